use super::event::Event;
use crate::cosmic::CalcScalar;
use crate::errors::VelaError;
use std::collections::{HashMap, VecDeque};

/// The mission plan: a directed acyclic graph of events where an edge
/// `p -> d` means d must not run before p has completed.
///
/// The adjacency map stores, per event, the events depending on it. Events
/// are compared by identity, and the separate `events` vector keeps the order
/// in which they were first registered, which is also the tie-breaking order
/// of the topological sort.
pub struct Sequence<T: CalcScalar> {
    events: Vec<Event<T>>,
    deps: HashMap<Event<T>, Vec<Event<T>>>,
}

impl<T: CalcScalar> Default for Sequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: CalcScalar> Sequence<T> {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            deps: HashMap::new(),
        }
    }

    /// Adds an event with the events that must complete before it. Both the
    /// event and any unseen prerequisite are registered on first mention.
    pub fn add_event(&mut self, event: &Event<T>, prereqs: &[Event<T>]) {
        self.register(event);
        for prereq in prereqs {
            self.register(prereq);
            self.deps
                .get_mut(prereq)
                .expect("prerequisite was just registered")
                .push(event.clone());
        }
    }

    fn register(&mut self, event: &Event<T>) {
        if !self.deps.contains_key(event) {
            self.deps.insert(event.clone(), Vec::new());
            self.events.push(event.clone());
        }
    }

    /// Events in first-registration order.
    pub fn events(&self) -> &[Event<T>] {
        &self.events
    }

    /// The events that must run after the provided one.
    pub fn dependents_of(&self, event: &Event<T>) -> &[Event<T>] {
        self.deps.get(event).map_or(&[], Vec::as_slice)
    }

    /// Kahn's algorithm. The seed queue is FIFO over the zero in-degree
    /// events in registration order, so ties resolve deterministically to the
    /// order the user declared the plan in. Fails with
    /// [`VelaError::SequenceCycle`] if any event is unreachable.
    pub fn topological_sort(&self) -> Result<Vec<Event<T>>, VelaError> {
        let mut in_degree: HashMap<Event<T>, usize> =
            self.events.iter().map(|e| (e.clone(), 0)).collect();
        for event in &self.events {
            for dependent in &self.deps[event] {
                *in_degree
                    .get_mut(dependent)
                    .expect("dependents are registered on insertion") += 1;
            }
        }

        let mut queue: VecDeque<Event<T>> = self
            .events
            .iter()
            .filter(|e| in_degree[*e] == 0)
            .cloned()
            .collect();
        let mut sorted = Vec::with_capacity(self.events.len());
        while let Some(event) = queue.pop_front() {
            for dependent in &self.deps[&event] {
                let degree = in_degree
                    .get_mut(dependent)
                    .expect("dependents are registered on insertion");
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(dependent.clone());
                }
            }
            sorted.push(event);
        }

        if sorted.len() != self.events.len() {
            error!(
                "sequence has {} events but only {} are reachable without a cycle",
                self.events.len(),
                sorted.len()
            );
            return Err(VelaError::SequenceCycle);
        }
        Ok(sorted)
    }
}

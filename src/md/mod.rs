//! Mission design: the calc framework, the event sequence graph, and the
//! sequence manager which turns a declared plan into a solver-ready problem.

/// Variable tags and the calc containers binding them to domain objects.
pub mod calc;
pub use self::calc::{BodyCalc, BodyVar, Calc, ManeuverCalc, ManeuverVar, OrbitCalc, OrbitVar, Subject};

/// Decision variables over settable calcs.
pub mod variable;
pub use self::variable::SolverVariable;

/// Bounded constraints over any calc.
pub mod constraint;
pub use self::constraint::Constraint;

/// Events: named effects with their owned variables and constraints.
pub mod event;
pub use self::event::{Effect, Event};

/// The event dependency graph and its topological sort.
pub mod sequence;
pub use self::sequence::Sequence;

/// The frozen executable view of a sequence.
pub mod manager;
pub use self::manager::SequenceManager;

/// The solver seam and the built-in differential corrector.
pub mod opti;
pub use self::opti::{FiniteDiffNewton, NlpSolution, NlpSolver};

/// Sequence and solution reports.
pub mod report;
pub use self::report::{write_sequence_report, SolutionReport};

/// A shortcut to everything a mission design script needs.
pub mod prelude;

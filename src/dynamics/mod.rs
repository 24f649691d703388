/// The guidance module defines impulsive maneuvers, the local frames their
/// components are expressed in, and the application of a burn to a spacecraft.
///
/// It is up to the engineer to ensure that the coordinate frames of the
/// spacecraft and of any inertially-specified maneuver match.
pub mod guidance;
pub use self::guidance::*;

//! Re-exports of the linear algebra backend used throughout the crate.

pub use nalgebra::allocator::Allocator;
pub use nalgebra::{
    DMatrix, DVector, DefaultAllocator, Dim, DimName, Matrix3, Matrix6, Vector3, Vector6, U1, U3,
    U4, U6, U7,
};

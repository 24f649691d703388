use crate::cosmic::CalcScalar;
use crate::errors::VelaError;
use crate::linalg::{DMatrix, Vector3};

/// Dot product which stays valid for dual numbers.
pub fn dot<T: CalcScalar>(a: &Vector3<T>, b: &Vector3<T>) -> T {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Cross product which stays valid for dual numbers.
pub fn cross<T: CalcScalar>(a: &Vector3<T>, b: &Vector3<T>) -> Vector3<T> {
    Vector3::new(
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    )
}

/// Euclidean norm which stays valid for dual numbers.
pub fn norm<T: CalcScalar>(v: &Vector3<T>) -> T {
    dot(v, v).sqrt()
}

/// Returns the unit vector, or an error if the norm is vanishingly small.
pub fn unit_vector<T: CalcScalar>(v: &Vector3<T>) -> Result<Vector3<T>, VelaError> {
    let n = norm(v);
    if n.real() < 1e-12 {
        return Err(VelaError::MathDomain(
            "cannot normalize a zero vector".to_string(),
        ));
    }
    Ok(Vector3::new(v[0] / n, v[1] / n, v[2] / n))
}

/// Moore-Penrose pseudo-inverse via SVD, used to invert non-square Jacobians.
pub fn pseudo_inverse(mat: &DMatrix<f64>) -> Result<DMatrix<f64>, VelaError> {
    mat.clone()
        .pseudo_inverse(1e-10)
        .map_err(|msg| VelaError::SingularJacobian(msg.to_string()))
}

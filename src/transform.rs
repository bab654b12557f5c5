//! Sampled values: points, rotations and rigid transforms.
//!
//! Lattices resolve addresses to one of three fixed-size value types. All are
//! plain `Copy` arrays; [`stack`] turns a slice of them into one `ndarray`
//! array with a leading sample axis for callers that want a dense batch.

use crate::error::{Error, Result};
use core::fmt::Debug;
use ndarray::{ArrayD, IxDyn};
use num_traits::Float;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Floating point precision of sampled values (`f32` or `f64`).
pub trait Real: Float + Debug + Default + Send + Sync + 'static {
    /// Short tag used in catalog names (`f4` / `f8`).
    const TAG: &'static str;

    /// Conversion from `f64` (rounds for `f32`).
    fn from_f64_lossy(v: f64) -> Self;

    /// Widening conversion to `f64`.
    fn as_f64(self) -> f64;
}

impl Real for f32 {
    const TAG: &'static str = "f4";

    #[inline]
    fn from_f64_lossy(v: f64) -> Self {
        v as f32
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl Real for f64 {
    const TAG: &'static str = "f8";

    #[inline]
    fn from_f64_lossy(v: f64) -> Self {
        v
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self
    }
}

/// A value a lattice can resolve an address to.
pub trait Transform: Copy + Debug + Send + Sync {
    /// Element type.
    type Scalar: Real;

    /// Shape of one value (`[D]`, `[3, 3]` or `[4, 4]`).
    fn item_shape() -> Vec<usize>;

    /// Append the elements in row-major order.
    fn extend_flat(&self, out: &mut Vec<Self::Scalar>);
}

/// A point in `D`-dimensional Cartesian space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector<F, const D: usize>(pub [F; D]);

impl<F: Real, const D: usize> Transform for Vector<F, D> {
    type Scalar = F;

    fn item_shape() -> Vec<usize> {
        vec![D]
    }

    fn extend_flat(&self, out: &mut Vec<F>) {
        out.extend_from_slice(&self.0);
    }
}

/// A 3x3 rotation matrix, row-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation<F>(pub [[F; 3]; 3]);

impl<F: Real> Rotation<F> {
    /// The identity rotation.
    pub fn identity() -> Self {
        let (o, z) = (F::one(), F::zero());
        Self([[o, z, z], [z, o, z], [z, z, o]])
    }

    /// Rotation by `angle` radians about the unit vector `axis` (Rodrigues).
    pub fn from_axis_angle(axis: [F; 3], angle: F) -> Self {
        let [x, y, z] = axis;
        let (s, c) = angle.sin_cos();
        let t = F::one() - c;
        Self([
            [t * x * x + c, t * x * y - s * z, t * x * z + s * y],
            [t * x * y + s * z, t * y * y + c, t * y * z - s * x],
            [t * x * z - s * y, t * y * z + s * x, t * z * z + c],
        ])
    }

    /// Apply to a vector.
    pub fn apply(&self, v: [F; 3]) -> [F; 3] {
        let m = &self.0;
        [
            m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
            m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
            m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
        ]
    }

    /// Embed into a homogeneous transform with zero translation.
    pub fn to_homogeneous(&self) -> Xform<F> {
        Xform::from_parts(self, [F::zero(); 3])
    }
}

impl<F: Real> Transform for Rotation<F> {
    type Scalar = F;

    fn item_shape() -> Vec<usize> {
        vec![3, 3]
    }

    fn extend_flat(&self, out: &mut Vec<F>) {
        for row in &self.0 {
            out.extend_from_slice(row);
        }
    }
}

/// A 4x4 homogeneous rigid transform, row-major, last row `0 0 0 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Xform<F>(pub [[F; 4]; 4]);

impl<F: Real> Xform<F> {
    /// Compose a rotation and a translation.
    pub fn from_parts(rot: &Rotation<F>, trans: [F; 3]) -> Self {
        let (o, z) = (F::one(), F::zero());
        let r = &rot.0;
        Self([
            [r[0][0], r[0][1], r[0][2], trans[0]],
            [r[1][0], r[1][1], r[1][2], trans[1]],
            [r[2][0], r[2][1], r[2][2], trans[2]],
            [z, z, z, o],
        ])
    }

    /// Rotation block.
    pub fn rotation(&self) -> Rotation<F> {
        let m = &self.0;
        Rotation([
            [m[0][0], m[0][1], m[0][2]],
            [m[1][0], m[1][1], m[1][2]],
            [m[2][0], m[2][1], m[2][2]],
        ])
    }

    /// Translation column.
    pub fn translation(&self) -> [F; 3] {
        [self.0[0][3], self.0[1][3], self.0[2][3]]
    }
}

impl<F: Real> Transform for Xform<F> {
    type Scalar = F;

    fn item_shape() -> Vec<usize> {
        vec![4, 4]
    }

    fn extend_flat(&self, out: &mut Vec<F>) {
        for row in &self.0 {
            out.extend_from_slice(row);
        }
    }
}

/// Stack values into one array of shape `[n, ..item_shape]`.
pub fn stack<T: Transform>(values: &[T]) -> Result<ArrayD<T::Scalar>> {
    let mut shape = vec![values.len()];
    shape.extend(T::item_shape());
    let per_item: usize = T::item_shape().iter().product();
    let mut flat = Vec::with_capacity(values.len() * per_item);
    for v in values {
        v.extend_flat(&mut flat);
    }
    ArrayD::from_shape_vec(IxDyn(&shape), flat).map_err(|e| Error::ShapeMismatch {
        expected: format!("{:?}", shape),
        actual: e.to_string(),
    })
}

/// Normalize a 3-vector, rejecting zero length.
pub(crate) fn normalized<F: Real>(axis: [F; 3]) -> Result<[F; 3]> {
    let norm = (axis[0] * axis[0] + axis[1] * axis[1] + axis[2] * axis[2]).sqrt();
    if !(norm > F::zero()) || !norm.is_finite() {
        return Err(Error::InvalidParameter {
            name: "axis",
            message: format!("axis {:?} has no direction", axis),
        });
    }
    Ok([axis[0] / norm, axis[1] / norm, axis[2] / norm])
}

/// Float precision tag, for catalog lookups and persisted parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Precision {
    /// `f32`
    F4,
    /// `f64`
    F8,
}

impl Precision {
    /// Short tag (`f4` / `f8`).
    pub fn tag(self) -> &'static str {
        match self {
            Precision::F4 => f32::TAG,
            Precision::F8 => f64::TAG,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use core::f64::consts::FRAC_PI_2;

    #[test]
    fn test_axis_angle_quarter_turn() {
        let r = Rotation::<f64>::from_axis_angle([0.0, 0.0, 1.0], FRAC_PI_2);
        let v = r.apply([1.0, 0.0, 0.0]);
        assert!((v[0]).abs() < 1e-12);
        assert!((v[1] - 1.0).abs() < 1e-12);
        assert!((v[2]).abs() < 1e-12);
    }

    #[test]
    fn test_homogeneous_embedding() {
        let r = Rotation::<f32>::from_axis_angle([1.0, 0.0, 0.0], 0.3);
        let x = r.to_homogeneous();
        assert_eq!(x.rotation(), r);
        assert_eq!(x.translation(), [0.0; 3]);
        assert_eq!(x.0[3], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_stack_shapes() {
        let pts = [Vector([1.0f64, 2.0]), Vector([3.0, 4.0]), Vector([5.0, 6.0])];
        let a = stack(&pts).unwrap();
        assert_eq!(a.shape(), &[3, 2]);
        assert_eq!(a[&[2, 1][..]], 6.0);

        let xs = [Xform::from_parts(&Rotation::<f32>::identity(), [1.0, 2.0, 3.0])];
        let a = stack(&xs).unwrap();
        assert_eq!(a.shape(), &[1, 4, 4]);
        assert_eq!(a[&[0, 1, 3][..]], 2.0);

        let empty: [Rotation<f64>; 0] = [];
        assert_eq!(stack(&empty).unwrap().shape(), &[0, 3, 3]);
    }

    #[test]
    fn test_normalized_rejects_zero() {
        assert!(normalized([0.0f64; 3]).is_err());
        let n = normalized([0.0f64, 3.0, 4.0]).unwrap();
        assert!((n[1] - 0.6).abs() < 1e-12);
    }
}

//! The rotation group SO(3) and its algebra so(3).
//!
//! Group elements are unit quaternions stored as `[qx, qy, qz, qw]`, which is
//! also the coordinate order of `nalgebra::Quaternion::coords`. Algebra
//! elements are rotation vectors `φ = θ·axis`.

use crate::coefficients;
use crate::lie_group::LieGroup;
use crate::series;
use lietensor_core::GroupType;
use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3, Vector4};

/// Read a unit quaternion from `[qx, qy, qz, qw]`.
#[inline]
pub fn quat(x: &[f64]) -> UnitQuaternion<f64> {
    UnitQuaternion::new_unchecked(Quaternion::from(Vector4::new(x[0], x[1], x[2], x[3])))
}

/// Write a unit quaternion as `[qx, qy, qz, qw]`.
#[inline]
pub fn write_quat(q: &UnitQuaternion<f64>, out: &mut [f64]) {
    out[..4].copy_from_slice(q.as_ref().coords.as_slice());
}

#[inline]
pub(crate) fn vec3(x: &[f64]) -> Vector3<f64> {
    Vector3::new(x[0], x[1], x[2])
}

#[inline]
pub(crate) fn write_vec3(v: &Vector3<f64>, out: &mut [f64]) {
    out[..3].copy_from_slice(v.as_slice());
}

/// Exponential map of a rotation vector.
pub fn exp_map(phi: &Vector3<f64>) -> UnitQuaternion<f64> {
    let (imag, real) = coefficients::half_angle(phi.norm_squared());
    let v = phi * imag;
    UnitQuaternion::new_unchecked(Quaternion::new(real, v.x, v.y, v.z))
}

/// Logarithm map, with the angle in `[0, π]`.
pub fn log_map(q: &UnitQuaternion<f64>) -> Vector3<f64> {
    let (mut v, mut w) = (q.imag(), q.w);
    if w < 0.0 {
        v = -v;
        w = -w;
    }
    v * coefficients::log_scale(v.norm_squared(), w)
}

/// Left Jacobian `J_l(φ) = I + b1 Φ + b2 Φ²`.
pub fn left_jacobian(phi: &Vector3<f64>) -> Matrix3<f64> {
    let theta_sq = phi.norm_squared();
    let hat = phi.cross_matrix();
    Matrix3::identity() + hat * coefficients::b1(theta_sq) + hat * hat * coefficients::b2(theta_sq)
}

/// Inverse left Jacobian `J_l⁻¹(φ) = I − ½ Φ + c Φ²`.
pub fn left_jacobian_inv(phi: &Vector3<f64>) -> Matrix3<f64> {
    let theta_sq = phi.norm_squared();
    let hat = phi.cross_matrix();
    Matrix3::identity() - hat * 0.5 + hat * hat * coefficients::inv_b2(theta_sq)
}

/// Marker type for SO(3) kernels.
#[derive(Debug, Clone, Copy, Default)]
pub struct SO3;

impl LieGroup for SO3 {
    const GROUP: GroupType = GroupType::SO3;
    const ALGEBRA: GroupType = GroupType::so3;
    const DIM: usize = 4;
    const DOF: usize = 3;

    fn exp(a: &[f64], out: &mut [f64]) {
        write_quat(&exp_map(&vec3(a)), out);
    }

    fn log(x: &[f64], out: &mut [f64]) {
        write_vec3(&log_map(&quat(x)), out);
    }

    fn inv(x: &[f64], out: &mut [f64]) {
        write_quat(&quat(x).inverse(), out);
    }

    fn mul(x: &[f64], y: &[f64], out: &mut [f64]) {
        write_quat(&(quat(x) * quat(y)), out);
    }

    fn adj(x: &[f64], a: &[f64], out: &mut [f64]) {
        write_vec3(&quat(x).transform_vector(&vec3(a)), out);
    }

    fn adj_t(x: &[f64], a: &[f64], out: &mut [f64]) {
        write_vec3(&quat(x).inverse_transform_vector(&vec3(a)), out);
    }

    fn jinv(x: &[f64], a: &[f64], out: &mut [f64]) {
        let phi = log_map(&quat(x));
        write_vec3(&(left_jacobian_inv(&phi) * vec3(a)), out);
    }

    fn act3(x: &[f64], p: &[f64], out: &mut [f64]) {
        write_vec3(&quat(x).transform_vector(&vec3(p)), out);
    }

    fn act4(x: &[f64], p: &[f64], out: &mut [f64]) {
        write_vec3(&quat(x).transform_vector(&vec3(p)), out);
        out[3] = p[3];
    }

    fn quaternion(x: &[f64], out: &mut [f64]) {
        out[..4].copy_from_slice(&x[..4]);
    }

    fn left_jacobian_t(a: &[f64], g: &[f64], out: &mut [f64]) {
        write_vec3(&left_jacobian(&vec3(a)).tr_mul(&vec3(g)), out);
    }

    fn left_jacobian_inv_t(a: &[f64], g: &[f64], out: &mut [f64]) {
        write_vec3(&left_jacobian_inv(&vec3(a)).tr_mul(&vec3(g)), out);
    }

    fn ad_t(a: &[f64], g: &[f64], out: &mut [f64]) {
        write_vec3(&vec3(g).cross(&vec3(a)), out);
    }

    fn jinv_backward(x: &[f64], a: &[f64], g: &[f64], dx: &mut [f64], da: &mut [f64]) {
        let phi = log_map(&quat(x));
        let jinv_t = left_jacobian_inv(&phi).transpose();
        let g = vec3(g);
        let d_phi = series::jinv_derivative(&phi, &vec3(a), |v| v.cross_matrix());
        write_vec3(&(jinv_t * d_phi.tr_mul(&g)), dx);
        write_vec3(&(jinv_t * g), da);
    }

    fn act3_backward(x: &[f64], _p: &[f64], out: &[f64], g: &[f64], dx: &mut [f64], dp: &mut [f64]) {
        let g = vec3(g);
        write_vec3(&vec3(out).cross(&g), dx);
        write_vec3(&quat(x).inverse_transform_vector(&g), dp);
    }

    fn act4_backward(x: &[f64], _p: &[f64], out: &[f64], g: &[f64], dx: &mut [f64], dp: &mut [f64]) {
        let g3 = vec3(g);
        write_vec3(&vec3(out).cross(&g3), dx);
        write_vec3(&quat(x).inverse_transform_vector(&g3), dp);
        dp[3] = g[3];
    }

    fn quaternion_backward(x: &[f64], g: &[f64], dx: &mut [f64]) {
        let (v, w) = (vec3(x), x[3]);
        let gv = vec3(g);
        write_vec3(&((gv * w + v.cross(&gv) - v * g[3]) * 0.5), dx);
    }
}

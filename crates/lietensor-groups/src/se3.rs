//! The rigid motion group SE(3) and its algebra se(3).
//!
//! Group elements are stored as `[tx, ty, tz, qx, qy, qz, qw]`. Algebra
//! elements are twists `ξ = [ρ, φ]` with the translational part first, and the
//! tangent space of the group uses the same ordering.

use crate::coefficients;
use crate::lie_group::LieGroup;
use crate::series;
use crate::so3::{self, quat, vec3, write_quat, write_vec3};
use lietensor_core::GroupType;
use nalgebra::{Matrix3, Matrix6, UnitQuaternion, Vector3, Vector6};

#[inline]
fn parts(x: &[f64]) -> (Vector3<f64>, UnitQuaternion<f64>) {
    (vec3(&x[..3]), quat(&x[3..7]))
}

#[inline]
fn twist(a: &[f64]) -> Vector6<f64> {
    Vector6::from_column_slice(&a[..6])
}

#[inline]
fn split(xi: &Vector6<f64>) -> (Vector3<f64>, Vector3<f64>) {
    (xi.fixed_rows::<3>(0).into_owned(), xi.fixed_rows::<3>(3).into_owned())
}

fn write_twist(xi: &Vector6<f64>, out: &mut [f64]) {
    out[..6].copy_from_slice(xi.as_slice());
}

/// Coupling block `Q(ρ, φ)` of the SE(3) left Jacobian.
pub fn q_matrix(rho: &Vector3<f64>, phi: &Vector3<f64>) -> Matrix3<f64> {
    let theta_sq = phi.norm_squared();
    let p = phi.cross_matrix();
    let r = rho.cross_matrix();
    let pr = p * r;
    let rp = r * p;
    let prp = pr * p;
    r * 0.5
        + (pr + rp + prp) * coefficients::b2(theta_sq)
        + (p * pr + rp * p - prp * 3.0) * coefficients::q2(theta_sq)
        + (prp * p + p * prp) * coefficients::q3(theta_sq)
}

/// Left Jacobian `[[J, Q], [0, J]]`.
pub fn left_jacobian(xi: &Vector6<f64>) -> Matrix6<f64> {
    let (rho, phi) = split(xi);
    let j = so3::left_jacobian(&phi);
    let mut m = Matrix6::zeros();
    m.fixed_view_mut::<3, 3>(0, 0).copy_from(&j);
    m.fixed_view_mut::<3, 3>(0, 3).copy_from(&q_matrix(&rho, &phi));
    m.fixed_view_mut::<3, 3>(3, 3).copy_from(&j);
    m
}

/// Inverse left Jacobian `[[J⁻¹, −J⁻¹ Q J⁻¹], [0, J⁻¹]]`.
pub fn left_jacobian_inv(xi: &Vector6<f64>) -> Matrix6<f64> {
    let (rho, phi) = split(xi);
    let ji = so3::left_jacobian_inv(&phi);
    let mut m = Matrix6::zeros();
    m.fixed_view_mut::<3, 3>(0, 0).copy_from(&ji);
    m.fixed_view_mut::<3, 3>(0, 3)
        .copy_from(&(-ji * q_matrix(&rho, &phi) * ji));
    m.fixed_view_mut::<3, 3>(3, 3).copy_from(&ji);
    m
}

/// Algebra adjoint `ad_ξ = [[φ^, ρ^], [0, φ^]]`.
pub fn ad(xi: &Vector6<f64>) -> Matrix6<f64> {
    let (rho, phi) = split(xi);
    let p = phi.cross_matrix();
    let mut m = Matrix6::zeros();
    m.fixed_view_mut::<3, 3>(0, 0).copy_from(&p);
    m.fixed_view_mut::<3, 3>(0, 3).copy_from(&rho.cross_matrix());
    m.fixed_view_mut::<3, 3>(3, 3).copy_from(&p);
    m
}

/// Logarithm of a group element as a twist.
pub fn log_map(x: &[f64]) -> Vector6<f64> {
    let (t, q) = parts(x);
    let phi = so3::log_map(&q);
    let rho = so3::left_jacobian_inv(&phi) * t;
    Vector6::new(rho.x, rho.y, rho.z, phi.x, phi.y, phi.z)
}

/// Marker type for SE(3) kernels.
#[derive(Debug, Clone, Copy, Default)]
pub struct SE3;

impl LieGroup for SE3 {
    const GROUP: GroupType = GroupType::SE3;
    const ALGEBRA: GroupType = GroupType::se3;
    const DIM: usize = 7;
    const DOF: usize = 6;

    fn exp(a: &[f64], out: &mut [f64]) {
        let (rho, phi) = split(&twist(a));
        write_vec3(&(so3::left_jacobian(&phi) * rho), out);
        write_quat(&so3::exp_map(&phi), &mut out[3..]);
    }

    fn log(x: &[f64], out: &mut [f64]) {
        write_twist(&log_map(x), out);
    }

    fn inv(x: &[f64], out: &mut [f64]) {
        let (t, q) = parts(x);
        let qi = q.inverse();
        write_vec3(&-(qi * t), out);
        write_quat(&qi, &mut out[3..]);
    }

    fn mul(x: &[f64], y: &[f64], out: &mut [f64]) {
        let (t1, q1) = parts(x);
        let (t2, q2) = parts(y);
        write_vec3(&(t1 + q1 * t2), out);
        write_quat(&(q1 * q2), &mut out[3..]);
    }

    fn adj(x: &[f64], a: &[f64], out: &mut [f64]) {
        let (t, q) = parts(x);
        let r_phi = q * vec3(&a[3..]);
        write_vec3(&(q * vec3(a) + t.cross(&r_phi)), out);
        write_vec3(&r_phi, &mut out[3..]);
    }

    fn adj_t(x: &[f64], a: &[f64], out: &mut [f64]) {
        let (t, q) = parts(x);
        let a_rho = vec3(a);
        write_vec3(&q.inverse_transform_vector(&a_rho), out);
        write_vec3(
            &q.inverse_transform_vector(&(vec3(&a[3..]) - t.cross(&a_rho))),
            &mut out[3..],
        );
    }

    fn jinv(x: &[f64], a: &[f64], out: &mut [f64]) {
        write_twist(&(left_jacobian_inv(&log_map(x)) * twist(a)), out);
    }

    fn act3(x: &[f64], p: &[f64], out: &mut [f64]) {
        let (t, q) = parts(x);
        write_vec3(&(q * vec3(p) + t), out);
    }

    fn act4(x: &[f64], p: &[f64], out: &mut [f64]) {
        let (t, q) = parts(x);
        write_vec3(&(q * vec3(p) + t * p[3]), out);
        out[3] = p[3];
    }

    fn quaternion(x: &[f64], out: &mut [f64]) {
        out[..4].copy_from_slice(&x[3..7]);
    }

    fn left_jacobian_t(a: &[f64], g: &[f64], out: &mut [f64]) {
        write_twist(&left_jacobian(&twist(a)).tr_mul(&twist(g)), out);
    }

    fn left_jacobian_inv_t(a: &[f64], g: &[f64], out: &mut [f64]) {
        write_twist(&left_jacobian_inv(&twist(a)).tr_mul(&twist(g)), out);
    }

    fn ad_t(a: &[f64], g: &[f64], out: &mut [f64]) {
        write_twist(&ad(&twist(a)).tr_mul(&twist(g)), out);
    }

    fn jinv_backward(x: &[f64], a: &[f64], g: &[f64], dx: &mut [f64], da: &mut [f64]) {
        let xi = log_map(x);
        let jinv_t = left_jacobian_inv(&xi).transpose();
        let g = twist(g);
        let d_xi = series::jinv_derivative(&xi, &twist(a), ad);
        write_twist(&(jinv_t * d_xi.tr_mul(&g)), dx);
        write_twist(&(jinv_t * g), da);
    }

    fn act3_backward(x: &[f64], _p: &[f64], out: &[f64], g: &[f64], dx: &mut [f64], dp: &mut [f64]) {
        let (_, q) = parts(x);
        let g = vec3(g);
        write_vec3(&g, dx);
        write_vec3(&vec3(out).cross(&g), &mut dx[3..]);
        write_vec3(&q.inverse_transform_vector(&g), dp);
    }

    fn act4_backward(x: &[f64], p: &[f64], out: &[f64], g: &[f64], dx: &mut [f64], dp: &mut [f64]) {
        let (t, q) = parts(x);
        let g3 = vec3(g);
        write_vec3(&(g3 * p[3]), dx);
        write_vec3(&vec3(out).cross(&g3), &mut dx[3..]);
        write_vec3(&q.inverse_transform_vector(&g3), dp);
        dp[3] = t.dot(&g3) + g[3];
    }

    fn quaternion_backward(x: &[f64], g: &[f64], dx: &mut [f64]) {
        let (v, w) = (vec3(&x[3..]), x[6]);
        let gv = vec3(g);
        write_vec3(&((gv * w + v.cross(&gv) - v * g[3]) * 0.5), &mut dx[3..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn element(xi: [f64; 6]) -> [f64; 7] {
        let mut x = [0.0; 7];
        SE3::exp(&xi, &mut x);
        x
    }

    #[test]
    fn test_pure_translation_exp() {
        let x = element([1.0, 2.0, 3.0, 0.0, 0.0, 0.0]);
        assert_eq!(x, [1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_exp_log_round_trip() {
        let xi = [0.3, -1.0, 0.5, 0.8, -0.2, 0.4];
        let x = element(xi);
        let mut back = [0.0; 6];
        SE3::log(&x, &mut back);
        for (a, b) in xi.iter().zip(back.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_jacobian_inverse_pair() {
        for xi in [
            Vector6::new(0.1, 0.2, 0.3, 1e-6, -2e-6, 1e-6),
            Vector6::new(0.5, -0.3, 0.2, 0.06, 0.03, -0.05),
            Vector6::new(1.0, 2.0, -1.0, 0.7, -1.2, 0.9),
        ] {
            let prod = left_jacobian(&xi) * left_jacobian_inv(&xi);
            assert_relative_eq!(prod, Matrix6::identity(), epsilon = 1e-10);
        }
    }

    #[test]
    fn test_jacobian_matches_exp_perturbation() {
        // Exp(ξ + δ) ≈ Exp(J_l(ξ) δ) · Exp(ξ)
        let xi = Vector6::new(0.4, -0.6, 0.2, 0.5, 0.3, -0.7);
        let h = 1e-6;
        let y0 = element(xi.into());
        let mut y0_inv = [0.0; 7];
        SE3::inv(&y0, &mut y0_inv);
        let jl = left_jacobian(&xi);
        for j in 0..6 {
            let mut e = Vector6::zeros();
            e[j] = h;
            let yp = element((xi + e).into());
            let ym = element((xi - e).into());
            let mut dp = [0.0; 7];
            let mut dm = [0.0; 7];
            SE3::mul(&yp, &y0_inv, &mut dp);
            SE3::mul(&ym, &y0_inv, &mut dm);
            let fd = (log_map(&dp) - log_map(&dm)) / (2.0 * h);
            assert_relative_eq!(fd, jl.column(j).into_owned(), epsilon = 1e-7);
        }
    }

    #[test]
    fn test_adjoint_transposes_agree() {
        let x = element([0.2, 0.1, -0.4, 0.3, 0.9, -0.1]);
        let a = [0.5, -0.2, 0.7, 0.1, 0.3, -0.6];
        let b = [-0.3, 0.8, 0.2, 0.4, -0.5, 0.1];
        let (mut ad_a, mut adt_b) = ([0.0; 6], [0.0; 6]);
        SE3::adj(&x, &a, &mut ad_a);
        SE3::adj_t(&x, &b, &mut adt_b);
        let lhs: f64 = ad_a.iter().zip(b.iter()).map(|(u, v)| u * v).sum();
        let rhs: f64 = a.iter().zip(adt_b.iter()).map(|(u, v)| u * v).sum();
        assert_relative_eq!(lhs, rhs, epsilon = 1e-12);
    }
}

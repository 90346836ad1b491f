//! Bernoulli series of the inverse left Jacobian.
//!
//! `J_l⁻¹(x) = Σₙ Bₙ/n! · ad_xⁿ` holds for every matrix Lie group whose
//! adjoint eigenvalues stay inside `|λ| < 2π`, which covers `Log` outputs.
//! Differentiating the partial sums term by term gives the derivative of
//! `J_l⁻¹(x)·a` with respect to `x` that the `Jinv` backward rule needs.

use lietensor_core::config;
use nalgebra::{SMatrix, SVector};
use once_cell::sync::Lazy;
use std::f64::consts::PI;

static COEFFICIENTS: Lazy<Vec<f64>> =
    Lazy::new(|| bernoulli_coefficients(config().jinv_series_terms));

/// `ζ(2k)` for `k ≥ 1`.
fn zeta_even(k: usize) -> f64 {
    match k {
        1 => PI.powi(2) / 6.0,
        2 => PI.powi(4) / 90.0,
        3 => PI.powi(6) / 945.0,
        _ => {
            let exp = -2 * (k as i32);
            (1..=1000).map(|m| f64::from(m).powi(exp)).sum()
        }
    }
}

/// The first `terms` coefficients `Bₙ/n!` of `x/(eˣ − 1)`.
pub fn bernoulli_coefficients(terms: usize) -> Vec<f64> {
    (0..terms)
        .map(|n| match n {
            0 => 1.0,
            1 => -0.5,
            n if n % 2 == 1 => 0.0,
            n => {
                let k = n / 2;
                let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
                sign * 2.0 * zeta_even(k) / (2.0 * PI).powi(n as i32)
            }
        })
        .collect()
}

/// Derivative of `J_l⁻¹(x)·a` with respect to `x`.
///
/// With `vₙ = ad_xⁿ a`, the per-term derivatives obey
/// `Wₙ = ad_x Wₙ₋₁ − ad(vₙ₋₁)` from `W₀ = 0`.
pub fn jinv_derivative<const N: usize, F>(
    x: &SVector<f64, N>,
    a: &SVector<f64, N>,
    hat: F,
) -> SMatrix<f64, N, N>
where
    F: Fn(&SVector<f64, N>) -> SMatrix<f64, N, N>,
{
    let ad_x = hat(x);
    let mut v = *a;
    let mut w = SMatrix::<f64, N, N>::zeros();
    let mut d = SMatrix::<f64, N, N>::zeros();
    for &c in COEFFICIENTS.iter().skip(1) {
        w = ad_x * w - hat(&v);
        v = ad_x * v;
        if c != 0.0 {
            d += w * c;
        }
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::so3;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    /// `J_l⁻¹(x)·a` evaluated through the series.
    fn jinv_apply<const N: usize, F>(
        x: &SVector<f64, N>,
        a: &SVector<f64, N>,
        hat: F,
    ) -> SVector<f64, N>
    where
        F: Fn(&SVector<f64, N>) -> SMatrix<f64, N, N>,
    {
        let ad_x = hat(x);
        let mut v = *a;
        let mut b = SVector::<f64, N>::zeros();
        for &c in COEFFICIENTS.iter() {
            b += v * c;
            v = ad_x * v;
        }
        b
    }

    #[test]
    fn test_known_coefficients() {
        let c = bernoulli_coefficients(9);
        assert_relative_eq!(c[0], 1.0);
        assert_relative_eq!(c[1], -0.5);
        assert_relative_eq!(c[2], 1.0 / 12.0, epsilon = 1e-15);
        assert_eq!(c[3], 0.0);
        assert_relative_eq!(c[4], -1.0 / 720.0, epsilon = 1e-15);
        assert_relative_eq!(c[6], 1.0 / 30240.0, epsilon = 1e-15);
        assert_relative_eq!(c[8], -1.0 / 1_209_600.0, epsilon = 1e-15);
    }

    #[test]
    fn test_series_matches_closed_form() {
        let x = Vector3::new(0.7, -1.1, 0.4);
        let a = Vector3::new(0.2, 0.5, -0.3);
        let series = jinv_apply(&x, &a, |v| v.cross_matrix());
        let closed = so3::left_jacobian_inv(&x) * a;
        assert_relative_eq!(series, closed, epsilon = 1e-12);
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let x = Vector3::new(0.3, 0.9, -0.5);
        let a = Vector3::new(-0.4, 0.1, 0.8);
        let d = jinv_derivative(&x, &a, |v| v.cross_matrix());
        let h = 1e-6;
        for j in 0..3 {
            let mut e = Vector3::zeros();
            e[j] = h;
            let fd = (so3::left_jacobian_inv(&(x + e)) * a - so3::left_jacobian_inv(&(x - e)) * a)
                / (2.0 * h);
            assert_relative_eq!(d.column(j).into_owned(), fd, epsilon = 1e-8);
        }
    }
}

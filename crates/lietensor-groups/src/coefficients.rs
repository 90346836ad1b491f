//! Scalar coefficients of the SO(3)/SE(3) closed forms.
//!
//! Every function takes the squared angle `θ²` and switches to a truncated
//! Taylor series near zero. The quaternion terms change representation at the
//! configured small-angle threshold. The Jacobian coefficients divide by higher
//! powers of `θ` and switch earlier, at [`JACOBIAN_SERIES_SQ`] or the configured
//! threshold, whichever is larger.

use lietensor_core::config;

/// Squared angle below which the Jacobian coefficients use their series.
pub const JACOBIAN_SERIES_SQ: f64 = 1e-2;

fn exp_series(theta_sq: f64) -> bool {
    theta_sq < config().small_angle_threshold_sq()
}

fn jacobian_series(theta_sq: f64) -> bool {
    theta_sq < JACOBIAN_SERIES_SQ.max(config().small_angle_threshold_sq())
}

/// `(sin(θ/2)/θ, cos(θ/2))`, the imaginary scale and real part of `Exp(φ)`.
pub fn half_angle(theta_sq: f64) -> (f64, f64) {
    if exp_series(theta_sq) {
        let t2 = theta_sq * theta_sq;
        (
            0.5 - theta_sq / 48.0 + t2 / 3840.0,
            1.0 - theta_sq / 8.0 + t2 / 384.0,
        )
    } else {
        let theta = theta_sq.sqrt();
        let (s, c) = (0.5 * theta).sin_cos();
        (s / theta, c)
    }
}

/// Scale mapping a quaternion's vector part `v` (with `|v| = n`, real part
/// `w ≥ 0`) to its rotation vector.
pub fn log_scale(n_sq: f64, w: f64) -> f64 {
    if exp_series(n_sq) {
        2.0 / w * (1.0 - n_sq / (3.0 * w * w))
    } else {
        let n = n_sq.sqrt();
        2.0 * n.atan2(w) / n
    }
}

/// `(1 − cos θ)/θ²`
pub fn b1(theta_sq: f64) -> f64 {
    if jacobian_series(theta_sq) {
        0.5 - theta_sq / 24.0 + theta_sq * theta_sq / 720.0
    } else {
        (1.0 - theta_sq.sqrt().cos()) / theta_sq
    }
}

/// `(θ − sin θ)/θ³`
pub fn b2(theta_sq: f64) -> f64 {
    if jacobian_series(theta_sq) {
        1.0 / 6.0 - theta_sq / 120.0 + theta_sq * theta_sq / 5040.0
    } else {
        let theta = theta_sq.sqrt();
        (theta - theta.sin()) / (theta_sq * theta)
    }
}

/// `1/θ² − cot(θ/2)/(2θ)`, the quadratic coefficient of the inverse left Jacobian.
pub fn inv_b2(theta_sq: f64) -> f64 {
    if jacobian_series(theta_sq) {
        1.0 / 12.0 + theta_sq / 720.0 + theta_sq * theta_sq / 30240.0
    } else {
        let theta = theta_sq.sqrt();
        1.0 / theta_sq - 1.0 / (2.0 * theta * (0.5 * theta).tan())
    }
}

/// `(θ² + 2 cos θ − 2)/(2θ⁴)`
pub fn q2(theta_sq: f64) -> f64 {
    if jacobian_series(theta_sq) {
        1.0 / 24.0 - theta_sq / 720.0 + theta_sq * theta_sq / 40320.0
    } else {
        (theta_sq + 2.0 * theta_sq.sqrt().cos() - 2.0) / (2.0 * theta_sq * theta_sq)
    }
}

/// `(2θ − 3 sin θ + θ cos θ)/(2θ⁵)`
pub fn q3(theta_sq: f64) -> f64 {
    if jacobian_series(theta_sq) {
        1.0 / 120.0 - theta_sq / 2520.0 + theta_sq * theta_sq / 120_960.0
    } else {
        let theta = theta_sq.sqrt();
        let (s, c) = theta.sin_cos();
        (2.0 * theta - 3.0 * s + theta * c) / (2.0 * theta_sq * theta_sq * theta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // Values just above and below each switch point must agree.
    #[test]
    fn test_series_continuity() {
        let lo = JACOBIAN_SERIES_SQ * (1.0 - 1e-9);
        let hi = JACOBIAN_SERIES_SQ * (1.0 + 1e-9);
        for f in [b1, b2, inv_b2, q2, q3] {
            assert_relative_eq!(f(lo), f(hi), max_relative = 1e-9);
        }

        let thr = config().small_angle_threshold_sq();
        let (si, ci) = half_angle(thr * (1.0 - 1e-9));
        let (so, co) = half_angle(thr * (1.0 + 1e-9));
        assert_relative_eq!(si, so, max_relative = 1e-9);
        assert_relative_eq!(ci, co, max_relative = 1e-9);
    }

    #[test]
    fn test_limits_at_zero() {
        assert_eq!(half_angle(0.0), (0.5, 1.0));
        assert_relative_eq!(b1(0.0), 0.5);
        assert_relative_eq!(b2(0.0), 1.0 / 6.0);
        assert_relative_eq!(inv_b2(0.0), 1.0 / 12.0);
        assert_relative_eq!(q2(0.0), 1.0 / 24.0);
        assert_relative_eq!(q3(0.0), 1.0 / 120.0);
        assert_relative_eq!(log_scale(0.0, 1.0), 2.0);
    }

    #[test]
    fn test_closed_forms() {
        let theta = 1.2_f64;
        let t2 = theta * theta;
        assert_relative_eq!(b1(t2), (1.0 - theta.cos()) / t2, epsilon = 1e-14);
        assert_relative_eq!(
            inv_b2(t2),
            1.0 / t2 - (1.0 + theta.cos()) / (2.0 * theta * theta.sin()),
            epsilon = 1e-12
        );
        // A rotation by π has a zero real part.
        assert_relative_eq!(log_scale(1.0, 0.0), std::f64::consts::PI);
    }
}

//! Per-element interface shared by the rotation and rigid-motion groups.
//!
//! Implementors work on raw coordinate slices of a single element. Batching,
//! broadcasting and validation happen one level up in the kernel registry,
//! so every method here can assume correctly sized inputs.
//!
//! Gradients with respect to group elements are left-tangent: component `i`
//! is `∂L(Exp(ε)·X)/∂εᵢ` for `i < DOF`, and the remaining `DIM − DOF` slots
//! are left untouched (the caller zero-initialises them).

use lietensor_core::GroupType;

/// Closed-form operators and Jacobian primitives of a matrix Lie group.
pub trait LieGroup {
    /// Group kind.
    const GROUP: GroupType;
    /// Paired algebra kind.
    const ALGEBRA: GroupType;
    /// Stored coordinates per element.
    const DIM: usize;
    /// Tangent space dimension.
    const DOF: usize;

    /// Exponential map of an algebra element.
    fn exp(a: &[f64], out: &mut [f64]);
    /// Logarithm map of a group element.
    fn log(x: &[f64], out: &mut [f64]);
    /// Group inverse.
    fn inv(x: &[f64], out: &mut [f64]);
    /// Group product `x · y`.
    fn mul(x: &[f64], y: &[f64], out: &mut [f64]);
    /// Adjoint action `Ad_x a`.
    fn adj(x: &[f64], a: &[f64], out: &mut [f64]);
    /// Transposed adjoint `Ad_xᵀ a`.
    fn adj_t(x: &[f64], a: &[f64], out: &mut [f64]);
    /// Inverse left Jacobian at `Log x` applied to `a`.
    fn jinv(x: &[f64], a: &[f64], out: &mut [f64]);
    /// Action on a 3D point.
    fn act3(x: &[f64], p: &[f64], out: &mut [f64]);
    /// Action on a homogeneous 4D point.
    fn act4(x: &[f64], p: &[f64], out: &mut [f64]);
    /// Rotation quaternion `[qx, qy, qz, qw]`.
    fn quaternion(x: &[f64], out: &mut [f64]);

    /// `J_l(a)ᵀ g`
    fn left_jacobian_t(a: &[f64], g: &[f64], out: &mut [f64]);
    /// `J_l⁻¹(a)ᵀ g`
    fn left_jacobian_inv_t(a: &[f64], g: &[f64], out: &mut [f64]);
    /// `ad_aᵀ g`
    fn ad_t(a: &[f64], g: &[f64], out: &mut [f64]);

    /// Gradients of [`LieGroup::jinv`].
    fn jinv_backward(x: &[f64], a: &[f64], g: &[f64], dx: &mut [f64], da: &mut [f64]);
    /// Gradients of [`LieGroup::act3`].
    fn act3_backward(x: &[f64], p: &[f64], out: &[f64], g: &[f64], dx: &mut [f64], dp: &mut [f64]);
    /// Gradients of [`LieGroup::act4`].
    fn act4_backward(x: &[f64], p: &[f64], out: &[f64], g: &[f64], dx: &mut [f64], dp: &mut [f64]);
    /// Gradient of [`LieGroup::quaternion`].
    fn quaternion_backward(x: &[f64], g: &[f64], dx: &mut [f64]);

    /// Homogeneous 4x4 matrix, row major. Column `j` is `act4(x, e_j)`.
    fn matrix(x: &[f64], out: &mut [f64]) {
        let mut col = [0.0; 4];
        for j in 0..4 {
            let mut e = [0.0; 4];
            e[j] = 1.0;
            Self::act4(x, &e, &mut col);
            for r in 0..4 {
                out[r * 4 + j] = col[r];
            }
        }
    }

    /// `da = J_l(a)ᵀ g`
    fn exp_backward(a: &[f64], g: &[f64], da: &mut [f64]) {
        Self::left_jacobian_t(a, &g[..Self::DOF], da);
    }

    /// `dx = J_l⁻¹(Log x)ᵀ g`
    fn log_backward(out: &[f64], g: &[f64], dx: &mut [f64]) {
        Self::left_jacobian_inv_t(out, g, &mut dx[..Self::DOF]);
    }

    /// `dx = −Ad_yᵀ g` where `y = x⁻¹`
    fn inv_backward(out: &[f64], g: &[f64], dx: &mut [f64]) {
        let dx = &mut dx[..Self::DOF];
        Self::adj_t(out, &g[..Self::DOF], dx);
        dx.iter_mut().for_each(|v| *v = -*v);
    }

    /// `dx = g`, `dy = Ad_xᵀ g`
    fn mul_backward(x: &[f64], g: &[f64], dx: &mut [f64], dy: &mut [f64]) {
        let g = &g[..Self::DOF];
        dx[..Self::DOF].copy_from_slice(g);
        Self::adj_t(x, g, &mut dy[..Self::DOF]);
    }

    /// `dx = −ad_bᵀ g`, `da = Ad_xᵀ g` where `b = Ad_x a`
    fn adj_backward(x: &[f64], out: &[f64], g: &[f64], dx: &mut [f64], da: &mut [f64]) {
        let dx = &mut dx[..Self::DOF];
        Self::ad_t(out, g, dx);
        dx.iter_mut().for_each(|v| *v = -*v);
        Self::adj_t(x, g, da);
    }

    /// `dx = −ad_uᵀ a`, `da = u` where `u = Ad_x g`
    fn adj_t_backward(x: &[f64], a: &[f64], g: &[f64], dx: &mut [f64], da: &mut [f64]) {
        Self::adj(x, g, da);
        let dx = &mut dx[..Self::DOF];
        Self::ad_t(da, a, dx);
        dx.iter_mut().for_each(|v| *v = -*v);
    }

    /// Sum of the [`LieGroup::act4`] rule over the four columns.
    fn matrix_backward(x: &[f64], out: &[f64], g: &[f64], dx: &mut [f64]) {
        let mut col = [0.0; 4];
        let mut g_col = [0.0; 4];
        let mut dx_col = [0.0; 7];
        let mut dp = [0.0; 4];
        for j in 0..4 {
            let mut e = [0.0; 4];
            e[j] = 1.0;
            for r in 0..4 {
                col[r] = out[r * 4 + j];
                g_col[r] = g[r * 4 + j];
            }
            let dx_col = &mut dx_col[..Self::DIM];
            dx_col.fill(0.0);
            Self::act4_backward(x, &e, &col, &g_col, dx_col, &mut dp);
            for (d, s) in dx.iter_mut().zip(dx_col.iter()) {
                *d += s;
            }
        }
    }
}

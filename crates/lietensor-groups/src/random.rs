//! Gaussian sampling of batched elements.

use crate::operator::Operator;
use crate::registry::lookup;
use lietensor_core::{Batch, GroupType, Result};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Tangent vectors with i.i.d. `N(0, sigma²)` coordinates.
pub fn gaussian_tangent<R: Rng + ?Sized>(
    gtype: GroupType,
    batch_shape: &[usize],
    sigma: f64,
    rng: &mut R,
) -> Result<Batch> {
    let dof = gtype.manifold_dim();
    let count = batch_shape.iter().product::<usize>() * dof;
    let values = (0..count)
        .map(|_| {
            let z: f64 = StandardNormal.sample(rng);
            sigma * z
        })
        .collect();
    Batch::from_elements(batch_shape, &[dof], values)
}

/// Random elements of `gtype`.
///
/// Algebra kinds get the scaled Gaussian itself; group kinds get its
/// exponential.
pub fn sample<R: Rng + ?Sized>(
    gtype: GroupType,
    batch_shape: &[usize],
    sigma: f64,
    rng: &mut R,
) -> Result<Batch> {
    let tangent = gaussian_tangent(gtype, batch_shape, sigma, rng)?;
    if gtype.is_manifold() {
        lookup(Operator::Exp, gtype.mapping())?.forward(&[&tangent])
    } else {
        Ok(tangent)
    }
}

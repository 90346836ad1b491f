//! Free-function constructors and maps.

use crate::lie_tensor::LieTensor;
use crate::tensor::Tensor;
use lietensor_core::{Batch, GroupType, Result};
use lietensor_groups::random::gaussian_tangent;

/// Packs `values` as elements of `gtype`; see [`LieTensor::init_from_vec`].
pub fn make(gtype: GroupType, values: Batch) -> Result<LieTensor> {
    LieTensor::init_from_vec(gtype, values)
}

/// Identity elements; see [`LieTensor::identity`].
pub fn identity(gtype: GroupType, batch_shape: &[usize]) -> LieTensor {
    LieTensor::identity(gtype, batch_shape)
}

/// Random elements; see [`LieTensor::random`].
pub fn random(gtype: GroupType, batch_shape: &[usize], sigma: f64) -> Result<LieTensor> {
    LieTensor::random(gtype, batch_shape, sigma)
}

/// Gaussian tangent coordinates for `gtype`, as a plain tensor.
pub fn randn(gtype: GroupType, batch_shape: &[usize], sigma: f64) -> Result<Tensor> {
    let values = gaussian_tangent(gtype, batch_shape, sigma, &mut rand::thread_rng())?;
    Ok(Tensor::new(values))
}

/// Exponential map of algebra elements.
pub fn exp(a: &LieTensor) -> Result<LieTensor> {
    a.exp()
}

/// Logarithm map of group elements.
pub fn log(x: &LieTensor) -> Result<LieTensor> {
    x.log()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_make_and_maps() {
        let raw = Batch::from_vec(&[4], vec![0.0, 0.0, 3.0, 4.0]).unwrap();
        let x = make(GroupType::SO3, raw).unwrap();
        assert_relative_eq!(x.data().element(0), &[0.0, 0.0, 0.6, 0.8][..], epsilon = 1e-15);

        let a = log(&x).unwrap();
        assert_eq!(a.gtype(), GroupType::so3);
        let back = exp(&a).unwrap();
        assert_relative_eq!(back.data(), x.data(), epsilon = 1e-12);
    }

    #[test]
    fn test_randn_shape() {
        let a = randn(GroupType::SE3, &[2, 5], 1.0).unwrap();
        assert_eq!(a.shape(), vec![2, 5, 6]);
        let x = random(GroupType::SO3, &[4], 0.5).unwrap();
        assert_eq!(identity(GroupType::SO3, &[4]).shape(), x.shape());
    }
}

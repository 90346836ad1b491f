//! Closed-form SO(3)/SE(3) operators and their analytic Jacobians.
//!
//! Each supported group implements [`LieGroup`] on raw coordinate slices.
//! The [`registry`] lifts those per-element closed forms to broadcast
//! batches and exposes them as [`Kernel`]s keyed by [`Operator`] and
//! [`GroupType`](lietensor_core::GroupType).
//!
//! # Example
//!
//! ```
//! use lietensor_core::{Batch, GroupType};
//! use lietensor_groups::{lookup, Operator};
//!
//! let exp = lookup(Operator::Exp, GroupType::se3).unwrap();
//! let twist = Batch::from_vec(&[6], vec![1.0, 2.0, 3.0, 0.0, 0.0, 0.0]).unwrap();
//! let pose = exp.forward(&[&twist]).unwrap();
//! assert_eq!(pose.element(0), &[1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 1.0]);
//! ```

pub mod coefficients;
pub mod gradcheck;
pub mod lie_group;
pub mod operator;
pub mod random;
pub mod registry;
pub mod se3;
pub mod series;
pub mod so3;

pub use gradcheck::{check, GradcheckReport};
pub use lie_group::LieGroup;
pub use operator::Operator;
pub use registry::{kernels, lookup, Kernel};
pub use se3::SE3;
pub use so3::SO3;

//! Batched, differentiable SO(3) and SE(3) elements.
//!
//! [`LieTensor`] tags a batch of coordinates with its [`GroupType`] and
//! exposes the group operators as methods. Operators broadcast over leading
//! batch axes and, once an operand is bound to a [`Graph`] with
//! `requires_grad`, record themselves for a reverse pass.
//!
//! # Example
//!
//! ```
//! use lietensor::prelude::*;
//! use std::rc::Rc;
//!
//! let graph = Rc::new(Graph::new());
//! let a = LieTensor::new(GroupType::se3, Batch::from_vec(&[6], vec![1.0, 2.0, 3.0, 0.0, 0.0, 0.0])?)?
//!     .requires_grad(&graph);
//! let t = a.exp()?.translation()?;
//! assert_eq!(t.data().element(0), &[1.0, 2.0, 3.0, 1.0]);
//!
//! let grads = t.backward(None)?;
//! assert_eq!(grads.wrt(&a).map(|g| g.shape()), Some(vec![6]));
//! # Ok::<(), LieError>(())
//! ```

pub mod functional;
pub mod lie_tensor;
pub mod tensor;

pub use lie_tensor::LieTensor;
pub use tensor::{Binding, Gradients, Operand, Tensor};

pub use lietensor_autodiff::Graph;
pub use lietensor_core::{config, init_config, Batch, GroupType, LieConfig, LieError, Result};
pub use lietensor_groups::{gradcheck, lookup, Operator};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::functional::{exp, identity, log, make, randn, random};
    pub use crate::lie_tensor::LieTensor;
    pub use crate::tensor::{Gradients, Operand, Tensor};
    pub use lietensor_autodiff::Graph;
    pub use lietensor_core::{Batch, GroupType, LieError, Result};
}

//! Reverse-mode differentiation through batched Lie group operators.
//!
//! The engine is a small eager tape:
//!
//! 1. **Graph**: records values and the operations that produced them
//! 2. **Operations**: forward and backward rules, backed by registered kernels
//! 3. **Backward**: walks the tape in reverse and accumulates gradients
//!
//! # Example
//!
//! ```
//! use lietensor_autodiff::prelude::*;
//! use lietensor_core::{Batch, GroupType};
//! use lietensor_groups::Operator;
//!
//! let graph = Graph::new();
//! let a = graph.variable(Batch::zeros(&[], &[3]));
//! let op = LieOp::new(Operator::Exp, GroupType::so3).unwrap();
//! let x = graph.apply_op(Box::new(op), &[a.id]).unwrap();
//! let grads = backward(&graph, x, None).unwrap();
//! assert_eq!(grads[&a.id].shape(), vec![3]);
//! ```

pub mod backward;
pub mod graph;
pub mod ops;

// Re-export key types
pub use backward::{backward, grad, GradientMap};
pub use graph::{Graph, Node, NodeId, Variable};
pub use ops::{LieOp, Op};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::backward::{backward, grad, GradientMap};
    pub use crate::graph::{Graph, Node, NodeId, Variable};
    pub use crate::ops::{LieOp, Op};
}

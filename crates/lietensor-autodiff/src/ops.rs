//! Operations for the computation graph.
//!
//! Every differentiable operator in this workspace is a registered
//! [`Kernel`]; [`LieOp`] puts one on the tape.

use lietensor_core::{Batch, GroupType, Result};
use lietensor_groups::{lookup, Kernel, Operator};
use std::fmt::Debug;

/// Trait for operations in the computation graph.
pub trait Op: Debug {
    /// Performs the forward computation.
    fn forward(&self, inputs: &[&Batch]) -> Result<Batch>;

    /// Computes the gradient with respect to each input.
    ///
    /// # Arguments
    /// * `grad_output` - The gradient flowing from the output
    /// * `inputs` - The input values used in the forward pass
    /// * `output` - The output value from the forward pass
    ///
    /// # Returns
    /// One gradient per input, shaped like that input
    fn backward(&self, grad_output: &Batch, inputs: &[&Batch], output: &Batch)
        -> Result<Vec<Batch>>;

    /// Returns the name of this operation.
    fn name(&self) -> &str;
}

/// A group operator recorded on the tape.
#[derive(Debug, Clone, Copy)]
pub struct LieOp {
    kernel: &'static Kernel,
}

impl LieOp {
    /// Looks up the kernel for `operator` on `gtype`.
    pub fn new(operator: Operator, gtype: GroupType) -> Result<Self> {
        Ok(Self::from_kernel(lookup(operator, gtype)?))
    }

    /// Wraps an already resolved kernel.
    pub fn from_kernel(kernel: &'static Kernel) -> Self {
        Self { kernel }
    }
}

impl Op for LieOp {
    fn forward(&self, inputs: &[&Batch]) -> Result<Batch> {
        self.kernel.forward(inputs)
    }

    fn backward(
        &self,
        grad_output: &Batch,
        inputs: &[&Batch],
        output: &Batch,
    ) -> Result<Vec<Batch>> {
        self.kernel.backward(inputs, output, grad_output)
    }

    fn name(&self) -> &str {
        self.kernel.operator().name()
    }
}

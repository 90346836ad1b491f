//! Untyped batches and their binding to a gradient tape.

use lietensor_autodiff::{backward, GradientMap, Graph, LieOp, NodeId};
use lietensor_core::{Batch, LieError, Result};
use lietensor_groups::Kernel;
use std::fmt;
use std::rc::Rc;

/// Where a value lives on a tape.
#[derive(Debug, Clone)]
pub struct Binding {
    graph: Rc<Graph>,
    id: NodeId,
}

impl Binding {
    /// Tape the value was recorded on.
    pub fn graph(&self) -> &Rc<Graph> {
        &self.graph
    }

    /// Node holding the value.
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub(crate) fn leaf(graph: &Rc<Graph>, value: &Batch) -> Self {
        Self {
            graph: Rc::clone(graph),
            id: graph.variable(value.clone()).id,
        }
    }
}

/// Anything that can be passed to a group operator.
pub trait Operand {
    /// The batched values.
    fn value(&self) -> &Batch;

    /// Tape binding, if the value is tracked.
    fn binding(&self) -> Option<&Binding>;
}

impl Operand for Batch {
    fn value(&self) -> &Batch {
        self
    }

    fn binding(&self) -> Option<&Binding> {
        None
    }
}

/// A batch of plain vectors: tangent coordinates, points, matrices.
#[derive(Debug, Clone)]
pub struct Tensor {
    value: Batch,
    binding: Option<Binding>,
}

impl Tensor {
    /// Wraps `value` without a tape binding.
    pub fn new(value: Batch) -> Self {
        Self {
            value,
            binding: None,
        }
    }

    /// Builds a tensor whose last axis is the vector.
    pub fn from_vec(shape: &[usize], values: Vec<f64>) -> Result<Self> {
        Ok(Self::new(Batch::from_vec(shape, values)?))
    }

    pub(crate) fn bound(value: Batch, binding: Option<Binding>) -> Self {
        Self { value, binding }
    }

    /// The underlying values.
    pub fn data(&self) -> &Batch {
        &self.value
    }

    /// Batch shape followed by the vector width.
    pub fn shape(&self) -> Vec<usize> {
        self.value.shape()
    }

    /// Leading batch axes.
    pub fn batch_shape(&self) -> &[usize] {
        self.value.batch_shape()
    }

    /// Records the tensor as a leaf of `graph`.
    pub fn requires_grad(mut self, graph: &Rc<Graph>) -> Self {
        self.binding = Some(Binding::leaf(graph, &self.value));
        self
    }

    /// Whether the tensor is bound to a tape.
    pub fn is_tracked(&self) -> bool {
        self.binding.is_some()
    }

    /// The same values without a tape binding.
    pub fn detach(&self) -> Self {
        Self::new(self.value.clone())
    }

    /// Reverse pass from this tensor; `grad` defaults to ones.
    pub fn backward(&self, grad: Option<Batch>) -> Result<Gradients> {
        run_backward(self.binding.as_ref(), grad)
    }
}

impl From<Batch> for Tensor {
    fn from(value: Batch) -> Self {
        Self::new(value)
    }
}

impl Operand for Tensor {
    fn value(&self) -> &Batch {
        &self.value
    }

    fn binding(&self) -> Option<&Binding> {
        self.binding.as_ref()
    }
}

/// Gradients produced by a reverse pass.
#[derive(Debug)]
pub struct Gradients {
    graph: Rc<Graph>,
    map: GradientMap,
}

impl Gradients {
    /// Gradient with respect to `x`, `None` if `x` is not on this tape or
    /// does not influence the output.
    pub fn wrt<T: Operand + ?Sized>(&self, x: &T) -> Option<&Batch> {
        let binding = x.binding()?;
        if !Rc::ptr_eq(&binding.graph, &self.graph) {
            return None;
        }
        self.map.get(&binding.id)
    }

    /// Number of nodes that received a gradient.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when no node received a gradient.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

pub(crate) fn run_backward(binding: Option<&Binding>, grad: Option<Batch>) -> Result<Gradients> {
    let binding = binding.ok_or_else(|| {
        log::warn!("backward requested from a value that is not on a tape");
        LieError::tape("value is not recorded on a tape")
    })?;
    let map = backward(&binding.graph, binding.id, grad)?;
    Ok(Gradients {
        graph: Rc::clone(&binding.graph),
        map,
    })
}

/// The tape shared by every tracked operand of `operation`, if any.
pub(crate) fn shared_tape<'a>(
    operation: impl fmt::Display,
    operands: &[&'a dyn Operand],
) -> Result<Option<&'a Rc<Graph>>> {
    let mut graph: Option<&Rc<Graph>> = None;
    for binding in operands.iter().filter_map(|o| o.binding()) {
        match graph {
            None => graph = Some(&binding.graph),
            Some(g) if Rc::ptr_eq(g, &binding.graph) => {}
            Some(_) => {
                return Err(LieError::tape(format!(
                    "operands of {operation} are recorded on different tapes"
                )));
            }
        }
    }
    Ok(graph)
}

/// Evaluates `kernel` on `operands`, recording it when any operand is tracked.
///
/// Untracked operands join the tape as constants. All operands must share
/// one tape.
pub(crate) fn apply(
    kernel: &'static Kernel,
    operands: &[&dyn Operand],
) -> Result<(Batch, Option<Binding>)> {
    let graph = shared_tape(kernel.operator(), operands)?;
    let values: Vec<&Batch> = operands.iter().map(|o| o.value()).collect();
    let Some(graph) = graph else {
        return Ok((kernel.forward(&values)?, None));
    };

    // Reject bad operands before anything is added to the tape.
    kernel.plan(&values)?;
    let ids: Vec<NodeId> = operands
        .iter()
        .map(|o| match o.binding() {
            Some(b) => b.id,
            None => graph.constant(o.value().clone()),
        })
        .collect();
    let id = graph.apply_op(Box::new(LieOp::from_kernel(kernel)), &ids)?;
    let binding = Binding {
        graph: Rc::clone(graph),
        id,
    };
    Ok((graph.value(id)?, Some(binding)))
}

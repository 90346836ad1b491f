//! Typed batches of group and algebra elements.

use crate::tensor::{apply, run_backward, shared_tape, Binding, Gradients, Operand, Tensor};
use lietensor_autodiff::Graph;
use lietensor_core::{broadcast_shapes, Batch, GroupType, LieError, Result};
use lietensor_groups::{lookup, random, Operator};
use rand::Rng;
use std::fmt;
use std::rc::Rc;

/// A batch of elements of one [`GroupType`].
///
/// The last axis holds the stored coordinates (`gtype.dim()` of them); every
/// leading axis is a batch axis. Operations broadcast batch axes and return
/// new values.
#[derive(Debug, Clone)]
pub struct LieTensor {
    value: Batch,
    gtype: GroupType,
    binding: Option<Binding>,
}

impl LieTensor {
    /// Wraps `value`, whose event shape must be `[gtype.dim()]`.
    pub fn new(gtype: GroupType, value: Batch) -> Result<Self> {
        if value.event_shape() != [gtype.dim()].as_slice() {
            return Err(LieError::dimension_mismatch(
                format!("trailing dimension {} for {gtype}", gtype.dim()),
                format!("{:?}", value.event_shape()),
            ));
        }
        Ok(Self {
            value,
            gtype,
            binding: None,
        })
    }

    /// Identity elements over `batch_shape`.
    pub fn identity(gtype: GroupType, batch_shape: &[usize]) -> Self {
        Self {
            value: Batch::repeat(batch_shape, gtype.identity()),
            gtype,
            binding: None,
        }
    }

    /// Identity elements of the same kind and batch shape as `self`.
    pub fn identity_like(&self) -> Self {
        Self::identity(self.gtype, self.value.batch_shape())
    }

    /// Random elements drawn with the thread-local generator.
    pub fn random(gtype: GroupType, batch_shape: &[usize], sigma: f64) -> Result<Self> {
        Self::random_with(gtype, batch_shape, sigma, &mut rand::thread_rng())
    }

    /// Random elements: Gaussian tangent vectors with standard deviation
    /// `sigma`, mapped through Exp for group kinds.
    pub fn random_with<R: Rng + ?Sized>(
        gtype: GroupType,
        batch_shape: &[usize],
        sigma: f64,
        rng: &mut R,
    ) -> Result<Self> {
        Self::new(gtype, random::sample(gtype, batch_shape, sigma, rng)?)
    }

    /// Packs raw coordinates into elements, normalising the quaternion part
    /// of group kinds.
    pub fn init_from_vec(gtype: GroupType, values: Batch) -> Result<Self> {
        let mut tensor = Self::new(gtype, values)?;
        if gtype.is_manifold() {
            let offset = gtype.dim() - 4;
            for i in 0..tensor.value.numel() {
                let q = &mut tensor.value.element_mut(i)[offset..];
                let norm = q.iter().map(|v| v * v).sum::<f64>().sqrt();
                if !(norm.is_finite() && norm > 0.0) {
                    return Err(LieError::invalid_point(format!(
                        "quaternion of element {i} has norm {norm}"
                    )));
                }
                q.iter_mut().for_each(|v| *v /= norm);
            }
        }
        Ok(tensor)
    }

    /// Kind of the elements.
    pub fn gtype(&self) -> GroupType {
        self.gtype
    }

    /// Batch shape followed by the coordinate width.
    pub fn shape(&self) -> Vec<usize> {
        self.value.shape()
    }

    /// Leading batch axes.
    pub fn batch_shape(&self) -> &[usize] {
        self.value.batch_shape()
    }

    /// The stored coordinates.
    pub fn data(&self) -> &Batch {
        &self.value
    }

    /// The coordinates as an untyped tensor, keeping the tape binding.
    pub fn as_tensor(&self) -> Tensor {
        Tensor::bound(self.value.clone(), self.binding.clone())
    }

    /// The same elements without a tape binding.
    pub fn detach(&self) -> Self {
        Self {
            value: self.value.clone(),
            gtype: self.gtype,
            binding: None,
        }
    }

    /// Records the elements as a leaf of `graph`.
    pub fn requires_grad(mut self, graph: &Rc<Graph>) -> Self {
        self.binding = Some(Binding::leaf(graph, &self.value));
        self
    }

    /// Whether the elements are bound to a tape.
    pub fn is_tracked(&self) -> bool {
        self.binding.is_some()
    }

    fn call(
        &self,
        operator: Operator,
        other: Option<&dyn Operand>,
    ) -> Result<(Batch, Option<Binding>)> {
        let kernel = lookup(operator, self.gtype)?;
        match other {
            Some(other) => apply(kernel, &[self, other]),
            None => apply(kernel, &[self]),
        }
    }

    fn typed(&self, operator: Operator, other: Option<&dyn Operand>) -> Result<Self> {
        let (value, binding) = self.call(operator, other)?;
        let gtype = operator
            .output_kind(self.gtype)
            .ok_or_else(|| LieError::invalid_domain(operator, self.gtype))?;
        Ok(Self {
            value,
            gtype,
            binding,
        })
    }

    fn untyped(&self, operator: Operator, other: Option<&dyn Operand>) -> Result<Tensor> {
        let (value, binding) = self.call(operator, other)?;
        Ok(Tensor::bound(value, binding))
    }

    /// Exponential map of algebra elements.
    pub fn exp(&self) -> Result<Self> {
        self.typed(Operator::Exp, None)
    }

    /// Logarithm map of group elements.
    pub fn log(&self) -> Result<Self> {
        self.typed(Operator::Log, None)
    }

    /// Group inverse.
    pub fn inv(&self) -> Result<Self> {
        self.typed(Operator::Inv, None)
    }

    /// Group product `self · other`.
    pub fn mul(&self, other: &LieTensor) -> Result<Self> {
        if other.gtype != self.gtype {
            return Err(LieError::invalid_domain(
                Operator::Mul,
                format!("{} and {}", self.gtype, other.gtype),
            ));
        }
        self.typed(Operator::Mul, Some(other))
    }

    /// Adjoint action on tangent vectors.
    pub fn adj(&self, a: &dyn Operand) -> Result<Self> {
        self.typed(Operator::Adj, Some(a))
    }

    /// Transposed adjoint action on tangent vectors.
    pub fn adj_t(&self, a: &dyn Operand) -> Result<Self> {
        self.typed(Operator::AdjT, Some(a))
    }

    /// Inverse left Jacobian at `Log(self)` applied to `a`.
    pub fn jinv(&self, a: &dyn Operand) -> Result<Self> {
        self.typed(Operator::Jinv, Some(a))
    }

    /// Transforms 3-D points or homogeneous 4-D points.
    pub fn act(&self, p: &dyn Operand) -> Result<Tensor> {
        let operator = match p.value().event_shape() {
            [3] => Operator::Act3,
            [4] => Operator::Act4,
            other => {
                return Err(LieError::dimension_mismatch(
                    "points with trailing dimension 3 or 4",
                    format!("{other:?}"),
                ))
            }
        };
        self.untyped(operator, Some(p))
    }

    /// Retraction `Exp(a) · self`.
    ///
    /// Both steps are validated before either is recorded.
    pub fn retr(&self, a: &dyn Operand) -> Result<Self> {
        if !self.gtype.is_manifold() {
            return Err(LieError::invalid_domain("Retr", self.gtype));
        }
        let dof = self.gtype.manifold_dim();
        if a.value().event_shape() != [dof].as_slice() {
            return Err(LieError::dimension_mismatch(
                format!("trailing dimension {dof} for Retr on {}", self.gtype),
                format!("{:?}", a.value().event_shape()),
            ));
        }
        broadcast_shapes(self.batch_shape(), a.value().batch_shape())?;
        shared_tape("Retr", &[self as &dyn Operand, a])?;
        let (value, binding) = apply(lookup(Operator::Exp, self.gtype.mapping())?, &[a])?;
        let step = Self {
            value,
            gtype: self.gtype,
            binding,
        };
        step.mul(self)
    }

    /// Homogeneous 4x4 matrices, row major.
    pub fn matrix(&self) -> Result<Tensor> {
        self.untyped(Operator::Matrix, None)
    }

    /// Translation as a homogeneous point `(t, 1)`.
    pub fn translation(&self) -> Result<Tensor> {
        let origin = Batch::repeat(&[], &[0.0, 0.0, 0.0, 1.0]);
        self.untyped(Operator::Act4, Some(&origin))
    }

    /// Rotation quaternion `[qx, qy, qz, qw]`.
    pub fn quaternion(&self) -> Result<Tensor> {
        self.untyped(Operator::Quaternion, None)
    }

    /// Reverse pass from these elements; `grad` defaults to ones.
    pub fn backward(&self, grad: Option<Batch>) -> Result<Gradients> {
        run_backward(self.binding.as_ref(), grad)
    }
}

impl Operand for LieTensor {
    fn value(&self) -> &Batch {
        &self.value
    }

    fn binding(&self) -> Option<&Binding> {
        self.binding.as_ref()
    }
}

impl fmt::Display for LieTensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} Group:", self.gtype)?;
        for element in self.value.elements() {
            writeln!(f, "{element:?}")?;
        }
        Ok(())
    }
}

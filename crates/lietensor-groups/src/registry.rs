//! `(operator, kind)` kernel lookup table.
//!
//! Each [`Kernel`] pairs a per-element forward closed form with its backward
//! rule and lifts both to batches: operands are validated, batch shapes are
//! broadcast through a [`BroadcastPlan`], and gradients are summed back into
//! the elements they were broadcast from.

use crate::lie_group::LieGroup;
use crate::operator::Operator;
use crate::se3::SE3;
use crate::so3::SO3;
use lietensor_core::{Batch, BroadcastPlan, GroupType, LieError, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

/// Per-element forward: `(primary, secondary, out)`. Unary operators receive
/// an empty secondary slice.
pub type ForwardFn = fn(&[f64], &[f64], &mut [f64]);

/// Per-element backward: `(primary, secondary, output, grad, d_primary, d_secondary)`.
/// Gradient buffers arrive zeroed.
pub type BackwardFn = fn(&[f64], &[f64], &[f64], &[f64], &mut [f64], &mut [f64]);

/// A registered operator implementation for one group kind.
#[derive(Clone, Copy)]
pub struct Kernel {
    operator: Operator,
    gtype: GroupType,
    forward: ForwardFn,
    backward: BackwardFn,
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("operator", &self.operator)
            .field("gtype", &self.gtype)
            .finish_non_exhaustive()
    }
}

impl Kernel {
    const fn new(
        operator: Operator,
        gtype: GroupType,
        forward: ForwardFn,
        backward: BackwardFn,
    ) -> Self {
        Self {
            operator,
            gtype,
            forward,
            backward,
        }
    }

    /// Operator implemented by this kernel.
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Kind of the primary operand.
    pub fn gtype(&self) -> GroupType {
        self.gtype
    }

    /// Number of operands.
    pub fn arity(&self) -> usize {
        self.operator.arity()
    }

    /// Kind of the output, `None` for plain tensors.
    pub fn output_kind(&self) -> Option<GroupType> {
        self.operator.output_kind(self.gtype)
    }

    /// Event shape of the output.
    pub fn output_event(&self) -> Vec<usize> {
        self.operator.output_event(self.gtype)
    }

    /// Group kind of operand `index` when it is a group element.
    pub fn input_manifold(&self, index: usize) -> Option<GroupType> {
        self.operator
            .input_is_manifold(self.gtype, index)
            .then_some(self.gtype)
    }

    /// Check operand count and trailing widths, then broadcast batch shapes.
    pub fn plan(&self, inputs: &[&Batch]) -> Result<BroadcastPlan> {
        let arity = self.arity();
        if inputs.len() != arity {
            return Err(LieError::dimension_mismatch(
                format!("{arity} operands for {}", self.operator),
                inputs.len(),
            ));
        }
        for (index, input) in inputs.iter().enumerate() {
            let width = self.operator.input_width(self.gtype, index);
            if input.event_shape() != [width].as_slice() {
                return Err(LieError::dimension_mismatch(
                    format!("trailing dimension {width} for {} operand {index}", self.operator),
                    format!("{:?}", input.event_shape()),
                ));
            }
        }
        let shapes: Vec<&[usize]> = inputs.iter().map(|b| b.batch_shape()).collect();
        BroadcastPlan::resolve(&shapes)
    }

    /// Evaluate the operator over broadcast batches.
    pub fn forward(&self, inputs: &[&Batch]) -> Result<Batch> {
        let plan = self.plan(inputs)?;
        log::trace!(
            "{} on {} over batch shape {:?}",
            self.operator,
            self.gtype,
            plan.out_shape()
        );

        let forward = self.forward;
        let x = inputs[0];
        let y = inputs.get(1).copied();
        Ok(Batch::from_fn(
            plan.out_shape(),
            &self.output_event(),
            |i, out| {
                let ye = y.map_or(&[][..], |y| y.element(plan.source(1, i)));
                forward(x.element(plan.source(0, i)), ye, out);
            },
        ))
    }

    /// Gradients with respect to every operand, shaped like the operands.
    ///
    /// `output` must be the value [`Kernel::forward`] produced for `inputs`
    /// and `grad` must share its shape.
    pub fn backward(&self, inputs: &[&Batch], output: &Batch, grad: &Batch) -> Result<Vec<Batch>> {
        let plan = self.plan(inputs)?;
        let mut expected = plan.out_shape().to_vec();
        expected.extend(self.output_event());
        if output.shape() != expected || grad.shape() != expected {
            return Err(LieError::dimension_mismatch(
                format!("output and gradient of shape {expected:?}"),
                format!("{:?} and {:?}", output.shape(), grad.shape()),
            ));
        }
        log::trace!(
            "{} backward on {} over batch shape {:?}",
            self.operator,
            self.gtype,
            plan.out_shape()
        );

        let backward = self.backward;
        let x = inputs[0];
        let y = inputs.get(1).copied();
        let wx = x.width();
        let wy = y.map_or(0, Batch::width);
        let joint = Batch::from_fn(plan.out_shape(), &[wx + wy], |i, buf| {
            let (dx, dy) = buf.split_at_mut(wx);
            let ye = y.map_or(&[][..], |y| y.element(plan.source(1, i)));
            backward(
                x.element(plan.source(0, i)),
                ye,
                output.element(i),
                grad.element(i),
                dx,
                dy,
            );
        });

        let mut grads: Vec<Batch> = inputs
            .iter()
            .map(|b| Batch::zeros(b.batch_shape(), b.event_shape()))
            .collect();
        for i in 0..plan.numel() {
            let g = joint.element(i);
            grads[0].accumulate(plan.source(0, i), &g[..wx]);
            if let Some(gy) = grads.get_mut(1) {
                gy.accumulate(plan.source(1, i), &g[wx..]);
            }
        }
        Ok(grads)
    }
}

fn group_kernels<G: LieGroup>() -> [Kernel; 11] {
    [
        Kernel::new(
            Operator::Exp,
            G::ALGEBRA,
            |a, _, out| G::exp(a, out),
            |a, _, _, g, da, _| G::exp_backward(a, g, da),
        ),
        Kernel::new(
            Operator::Log,
            G::GROUP,
            |x, _, out| G::log(x, out),
            |_, _, out, g, dx, _| G::log_backward(out, g, dx),
        ),
        Kernel::new(
            Operator::Inv,
            G::GROUP,
            |x, _, out| G::inv(x, out),
            |_, _, out, g, dx, _| G::inv_backward(out, g, dx),
        ),
        Kernel::new(
            Operator::Mul,
            G::GROUP,
            G::mul,
            |x, _, _, g, dx, dy| G::mul_backward(x, g, dx, dy),
        ),
        Kernel::new(
            Operator::Adj,
            G::GROUP,
            G::adj,
            |x, _, out, g, dx, da| G::adj_backward(x, out, g, dx, da),
        ),
        Kernel::new(
            Operator::AdjT,
            G::GROUP,
            G::adj_t,
            |x, a, _, g, dx, da| G::adj_t_backward(x, a, g, dx, da),
        ),
        Kernel::new(
            Operator::Jinv,
            G::GROUP,
            G::jinv,
            |x, a, _, g, dx, da| G::jinv_backward(x, a, g, dx, da),
        ),
        Kernel::new(Operator::Act3, G::GROUP, G::act3, G::act3_backward),
        Kernel::new(Operator::Act4, G::GROUP, G::act4, G::act4_backward),
        Kernel::new(
            Operator::Matrix,
            G::GROUP,
            |x, _, out| G::matrix(x, out),
            |x, _, out, g, dx, _| G::matrix_backward(x, out, g, dx),
        ),
        Kernel::new(
            Operator::Quaternion,
            G::GROUP,
            |x, _, out| G::quaternion(x, out),
            |x, _, _, g, dx, _| G::quaternion_backward(x, g, dx),
        ),
    ]
}

static KERNELS: Lazy<HashMap<(Operator, GroupType), Kernel>> = Lazy::new(|| {
    group_kernels::<SO3>()
        .into_iter()
        .chain(group_kernels::<SE3>())
        .map(|k| ((k.operator, k.gtype), k))
        .collect()
});

/// Find the kernel for `operator` on elements of `gtype`.
///
/// Fails with [`LieError::InvalidDomain`] when the operator is not defined
/// on that kind, for instance `Exp` on a group element.
pub fn lookup(operator: Operator, gtype: GroupType) -> Result<&'static Kernel> {
    KERNELS
        .get(&(operator, gtype))
        .ok_or_else(|| LieError::invalid_domain(operator, gtype))
}

/// Every registered kernel, ordered by operator then kind.
pub fn kernels() -> Vec<&'static Kernel> {
    let mut all: Vec<_> = KERNELS.values().collect();
    all.sort_by_key(|k| (k.operator, k.gtype));
    all
}

//! Finite-difference verification of the analytic backward rules.
//!
//! For a kernel, a set of inputs and an upstream gradient `g`, the checker
//! forms the scalar `L = ⟨g, f(inputs)⟩` and compares each analytic gradient
//! entry with a central difference of `L`. Group-valued inputs are perturbed
//! on the left, `Exp(±h eⱼ) · X`, and group-valued outputs are measured
//! through `Log(Y · Y₀⁻¹)`, matching the left-tangent gradient convention.

use crate::operator::Operator;
use crate::registry::{lookup, Kernel};
use lietensor_core::{config, Batch, GroupType, Result};

/// Largest discrepancies found by [`check`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GradcheckReport {
    /// Largest `|analytic − numeric|`.
    pub max_abs_error: f64,
    /// Largest `|analytic − numeric| / max(1, |numeric|)`.
    pub max_rel_error: f64,
    /// Number of gradient entries compared.
    pub entries: usize,
}

impl GradcheckReport {
    /// Whether every entry is within `tolerance` (relative above unit scale).
    pub fn is_within(&self, tolerance: f64) -> bool {
        self.max_rel_error <= tolerance
    }

    /// Whether every entry is within the configured tolerance.
    pub fn passed(&self) -> bool {
        self.is_within(config().gradcheck_tolerance)
    }

    fn record(&mut self, analytic: f64, numeric: f64) {
        let err = (analytic - numeric).abs();
        self.max_abs_error = self.max_abs_error.max(err);
        self.max_rel_error = self.max_rel_error.max(err / numeric.abs().max(1.0));
        self.entries += 1;
    }
}

/// Check `kernel` at `inputs` with the configured finite-difference step.
pub fn check(kernel: &Kernel, inputs: &[&Batch], grad_output: &Batch) -> Result<GradcheckReport> {
    check_with_step(kernel, inputs, grad_output, config().gradcheck_step)
}

/// Check `kernel` at `inputs` with an explicit finite-difference step.
pub fn check_with_step(
    kernel: &Kernel,
    inputs: &[&Batch],
    grad_output: &Batch,
    step: f64,
) -> Result<GradcheckReport> {
    let output = kernel.forward(inputs)?;
    let analytic = kernel.backward(inputs, &output, grad_output)?;
    let objective = Objective::new(kernel, &output, grad_output)?;

    let mut report = GradcheckReport::default();
    for (k, input) in inputs.iter().enumerate() {
        let manifold = kernel.input_manifold(k);
        let directions = manifold.map_or(input.width(), GroupType::manifold_dim);
        for e in 0..input.numel() {
            for j in 0..input.width() {
                let numeric = if j < directions {
                    let plus = perturb(input, e, j, step, manifold)?;
                    let minus = perturb(input, e, j, -step, manifold)?;
                    let lp = objective.eval(&with_replaced(inputs, k, &plus))?;
                    let lm = objective.eval(&with_replaced(inputs, k, &minus))?;
                    (lp - lm) / (2.0 * step)
                } else {
                    0.0
                };
                report.record(analytic[k].element(e)[j], numeric);
            }
        }
    }

    log::debug!(
        "gradcheck {} on {}: {} entries, max abs {:.3e}, max rel {:.3e}",
        kernel.operator(),
        kernel.gtype(),
        report.entries,
        report.max_abs_error,
        report.max_rel_error
    );
    Ok(report)
}

fn with_replaced<'a>(inputs: &[&'a Batch], k: usize, replacement: &'a Batch) -> Vec<&'a Batch> {
    let mut out = inputs.to_vec();
    out[k] = replacement;
    out
}

/// Copy of `input` with element `e` moved along direction `j`.
fn perturb(
    input: &Batch,
    e: usize,
    j: usize,
    step: f64,
    manifold: Option<GroupType>,
) -> Result<Batch> {
    let mut out = input.clone();
    match manifold {
        Some(gtype) => {
            let mut eps = vec![0.0; gtype.manifold_dim()];
            eps[j] = step;
            let delta = lookup(Operator::Exp, gtype.mapping())?
                .forward(&[&Batch::from_vec(&[eps.len()], eps)?])?;
            let x = Batch::from_vec(&[gtype.dim()], input.element(e).to_vec())?;
            let moved = lookup(Operator::Mul, gtype)?.forward(&[&delta, &x])?;
            out.element_mut(e).copy_from_slice(moved.element(0));
        }
        None => out.element_mut(e)[j] += step,
    }
    Ok(out)
}

/// The scalar `⟨g, f(inputs)⟩`, in tangent coordinates for group outputs.
struct Objective<'a> {
    kernel: &'a Kernel,
    grad: &'a Batch,
    reference: Option<(GroupType, Batch)>,
}

impl<'a> Objective<'a> {
    fn new(kernel: &'a Kernel, output: &Batch, grad: &'a Batch) -> Result<Self> {
        let reference = match kernel.output_kind() {
            Some(kind) if kind.is_manifold() => {
                Some((kind, lookup(Operator::Inv, kind)?.forward(&[output])?))
            }
            _ => None,
        };
        Ok(Self {
            kernel,
            grad,
            reference,
        })
    }

    fn eval(&self, inputs: &[&Batch]) -> Result<f64> {
        let y = self.kernel.forward(inputs)?;
        match &self.reference {
            Some((kind, y0_inv)) => {
                let delta = lookup(Operator::Mul, *kind)?.forward(&[&y, y0_inv])?;
                let tangent = lookup(Operator::Log, *kind)?.forward(&[&delta])?;
                let dof = kind.manifold_dim();
                Ok(tangent
                    .elements()
                    .zip(self.grad.elements())
                    .map(|(t, g)| t.iter().zip(&g[..dof]).map(|(a, b)| a * b).sum::<f64>())
                    .sum())
            }
            None => y.dot(self.grad),
        }
    }
}

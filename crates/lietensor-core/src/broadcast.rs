//! Broadcasting of batch shapes.
//!
//! Shapes are aligned from the trailing axis. Each aligned pair must be equal,
//! or one side must be 1 or absent. Instead of materialising broadcast
//! operands, a [`BroadcastPlan`] records for every flattened output element the
//! source element of each operand. The same indices unbroadcast gradients by
//! summing into the source elements.

use crate::batch::Batch;
use crate::error::{LieError, Result};

/// Resolve the broadcast shape of two batch shapes.
pub fn broadcast_shapes(lhs: &[usize], rhs: &[usize]) -> Result<Vec<usize>> {
    let rank = lhs.len().max(rhs.len());
    let mut out = vec![0; rank];
    for axis in 0..rank {
        let a = axis_from_end(lhs, rank - 1 - axis);
        let b = axis_from_end(rhs, rank - 1 - axis);
        out[axis] = match (a, b) {
            (a, b) if a == b => a,
            (1, b) => b,
            (a, 1) => a,
            _ => return Err(LieError::broadcast_incompatible(lhs, rhs)),
        };
    }
    Ok(out)
}

/// Size of the axis `back` positions from the end, 1 if absent.
fn axis_from_end(shape: &[usize], back: usize) -> usize {
    if back < shape.len() {
        shape[shape.len() - 1 - back]
    } else {
        1
    }
}

/// Row-major strides of `shape` right-aligned to `out`, zero on broadcast axes.
fn broadcast_strides(shape: &[usize], out: &[usize]) -> Vec<usize> {
    let rank = out.len();
    let mut strides = vec![0; rank];
    let mut stride = 1;
    for axis in (0..rank).rev() {
        let back = rank - 1 - axis;
        let dim = axis_from_end(shape, back);
        if back < shape.len() && dim == out[axis] && dim != 1 {
            strides[axis] = stride;
        }
        stride *= dim;
    }
    strides
}

/// Source indices of every operand for each flattened output element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastPlan {
    out_shape: Vec<usize>,
    operand_shapes: Vec<Vec<usize>>,
    sources: Vec<Vec<usize>>,
}

impl BroadcastPlan {
    /// Resolve a plan for any number of operand batch shapes.
    pub fn resolve(shapes: &[&[usize]]) -> Result<Self> {
        let mut out_shape: Vec<usize> = Vec::new();
        for shape in shapes {
            out_shape = broadcast_shapes(&out_shape, shape)?;
        }

        let numel: usize = out_shape.iter().product();
        let sources = shapes
            .iter()
            .map(|shape| {
                let strides = broadcast_strides(shape, &out_shape);
                (0..numel)
                    .map(|flat| {
                        let mut rem = flat;
                        let mut src = 0;
                        for axis in (0..out_shape.len()).rev() {
                            let dim = out_shape[axis];
                            src += (rem % dim) * strides[axis];
                            rem /= dim;
                        }
                        src
                    })
                    .collect()
            })
            .collect();

        Ok(Self {
            out_shape,
            operand_shapes: shapes.iter().map(|s| s.to_vec()).collect(),
            sources,
        })
    }

    /// Plan for a single operand; every index maps to itself.
    pub fn unary(shape: &[usize]) -> Self {
        let numel = shape.iter().product();
        Self {
            out_shape: shape.to_vec(),
            operand_shapes: vec![shape.to_vec()],
            sources: vec![(0..numel).collect()],
        }
    }

    /// Broadcast batch shape.
    pub fn out_shape(&self) -> &[usize] {
        &self.out_shape
    }

    /// Number of output elements.
    pub fn numel(&self) -> usize {
        self.out_shape.iter().product()
    }

    /// Number of operands the plan was resolved for.
    pub fn arity(&self) -> usize {
        self.sources.len()
    }

    /// Source element of `operand` for output element `i`.
    #[inline]
    pub fn source(&self, operand: usize, i: usize) -> usize {
        self.sources[operand][i]
    }

    /// All source indices of `operand`.
    pub fn sources(&self, operand: usize) -> &[usize] {
        &self.sources[operand]
    }

    /// Materialise `operand` at the broadcast shape.
    pub fn flatten(&self, operand: usize, batch: &Batch) -> Batch {
        let sources = &self.sources[operand];
        Batch::from_fn(&self.out_shape, batch.event_shape(), |i, out| {
            out.copy_from_slice(batch.element(sources[i]));
        })
    }

    /// Sum a gradient at the broadcast shape back into the shape of `operand`.
    pub fn unbroadcast(&self, operand: usize, grad: &Batch) -> Result<Batch> {
        if grad.batch_shape() != self.out_shape.as_slice() {
            return Err(LieError::dimension_mismatch(
                format!("gradient batch shape {:?}", self.out_shape),
                format!("{:?}", grad.batch_shape()),
            ));
        }
        let mut out = Batch::zeros(&self.operand_shapes[operand], grad.event_shape());
        for (i, &src) in self.sources[operand].iter().enumerate() {
            out.accumulate(src, grad.element(i));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    /// A full shape plus two operand shapes that broadcast to it.
    fn compatible_shapes() -> impl Strategy<Value = (Vec<usize>, Vec<usize>, Vec<usize>)> {
        prop::collection::vec(1usize..4, 0..4).prop_flat_map(|out| {
            let rank = out.len();
            (
                Just(out),
                prop::collection::vec(any::<bool>(), rank),
                prop::collection::vec(any::<bool>(), rank),
                0..=rank,
                0..=rank,
            )
                .prop_map(|(out, ones_a, ones_b, drop_a, drop_b)| {
                    let shrink = |ones: &[bool], drop: usize| -> Vec<usize> {
                        out.iter()
                            .zip(ones)
                            .skip(drop)
                            .map(|(&d, &one)| if one { 1 } else { d })
                            .collect()
                    };
                    let a = shrink(&ones_a, drop_a);
                    let b = shrink(&ones_b, drop_b);
                    (out, a, b)
                })
        })
    }

    #[test]
    fn test_broadcast_shapes() {
        assert_eq!(broadcast_shapes(&[], &[]).unwrap(), Vec::<usize>::new());
        assert_eq!(broadcast_shapes(&[5, 3], &[]).unwrap(), vec![5, 3]);
        assert_eq!(broadcast_shapes(&[5, 1], &[3]).unwrap(), vec![5, 3]);
        assert_eq!(broadcast_shapes(&[1], &[0]).unwrap(), vec![0]);
        assert_eq!(broadcast_shapes(&[2, 1, 4], &[3, 1]).unwrap(), vec![2, 3, 4]);
    }

    #[test]
    fn test_incompatible_shapes() {
        let err = broadcast_shapes(&[2, 3], &[4]).unwrap_err();
        assert_eq!(err, LieError::broadcast_incompatible(&[2, 3], &[4]));
        assert!(broadcast_shapes(&[0], &[3]).is_err());
    }

    #[test]
    fn test_plan_sources() {
        let plan = BroadcastPlan::resolve(&[&[2, 1], &[3]]).unwrap();
        assert_eq!(plan.out_shape(), &[2, 3]);
        assert_eq!(plan.sources(0), &[0, 0, 0, 1, 1, 1]);
        assert_eq!(plan.sources(1), &[0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_plan_with_scalar_operand() {
        let plan = BroadcastPlan::resolve(&[&[], &[4]]).unwrap();
        assert_eq!(plan.sources(0), &[0, 0, 0, 0]);
        assert_eq!(plan.sources(1), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_flatten_and_unbroadcast() {
        let a = Batch::from_vec(&[2, 1, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let plan = BroadcastPlan::resolve(&[a.batch_shape(), &[3]]).unwrap();
        let flat = plan.flatten(0, &a);
        assert_eq!(flat.shape(), vec![2, 3, 2]);
        assert_eq!(flat.element(2), &[1.0, 2.0]);
        assert_eq!(flat.element(3), &[3.0, 4.0]);

        let grad = Batch::full(&[2, 3], &[2], 1.0);
        let back = plan.unbroadcast(0, &grad).unwrap();
        assert_eq!(back.shape(), vec![2, 1, 2]);
        assert_eq!(back.as_slice(), &[3.0, 3.0, 3.0, 3.0]);
        let back_rhs = plan.unbroadcast(1, &grad).unwrap();
        assert_eq!(back_rhs.shape(), vec![3, 2]);
        assert_eq!(back_rhs.element(0), &[2.0, 2.0]);
    }

    #[test]
    fn test_empty_plan() {
        let plan = BroadcastPlan::resolve(&[&[0], &[]]).unwrap();
        assert_eq!(plan.numel(), 0);
        assert!(plan.sources(1).is_empty());
    }

    proptest! {
        #[test]
        fn prop_broadcast_is_symmetric((_out, a, b) in compatible_shapes()) {
            prop_assert_eq!(broadcast_shapes(&a, &b).unwrap(), broadcast_shapes(&b, &a).unwrap());
        }

        #[test]
        fn prop_plan_indexes_stay_in_range((_out, a, b) in compatible_shapes()) {
            let plan = BroadcastPlan::resolve(&[&a, &b]).unwrap();
            let expected = broadcast_shapes(&a, &b).unwrap();
            prop_assert_eq!(plan.out_shape(), expected.as_slice());
            for (operand, shape) in [&a, &b].into_iter().enumerate() {
                let len: usize = shape.iter().product();
                prop_assert_eq!(plan.sources(operand).len(), plan.numel());
                prop_assert!(plan.sources(operand).iter().all(|&src| src < len));
            }
        }

        #[test]
        fn prop_unbroadcast_preserves_total((_out, a, b) in compatible_shapes()) {
            let plan = BroadcastPlan::resolve(&[&a, &b]).unwrap();
            let values = (0..plan.numel()).map(|i| i as f64).collect();
            let grad = Batch::from_elements(plan.out_shape(), &[1], values).unwrap();
            let total: f64 = grad.as_slice().iter().sum();
            for operand in 0..2 {
                let back = plan.unbroadcast(operand, &grad).unwrap();
                prop_assert_eq!(back.as_slice().iter().sum::<f64>(), total);
            }
        }

        #[test]
        fn prop_flatten_copies_sources((_out, a, b) in compatible_shapes()) {
            let len: usize = a.iter().product();
            let values = (0..2 * len).map(|i| i as f64).collect();
            let batch = Batch::from_elements(&a, &[2], values).unwrap();
            let plan = BroadcastPlan::resolve(&[&a, &b]).unwrap();
            let flat = plan.flatten(0, &batch);
            for i in 0..plan.numel() {
                prop_assert_eq!(flat.element(i), batch.element(plan.source(0, i)));
            }
        }
    }
}

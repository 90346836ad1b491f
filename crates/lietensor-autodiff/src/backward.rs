//! Backward pass implementation for automatic differentiation.
//!
//! Gradients are left-tangent cotangents: for a group-valued node the
//! gradient has the coordinate width of the group, with the tangent
//! components first and the remaining slots zero.

use crate::graph::{Graph, NodeId};
use lietensor_core::{Batch, LieError, Result};
use std::collections::HashMap;

/// Type alias for gradient storage.
pub type GradientMap = HashMap<NodeId, Batch>;

/// Performs backward pass (backpropagation) through the graph.
///
/// # Arguments
/// * `graph` - The computation graph
/// * `output_node` - The node to compute gradients from
/// * `grad_output` - The initial gradient, ones shaped like the output if `None`
///
/// # Returns
/// A map from node IDs to their gradients. Nodes that do not require
/// gradients get no entry.
pub fn backward(
    graph: &Graph,
    output_node: NodeId,
    grad_output: Option<Batch>,
) -> Result<GradientMap> {
    let output = graph.node(output_node)?;
    let initial_grad = match grad_output {
        Some(grad) if grad.shape() != output.value.shape() => {
            return Err(LieError::tape(format!(
                "seed gradient of shape {:?} for {output_node} of shape {:?}",
                grad.shape(),
                output.value.shape()
            )));
        }
        Some(grad) => grad,
        None => Batch::full(output.value.batch_shape(), output.value.event_shape(), 1.0),
    };

    let mut gradients = GradientMap::new();
    if !output.requires_grad {
        log::warn!("backward from {output_node}, which does not require gradients");
        return Ok(gradients);
    }
    gradients.insert(output_node, initial_grad);

    for node_id in graph.topological_order(output_node).into_iter().rev() {
        let node = graph.node(node_id)?;
        let op = match &node.op {
            Some(op) if node.requires_grad => op,
            _ => continue,
        };
        let node_grad = match gradients.get(&node_id) {
            Some(grad) => grad.clone(),
            None => continue,
        };

        let input_nodes = node
            .inputs
            .iter()
            .map(|&id| graph.node(id))
            .collect::<Result<Vec<_>>>()?;
        let values: Vec<&Batch> = input_nodes.iter().map(|n| &n.value).collect();
        let input_grads = op.backward(&node_grad, &values, &node.value)?;
        log::debug!("backward through {} at {node_id}", op.name());

        for (input, grad) in input_nodes.iter().zip(input_grads) {
            if !input.requires_grad {
                continue;
            }
            match gradients.get_mut(&input.id) {
                Some(existing) => existing.add_assign(&grad)?,
                None => {
                    gradients.insert(input.id, grad);
                }
            }
        }
    }

    Ok(gradients)
}

/// Computes gradients of `output_node` with respect to the given inputs.
///
/// Inputs the output does not depend on get a zero gradient.
pub fn grad(graph: &Graph, output_node: NodeId, input_nodes: &[NodeId]) -> Result<Vec<Batch>> {
    let mut gradients = backward(graph, output_node, None)?;
    input_nodes
        .iter()
        .map(|&id| match gradients.remove(&id) {
            Some(g) => Ok(g),
            None => {
                let value = graph.value(id)?;
                Ok(Batch::zeros(value.batch_shape(), value.event_shape()))
            }
        })
        .collect()
}

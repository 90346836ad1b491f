//! Recording tape for reverse-mode differentiation.
//!
//! The graph is eager: [`Graph::apply_op`] evaluates the operation as soon
//! as it is recorded and stores the result on the new node. Node ids are
//! handed out in recording order, so every node's inputs have smaller ids and
//! the id order is already a topological order.

use crate::ops::Op;
use lietensor_core::{Batch, LieError, Result};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Unique identifier for nodes in the computation graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in recording order.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node{}", self.0)
    }
}

/// A leaf of the computation graph.
#[derive(Debug, Clone)]
pub struct Variable {
    /// Unique identifier for this variable
    pub id: NodeId,
    /// Name of the variable (optional)
    pub name: Option<String>,
    /// Whether this variable requires gradient computation
    pub requires_grad: bool,
}

impl Variable {
    /// Creates a new variable with the given ID.
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            name: None,
            requires_grad: true,
        }
    }

    /// Sets the name of the variable.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn with_requires_grad(mut self, requires_grad: bool) -> Self {
        self.requires_grad = requires_grad;
        self
    }
}

/// A recorded value together with the operation that produced it.
#[derive(Debug)]
pub struct Node {
    /// Unique identifier
    pub id: NodeId,
    /// The value computed at this node
    pub value: Batch,
    /// The operation that produced this node, `None` for leaves
    pub op: Option<Box<dyn Op>>,
    /// Input nodes to this operation
    pub inputs: Vec<NodeId>,
    /// Whether gradients flow through this node
    pub requires_grad: bool,
    /// Optional name for debugging
    pub name: Option<String>,
}

impl Node {
    fn leaf(id: NodeId, value: Batch, requires_grad: bool) -> Self {
        Self {
            id,
            value,
            op: None,
            inputs: Vec::new(),
            requires_grad,
            name: None,
        }
    }
}

/// The computation graph structure.
#[derive(Debug)]
pub struct Graph {
    /// All nodes in recording order
    nodes: RefCell<Vec<Rc<Node>>>,
    /// Whether to track gradients
    track_gradients: bool,
}

impl Graph {
    /// Creates a new empty computation graph.
    pub fn new() -> Self {
        Self {
            nodes: RefCell::new(Vec::new()),
            track_gradients: true,
        }
    }

    /// Creates a new graph with gradient tracking disabled.
    pub fn no_grad() -> Self {
        Self {
            nodes: RefCell::new(Vec::new()),
            track_gradients: false,
        }
    }

    /// Whether new variables require gradients.
    pub fn is_tracking(&self) -> bool {
        self.track_gradients
    }

    fn push(&self, build: impl FnOnce(NodeId) -> Node) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId(nodes.len());
        nodes.push(Rc::new(build(id)));
        id
    }

    /// Creates a new variable (input node) in the graph.
    pub fn variable(&self, value: Batch) -> Variable {
        let requires_grad = self.track_gradients;
        let id = self.push(|id| Node::leaf(id, value, requires_grad));
        log::debug!("recorded variable {id}");
        Variable::new(id).with_requires_grad(requires_grad)
    }

    /// Creates a new variable with a name.
    pub fn named_variable(&self, value: Batch, name: impl Into<String>) -> Variable {
        let name = name.into();
        let requires_grad = self.track_gradients;
        let node_name = name.clone();
        let id = self.push(|id| Node {
            name: Some(node_name),
            ..Node::leaf(id, value, requires_grad)
        });
        log::debug!("recorded variable {id} ({name})");
        Variable::new(id)
            .with_name(name)
            .with_requires_grad(requires_grad)
    }

    /// Creates a constant (non-differentiable) node in the graph.
    pub fn constant(&self, value: Batch) -> NodeId {
        self.push(|id| Node::leaf(id, value, false))
    }

    /// Records `op` applied to `inputs` and evaluates it immediately.
    pub fn apply_op(&self, op: Box<dyn Op>, inputs: &[NodeId]) -> Result<NodeId> {
        let input_nodes = inputs
            .iter()
            .map(|&id| self.node(id))
            .collect::<Result<Vec<_>>>()?;
        let values: Vec<&Batch> = input_nodes.iter().map(|n| &n.value).collect();
        let value = op.forward(&values)?;

        let requires_grad = self.track_gradients && input_nodes.iter().any(|n| n.requires_grad);
        let name = op.name().to_string();
        let id = self.push(|id| Node {
            id,
            value,
            op: Some(op),
            inputs: inputs.to_vec(),
            requires_grad,
            name: None,
        });
        log::debug!("recorded {name} as {id} from {inputs:?}");
        Ok(id)
    }

    /// Gets a node by its ID.
    pub fn node(&self, id: NodeId) -> Result<Rc<Node>> {
        self.nodes
            .borrow()
            .get(id.0)
            .cloned()
            .ok_or_else(|| LieError::tape(format!("{id} is not on this tape")))
    }

    /// Gets the value of a node.
    pub fn value(&self, id: NodeId) -> Result<Batch> {
        Ok(self.node(id)?.value.clone())
    }

    /// Whether gradients flow through the node.
    pub fn requires_grad(&self, id: NodeId) -> Result<bool> {
        Ok(self.node(id)?.requires_grad)
    }

    /// Gets all nodes up to and including `target` in topological order.
    pub fn topological_order(&self, target: NodeId) -> Vec<NodeId> {
        let len = self.num_nodes().min(target.0 + 1);
        (0..len).map(NodeId).collect()
    }

    /// Returns the number of nodes in the graph.
    pub fn num_nodes(&self) -> usize {
        self.nodes.borrow().len()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

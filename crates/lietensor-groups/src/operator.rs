//! Operator metadata.
//!
//! Describes each operator's arity, the expected width of its secondary
//! operand, and the kind and event shape of its output. Only the kernel
//! registry decides which `(operator, kind)` pairs exist.

use lietensor_core::GroupType;
use std::fmt;

/// Group operators with a forward closed form and an analytic backward rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    /// Algebra to group
    Exp,
    /// Group to algebra
    Log,
    /// Group inverse
    Inv,
    /// Group product
    Mul,
    /// Adjoint action on a tangent vector
    Adj,
    /// Transposed adjoint action
    AdjT,
    /// Inverse left Jacobian applied to a tangent vector
    Jinv,
    /// Action on 3D points
    Act3,
    /// Action on homogeneous 4D points
    Act4,
    /// Homogeneous 4x4 matrix
    Matrix,
    /// Rotation quaternion
    Quaternion,
}

impl Operator {
    /// Every operator.
    pub const ALL: [Self; 11] = [
        Self::Exp,
        Self::Log,
        Self::Inv,
        Self::Mul,
        Self::Adj,
        Self::AdjT,
        Self::Jinv,
        Self::Act3,
        Self::Act4,
        Self::Matrix,
        Self::Quaternion,
    ];

    /// Operator name as used in error messages and logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Exp => "Exp",
            Self::Log => "Log",
            Self::Inv => "Inv",
            Self::Mul => "Mul",
            Self::Adj => "Adj",
            Self::AdjT => "AdjT",
            Self::Jinv => "Jinv",
            Self::Act3 => "Act3",
            Self::Act4 => "Act4",
            Self::Matrix => "Matrix",
            Self::Quaternion => "Quaternion",
        }
    }

    /// Number of operands including the primary group operand.
    pub const fn arity(self) -> usize {
        match self {
            Self::Exp | Self::Log | Self::Inv | Self::Matrix | Self::Quaternion => 1,
            Self::Mul | Self::Adj | Self::AdjT | Self::Jinv | Self::Act3 | Self::Act4 => 2,
        }
    }

    /// Whether the operator is defined on elements of `gtype`.
    pub const fn accepts(self, gtype: GroupType) -> bool {
        match self {
            Self::Exp => !gtype.is_manifold(),
            _ => gtype.is_manifold(),
        }
    }

    /// Trailing width of the secondary operand, for binary operators.
    pub const fn secondary_width(self, gtype: GroupType) -> Option<usize> {
        match self {
            Self::Mul => Some(gtype.dim()),
            Self::Adj | Self::AdjT | Self::Jinv => Some(gtype.manifold_dim()),
            Self::Act3 => Some(3),
            Self::Act4 => Some(4),
            _ => None,
        }
    }

    /// Trailing width of operand `index`.
    pub const fn input_width(self, gtype: GroupType, index: usize) -> usize {
        match (index, self.secondary_width(gtype)) {
            (0, _) | (_, None) => gtype.dim(),
            (_, Some(w)) => w,
        }
    }

    /// Whether operand `index` is a group element, so that its gradient is
    /// expressed in left-tangent coordinates.
    pub const fn input_is_manifold(self, gtype: GroupType, index: usize) -> bool {
        match index {
            0 => gtype.is_manifold(),
            _ => matches!(self, Self::Mul),
        }
    }

    /// Kind of the output, or `None` for plain tensors (points, matrices).
    pub const fn output_kind(self, gtype: GroupType) -> Option<GroupType> {
        match self {
            Self::Exp | Self::Log | Self::Adj | Self::AdjT | Self::Jinv => Some(gtype.mapping()),
            Self::Inv | Self::Mul => Some(gtype),
            Self::Act3 | Self::Act4 | Self::Matrix | Self::Quaternion => None,
        }
    }

    /// Whether the output is a group element.
    pub const fn output_is_manifold(self, gtype: GroupType) -> bool {
        match self.output_kind(gtype) {
            Some(kind) => kind.is_manifold(),
            None => false,
        }
    }

    /// Event shape of every output element.
    pub fn output_event(self, gtype: GroupType) -> Vec<usize> {
        match self {
            Self::Act3 => vec![3],
            Self::Act4 | Self::Quaternion => vec![4],
            Self::Matrix => vec![4, 4],
            _ => match self.output_kind(gtype) {
                Some(kind) => vec![kind.dim()],
                None => Vec::new(),
            },
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

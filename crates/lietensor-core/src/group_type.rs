//! Static metadata for the four group and algebra kinds.
//!
//! | kind  | stored coordinates            | tangent dim | manifold |
//! |-------|-------------------------------|-------------|----------|
//! | `SO3` | `[qx, qy, qz, qw]`            | 3           | yes      |
//! | `so3` | `[φx, φy, φz]`                | 3           | no       |
//! | `SE3` | `[tx, ty, tz, qx, qy, qz, qw]`| 6           | yes      |
//! | `se3` | `[ρx, ρy, ρz, φx, φy, φz]`    | 6           | no       |
//!
//! Manifold kinds pair with exactly one tangent kind through [`GroupType::mapping`],
//! and the pairing is an involution.

use crate::error::{LieError, Result};
use std::fmt;
use std::str::FromStr;

/// Tag identifying one of the supported groups or algebras.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GroupType {
    /// Rotation group, unit quaternion coordinates.
    SO3,
    /// Rotation algebra, axis-angle coordinates.
    so3,
    /// Rigid motion group, translation followed by a unit quaternion.
    SE3,
    /// Rigid motion algebra, translational part followed by rotational part.
    se3,
}

/// Immutable record describing a group kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupInfo {
    /// Kind this record describes
    pub gtype: GroupType,
    /// Display name
    pub name: &'static str,
    /// Length of the stored coordinate vector
    pub dim: usize,
    /// Dimension of the associated tangent space
    pub manifold_dim: usize,
    /// Whether the kind is a group (true) or an algebra (false)
    pub is_manifold: bool,
    /// Paired kind reached by Exp/Log
    pub mapping: GroupType,
    /// Coordinates of the identity element
    pub identity: &'static [f64],
}

static REGISTRY: [GroupInfo; 4] = [
    GroupInfo {
        gtype: GroupType::SO3,
        name: "SO3",
        dim: 4,
        manifold_dim: 3,
        is_manifold: true,
        mapping: GroupType::so3,
        identity: &[0.0, 0.0, 0.0, 1.0],
    },
    GroupInfo {
        gtype: GroupType::so3,
        name: "so3",
        dim: 3,
        manifold_dim: 3,
        is_manifold: false,
        mapping: GroupType::SO3,
        identity: &[0.0, 0.0, 0.0],
    },
    GroupInfo {
        gtype: GroupType::SE3,
        name: "SE3",
        dim: 7,
        manifold_dim: 6,
        is_manifold: true,
        mapping: GroupType::se3,
        identity: &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
    },
    GroupInfo {
        gtype: GroupType::se3,
        name: "se3",
        dim: 6,
        manifold_dim: 6,
        is_manifold: false,
        mapping: GroupType::SE3,
        identity: &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    },
];

impl GroupType {
    /// All kinds, in registry order.
    pub const ALL: [Self; 4] = [Self::SO3, Self::so3, Self::SE3, Self::se3];

    /// Returns the static metadata record for this kind.
    pub fn info(self) -> &'static GroupInfo {
        &REGISTRY[self as usize]
    }

    /// Length of the stored coordinate vector.
    pub const fn dim(self) -> usize {
        match self {
            Self::SO3 => 4,
            Self::so3 => 3,
            Self::SE3 => 7,
            Self::se3 => 6,
        }
    }

    /// Dimension of the tangent space shared by the kind and its mapping.
    pub const fn manifold_dim(self) -> usize {
        match self {
            Self::SO3 | Self::so3 => 3,
            Self::SE3 | Self::se3 => 6,
        }
    }

    /// True for the groups, false for the algebras.
    pub const fn is_manifold(self) -> bool {
        matches!(self, Self::SO3 | Self::SE3)
    }

    /// The kind reached by Exp (from an algebra) or Log (from a group).
    pub const fn mapping(self) -> Self {
        match self {
            Self::SO3 => Self::so3,
            Self::so3 => Self::SO3,
            Self::SE3 => Self::se3,
            Self::se3 => Self::SE3,
        }
    }

    /// The group member of the pair (`self` for manifold kinds).
    pub const fn manifold(self) -> Self {
        if self.is_manifold() {
            self
        } else {
            self.mapping()
        }
    }

    /// Coordinates of the identity element.
    pub fn identity(self) -> &'static [f64] {
        self.info().identity
    }

    /// Display name (`"SO3"`, `"so3"`, `"SE3"`, `"se3"`).
    pub fn name(self) -> &'static str {
        self.info().name
    }
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GroupType {
    type Err = LieError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|g| g.name() == s)
            .ok_or_else(|| LieError::invalid_domain("lookup", s))
    }
}

//! Core types for batched Lie group computations.
//!
//! This crate holds everything the operator kernels share: the static
//! metadata of the supported groups, dense batched storage, shape
//! broadcasting, the error taxonomy and the numerical configuration.
//!
//! # Modules
//!
//! - [`group_type`]: The four group and algebra kinds and their metadata
//! - [`batch`]: Element-contiguous batched storage
//! - [`broadcast`]: Trailing-aligned broadcasting of batch shapes
//! - [`config`]: Process-wide numerical settings
//! - [`error`]: Error types for Lie group operations

pub mod batch;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod group_type;

pub use batch::Batch;
pub use broadcast::{broadcast_shapes, BroadcastPlan};
pub use config::{config, init_config, LieConfig, LieConfigBuilder};
pub use error::{LieError, Result};
pub use group_type::{GroupInfo, GroupType};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use lietensor_core::prelude::*;
///
/// assert_eq!(GroupType::SE3.dim(), 7);
/// ```
pub mod prelude {
    pub use crate::batch::Batch;
    pub use crate::broadcast::{broadcast_shapes, BroadcastPlan};
    pub use crate::config::{config, LieConfig};
    pub use crate::error::{LieError, Result};
    pub use crate::group_type::GroupType;
}

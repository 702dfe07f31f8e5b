//! Placement: transforming room content onto the target board
//!
//! - [`transform`]: the anchor-relative rigid transform
//! - [`nets`]: net correspondence between a room and one scope instance
//! - [`groups`]: per-scope groups holding generated content
//! - [`engine`]: the synthesis run over the whole scope tree

pub mod engine;
pub mod groups;
pub mod nets;
pub mod transform;

pub use engine::synthesize;
pub use groups::{clear_generated, enforce_membership, group_name};
pub use nets::{NetConflict, NetMapping};
pub use transform::{Pose, PositionTransform};

//! Frame types and synthetic frame generation.
//!
//! This module defines the in-memory frame exchanged with the
//! background model and a deterministic synthetic scene source used by
//! the demo binary and tests. Real capture and display live outside
//! this crate; collaborators hand the model a decoded [`Frame`] and
//! receive mask and background arrays back.

mod frame;
mod source;

pub use frame::Frame;
pub use source::{MovingBlock, SceneConfig, SceneError, SyntheticScene};

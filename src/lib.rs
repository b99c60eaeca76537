//! Per-Pixel Mixture Background Modeling Library
//!
//! Online multi-modal background models for video motion detection.
//! Every pixel location maintains an independent, bounded set of
//! weighted Gaussian (or fuzzy) modes; each frame the modes are
//! ranked, matched once, adapted, decayed, pruned and renormalized to
//! yield a binary foreground mask and a background estimate.
//!
//! # Architecture
//!
//! The system follows an explicit data flow:
//!
//! ```text
//! video (frames) → subtractor → engine → matching
//!                       ↓          ↓
//!                     model (mixtures, config)
//! ```
//!
//! # Design Principles
//!
//! - **One engine, many variants**: Grimson, Zivkovic and the Type-2
//!   fuzzy models share a single update loop; only the injected match
//!   strategy and the bias/pruning policy differ
//! - **Pixel independence**: no pixel's update touches another pixel's
//!   state, so the frame loop is data-parallel
//! - **Fail fast at the boundary**: geometry and format preconditions
//!   are checked before any per-pixel mutation; numeric degeneracy is
//!   recovered locally per pixel, never escalated
//!
//! # Example
//!
//! ```
//! use bgmix::{BackgroundModel, ModelConfig, SceneConfig, SyntheticScene};
//!
//! let mut scene = SyntheticScene::new(SceneConfig::default()).unwrap();
//! let mut model = BackgroundModel::new(ModelConfig::zivkovic()).unwrap();
//!
//! // First frame bootstraps the model; later frames are segmented.
//! for _ in 0..10 {
//!     let frame = scene.next_frame();
//!     let segmentation = model.update(&frame).unwrap();
//!     let _ratio = segmentation.mask.foreground_ratio();
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod engine;
pub mod matching;
pub mod model;
pub mod subtractor;
pub mod video;

// Re-export commonly used types at crate root
pub use engine::{MixtureEngine, PixelDecision, PixelLabel};
pub use matching::MatchStrategy;
pub use model::{Algorithm, Component, ConfigError, FileConfig, Mixture, ModelConfig, RunConfig};
pub use subtractor::{BackgroundModel, Mask, ModelError, Segmentation};
pub use video::{Frame, SceneConfig, SyntheticScene};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

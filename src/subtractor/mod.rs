//! The frame driver: a full-frame background model.
//!
//! [`BackgroundModel`] owns one [`Mixture`] per pixel and applies the
//! update engine to every pixel of an incoming frame, independently
//! and in parallel. Precondition checks (buffer consistency, channel
//! support, geometry match) run once per call, before any per-pixel
//! state is touched, so a rejected frame never leaves the model
//! partially mutated.

mod mask;

pub use mask::Mask;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::engine::MixtureEngine;
use crate::model::{ConfigError, Mixture, ModelConfig};
use crate::video::Frame;

/// Errors raised at the frame boundary.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("frame buffer length does not match its declared geometry")]
    InvalidFrame,
    #[error("unsupported channel count {0} (expected 1 or 3)")]
    UnsupportedFormat(u8),
    #[error("frame is {actual_width}x{actual_height} but the model was built for {width}x{height}")]
    DimensionMismatch {
        /// Model width established by the first frame.
        width: u32,
        /// Model height established by the first frame.
        height: u32,
        /// Width of the offending frame.
        actual_width: u32,
        /// Height of the offending frame.
        actual_height: u32,
    },
    #[error("frame has {actual} channels but the model was built for {expected}")]
    ChannelMismatch {
        /// Channel count established by the first frame.
        expected: u8,
        /// Channel count of the offending frame.
        actual: u8,
    },
}

/// Output of one model update: the foreground mask and the current
/// best-estimate background appearance.
///
/// Both buffers are freshly allocated per call and never alias the
/// model's internal state.
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Binary foreground mask.
    pub mask: Mask,
    /// Background estimate in the input frame's channel layout.
    pub background: Frame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Geometry {
    width: u32,
    height: u32,
    channels: u8,
}

/// A per-pixel mixture background model for a fixed-geometry stream.
///
/// The model bootstraps from the first frame it sees and afterwards
/// requires every frame to match that geometry exactly. Updates must
/// be sequential (`&mut self`); within one update the per-pixel work
/// is data-parallel, since no pixel reads another pixel's mixture.
pub struct BackgroundModel {
    engine: MixtureEngine,
    mixtures: Vec<Mixture>,
    geometry: Option<Geometry>,
}

impl BackgroundModel {
    /// Creates a model from a validated configuration.
    pub fn new(config: ModelConfig) -> Result<Self, ConfigError> {
        let engine = MixtureEngine::new(config)?;
        let config = engine.config();
        info!(
            algorithm = %config.algorithm,
            max_modes = config.max_modes,
            alpha = config.alpha,
            "background model created"
        );
        Ok(Self {
            engine,
            mixtures: Vec::new(),
            geometry: None,
        })
    }

    /// Returns the model configuration.
    pub fn config(&self) -> &ModelConfig {
        self.engine.config()
    }

    /// Returns true once the model has seen its first frame.
    pub fn is_initialized(&self) -> bool {
        self.geometry.is_some()
    }

    /// Returns `(width, height, channels)` once established.
    pub fn geometry(&self) -> Option<(u32, u32, u8)> {
        self.geometry.map(|g| (g.width, g.height, g.channels))
    }

    /// Read access to the mixture at a pixel coordinate.
    pub fn mixture_at(&self, x: u32, y: u32) -> Option<&Mixture> {
        let geometry = self.geometry?;
        if x < geometry.width && y < geometry.height {
            self.mixtures
                .get((y as usize) * (geometry.width as usize) + x as usize)
        } else {
            None
        }
    }

    /// Discards all per-pixel state; the next frame re-bootstraps.
    pub fn reset(&mut self) {
        self.mixtures.clear();
        self.geometry = None;
        info!("background model reset");
    }

    /// Processes one frame and returns the segmentation.
    ///
    /// The first frame establishes the model geometry, seeds every
    /// pixel's mixture from the observed value, and reports everything
    /// as foreground with the raw frame as the background estimate —
    /// the model has not converged yet. Subsequent frames must match
    /// the established geometry and channel count.
    pub fn update(&mut self, frame: &Frame) -> Result<Segmentation, ModelError> {
        if !frame.is_valid() {
            return Err(ModelError::InvalidFrame);
        }
        if frame.channels() != 1 && frame.channels() != 3 {
            return Err(ModelError::UnsupportedFormat(frame.channels()));
        }

        match self.geometry {
            None => Ok(self.bootstrap(frame)),
            Some(geometry) => {
                if frame.width() != geometry.width || frame.height() != geometry.height {
                    return Err(ModelError::DimensionMismatch {
                        width: geometry.width,
                        height: geometry.height,
                        actual_width: frame.width(),
                        actual_height: frame.height(),
                    });
                }
                if frame.channels() != geometry.channels {
                    return Err(ModelError::ChannelMismatch {
                        expected: geometry.channels,
                        actual: frame.channels(),
                    });
                }
                Ok(self.advance(frame, geometry))
            }
        }
    }

    /// Seeds one mixture per pixel from the first frame.
    fn bootstrap(&mut self, frame: &Frame) -> Segmentation {
        let engine = &self.engine;
        self.mixtures = (0..frame.pixel_count())
            .into_par_iter()
            .map(|index| engine.seed(frame.sample(index)))
            .collect();
        self.geometry = Some(Geometry {
            width: frame.width(),
            height: frame.height(),
            channels: frame.channels(),
        });
        info!(
            width = frame.width(),
            height = frame.height(),
            channels = frame.channels(),
            "model bootstrapped from first frame"
        );

        Segmentation {
            mask: Mask::all_foreground(frame.width(), frame.height()),
            background: frame.clone(),
        }
    }

    /// Runs the per-pixel update over the whole frame.
    fn advance(&mut self, frame: &Frame, geometry: Geometry) -> Segmentation {
        let channels = geometry.channels as usize;
        let pixel_count = self.mixtures.len();
        let mut mask_data = vec![Mask::BACKGROUND; pixel_count];
        let mut background_data = vec![0u8; pixel_count * channels];

        let engine = &self.engine;
        self.mixtures
            .par_iter_mut()
            .zip(mask_data.par_iter_mut())
            .zip(background_data.par_chunks_mut(channels))
            .enumerate()
            .for_each(|(index, ((mixture, mask_pixel), background_pixel))| {
                let observation = frame.sample(index);
                let decision = engine.update(mixture, observation, channels);

                *mask_pixel = if decision.is_background() {
                    Mask::BACKGROUND
                } else {
                    Mask::FOREGROUND
                };
                for (out, value) in background_pixel.iter_mut().zip(decision.background.iter()) {
                    *out = value.round().clamp(0.0, 255.0) as u8;
                }
            });

        let mask = Mask::from_raw(mask_data, geometry.width, geometry.height);
        debug!(
            foreground = mask.foreground_count(),
            pixels = pixel_count,
            "frame processed"
        );

        Segmentation {
            mask,
            background: Frame::with_channels(
                background_data,
                geometry.width,
                geometry.height,
                geometry.channels,
            ),
        }
    }
}

impl std::fmt::Debug for BackgroundModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundModel")
            .field("engine", &self.engine)
            .field("geometry", &self.geometry)
            .finish()
    }
}

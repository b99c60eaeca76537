//! Deterministic synthetic frame source.
//!
//! Generates repeatable test scenes: a static background, bounded
//! sensor-style noise, and an optional moving block. Used by the demo
//! binary and the scenario tests in place of real capture hardware,
//! which is outside this crate's scope.

use super::Frame;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a scene description is unusable.
#[derive(Debug, Clone, Error)]
pub enum SceneError {
    #[error("scene dimensions must be non-zero")]
    EmptyGeometry,
    #[error("moving block does not fit inside the scene")]
    BlockTooLarge,
}

/// A block that translates across the scene at a fixed speed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MovingBlock {
    /// Edge length of the square block, in pixels.
    pub size: u32,
    /// Block color (first lane used for grayscale scenes).
    pub color: [u8; 3],
    /// Horizontal displacement per frame, in pixels.
    pub speed: u32,
}

impl Default for MovingBlock {
    fn default() -> Self {
        Self {
            size: 16,
            color: [230, 40, 40],
            speed: 2,
        }
    }
}

/// Description of a synthetic scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Generate color frames (false = grayscale).
    pub color: bool,
    /// Background color (first lane used for grayscale scenes).
    pub background: [u8; 3],
    /// Peak-to-peak amplitude of the deterministic noise, in sample units.
    pub noise_amplitude: u8,
    /// Optional foreground block moving across the scene.
    pub block: Option<MovingBlock>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: 160,
            height: 120,
            color: true,
            background: [90, 110, 70],
            noise_amplitude: 4,
            block: Some(MovingBlock::default()),
        }
    }
}

impl SceneConfig {
    /// Validates the scene description.
    pub fn validate(&self) -> Result<(), SceneError> {
        if self.width == 0 || self.height == 0 {
            return Err(SceneError::EmptyGeometry);
        }
        if let Some(block) = &self.block {
            if block.size > self.width || block.size > self.height {
                return Err(SceneError::BlockTooLarge);
            }
        }
        Ok(())
    }

    /// Samples per pixel for frames of this scene.
    pub fn channels(&self) -> u8 {
        if self.color {
            3
        } else {
            1
        }
    }
}

/// Deterministic frame generator.
///
/// Every frame is derived from the frame index and an xorshift noise
/// stream, so a scene replays identically across runs.
#[derive(Debug, Clone)]
pub struct SyntheticScene {
    config: SceneConfig,
    frame_index: u64,
    noise_state: u64,
}

impl SyntheticScene {
    /// Creates a scene from a validated description.
    pub fn new(config: SceneConfig) -> Result<Self, SceneError> {
        config.validate()?;
        Ok(Self {
            config,
            frame_index: 0,
            noise_state: 0x9e37_79b9_7f4a_7c15,
        })
    }

    /// Returns the scene description.
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Number of frames generated so far.
    pub fn frames_generated(&self) -> u64 {
        self.frame_index
    }

    /// Generates the next frame of the scene.
    pub fn next_frame(&mut self) -> Frame {
        let channels = self.config.channels() as usize;
        let frame_width = self.config.width;
        let frame_height = self.config.height;
        let width = frame_width as usize;
        let height = frame_height as usize;
        let background = self.config.background;
        let amplitude = self.config.noise_amplitude;

        let block_bounds = self.config.block.map(|block| {
            let travel = u64::from((frame_width - block.size).max(1));
            let left = (u64::from(block.speed) * self.frame_index) % travel;
            let top = u64::from(frame_height - block.size) / 2;
            (
                left as usize,
                top as usize,
                block.size as usize,
                block.color,
            )
        });

        let mut samples = vec![0u8; width * height * channels];
        for y in 0..height {
            for x in 0..width {
                let base_color = match block_bounds {
                    Some((left, top, size, color))
                        if x >= left && x < left + size && y >= top && y < top + size =>
                    {
                        color
                    }
                    _ => background,
                };

                let offset = (y * width + x) * channels;
                for lane in 0..channels {
                    let noise = self.next_noise(amplitude);
                    samples[offset + lane] = base_color[lane].saturating_add_signed(noise);
                }
            }
        }

        self.frame_index += 1;
        if channels == 1 {
            Frame::gray(samples, frame_width, frame_height)
        } else {
            Frame::rgb(samples, frame_width, frame_height)
        }
    }

    /// Draws a noise offset in `[-amplitude/2, amplitude/2]`.
    fn next_noise(&mut self, amplitude: u8) -> i8 {
        if amplitude == 0 {
            return 0;
        }
        // xorshift64: cheap, deterministic, good enough for test scenes.
        let mut state = self.noise_state;
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        self.noise_state = state;

        let span = u64::from(amplitude) + 1;
        let offset = (state % span) as i16 - i16::from(amplitude / 2);
        offset.clamp(i16::from(i8::MIN), i16::from(i8::MAX)) as i8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_is_deterministic() {
        let config = SceneConfig::default();
        let mut first = SyntheticScene::new(config.clone()).unwrap();
        let mut second = SyntheticScene::new(config).unwrap();

        for _ in 0..3 {
            assert_eq!(first.next_frame(), second.next_frame());
        }
    }

    #[test]
    fn test_frames_are_valid() {
        let mut scene = SyntheticScene::new(SceneConfig::default()).unwrap();
        let frame = scene.next_frame();

        assert!(frame.is_valid());
        assert_eq!(frame.channels(), 3);
        assert_eq!(scene.frames_generated(), 1);
    }

    #[test]
    fn test_gray_scene() {
        let config = SceneConfig {
            color: false,
            block: None,
            noise_amplitude: 0,
            background: [128, 0, 0],
            ..Default::default()
        };
        let mut scene = SyntheticScene::new(config).unwrap();
        let frame = scene.next_frame();

        assert_eq!(frame.channels(), 1);
        assert!(frame.samples().iter().all(|&s| s == 128));
    }

    #[test]
    fn test_block_moves_between_frames() {
        let config = SceneConfig {
            noise_amplitude: 0,
            ..Default::default()
        };
        let mut scene = SyntheticScene::new(config).unwrap();

        let first = scene.next_frame();
        for _ in 0..4 {
            scene.next_frame();
        }
        let later = scene.next_frame();
        assert_ne!(first, later);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let config = SceneConfig {
            width: 0,
            ..Default::default()
        };
        assert!(matches!(
            SyntheticScene::new(config),
            Err(SceneError::EmptyGeometry)
        ));
    }

    #[test]
    fn test_oversized_block_rejected() {
        let config = SceneConfig {
            width: 8,
            height: 8,
            block: Some(MovingBlock {
                size: 16,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(
            SyntheticScene::new(config),
            Err(SceneError::BlockTooLarge)
        ));
    }
}

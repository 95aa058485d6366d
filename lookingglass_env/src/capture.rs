//! Capture pipeline abstraction for the shadow-world preview.

use crate::error::EnvError;
use crate::types::{ClearFlags, Pose, ViewParams};
use serde::{Deserialize, Serialize};

/// Largest supported edge of a capture target in pixels.
const MAX_TARGET_EDGE: u32 = 16384;

/// Pixel layout of a capture buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// 8 bits per channel, alpha first
    #[default]
    Argb32,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Argb32 => 4,
        }
    }
}

/// Off-screen render target the shadow camera draws into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureTarget {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl CaptureTarget {
    /// Creates an ARGB32 target.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: PixelFormat::Argb32,
        }
    }

    /// Checks the resolution is usable.
    pub fn validate(&self) -> Result<(), EnvError> {
        let in_range = |edge: u32| edge > 0 && edge <= MAX_TARGET_EDGE;
        if in_range(self.width) && in_range(self.height) {
            Ok(())
        } else {
            Err(EnvError::invalid_target(self.width, self.height))
        }
    }

    /// Size of a full frame in bytes.
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

impl Default for CaptureTarget {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

/// The consumer side of the shadow view.
///
/// The engine calls [`source_updated`](CapturePipeline::source_updated)
/// exactly once per synchronization, after the shadow camera's pose and
/// parameters are final for the tick. Rendering happens on the pipeline's
/// side of this call.
pub trait CapturePipeline {
    /// Binds the render target. Called once, before the first tick.
    fn configure(&mut self, target: CaptureTarget) -> Result<(), EnvError>;

    /// Notifies the pipeline that the source viewpoint is current.
    fn source_updated(&mut self, pose: &Pose, params: &ViewParams);
}

/// An image buffer produced by a capture.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureBuffer {
    target: CaptureTarget,
    pixels: Vec<u8>,
}

impl CaptureBuffer {
    /// Allocates a zeroed buffer for the target.
    pub fn new(target: CaptureTarget) -> Self {
        Self {
            target,
            pixels: vec![0; target.byte_len()],
        }
    }

    /// Fills every pixel with the given packed value.
    pub fn fill(&mut self, pixel: [u8; 4]) {
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&pixel);
        }
    }

    /// Returns the pixel at (x, y), if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.target.width || y >= self.target.height {
            return None;
        }
        let offset = (y as usize * self.target.width as usize + x as usize) * 4;
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.pixels[offset..offset + 4]);
        Some(px)
    }

    pub fn target(&self) -> CaptureTarget {
        self.target
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }
}

/// GPU-less capture sink.
///
/// Keeps the latest viewpoint and an ARGB32 buffer. Drawing geometry is the
/// host renderer's job; this sink only performs the clear step so a solid
/// background is visible in headless runs and tests.
#[derive(Debug, Default)]
pub struct HeadlessCapture {
    buffer: Option<CaptureBuffer>,
    last_view: Option<(Pose, ViewParams)>,
    frames: u64,
}

impl HeadlessCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of viewpoint updates received.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// The most recent viewpoint.
    pub fn last_view(&self) -> Option<&(Pose, ViewParams)> {
        self.last_view.as_ref()
    }

    /// The bound buffer, if configured.
    pub fn buffer(&self) -> Option<&CaptureBuffer> {
        self.buffer.as_ref()
    }

    /// The latest frame, or an error if no target was ever bound.
    pub fn frame(&self) -> Result<&CaptureBuffer, EnvError> {
        self.buffer.as_ref().ok_or(EnvError::CaptureNotConfigured)
    }
}

impl CapturePipeline for HeadlessCapture {
    fn configure(&mut self, target: CaptureTarget) -> Result<(), EnvError> {
        target.validate()?;
        self.buffer = Some(CaptureBuffer::new(target));
        Ok(())
    }

    /// Updates before `configure` are dropped: there is nothing to draw into.
    fn source_updated(&mut self, pose: &Pose, params: &ViewParams) {
        let Some(buffer) = self.buffer.as_mut() else {
            return;
        };
        if params.clear_flags == ClearFlags::SolidColor {
            buffer.fill(params.background.to_argb32());
        }
        self.last_view = Some((*pose, *params));
        self.frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;
    use nalgebra::Vector3;

    #[test]
    fn test_target_validation() {
        assert!(CaptureTarget::new(640, 480).validate().is_ok());
        assert!(matches!(
            CaptureTarget::new(0, 480).validate(),
            Err(EnvError::InvalidCaptureTarget { width: 0, height: 480 })
        ));
        assert!(CaptureTarget::new(640, MAX_TARGET_EDGE + 1).validate().is_err());
    }

    #[test]
    fn test_headless_rejects_bad_target() {
        let mut capture = HeadlessCapture::new();
        assert!(capture.configure(CaptureTarget::new(0, 0)).is_err());
        assert!(capture.buffer().is_none());
    }

    #[test]
    fn test_headless_ignores_updates_before_configure() {
        let mut capture = HeadlessCapture::new();
        capture.source_updated(&Pose::identity(), &ViewParams::default());

        assert_eq!(capture.frames(), 0);
        assert!(capture.last_view().is_none());
        assert!(matches!(capture.frame(), Err(EnvError::CaptureNotConfigured)));

        capture.configure(CaptureTarget::new(2, 2)).unwrap();
        capture.source_updated(&Pose::identity(), &ViewParams::default());
        assert_eq!(capture.frames(), 1);
        assert_eq!(capture.frame().unwrap().target(), CaptureTarget::new(2, 2));
    }

    #[test]
    fn test_target_json_defaults() {
        let target: CaptureTarget = serde_json::from_str(r#"{ "width": 640, "height": 480 }"#).unwrap();
        assert_eq!(target, CaptureTarget::new(640, 480));
    }

    #[test]
    fn test_headless_solid_clear() {
        let mut capture = HeadlessCapture::new();
        capture.configure(CaptureTarget::new(4, 2)).unwrap();

        let params = ViewParams {
            background: Color::rgba(1.0, 0.0, 0.0, 1.0),
            clear_flags: ClearFlags::SolidColor,
            ..Default::default()
        };
        let pose = Pose::at(Vector3::new(1.0, 2.0, 3.0));
        capture.source_updated(&pose, &params);

        let buffer = capture.buffer().unwrap();
        assert_eq!(buffer.as_bytes().len(), 4 * 2 * 4);
        assert_eq!(buffer.pixel(3, 1), Some([255, 255, 0, 0]));
        assert_eq!(buffer.pixel(4, 0), None);
        assert_eq!(capture.frames(), 1);
        assert_eq!(capture.last_view().unwrap().0, pose);
    }

    #[test]
    fn test_headless_skybox_leaves_buffer() {
        let mut capture = HeadlessCapture::new();
        capture.configure(CaptureTarget::new(2, 2)).unwrap();
        capture.source_updated(&Pose::identity(), &ViewParams::default());

        assert_eq!(capture.buffer().unwrap().pixel(0, 0), Some([0, 0, 0, 0]));
    }
}

//! Frame pipeline: `screen` messages → decoded raster → display surface.
//!
//! This use case sits at the application layer and draws through a
//! [`Surface`] trait.  The in-memory raster surface and the recording mock
//! are in the infrastructure layer.
//!
//! For each frame:
//!
//! 1. the remote logical size is taken from the message;
//! 2. the base64 payload is decoded to an RGBA raster on the blocking pool
//!    (JPEG/PNG decoding is CPU-bound and must not stall the event loop);
//! 3. if the raster size differs from the surface size the surface is
//!    resized, which is the only place the display size ever changes;
//! 4. the raster is drawn at the origin, the FPS window is updated and the
//!    frame counter incremented.
//!
//! A payload that fails to decode is dropped with a warning and changes
//! nothing beyond step 1.

use std::time::Instant;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::RgbaImage;
use player_core::domain::fps::FpsEstimator;
use player_core::protocol::messages::ScreenFrame;
use player_core::{map_to_remote, CoordinateMapper, LocalPoint, RemotePoint, SurfaceSize};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("frame payload is not a decodable image: {0}")]
    Image(#[from] image::ImageError),

    #[error("frame decode task failed: {0}")]
    DecodeTask(#[from] tokio::task::JoinError),
}

/// Something frames can be drawn on.
///
/// `size()` is the local display size used for coordinate mapping, so an
/// implementation that is shown scaled must report its displayed size.
pub trait Surface: Send {
    fn size(&self) -> SurfaceSize;

    /// Changes the surface size.  Existing content may be discarded.
    fn resize(&mut self, size: SurfaceSize);

    /// Draws `raster` with its top-left corner at the origin.
    fn draw(&mut self, raster: &RgbaImage);

    /// Draws the transient click cue centred on `at`.  It is not tracked;
    /// the next frame simply draws over it.
    fn draw_click_marker(&mut self, at: LocalPoint);

    /// Blanks the whole surface.
    fn clear(&mut self);
}

/// Decodes a base64 image payload into an RGBA raster.
///
/// # Errors
///
/// [`FrameError::Base64`] or [`FrameError::Image`].
pub fn decode_frame_payload(data: &str) -> Result<RgbaImage, FrameError> {
    let bytes = STANDARD.decode(data.trim())?;
    let decoded = image::load_from_memory(&bytes)?;
    Ok(decoded.to_rgba8())
}

pub struct FramePipeline<S: Surface> {
    surface: S,
    remote_size: SurfaceSize,
    fps: FpsEstimator,
    frame_count: u64,
}

impl<S: Surface> FramePipeline<S> {
    pub fn new(surface: S, fps_window: usize) -> Self {
        Self { surface, remote_size: SurfaceSize::default(), fps: FpsEstimator::new(fps_window), frame_count: 0 }
    }

    /// Consumes one `screen` message.
    ///
    /// # Errors
    ///
    /// Returns the decode failure after logging it; the caller only needs
    /// the error for diagnostics, the frame is already dropped.
    pub async fn ingest(&mut self, frame: ScreenFrame) -> Result<(), FrameError> {
        self.remote_size = SurfaceSize::new(frame.width, frame.height);
        if let Some(ts) = frame.timestamp {
            debug!(timestamp = ts, width = frame.width, height = frame.height, "frame received");
        }

        let data = frame.data;
        let decoded = tokio::task::spawn_blocking(move || decode_frame_payload(&data))
            .await
            .map_err(FrameError::from)
            .and_then(|result| result);

        match decoded {
            Ok(raster) => {
                self.apply_decoded(&raster, Instant::now());
                Ok(())
            }
            Err(e) => {
                warn!("dropping frame: {e}");
                Err(e)
            }
        }
    }

    /// Draws an already decoded raster observed at `now`.
    pub fn apply_decoded(&mut self, raster: &RgbaImage, now: Instant) {
        let raster_size = SurfaceSize::new(raster.width(), raster.height());
        if self.surface.size() != raster_size {
            info!("surface resized to {raster_size}");
            self.surface.resize(raster_size);
        }
        self.surface.draw(raster);
        self.fps.record_frame(now);
        self.frame_count += 1;
    }

    /// Resets the counters and the FPS window and blanks the surface.
    /// The last remote size is kept until the next frame replaces it.
    pub fn clear(&mut self) {
        self.frame_count = 0;
        self.fps.reset();
        self.surface.clear();
    }

    /// Draws the click cue on the surface.
    pub fn show_click_feedback(&mut self, at: LocalPoint) {
        self.surface.draw_click_marker(at);
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn fps(&self) -> u32 {
        self.fps.fps()
    }

    pub fn remote_size(&self) -> SurfaceSize {
        self.remote_size
    }

    /// `"<w>x<h>"` of the remote surface, or `"-"` before the first frame.
    pub fn resolution(&self) -> String {
        if self.remote_size.is_empty() {
            "-".to_string()
        } else {
            self.remote_size.to_string()
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

impl<S: Surface> CoordinateMapper for FramePipeline<S> {
    /// Maps using the current remote size and the current surface size.
    fn map_to_remote(&self, local: LocalPoint) -> Option<RemotePoint> {
        map_to_remote(local, self.remote_size, self.surface.size())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::surface::mock::{MockSurface, SurfaceCall};
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;
    use std::time::Duration;

    fn png_base64(width: u32, height: u32) -> String {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        STANDARD.encode(bytes)
    }

    fn frame(width: u32, height: u32, data: String) -> ScreenFrame {
        ScreenFrame { width, height, data, timestamp: None }
    }

    #[tokio::test]
    async fn test_ingest_resizes_surface_to_raster_and_draws() {
        // Arrange
        let mut pipeline = FramePipeline::new(MockSurface::new(), 10);

        // Act
        pipeline.ingest(frame(1920, 1080, png_base64(96, 54))).await.unwrap();

        // Assert
        assert_eq!(pipeline.surface().size(), SurfaceSize::new(96, 54));
        assert_eq!(pipeline.remote_size(), SurfaceSize::new(1920, 1080));
        assert_eq!(pipeline.frame_count(), 1);
        assert_eq!(
            pipeline.surface().calls(),
            vec![SurfaceCall::Resize(SurfaceSize::new(96, 54)), SurfaceCall::Draw(SurfaceSize::new(96, 54))]
        );
    }

    #[tokio::test]
    async fn test_same_size_frames_do_not_resize_again() {
        let mut pipeline = FramePipeline::new(MockSurface::new(), 10);

        pipeline.ingest(frame(8, 8, png_base64(8, 8))).await.unwrap();
        pipeline.ingest(frame(8, 8, png_base64(8, 8))).await.unwrap();

        let resizes = pipeline.surface().calls().iter().filter(|c| matches!(c, SurfaceCall::Resize(_))).count();
        assert_eq!(resizes, 1);
        assert_eq!(pipeline.frame_count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_base64_is_dropped_without_drawing() {
        let mut pipeline = FramePipeline::new(MockSurface::new(), 10);

        let result = pipeline.ingest(frame(10, 10, "***not base64***".into())).await;

        assert!(matches!(result, Err(FrameError::Base64(_))));
        assert_eq!(pipeline.frame_count(), 0);
        assert!(pipeline.surface().calls().is_empty());
    }

    #[tokio::test]
    async fn test_non_image_payload_is_dropped() {
        let mut pipeline = FramePipeline::new(MockSurface::new(), 10);

        let result = pipeline.ingest(frame(10, 10, STANDARD.encode(b"hello"))).await;

        assert!(matches!(result, Err(FrameError::Image(_))));
        assert_eq!(pipeline.frame_count(), 0);
    }

    #[test]
    fn test_apply_decoded_updates_fps() {
        let mut pipeline = FramePipeline::new(MockSurface::new(), 10);
        let raster = RgbaImage::new(4, 4);
        let start = Instant::now();

        for i in 0..11u64 {
            pipeline.apply_decoded(&raster, start + Duration::from_millis(100 * i));
        }

        assert_eq!(pipeline.fps(), 10);
        assert_eq!(pipeline.frame_count(), 11);
    }

    #[test]
    fn test_clear_resets_counters_and_blanks_surface() {
        let mut pipeline = FramePipeline::new(MockSurface::new(), 10);
        let raster = RgbaImage::new(4, 4);
        let start = Instant::now();
        pipeline.apply_decoded(&raster, start);
        pipeline.apply_decoded(&raster, start + Duration::from_millis(50));

        pipeline.clear();

        assert_eq!(pipeline.frame_count(), 0);
        assert_eq!(pipeline.fps(), 0);
        assert_eq!(pipeline.surface().calls().last(), Some(&SurfaceCall::Clear));
    }

    #[test]
    fn test_mapping_uses_live_sizes() {
        let mut pipeline = FramePipeline::new(MockSurface::with_size(SurfaceSize::new(960, 540)), 10);
        assert_eq!(pipeline.map_to_remote(LocalPoint::new(100.0, 50.0)), None);

        pipeline.remote_size = SurfaceSize::new(1920, 1080);
        assert_eq!(pipeline.map_to_remote(LocalPoint::new(100.0, 50.0)), Some(RemotePoint::new(200, 100)));

        pipeline.surface_mut().resize(SurfaceSize::new(1920, 1080));
        assert_eq!(pipeline.map_to_remote(LocalPoint::new(100.0, 50.0)), Some(RemotePoint::new(100, 50)));
    }

    #[test]
    fn test_resolution_placeholder_before_first_frame() {
        let pipeline = FramePipeline::new(MockSurface::new(), 10);
        assert_eq!(pipeline.resolution(), "-");
    }

    #[test]
    fn test_decode_frame_payload_roundtrips_png() {
        let raster = decode_frame_payload(&png_base64(3, 2)).unwrap();
        assert_eq!((raster.width(), raster.height()), (3, 2));
        assert_eq!(raster.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
    }
}

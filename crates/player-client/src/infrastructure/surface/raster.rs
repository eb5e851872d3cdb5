//! In-memory RGBA surface.
//!
//! The headless player renders into this buffer.  It behaves like a canvas:
//! a frame overwrites everything, the click cue is blended on top and stays
//! until the next frame, and the buffer can be written out as a PNG.

use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage};
use player_core::{LocalPoint, SurfaceSize};
use tracing::info;

use crate::application::frame_pipeline::Surface;

/// Click cue colour (alpha 0.8 ≈ 204/255).
const MARKER_COLOR: Rgba<u8> = Rgba([233, 69, 96, 204]);
/// Centre radius of the outer ring.
const MARKER_RING_RADIUS: f64 = 15.0;
/// Stroke width of the outer ring.
const MARKER_RING_WIDTH: f64 = 3.0;
const MARKER_DOT_RADIUS: f64 = 5.0;

#[derive(Debug, Clone, Default)]
pub struct RasterSurface {
    buffer: RgbaImage,
}

impl RasterSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &RgbaImage {
        &self.buffer
    }

    /// Writes the current buffer as a PNG file.
    ///
    /// # Errors
    ///
    /// Returns the encoder or I/O error.  A zero-sized surface cannot be
    /// encoded and also errors.
    pub fn save_png(&self, path: &Path) -> Result<(), image::ImageError> {
        self.buffer.save_with_format(path, ImageFormat::Png)?;
        info!(path = %path.display(), size = %self.size(), "snapshot written");
        Ok(())
    }

    /// Alpha-blends `color` over the pixel at (x, y) if it is inside.
    fn blend(&mut self, x: i64, y: i64, color: Rgba<u8>) {
        if x < 0 || y < 0 || x >= i64::from(self.buffer.width()) || y >= i64::from(self.buffer.height()) {
            return;
        }
        let pixel = self.buffer.get_pixel_mut(x as u32, y as u32);
        let alpha = u32::from(color[3]);
        for channel in 0..3 {
            let src = u32::from(color[channel]);
            let dst = u32::from(pixel[channel]);
            pixel[channel] = ((src * alpha + dst * (255 - alpha)) / 255) as u8;
        }
        pixel[3] = pixel[3].max(color[3]);
    }
}

impl Surface for RasterSurface {
    fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.buffer.width(), self.buffer.height())
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.buffer = RgbaImage::new(size.width, size.height);
    }

    fn draw(&mut self, raster: &RgbaImage) {
        image::imageops::replace(&mut self.buffer, raster, 0, 0);
    }

    fn draw_click_marker(&mut self, at: LocalPoint) {
        let reach = (MARKER_RING_RADIUS + MARKER_RING_WIDTH).ceil() as i64;
        let (cx, cy) = (at.x.round() as i64, at.y.round() as i64);
        let (width, height) = (i64::from(self.buffer.width()), i64::from(self.buffer.height()));
        if cx < -reach || cy < -reach || cx > width.saturating_add(reach) || cy > height.saturating_add(reach) {
            return;
        }
        let ring_inner = MARKER_RING_RADIUS - MARKER_RING_WIDTH / 2.0;
        let ring_outer = MARKER_RING_RADIUS + MARKER_RING_WIDTH / 2.0;

        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let distance = ((dx * dx + dy * dy) as f64).sqrt();
                let on_ring = distance >= ring_inner && distance <= ring_outer;
                if on_ring || distance <= MARKER_DOT_RADIUS {
                    self.blend(cx + dx, cy + dy, MARKER_COLOR);
                }
            }
        }
    }

    fn clear(&mut self) {
        for pixel in self.buffer.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

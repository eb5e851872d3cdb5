//! Recording surface for tests.
//!
//! Every call is appended to `calls` so assertions can check exactly what was
//! drawn and in which order, without inspecting pixels.

use image::RgbaImage;
use player_core::{LocalPoint, SurfaceSize};

use crate::application::frame_pipeline::Surface;

/// One recorded surface operation.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Resize(SurfaceSize),
    /// A raster of the given size was drawn.
    Draw(SurfaceSize),
    ClickMarker(LocalPoint),
    Clear,
}

#[derive(Debug, Default)]
pub struct MockSurface {
    size: SurfaceSize,
    calls: Vec<SurfaceCall>,
}

impl MockSurface {
    /// A zero-sized surface, as before the first frame.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(size: SurfaceSize) -> Self {
        Self { size, calls: Vec::new() }
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.clone()
    }

    pub fn click_markers(&self) -> Vec<LocalPoint> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SurfaceCall::ClickMarker(at) => Some(*at),
                _ => None,
            })
            .collect()
    }
}

impl Surface for MockSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
        self.calls.push(SurfaceCall::Resize(size));
    }

    fn draw(&mut self, raster: &RgbaImage) {
        self.calls.push(SurfaceCall::Draw(SurfaceSize::new(raster.width(), raster.height())));
    }

    fn draw_click_marker(&mut self, at: LocalPoint) {
        self.calls.push(SurfaceCall::ClickMarker(at));
    }

    fn clear(&mut self) {
        self.calls.push(SurfaceCall::Clear);
    }
}

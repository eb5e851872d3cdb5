//! Coordinate spaces.
//!
//! The player deals with two pixel spaces:
//!
//! - **local display space**: the surface the frames are drawn on, which the
//!   pointer events are reported in;
//! - **remote logical space**: the pixel space of the remotely controlled
//!   desktop, as announced by the `width`/`height` of each `screen` frame.
//!
//! The scale between them is derived on every translation from the current
//! sizes and is never cached.

use serde::{Deserialize, Serialize};

/// Width and height of a pixel surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either dimension is zero (no frame yet, or a
    /// collapsed surface).
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for SurfaceSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A point in local display space.  Fractional values are allowed because
/// pointer events are often reported with sub-pixel precision.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocalPoint {
    pub x: f64,
    pub y: f64,
}

impl LocalPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(&self, other: LocalPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A point in remote logical space, as sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RemotePoint {
    pub x: i32,
    pub y: i32,
}

impl RemotePoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Maps a local display point into remote logical coordinates.
///
/// `scale = remote / display` per axis; each mapped component is rounded
/// half-up.  Returns `None` when either size has a zero dimension, which is
/// always the case before the first frame arrives.
pub fn map_to_remote(local: LocalPoint, remote: SurfaceSize, display: SurfaceSize) -> Option<RemotePoint> {
    if remote.is_empty() || display.is_empty() {
        return None;
    }
    let scale_x = f64::from(remote.width) / f64::from(display.width);
    let scale_y = f64::from(remote.height) / f64::from(display.height);
    Some(RemotePoint::new(round_half_up(local.x * scale_x), round_half_up(local.y * scale_y)))
}

fn round_half_up(value: f64) -> i32 {
    // Saturating float→int cast; absurd pointer values clamp instead of wrapping.
    (value + 0.5).floor() as i32
}

/// Anything that can translate local display coordinates into the current
/// remote space.
///
/// The frame pipeline implements this using the live remote size and the
/// live surface size; the gesture translator only sees this trait.
pub trait CoordinateMapper {
    /// Returns `None` when no mapping is available yet.
    fn map_to_remote(&self, local: LocalPoint) -> Option<RemotePoint>;
}

/// A mapper over two fixed sizes.  Used by tests and benchmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedMapper {
    pub remote: SurfaceSize,
    pub display: SurfaceSize,
}

impl CoordinateMapper for FixedMapper {
    fn map_to_remote(&self, local: LocalPoint) -> Option<RemotePoint> {
        map_to_remote(local, self.remote, self.display)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

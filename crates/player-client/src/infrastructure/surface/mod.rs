//! Implementations of the application-layer [`Surface`] trait.
//!
//! - **`raster`** – in-memory RGBA buffer used by the headless binary; can
//!   be written to disk as PNG.
//! - **`mock`** – records every call for tests.
//!
//! [`Surface`]: crate::application::frame_pipeline::Surface

pub mod mock;
pub mod raster;

pub use mock::{MockSurface, SurfaceCall};
pub use raster::RasterSurface;

//! Infrastructure layer for player-client.
//!
//! The infrastructure layer handles all I/O: the WebSocket connection to the
//! remote host, the pixel buffers frames are drawn into, and the operator
//! console of the headless binary.
//!
//! # Responsibilities
//!
//! - Dialing the host and pumping WebSocket frames (tokio-tungstenite)
//! - Reconnecting with exponential backoff after an unexpected close
//! - Providing concrete [`Surface`](crate::application::Surface)
//!   implementations
//! - Parsing console lines and rendering session events
//!
//! # What does NOT belong here?
//!
//! - Deciding what a gesture means (that is `player-core`)
//! - Routing messages between components (that is the application layer)

pub mod console;
pub mod surface;
pub mod transport;

pub use surface::{MockSurface, RasterSurface, SurfaceCall};
pub use transport::WsTransport;

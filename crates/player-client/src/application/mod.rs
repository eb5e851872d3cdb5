//! Application layer for player-client.
//!
//! The application layer orchestrates the player: it knows *what* to do
//! with each transport event and each operator request, but delegates *how*
//! to do it to the infrastructure layer.
//!
//! # Responsibilities
//!
//! - Decoding `screen` frames and drawing them through the [`Surface`] trait
//! - Composing the gesture, command and automation coordinators into one
//!   [`Session`]
//! - Fanning session events out to any number of subscribers
//!
//! # What does NOT belong here?
//!
//! - Opening sockets or spawning connection tasks (that is infrastructure)
//! - Concrete pixel buffers (see `infrastructure::surface`)
//! - Parsing operator input (see `infrastructure::console`)

pub mod fanout;
pub mod frame_pipeline;
pub mod session;

pub use fanout::EventFanout;
pub use frame_pipeline::{decode_frame_payload, FrameError, FramePipeline, Surface};
pub use session::{Session, SessionControl, SessionEvent, SessionStats, SessionTransport};

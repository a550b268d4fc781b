//! Playback module: the single-session coordinator and its audio backends.

pub mod backend;
pub mod coordinator;
pub mod rodio_backend;

pub use backend::{AudioBackend, ControlId, ControlSurface, MediaEvent};
pub use coordinator::PlaybackCoordinator;
pub use rodio_backend::RodioBackend;

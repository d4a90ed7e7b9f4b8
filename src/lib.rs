// Bike fitting core: pose landmarks in, joint angles and fit advice out.
//
// The per-frame pipeline is synchronous and single-owner. Hosts (the CLI,
// a browser bridge, ...) own the event loop that delivers pose frames and
// the storage that persists sessions.

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::PipelineConfig;
pub use error::{CaptureError, ConfigError, SessionError};

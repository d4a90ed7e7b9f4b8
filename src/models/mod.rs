// Data models for the fitting pipeline and the persisted session

pub mod issue;
pub mod landmark;
pub mod metrics;
pub mod preset;
pub mod session;

pub use issue::*;
pub use landmark::*;
pub use metrics::*;
pub use preset::*;
pub use session::*;

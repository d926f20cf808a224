//! `courier-core` — shared types, configuration and the event model.
//!
//! Everything the other crates agree on lives here: the [`types::Post`]
//! catalog record, the [`types::RunPolicy`] scheduling knobs, the
//! [`event::RunEvent`] notification model and the figment-backed
//! [`config::CourierConfig`].

pub mod config;
pub mod error;
pub mod event;
pub mod types;

pub use config::CourierConfig;
pub use error::{CourierError, Result};
pub use event::{EventKind, NotifyMode, RunEvent};
pub use types::{Post, PostButton, RunPolicy};

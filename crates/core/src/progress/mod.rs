//! Progress tracking for the transport layer.
//!
//! The generator only emits events through a
//! [`ProgressCallback`](crate::generator::ProgressCallback). Whatever bridges
//! it to clients owns a [`ProgressStore`] and hands out its callback.

mod config;
mod store;

pub use config::ProgressConfig;
pub use store::ProgressStore;

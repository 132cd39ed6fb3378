//! Practice client: question catalog, submissions, hints and local progress
//! for the coding-practice server.
//!
//! `Workbench` is the entry point; it owns the `Session` and hands it to the
//! submission and hint controllers.

pub mod api;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod hints;
pub mod listing;
pub mod markup;
pub mod progress;
pub mod protocol;
pub mod session;
pub mod store;
pub mod submission;
pub mod telemetry;
pub mod util;
pub mod view;
pub mod workbench;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use workbench::Workbench;

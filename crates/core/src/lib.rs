//! Core types and shared functionality for webshot.
//!
//! This crate provides:
//! - Fingerprint-addressed cache backends (local filesystem and S3)
//! - The background cleanup scheduler
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod request;

pub use cache::{CacheStore, LocalStore, S3Store};
pub use config::AppConfig;
pub use error::Error;
pub use request::CaptureRequest;

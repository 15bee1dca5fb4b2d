//! # VidFlow Common Library
//!
//! Shared code for the VidFlow service:
//! - Video workflow engine (statuses, roles, transitions, effective status)
//! - Domain models
//! - Database schema and repositories
//! - Configuration loading
//! - CSV codecs and the Titulin title classifier
//! - Notification channel messages

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod export;
pub mod models;
pub mod titulin;
pub mod workflow;

pub use error::{Error, Result};

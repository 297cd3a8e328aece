//! # Lorehall Common Library
//!
//! Shared code for the Lorehall archive:
//! - Database schema, models and queries
//! - Configuration loading
//! - Error types
//! - Slug utilities

pub mod config;
pub mod db;
pub mod error;
pub mod slug;

pub use error::{Error, Result};

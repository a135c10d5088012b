//! # Hemolink Testkit
//!
//! Test utilities for Hemolink.
//!
//! This crate provides:
//! - An in-process application fixture with injected store and identity doubles
//! - Token minting and role seeding helpers
//! - Property-based generators for request bodies
//!
//! The HTTP integration tests live in this crate's `tests/` directory.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hemolink_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn staff_can_create() {
//!     let app = TestApp::new();
//!     let token = app.add_staff("nurse-1").await;
//!     let response = app.post("/api/create-request", Some(&token), body).await;
//!     assert_eq!(response.status, StatusCode::CREATED);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use axum::http::StatusCode;
}

pub use fixtures::*;
pub use generators::*;

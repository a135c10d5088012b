//! # Hemolink Server
//!
//! Role-gated HTTP backend for blood requests and the donation ledger.
//!
//! This crate provides:
//! - The domain model and its document layout
//! - The role store, authorization gate and write orchestrator
//! - Input schemas validated at the HTTP boundary
//! - The `axum` router and server bootstrap
//!
//! # Request flow
//!
//! ```text
//! router -> identity verifier -> role store -> gate -> input schema -> orchestrator
//! ```
//!
//! Each step completes before the next starts. Unauthenticated, forbidden and
//! malformed requests are rejected before any write is attempted.
//!
//! # Routes
//!
//! | Route | Caller | Success |
//! |---|---|---|
//! | `POST /api/assign-role` | any verified caller | 200 |
//! | `POST /api/handle-new-user` | webhook secret | 200 |
//! | `POST /api/create-request` | `medical_staff` | 201 |
//! | `DELETE /api/requests/:id` | `medical_staff` | 200 |
//! | `POST /api/register-donation` | `medical_staff` | 201 |
//! | `POST /api/update-status` | `medical_staff` | 200 |
//! | `GET /healthz` | anyone | 200 |
//!
//! Failures use one envelope, `{"kind": ..., "message": ...}`.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod gate;
mod input;
mod model;
mod orchestrator;
mod roles;
mod router;
mod seed;
mod server;

pub use config::{CorsMode, ServerConfig};
pub use error::{ErrorEnvelope, ServiceError, ServiceResult, INTERNAL_MESSAGE};
pub use gate::{authorize, Grant};
pub use input::{
    parse_body, CreateRequestInput, NewUserInput, RegisterDonationInput, UpdateStatusInput,
};
pub use model::{
    BloodRequest, BloodType, DonationRecord, HistoryEntry, LedgerEntry, LedgerStatus, Role,
    RoleRecord, BLOCKCHAIN_LEDGER, BLOOD_REQUESTS, DONATION_HISTORY, ROLE_CLAIM, USER_PROFILES,
    USER_ROLES,
};
pub use orchestrator::WriteOrchestrator;
pub use roles::RoleStore;
pub use router::{routes, AppState, Authenticated, MessageResponse, WEBHOOK_SECRET_HEADER};
pub use seed::{SeedData, SeedError};
pub use server::HemolinkServer;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

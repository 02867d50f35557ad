//! # API Shared
//!
//! Shared utilities and definitions for the CDS APIs.
//!
//! Contains:
//! - CDS Hooks wire types (`dto` module) with OpenAPI schemas
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and the `cds` CLI for common functionality.

pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;

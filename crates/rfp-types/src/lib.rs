//! # rfp-types
//!
//! Shared types, errors, and configuration for the **RFP escrow engine**.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`RfpId`], [`SubmissionId`], [`Address`], [`BlockHeight`], [`CallContext`]
//! - **RFP model**: [`Rfp`], [`RfpStatus`]
//! - **Submission model**: [`Submission`], [`SubmissionStatus`]
//! - **Payload model**: [`Payload`], [`ProposalCall`]
//! - **Notifications**: [`Notification`], [`EventRecord`]
//! - **Configuration**: [`EngineConfig`]
//! - **Errors**: [`RfpError`] with `RFP_ERR_` prefix codes
//! - **Constants**: system-wide defaults

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod payload;
pub mod rfp;
pub mod submission;

// Re-export all primary types at crate root for ergonomic imports:
//   use rfp_types::{Rfp, RfpStatus, Submission, Payload, ...};

pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use payload::*;
pub use rfp::*;
pub use submission::*;

/// Monetary amount held in escrow or moved through the token ledger.
pub type Amount = rust_decimal::Decimal;

// Constants are accessed via `rfp_types::constants::FOO`
// (not re-exported to avoid name collisions).

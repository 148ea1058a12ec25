//! # rfp-engine
//!
//! Custodial **RFP workflow engine**. Requestors post a request with a token
//! bounty, creators file proposals against it, the requestor awards one, and
//! the winning payload is forwarded to an external proposal factory.
//!
//! - [`RfpRegistry`]: RFP records and their lifecycle
//! - [`SubmissionStore`]: proposals, indexed per RFP
//! - [`SequenceAllocator`]: monotonic id issuance
//! - [`forwarding`]: relays a winning payload to a [`ProposalFactory`]
//! - [`EventLog`]: append-only notification trail
//! - [`RfpEngine`]: the serialized façade tying them to [`rfp_custody::Escrow`]
//!
//! ## Lifecycle
//!
//! ```text
//!            ┌── cancel (requestor) ──▶ CANCELLED   refund → requestor
//!   OPEN ────┼── award  (requestor) ──▶ AWARDED     bounty → winner
//!            └── expire (anyone)    ──▶ EXPIRED     refund → requestor
//!
//!   SUBMITTED ──▶ SELECTED ──forward──▶ PROPOSED
//!       └───────▶ REJECTED
//! ```
//!
//! ## Re-entrancy
//!
//! Ledger and factory calls happen only after every record change of the
//! operation is committed and the state lock is released. A collaborator
//! that calls back into the engine sees zero bounties and advanced statuses.

pub mod engine;
pub mod events;
pub mod forwarding;
pub mod registry;
pub mod sequence;
pub mod submissions;

pub use engine::RfpEngine;
pub use events::EventLog;
pub use forwarding::{InMemoryFactory, ProposalFactory};
pub use registry::{NewRfp, RfpRegistry};
pub use sequence::SequenceAllocator;
pub use submissions::SubmissionStore;

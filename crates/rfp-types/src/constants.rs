//! System-wide constants for the RFP escrow engine.

/// Default minimum lead time (in logical heights) between RFP creation and expiry.
pub const DEFAULT_MIN_DURATION: u64 = 100;

/// First identifier handed out by each sequence allocator.
///
/// Zero is never issued so that a zeroed id is always recognisably invalid.
pub const FIRST_SEQUENCE_ID: u64 = 1;

/// Maximum number of calls in a single submission payload.
pub const MAX_PAYLOAD_CALLS: usize = 10;

/// Domain separator for payload digests.
pub const PAYLOAD_DIGEST_DOMAIN: &[u8] = b"rfp-escrow:payload:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "RfpEscrow";

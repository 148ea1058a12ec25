//! Forwarding gateway: relays a winning payload to the proposal factory.
//!
//! The factory is external and untrusted. By the time it is called the
//! submission is already `Proposed`, so a re-entrant or repeated forward of
//! the same submission fails with `NotSelected` instead of re-forwarding.

use parking_lot::Mutex;
use rfp_types::{Address, Amount, Payload, PayloadColumns};

/// External proposal-broadcasting system.
pub trait ProposalFactory: Send + Sync {
    /// Create a proposal from the exact stored payload. No result is consulted.
    fn create_proposal(
        &self,
        targets: &[Address],
        values: &[Amount],
        signatures: &[String],
        call_data: &[Vec<u8>],
        description: &str,
    );
}

/// Hand `payload` to `factory` in its column layout.
pub fn forward(factory: &dyn ProposalFactory, payload: &Payload) {
    let PayloadColumns {
        targets,
        values,
        signatures,
        call_data,
        description,
    } = payload.columns();
    factory.create_proposal(&targets, &values, &signatures, &call_data, &description);
}

/// Factory that records every proposal it receives.
#[derive(Default)]
pub struct InMemoryFactory {
    received: Mutex<Vec<PayloadColumns>>,
}

impl InMemoryFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Proposals received so far, in arrival order.
    #[must_use]
    pub fn received(&self) -> Vec<PayloadColumns> {
        self.received.lock().clone()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.received.lock().len()
    }
}

impl ProposalFactory for InMemoryFactory {
    fn create_proposal(
        &self,
        targets: &[Address],
        values: &[Amount],
        signatures: &[String],
        call_data: &[Vec<u8>],
        description: &str,
    ) {
        self.received.lock().push(PayloadColumns {
            targets: targets.to_vec(),
            values: values.to_vec(),
            signatures: signatures.to_vec(),
            call_data: call_data.to_vec(),
            description: description.to_string(),
        });
    }
}

//! Submission payloads: the exact call batch forwarded when a submission wins.
//!
//! The external proposal factory takes four parallel columns
//! (`targets`, `values`, `signatures`, `call_data`). Internally the batch is
//! held as a row of [`ProposalCall`]s so the columns can never drift apart;
//! [`Payload::from_columns`] validates them on the way in and
//! [`Payload::columns`] rebuilds them unchanged on the way out.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Address, Amount, RfpError, constants};

/// A single call descriptor in a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalCall {
    pub target: Address,
    pub value: Amount,
    /// Function signature, e.g. `"transfer(address,uint256)"`.
    pub signature: String,
    pub call_data: Vec<u8>,
}

/// Column view handed to the proposal factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadColumns {
    pub targets: Vec<Address>,
    pub values: Vec<Amount>,
    pub signatures: Vec<String>,
    pub call_data: Vec<Vec<u8>>,
    pub description: String,
}

/// Ordered call batch plus a description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub calls: Vec<ProposalCall>,
    pub description: String,
}

impl Payload {
    /// Build a validated payload from rows.
    ///
    /// # Errors
    /// Returns [`RfpError::InvalidPayload`] if the batch is empty, too long,
    /// or carries a negative call value.
    pub fn new(calls: Vec<ProposalCall>, description: impl Into<String>) -> crate::Result<Self> {
        let payload = Self {
            calls,
            description: description.into(),
        };
        payload.validate()?;
        Ok(payload)
    }

    /// Build a validated payload from the factory's column layout.
    ///
    /// # Errors
    /// Returns [`RfpError::InvalidPayload`] if the columns differ in length,
    /// plus everything [`Payload::new`] rejects.
    pub fn from_columns(columns: PayloadColumns) -> crate::Result<Self> {
        let PayloadColumns {
            targets,
            values,
            signatures,
            call_data,
            description,
        } = columns;
        let n = targets.len();
        if values.len() != n || signatures.len() != n || call_data.len() != n {
            return Err(RfpError::InvalidPayload {
                reason: format!(
                    "column length mismatch: targets={n}, values={}, signatures={}, call_data={}",
                    values.len(),
                    signatures.len(),
                    call_data.len()
                ),
            });
        }
        let calls = targets
            .into_iter()
            .zip(values)
            .zip(signatures)
            .zip(call_data)
            .map(|(((target, value), signature), call_data)| ProposalCall {
                target,
                value,
                signature,
                call_data,
            })
            .collect();
        Self::new(calls, description)
    }

    /// Check structural validity.
    ///
    /// # Errors
    /// Returns [`RfpError::InvalidPayload`] describing the first violation.
    pub fn validate(&self) -> crate::Result<()> {
        if self.calls.is_empty() {
            return Err(RfpError::InvalidPayload {
                reason: "payload has no calls".into(),
            });
        }
        if self.calls.len() > constants::MAX_PAYLOAD_CALLS {
            return Err(RfpError::InvalidPayload {
                reason: format!(
                    "payload has {} calls, max {}",
                    self.calls.len(),
                    constants::MAX_PAYLOAD_CALLS
                ),
            });
        }
        if let Some((i, call)) = self
            .calls
            .iter()
            .enumerate()
            .find(|(_, c)| c.value < Amount::ZERO)
        {
            return Err(RfpError::InvalidPayload {
                reason: format!("call {i} has negative value {}", call.value),
            });
        }
        Ok(())
    }

    /// Split back into the factory's column layout, order preserved.
    #[must_use]
    pub fn columns(&self) -> PayloadColumns {
        PayloadColumns {
            targets: self.calls.iter().map(|c| c.target).collect(),
            values: self.calls.iter().map(|c| c.value).collect(),
            signatures: self.calls.iter().map(|c| c.signature.clone()).collect(),
            call_data: self.calls.iter().map(|c| c.call_data.clone()).collect(),
            description: self.description.clone(),
        }
    }

    /// SHA-256 over a length-prefixed canonical encoding.
    ///
    /// `SHA-256(domain || n || for each call: target || len(value) || value || len(sig) || sig || len(data) || data || len(desc) || desc)`
    #[must_use]
    pub fn digest(&self) -> [u8; 32] {
        fn put(hasher: &mut Sha256, bytes: &[u8]) {
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        }

        let mut hasher = Sha256::new();
        hasher.update(constants::PAYLOAD_DIGEST_DOMAIN);
        hasher.update((self.calls.len() as u64).to_le_bytes());
        for call in &self.calls {
            hasher.update(call.target.as_bytes());
            put(&mut hasher, call.value.normalize().to_string().as_bytes());
            put(&mut hasher, call.signature.as_bytes());
            put(&mut hasher, &call.call_data);
        }
        put(&mut hasher, self.description.as_bytes());
        hasher.finalize().into()
    }

    /// Hex form of [`Payload::digest`], for logs and audit records.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest())
    }
}

/// Dummy payload for unit tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Payload {
    /// One-call payload sending `value` to a random target.
    pub fn dummy(value: Amount) -> Self {
        Self {
            calls: vec![ProposalCall {
                target: Address::random(),
                value,
                signature: "transfer(address,uint256)".into(),
                call_data: rand::random::<[u8; 32]>().to_vec(),
            }],
            description: "dummy proposal".into(),
        }
    }
}

//! Submission store.
//!
//! Flat table keyed by the global [`SubmissionId`], plus an
//! `RfpId → [SubmissionId]` index in filing order. A submission can be
//! looked up without knowing its RFP; operations that name both ids check
//! them against each other via [`Submission::ensure_targets`].

use std::collections::HashMap;

use rfp_types::{
    Address, Payload, Result, RfpError, RfpId, Submission, SubmissionId, SubmissionStatus,
};

use crate::sequence::SequenceAllocator;

pub struct SubmissionStore {
    submissions: HashMap<SubmissionId, Submission>,
    by_rfp: HashMap<RfpId, Vec<SubmissionId>>,
    sequence: SequenceAllocator,
}

impl SubmissionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_allocator(SequenceAllocator::new())
    }

    #[must_use]
    pub fn with_allocator(sequence: SequenceAllocator) -> Self {
        Self {
            submissions: HashMap::new(),
            by_rfp: HashMap::new(),
            sequence,
        }
    }

    /// File a new `Submitted` record. The caller has already checked the RFP.
    pub fn insert(
        &mut self,
        rfp_id: RfpId,
        creator: Address,
        description: String,
        payload: Payload,
    ) -> SubmissionId {
        let id = SubmissionId(self.sequence.issue());
        self.submissions.insert(
            id,
            Submission {
                id,
                rfp_id,
                creator,
                description,
                payload,
                status: SubmissionStatus::Submitted,
            },
        );
        self.by_rfp.entry(rfp_id).or_default().push(id);
        id
    }

    /// # Errors
    /// Returns [`RfpError::SubmissionNotFound`] for an unknown id.
    pub fn get(&self, id: SubmissionId) -> Result<&Submission> {
        self.submissions
            .get(&id)
            .ok_or(RfpError::SubmissionNotFound(id))
    }

    /// # Errors
    /// Returns [`RfpError::SubmissionNotFound`] for an unknown id.
    pub fn get_mut(&mut self, id: SubmissionId) -> Result<&mut Submission> {
        self.submissions
            .get_mut(&id)
            .ok_or(RfpError::SubmissionNotFound(id))
    }

    /// Submissions filed against `rfp_id`, in filing order.
    pub fn for_rfp(&self, rfp_id: RfpId) -> impl Iterator<Item = &Submission> {
        self.by_rfp
            .get(&rfp_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.submissions.get(id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.submissions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.submissions.is_empty()
    }
}

impl Default for SubmissionStore {
    fn default() -> Self {
        Self::new()
    }
}

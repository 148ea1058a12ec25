//! The serialized RFP engine.
//!
//! All records live behind one mutex: holding it is holding the single
//! execution slot. Every mutating operation runs in three phases:
//!
//! ```text
//! check:    every precondition, under the lock, nothing mutated
//! commit:   all record changes + notifications, same lock
//! interact: lock dropped, then ledger / factory calls
//! ```
//!
//! External collaborators may re-enter any operation during the interact
//! phase. They can only ever observe committed state: a bounty that is being
//! paid out is already zero, a submission being forwarded is already
//! `Proposed`.

use std::sync::Arc;

use parking_lot::Mutex;
use rfp_custody::{CustodyConservation, Escrow, Payout, PendingWithdrawals, TokenLedger};
use rfp_types::{
    Address, Amount, BlockHeight, CallContext, EngineConfig, EventRecord, Notification, Payload,
    Result, Rfp, RfpError, RfpId, RfpStatus, Submission, SubmissionId, SubmissionStatus,
    constants,
};
use tracing::{info, warn};

use crate::events::EventLog;
use crate::forwarding::{self, ProposalFactory};
use crate::registry::{NewRfp, RfpRegistry};
use crate::submissions::SubmissionStore;

/// Everything guarded by the execution slot.
#[derive(Default)]
struct EngineState {
    registry: RfpRegistry,
    submissions: SubmissionStore,
    pending: PendingWithdrawals,
    conservation: CustodyConservation,
    events: EventLog,
}

/// Custodial RFP workflow engine.
pub struct RfpEngine {
    config: EngineConfig,
    state: Mutex<EngineState>,
    escrow: Escrow,
    factory: Arc<dyn ProposalFactory>,
}

impl RfpEngine {
    /// Build an engine over the given ledger and factory.
    ///
    /// # Errors
    /// Returns `Configuration` if `config` fails validation.
    pub fn new(
        config: EngineConfig,
        ledger: Arc<dyn TokenLedger>,
        factory: Arc<dyn ProposalFactory>,
    ) -> Result<Self> {
        config.validate()?;
        info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            custody = %config.custody,
            token_ledger = %config.token_ledger,
            factory = %config.factory,
            min_duration = config.min_duration,
            "RFP engine initialised"
        );
        Ok(Self {
            escrow: Escrow::new(config.custody, ledger),
            config,
            state: Mutex::new(EngineState::default()),
            factory,
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // =================================================================
    // RFP Registry
    // =================================================================

    /// Create an RFP funded with `bounty` pulled from the caller.
    ///
    /// The inbound lock transfer runs before the RFP record is committed, so
    /// a refused transfer leaves no record and a re-entrant call sees nothing
    /// of this RFP.
    ///
    /// # Errors
    /// - `InvalidDuration` unless `expiry > now + min_duration`
    /// - `InvalidAmount` if `bounty` is not positive or would overflow the
    ///   custody total
    /// - `TransferFailed` if the ledger refuses the lock
    pub fn create_rfp(
        &self,
        ctx: &CallContext,
        description: impl Into<String>,
        expiry: BlockHeight,
        bounty: Amount,
    ) -> Result<RfpId> {
        RfpRegistry::check_expiry(ctx.height, expiry, self.config.min_duration)?;
        let description = description.into();

        // Reserve headroom in the custody total before any value moves.
        self.state.lock().conservation.record_lock(bounty)?;
        if let Err(err) = self.escrow.lock(ctx.caller, bounty) {
            self.state.lock().conservation.revert_lock(bounty);
            return Err(err);
        }

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let id = state.registry.insert(NewRfp {
            requestor: ctx.caller,
            created_at: ctx.height,
            expiry,
            description: description.clone(),
            bounty,
        });
        state.events.emit(
            ctx.height,
            Notification::RfpCreated {
                rfp_id: id,
                creator: ctx.caller,
                bounty,
                expiry,
                description,
            },
        );
        info!(rfp = %id, requestor = %ctx.caller, bounty = %bounty, expiry = %expiry, "RFP created");
        Ok(id)
    }

    /// Withdraw an open RFP and refund its bounty to the requestor.
    ///
    /// # Errors
    /// - `RfpNotFound` for an unknown id
    /// - `Unauthorized` unless the caller is the requestor
    /// - `AlreadyAwarded` if the bounty went to a winner
    /// - `NotOpen` if the RFP was already cancelled or expired
    pub fn cancel_rfp(&self, ctx: &CallContext, rfp_id: RfpId) -> Result<Payout> {
        let (requestor, refund) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let rfp = state.registry.get_mut(rfp_id)?;
            ensure_requestor(rfp, ctx.caller)?;
            let refund = rfp.settle(RfpStatus::Cancelled)?;
            state.events.emit(
                ctx.height,
                Notification::RfpStatusChanged {
                    rfp_id,
                    status: RfpStatus::Cancelled,
                },
            );
            info!(rfp = %rfp_id, refund = %refund, "RFP cancelled");
            (rfp.requestor, refund)
        };
        Ok(self.release(ctx.height, requestor, refund))
    }

    /// Sweep an open RFP whose award window has passed and refund the requestor.
    /// Callable by anyone.
    ///
    /// # Errors
    /// - `RfpNotFound` for an unknown id
    /// - `NotOpen` if the RFP already left `Open`
    /// - `NotExpired` while `now <= expiry`
    pub fn expire_rfp(&self, ctx: &CallContext, rfp_id: RfpId) -> Result<Payout> {
        let (requestor, refund) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let rfp = state.registry.get_mut(rfp_id)?;
            ensure_open(rfp)?;
            if !rfp.is_expired_at(ctx.height) {
                return Err(RfpError::NotExpired {
                    rfp: rfp_id,
                    expiry: rfp.expiry,
                    now: ctx.height,
                });
            }
            let refund = rfp.settle(RfpStatus::Expired)?;
            state.events.emit(
                ctx.height,
                Notification::RfpStatusChanged {
                    rfp_id,
                    status: RfpStatus::Expired,
                },
            );
            info!(rfp = %rfp_id, refund = %refund, swept_by = %ctx.caller, "RFP expired");
            (rfp.requestor, refund)
        };
        Ok(self.release(ctx.height, requestor, refund))
    }

    // =================================================================
    // Submission Store
    // =================================================================

    /// File a proposal against an open RFP.
    ///
    /// # Errors
    /// - `RfpNotFound` for an unknown RFP
    /// - `NotOpen` unless the RFP is `Open`
    /// - `InvalidPayload` for a malformed payload
    pub fn submit_proposal(
        &self,
        ctx: &CallContext,
        rfp_id: RfpId,
        description: impl Into<String>,
        payload: Payload,
    ) -> Result<SubmissionId> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        ensure_open(state.registry.get(rfp_id)?)?;
        payload.validate()?;

        let digest = payload.digest_hex();
        let id = state
            .submissions
            .insert(rfp_id, ctx.caller, description.into(), payload);
        state.events.emit(
            ctx.height,
            Notification::SubmissionCreated {
                submission_id: id,
                creator: ctx.caller,
                rfp_id,
            },
        );
        info!(rfp = %rfp_id, submission = %id, creator = %ctx.caller, payload = %digest, "Submission filed");
        Ok(id)
    }

    /// Reject a submission on one of the caller's open RFPs.
    ///
    /// # Errors
    /// - `RfpNotFound` / `SubmissionNotFound` for unknown ids
    /// - `Unauthorized` unless the caller is the requestor
    /// - `NotOpen` unless the RFP is `Open`
    /// - `InvalidSubmissionState` if the submission targets another RFP or is not `Submitted`
    pub fn reject_submission(
        &self,
        ctx: &CallContext,
        rfp_id: RfpId,
        submission_id: SubmissionId,
    ) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let rfp = state.registry.get(rfp_id)?;
        ensure_requestor(rfp, ctx.caller)?;
        ensure_open(rfp)?;
        let submission = state.submissions.get_mut(submission_id)?;
        submission.ensure_targets(rfp_id)?;
        submission.mark_rejected()?;
        state.events.emit(
            ctx.height,
            Notification::SubmissionStatusChanged {
                rfp_id,
                submission_id,
                status: SubmissionStatus::Rejected,
            },
        );
        info!(rfp = %rfp_id, submission = %submission_id, "Submission rejected");
        Ok(())
    }

    // =================================================================
    // Escrow & Settlement
    // =================================================================

    /// Award `submission_id` and pay the bounty to its creator.
    ///
    /// Every precondition is checked before anything changes; a failure
    /// leaves all records untouched.
    ///
    /// # Errors
    /// - `RfpNotFound` / `SubmissionNotFound` for unknown ids
    /// - `Unauthorized` unless the caller is the requestor
    /// - `NotOpen` unless the RFP is `Open` (including a second award)
    /// - `Expired` if `now > expiry`
    /// - `InvalidSubmissionState` if the submission targets another RFP or is not `Submitted`
    pub fn award_submission(
        &self,
        ctx: &CallContext,
        rfp_id: RfpId,
        submission_id: SubmissionId,
    ) -> Result<Payout> {
        let (winner, bounty) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;

            // check
            let rfp = state.registry.get(rfp_id)?;
            ensure_requestor(rfp, ctx.caller)?;
            ensure_open(rfp)?;
            if rfp.is_expired_at(ctx.height) {
                return Err(RfpError::Expired {
                    rfp: rfp_id,
                    expiry: rfp.expiry,
                    now: ctx.height,
                });
            }
            let submission = state.submissions.get(submission_id)?;
            submission.ensure_targets(rfp_id)?;
            if submission.status != SubmissionStatus::Submitted {
                return Err(RfpError::InvalidSubmissionState {
                    submission: submission_id,
                    reason: format!("status is {}, expected SUBMITTED", submission.status),
                });
            }

            // commit
            let bounty = state.registry.get_mut(rfp_id)?.settle(RfpStatus::Awarded)?;
            let submission = state.submissions.get_mut(submission_id)?;
            submission.mark_selected()?;
            let winner = submission.creator;
            state.events.emit(
                ctx.height,
                Notification::RfpStatusChanged {
                    rfp_id,
                    status: RfpStatus::Awarded,
                },
            );
            state.events.emit(
                ctx.height,
                Notification::SubmissionStatusChanged {
                    rfp_id,
                    submission_id,
                    status: SubmissionStatus::Selected,
                },
            );
            info!(rfp = %rfp_id, submission = %submission_id, winner = %winner, bounty = %bounty, "Submission awarded");
            (winner, bounty)
        };
        Ok(self.release(ctx.height, winner, bounty))
    }

    /// Collect payouts that were deferred because their release transfer failed.
    ///
    /// The owed entry is cleared before the transfer and restored if the
    /// ledger refuses again.
    ///
    /// # Errors
    /// - `NothingToWithdraw` if nothing is owed to the caller
    /// - `TransferFailed` if the ledger refuses; the debt is kept
    pub fn withdraw_pending(&self, ctx: &CallContext) -> Result<Amount> {
        let amount = self.state.lock().pending.take(ctx.caller)?;

        match self.escrow.release(ctx.caller, amount) {
            Payout::Paid { .. } => {
                let mut guard = self.state.lock();
                let state = &mut *guard;
                state.conservation.record_release(amount);
                state.events.emit(
                    ctx.height,
                    Notification::PendingWithdrawn {
                        beneficiary: ctx.caller,
                        amount,
                    },
                );
                info!(beneficiary = %ctx.caller, amount = %amount, "Deferred payout collected");
                Ok(amount)
            }
            Payout::Deferred { .. } => {
                self.state.lock().pending.credit(ctx.caller, amount);
                warn!(beneficiary = %ctx.caller, amount = %amount, "Deferred payout still refused");
                Err(RfpError::TransferFailed {
                    amount,
                    reason: format!("ledger refused payout to {}", ctx.caller),
                })
            }
        }
    }

    /// Interact phase of every release. Callers must have dropped the lock
    /// and committed the bookkeeping that zeroed `amount`.
    fn release(&self, height: BlockHeight, to: Address, amount: Amount) -> Payout {
        let payout = self.escrow.release(to, amount);

        let mut guard = self.state.lock();
        let state = &mut *guard;
        match payout {
            Payout::Paid { .. } => state.conservation.record_release(amount),
            Payout::Deferred { .. } => {
                state.pending.credit(to, amount);
                state.events.emit(
                    height,
                    Notification::PayoutDeferred {
                        beneficiary: to,
                        amount,
                    },
                );
                warn!(beneficiary = %to, amount = %amount, "Release failed; payout deferred");
            }
        }
        payout
    }

    // =================================================================
    // Forwarding Gateway
    // =================================================================

    /// Forward a selected submission's payload to the proposal factory.
    /// Callable by anyone; succeeds at most once per submission.
    ///
    /// # Errors
    /// - `SubmissionNotFound` for an unknown id
    /// - `InvalidSubmissionState` if the submission targets another RFP
    /// - `NotSelected` unless the submission is `Selected`
    pub fn forward_to_external(
        &self,
        ctx: &CallContext,
        rfp_id: RfpId,
        submission_id: SubmissionId,
    ) -> Result<()> {
        let payload = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let submission = state.submissions.get_mut(submission_id)?;
            submission.ensure_targets(rfp_id)?;
            submission.mark_proposed()?;
            let payload = submission.payload.clone();
            state.events.emit(
                ctx.height,
                Notification::SubmissionStatusChanged {
                    rfp_id,
                    submission_id,
                    status: SubmissionStatus::Proposed,
                },
            );
            payload
        };

        forwarding::forward(self.factory.as_ref(), &payload);
        info!(
            rfp = %rfp_id,
            submission = %submission_id,
            forwarded_by = %ctx.caller,
            payload = %payload.digest_hex(),
            "Payload forwarded"
        );
        Ok(())
    }

    // =================================================================
    // Queries
    // =================================================================

    /// # Errors
    /// Returns `RfpNotFound` for an unknown id.
    pub fn rfp(&self, id: RfpId) -> Result<Rfp> {
        self.state.lock().registry.get(id).cloned()
    }

    /// # Errors
    /// Returns `SubmissionNotFound` for an unknown id.
    pub fn submission(&self, id: SubmissionId) -> Result<Submission> {
        self.state.lock().submissions.get(id).cloned()
    }

    /// Submissions filed against `rfp_id`, in filing order.
    #[must_use]
    pub fn submissions_for(&self, rfp_id: RfpId) -> Vec<Submission> {
        self.state
            .lock()
            .submissions
            .for_rfp(rfp_id)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn open_rfps(&self) -> Vec<Rfp> {
        self.state.lock().registry.open().cloned().collect()
    }

    #[must_use]
    pub fn rfp_count(&self) -> usize {
        self.state.lock().registry.len()
    }

    #[must_use]
    pub fn submission_count(&self) -> usize {
        self.state.lock().submissions.len()
    }

    /// Amount owed to `beneficiary` from deferred payouts.
    #[must_use]
    pub fn pending_withdrawal(&self, beneficiary: Address) -> Amount {
        self.state.lock().pending.owed(beneficiary)
    }

    #[must_use]
    pub fn events(&self) -> Vec<EventRecord> {
        self.state.lock().events.all().to_vec()
    }

    /// Records with `seq >= from`.
    #[must_use]
    pub fn events_since(&self, from: u64) -> Vec<EventRecord> {
        self.state.lock().events.since(from).to_vec()
    }

    /// Export the audit trail as JSON.
    ///
    /// # Errors
    /// Returns `Serialization` if encoding fails.
    pub fn events_json(&self) -> Result<String> {
        self.state.lock().events.to_json()
    }

    /// Check both custody invariants against the ledger's balance for the
    /// custody account. Only meaningful while no transfer is in flight.
    ///
    /// # Errors
    /// Returns `CustodyInvariantViolation` describing the mismatch.
    pub fn verify_custody(&self, custody_balance: Amount) -> Result<()> {
        let state = self.state.lock();
        state.conservation.verify_balance(custody_balance)?;
        state
            .conservation
            .verify_obligations(state.registry.open_bounty_total()?, state.pending.total()?)
    }
}

fn ensure_requestor(rfp: &Rfp, caller: Address) -> Result<()> {
    if rfp.requestor != caller {
        warn!(rfp = %rfp.id, caller = %caller, "Caller is not the requestor");
        return Err(RfpError::Unauthorized {
            reason: format!("{caller} is not the requestor of {}", rfp.id),
        });
    }
    Ok(())
}

fn ensure_open(rfp: &Rfp) -> Result<()> {
    if !rfp.is_open() {
        return Err(RfpError::NotOpen {
            rfp: rfp.id,
            status: rfp.status,
        });
    }
    Ok(())
}

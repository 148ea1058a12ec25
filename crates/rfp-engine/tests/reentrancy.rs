//! Hostile-collaborator tests.
//!
//! The ledger and the proposal factory are untrusted: they may call back
//! into the engine before returning, or refuse transfers. These tests check
//! that a callback only ever sees committed state, that custody pays out
//! each bounty exactly once, and that refused payouts are owed rather than
//! lost.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rfp_custody::{InMemoryLedger, Payout, TokenLedger};
use rfp_engine::{InMemoryFactory, ProposalFactory, RfpEngine};
use rfp_types::*;
use rust_decimal::Decimal;

fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

fn at(caller: Address, height: u64) -> CallContext {
    CallContext::new(caller, height)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config(custody: Address) -> EngineConfig {
    init_tracing();
    EngineConfig::new(custody, Address::random(), Address::random()).with_min_duration(10)
}

// =========================================================================
// Re-entrant ledger
// =========================================================================

/// What the ledger does from inside a payout.
#[derive(Clone, Copy)]
enum Attack {
    Cancel(CallContext, RfpId),
    Award(CallContext, RfpId, SubmissionId),
    Withdraw(CallContext),
    Expire(CallContext, RfpId),
}

/// Ledger that fires one attack the first time value leaves custody.
struct ReentrantLedger {
    inner: InMemoryLedger,
    custody: Address,
    engine: Mutex<Option<Arc<RfpEngine>>>,
    attack: Mutex<Option<Attack>>,
    outcomes: Mutex<Vec<Result<Payout>>>,
    observed: Mutex<Vec<Rfp>>,
}

impl ReentrantLedger {
    fn new(custody: Address) -> Self {
        Self {
            inner: InMemoryLedger::new(),
            custody,
            engine: Mutex::new(None),
            attack: Mutex::new(None),
            outcomes: Mutex::new(Vec::new()),
            observed: Mutex::new(Vec::new()),
        }
    }

    fn arm(&self, attack: Attack) {
        *self.attack.lock() = Some(attack);
    }
}

impl TokenLedger for ReentrantLedger {
    fn transfer(&self, from: Address, to: Address, amount: Amount) -> bool {
        let ok = self.inner.transfer(from, to, amount);
        if from != self.custody {
            return ok;
        }
        let attack = self.attack.lock().take();
        let engine = self.engine.lock().clone();
        if let (Some(attack), Some(engine)) = (attack, engine) {
            let outcome = match attack {
                Attack::Cancel(ctx, rfp) => {
                    if let Ok(r) = engine.rfp(rfp) {
                        self.observed.lock().push(r);
                    }
                    engine.cancel_rfp(&ctx, rfp)
                }
                Attack::Award(ctx, rfp, sub) => engine.award_submission(&ctx, rfp, sub),
                Attack::Withdraw(ctx) => engine.withdraw_pending(&ctx).map(|amount| Payout::Paid {
                    to: ctx.caller,
                    amount,
                }),
                Attack::Expire(ctx, rfp) => engine.expire_rfp(&ctx, rfp),
            };
            self.outcomes.lock().push(outcome);
        }
        ok
    }
}

struct Hostile {
    engine: Arc<RfpEngine>,
    ledger: Arc<ReentrantLedger>,
    custody: Address,
}

fn hostile() -> Hostile {
    let custody = Address::random();
    let ledger = Arc::new(ReentrantLedger::new(custody));
    let engine = Arc::new(
        RfpEngine::new(config(custody), ledger.clone(), Arc::new(InMemoryFactory::new()))
            .expect("valid config"),
    );
    *ledger.engine.lock() = Some(engine.clone());
    Hostile {
        engine,
        ledger,
        custody,
    }
}

impl Hostile {
    fn funded(&self, amount: i64) -> Address {
        let who = Address::random();
        self.ledger.inner.deposit(who, dec(amount));
        who
    }

    fn assert_conserved(&self) {
        self.engine
            .verify_custody(self.ledger.inner.balance_of(self.custody))
            .expect("custody conserved");
    }
}

#[test]
fn cancel_during_award_payout_sees_awarded() {
    let h = hostile();
    let requestor = h.funded(100);
    let creator = Address::random();
    let rfp_id = h
        .engine
        .create_rfp(&at(requestor, 0), "rfp", BlockHeight(50), dec(100))
        .unwrap();
    let sub_id = h
        .engine
        .submit_proposal(&at(creator, 1), rfp_id, "p", Payload::dummy(dec(0)))
        .unwrap();

    h.ledger.arm(Attack::Cancel(at(requestor, 2), rfp_id));
    let payout = h
        .engine
        .award_submission(&at(requestor, 2), rfp_id, sub_id)
        .unwrap();
    assert!(payout.is_paid());

    let observed = h.ledger.observed.lock().clone();
    assert_eq!(observed.len(), 1);
    assert_eq!(observed[0].status, RfpStatus::Awarded);
    assert_eq!(observed[0].bounty, Decimal::ZERO);

    let outcomes = h.ledger.outcomes.lock();
    assert!(matches!(outcomes[0], Err(RfpError::AlreadyAwarded(_))));
    drop(outcomes);

    assert_eq!(h.ledger.inner.balance_of(creator), dec(100));
    assert_eq!(h.ledger.inner.balance_of(requestor), Decimal::ZERO);
    h.assert_conserved();
}

#[test]
fn second_award_during_payout_fails() {
    let h = hostile();
    let requestor = h.funded(100);
    let rfp_id = h
        .engine
        .create_rfp(&at(requestor, 0), "rfp", BlockHeight(50), dec(100))
        .unwrap();
    let first = h
        .engine
        .submit_proposal(&at(Address::random(), 1), rfp_id, "a", Payload::dummy(dec(0)))
        .unwrap();
    let second = h
        .engine
        .submit_proposal(&at(Address::random(), 1), rfp_id, "b", Payload::dummy(dec(0)))
        .unwrap();

    h.ledger.arm(Attack::Award(at(requestor, 2), rfp_id, second));
    h.engine
        .award_submission(&at(requestor, 2), rfp_id, first)
        .unwrap();

    assert!(matches!(
        h.ledger.outcomes.lock()[0],
        Err(RfpError::NotOpen { .. })
    ));
    assert_eq!(
        h.engine.submission(second).unwrap().status,
        SubmissionStatus::Submitted
    );
    assert_eq!(h.ledger.inner.balance_of(h.custody), Decimal::ZERO);
    h.assert_conserved();
}

#[test]
fn recancel_during_refund_fails() {
    let h = hostile();
    let requestor = h.funded(70);
    let rfp_id = h
        .engine
        .create_rfp(&at(requestor, 0), "rfp", BlockHeight(50), dec(70))
        .unwrap();

    h.ledger.arm(Attack::Cancel(at(requestor, 1), rfp_id));
    h.engine.cancel_rfp(&at(requestor, 1), rfp_id).unwrap();

    assert!(matches!(
        h.ledger.outcomes.lock()[0],
        Err(RfpError::NotOpen {
            status: RfpStatus::Cancelled,
            ..
        })
    ));
    assert_eq!(h.ledger.inner.balance_of(requestor), dec(70));
    h.assert_conserved();
}

#[test]
fn expire_during_refund_fails() {
    let h = hostile();
    let requestor = h.funded(30);
    let rfp_id = h
        .engine
        .create_rfp(&at(requestor, 0), "rfp", BlockHeight(50), dec(30))
        .unwrap();

    h.ledger.arm(Attack::Expire(at(Address::random(), 60), rfp_id));
    h.engine
        .expire_rfp(&at(Address::random(), 60), rfp_id)
        .unwrap();

    assert!(matches!(
        h.ledger.outcomes.lock()[0],
        Err(RfpError::NotOpen { .. })
    ));
    assert_eq!(h.ledger.inner.balance_of(requestor), dec(30));
    h.assert_conserved();
}

#[test]
fn withdraw_during_payout_finds_nothing() {
    let h = hostile();
    let requestor = h.funded(20);
    let rfp_id = h
        .engine
        .create_rfp(&at(requestor, 0), "rfp", BlockHeight(50), dec(20))
        .unwrap();

    h.ledger.arm(Attack::Withdraw(at(requestor, 1)));
    h.engine.cancel_rfp(&at(requestor, 1), rfp_id).unwrap();

    assert!(matches!(
        h.ledger.outcomes.lock()[0],
        Err(RfpError::NothingToWithdraw)
    ));
    assert_eq!(h.ledger.inner.balance_of(requestor), dec(20));
    h.assert_conserved();
}

// =========================================================================
// Re-entrant factory
// =========================================================================

/// Factory that tries to forward the same submission again from inside
/// `create_proposal`.
struct ReentrantFactory {
    engine: Mutex<Option<Arc<RfpEngine>>>,
    target: Mutex<Option<(RfpId, SubmissionId)>>,
    calls: Mutex<usize>,
    observed: Mutex<Vec<SubmissionStatus>>,
    outcomes: Mutex<Vec<Result<()>>>,
}

impl ProposalFactory for ReentrantFactory {
    fn create_proposal(
        &self,
        _targets: &[Address],
        _values: &[Amount],
        _signatures: &[String],
        _call_data: &[Vec<u8>],
        _description: &str,
    ) {
        *self.calls.lock() += 1;
        let target = self.target.lock().take();
        let engine = self.engine.lock().clone();
        if let (Some((rfp, sub)), Some(engine)) = (target, engine) {
            if let Ok(s) = engine.submission(sub) {
                self.observed.lock().push(s.status);
            }
            let outcome = engine.forward_to_external(&at(Address::random(), 9), rfp, sub);
            self.outcomes.lock().push(outcome);
        }
    }
}

#[test]
fn reforward_during_forward_fails() {
    let ledger = Arc::new(InMemoryLedger::new());
    let factory = Arc::new(ReentrantFactory {
        engine: Mutex::new(None),
        target: Mutex::new(None),
        calls: Mutex::new(0),
        observed: Mutex::new(Vec::new()),
        outcomes: Mutex::new(Vec::new()),
    });
    let engine = Arc::new(
        RfpEngine::new(config(Address::random()), ledger.clone(), factory.clone())
            .expect("valid config"),
    );
    *factory.engine.lock() = Some(engine.clone());

    let requestor = Address::random();
    ledger.deposit(requestor, dec(10));
    let rfp_id = engine
        .create_rfp(&at(requestor, 0), "rfp", BlockHeight(50), dec(10))
        .unwrap();
    let sub_id = engine
        .submit_proposal(&at(Address::random(), 1), rfp_id, "p", Payload::dummy(dec(0)))
        .unwrap();
    engine
        .award_submission(&at(requestor, 2), rfp_id, sub_id)
        .unwrap();

    *factory.target.lock() = Some((rfp_id, sub_id));
    engine
        .forward_to_external(&at(Address::random(), 3), rfp_id, sub_id)
        .unwrap();

    assert_eq!(*factory.calls.lock(), 1);
    assert_eq!(
        factory.observed.lock().as_slice(),
        &[SubmissionStatus::Proposed]
    );
    assert!(matches!(
        factory.outcomes.lock()[0],
        Err(RfpError::NotSelected { .. })
    ));
}

// =========================================================================
// Refusing ledger
// =========================================================================

/// Ledger that can be told to refuse every transfer out of custody.
struct RefusingLedger {
    inner: InMemoryLedger,
    custody: Address,
    refuse_payouts: AtomicBool,
}

impl TokenLedger for RefusingLedger {
    fn transfer(&self, from: Address, to: Address, amount: Amount) -> bool {
        if from == self.custody && self.refuse_payouts.load(Ordering::SeqCst) {
            return false;
        }
        self.inner.transfer(from, to, amount)
    }
}

#[test]
fn refused_payout_is_deferred_then_withdrawn() {
    let custody = Address::random();
    let ledger = Arc::new(RefusingLedger {
        inner: InMemoryLedger::new(),
        custody,
        refuse_payouts: AtomicBool::new(true),
    });
    let engine = RfpEngine::new(config(custody), ledger.clone(), Arc::new(InMemoryFactory::new()))
        .expect("valid config");
    let conserved = || {
        engine
            .verify_custody(ledger.inner.balance_of(custody))
            .expect("custody conserved");
    };

    let requestor = Address::random();
    let creator = Address::random();
    ledger.inner.deposit(requestor, dec(100));
    let rfp_id = engine
        .create_rfp(&at(requestor, 0), "rfp", BlockHeight(50), dec(100))
        .unwrap();
    let sub_id = engine
        .submit_proposal(&at(creator, 1), rfp_id, "p", Payload::dummy(dec(0)))
        .unwrap();

    let payout = engine
        .award_submission(&at(requestor, 2), rfp_id, sub_id)
        .unwrap();
    assert_eq!(
        payout,
        Payout::Deferred {
            to: creator,
            amount: dec(100)
        }
    );

    // Transition is not rolled back; the winner is owed instead.
    let rfp = engine.rfp(rfp_id).unwrap();
    assert_eq!(rfp.status, RfpStatus::Awarded);
    assert_eq!(rfp.bounty, Decimal::ZERO);
    assert_eq!(engine.pending_withdrawal(creator), dec(100));
    assert!(engine.events().iter().any(|e| e.notification
        == Notification::PayoutDeferred {
            beneficiary: creator,
            amount: dec(100),
        }));
    conserved();

    // Retry while still refused keeps the debt.
    let err = engine.withdraw_pending(&at(creator, 3)).unwrap_err();
    assert!(matches!(err, RfpError::TransferFailed { .. }));
    assert_eq!(engine.pending_withdrawal(creator), dec(100));
    conserved();

    ledger.refuse_payouts.store(false, Ordering::SeqCst);
    assert_eq!(engine.withdraw_pending(&at(creator, 4)).unwrap(), dec(100));
    assert_eq!(ledger.inner.balance_of(creator), dec(100));
    assert_eq!(engine.pending_withdrawal(creator), Decimal::ZERO);
    assert!(matches!(
        engine.events().last().map(|e| &e.notification),
        Some(Notification::PendingWithdrawn { .. })
    ));
    conserved();

    let err = engine.withdraw_pending(&at(creator, 5)).unwrap_err();
    assert!(matches!(err, RfpError::NothingToWithdraw));
}

#[test]
fn refused_refunds_accumulate_per_beneficiary() {
    let custody = Address::random();
    let ledger = Arc::new(RefusingLedger {
        inner: InMemoryLedger::new(),
        custody,
        refuse_payouts: AtomicBool::new(true),
    });
    let engine = RfpEngine::new(config(custody), ledger.clone(), Arc::new(InMemoryFactory::new()))
        .expect("valid config");

    let requestor = Address::random();
    ledger.inner.deposit(requestor, dec(100));
    let a = engine
        .create_rfp(&at(requestor, 0), "a", BlockHeight(50), dec(30))
        .unwrap();
    let b = engine
        .create_rfp(&at(requestor, 0), "b", BlockHeight(50), dec(45))
        .unwrap();

    assert!(!engine.cancel_rfp(&at(requestor, 1), a).unwrap().is_paid());
    assert!(!engine.expire_rfp(&at(Address::random(), 51), b).unwrap().is_paid());
    assert_eq!(engine.pending_withdrawal(requestor), dec(75));
    engine
        .verify_custody(ledger.inner.balance_of(custody))
        .unwrap();

    ledger.refuse_payouts.store(false, Ordering::SeqCst);
    assert_eq!(engine.withdraw_pending(&at(requestor, 52)).unwrap(), dec(75));
    assert_eq!(ledger.inner.balance_of(requestor), dec(100));
    engine.verify_custody(Decimal::ZERO).unwrap();
}

#[test]
fn custody_leak_detected() {
    let custody = Address::random();
    let ledger = Arc::new(InMemoryLedger::new());
    let engine = RfpEngine::new(config(custody), ledger.clone(), Arc::new(InMemoryFactory::new()))
        .expect("valid config");
    let requestor = Address::random();
    ledger.deposit(requestor, dec(10));
    engine
        .create_rfp(&at(requestor, 0), "rfp", BlockHeight(50), dec(10))
        .unwrap();

    // Value leaves custody behind the engine's back.
    assert!(ledger.transfer(custody, Address::random(), dec(1)));
    let err = engine
        .verify_custody(ledger.balance_of(custody))
        .unwrap_err();
    assert!(matches!(err, RfpError::CustodyInvariantViolation { .. }));
}

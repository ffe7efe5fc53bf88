//! Ledger audit: journal digests, completeness checks, and store
//! cross-checks.
//!
//! Completeness invariant, checked per account:
//! ```text
//! balance == opening_balance + Σ(credits) − Σ(debits)
//! ```
//! Rejected debits contribute nothing. Each entry's `balance_before` must
//! equal the previous entry's `balance_after`.

use serde::Serialize;
use sha2::{Digest, Sha256};
use streetcredit_store::SettlementStore;
use streetcredit_types::{
    Account, BalanceRequestStatus, CreditError, Credits, LedgerEntry, LedgerEntryKind,
    OrderStatus, Result, SettlementKey, UserId,
};

use crate::ledger::Ledger;

/// Deterministic hash over a journal.
///
/// Depends on entry keys, kinds, amounts and balances, in order. Timestamps
/// are left out so two ledgers that made the same decisions agree.
#[must_use]
pub fn journal_digest(journal: &[LedgerEntry]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"streetcredit:journal:v1:");
    hasher.update((journal.len() as u64).to_le_bytes());

    for entry in journal {
        hasher.update(entry.key.tagged_bytes());
        hasher.update(entry.user_id.0.as_bytes());
        hasher.update([kind_tag(entry.kind)]);
        hasher.update(entry.amount.to_le_bytes());
        hasher.update(entry.balance_before.to_le_bytes());
        hasher.update(entry.balance_after.to_le_bytes());
    }

    let result = hasher.finalize();
    let mut root = [0u8; 32];
    root.copy_from_slice(&result);
    root
}

fn kind_tag(kind: LedgerEntryKind) -> u8 {
    match kind {
        LedgerEntryKind::Debit => b'd',
        LedgerEntryKind::Credit => b'c',
        LedgerEntryKind::RejectedDebit => b'r',
    }
}

/// Verify that `account.balance` is fully explained by its journal.
///
/// # Errors
/// Returns [`CreditError::LedgerInvariantViolation`] on any mismatch.
pub fn verify_journal(account: &Account, journal: &[LedgerEntry]) -> Result<()> {
    let mut running: Credits = account.opening_balance;
    let mut credited: u128 = 0;
    let mut debited: u128 = 0;

    for (i, entry) in journal.iter().enumerate() {
        if entry.balance_before != running {
            return Err(violation(format!(
                "user {}: entry {i} ({}) starts at {} but previous balance was {running}",
                account.user_id, entry.key, entry.balance_before
            )));
        }
        let expected_after = match entry.kind {
            LedgerEntryKind::Debit => {
                debited += u128::from(entry.amount);
                entry.balance_before.checked_sub(entry.amount)
            }
            LedgerEntryKind::Credit => {
                credited += u128::from(entry.amount);
                entry.balance_before.checked_add(entry.amount)
            }
            LedgerEntryKind::RejectedDebit => {
                if entry.amount <= entry.balance_before {
                    return Err(violation(format!(
                        "user {}: debit {} of {} rejected with {} available",
                        account.user_id, entry.key, entry.amount, entry.balance_before
                    )));
                }
                Some(entry.balance_before)
            }
        };
        if expected_after != Some(entry.balance_after) {
            return Err(violation(format!(
                "user {}: entry {i} ({} {}) ends at {}, expected {expected_after:?}",
                account.user_id, entry.kind, entry.key, entry.balance_after
            )));
        }
        running = entry.balance_after;
    }

    let expected = u128::from(account.opening_balance) + credited;
    let actual = u128::from(account.balance) + debited;
    if running != account.balance || expected != actual {
        return Err(violation(format!(
            "user {}: balance {} != opening {} + credits {credited} - debits {debited}",
            account.user_id, account.balance, account.opening_balance
        )));
    }
    Ok(())
}

fn violation(reason: String) -> CreditError {
    tracing::error!(%reason, "ledger invariant violation");
    CreditError::LedgerInvariantViolation { reason }
}

/// Outcome of cross-checking one user's store records against the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub user_id: UserId,
    pub balance: Credits,
    pub journal_entries: usize,
    /// Hex-encoded [`journal_digest`].
    pub digest: String,
    /// Entities the ledger has decided but whose status is still pending.
    /// A redrive resolves these.
    pub awaiting_status: Vec<SettlementKey>,
    /// Disagreements between store and ledger. Must be empty.
    pub mismatches: Vec<String>,
}

impl AuditReport {
    /// No mismatches. Entities awaiting a status write are not a fault.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Cross-check a user's orders and balance requests against the ledger.
///
/// Every settled order needs a debit of its quoted price, every rejected
/// order a refused debit, every processed request a credit of its amount.
/// The journal itself is verified first.
///
/// # Errors
/// - `UserNotFound` if the user has no account
/// - `LedgerInvariantViolation` if the journal does not add up
/// - storage errors from reading orders or requests
pub fn reconcile_user(ledger: &Ledger, store: &dyn SettlementStore, user_id: UserId) -> Result<AuditReport> {
    let (account, journal) = ledger.snapshot(user_id)?;
    verify_journal(&account, &journal)?;

    let mut awaiting_status = Vec::new();
    let mut mismatches = Vec::new();
    let find = |key: SettlementKey| journal.iter().find(|e| e.key == key);

    for order in store.orders_for_user(user_id)? {
        let key = SettlementKey::Order(order.id);
        match (order.status, find(key)) {
            (OrderStatus::Pending, None) => {}
            (OrderStatus::Pending, Some(_)) => awaiting_status.push(key),
            (OrderStatus::Settled, Some(e))
                if e.kind == LedgerEntryKind::Debit && e.amount == order.quoted_price => {}
            (OrderStatus::Rejected { .. }, Some(e)) if e.kind == LedgerEntryKind::RejectedDebit => {}
            (status, entry) => mismatches.push(format!(
                "{key}: store says {status}, ledger says {}",
                describe(entry)
            )),
        }
    }

    for request in store.balance_requests_for_user(user_id)? {
        let key = SettlementKey::BalanceRequest(request.id);
        match (request.status, find(key)) {
            (BalanceRequestStatus::Pending, None) => {}
            (BalanceRequestStatus::Pending, Some(_)) => awaiting_status.push(key),
            (BalanceRequestStatus::Processed, Some(e))
                if e.kind == LedgerEntryKind::Credit && e.amount == request.credits => {}
            (status, entry) => mismatches.push(format!(
                "{key}: store says {status}, ledger says {}",
                describe(entry)
            )),
        }
    }

    if !mismatches.is_empty() {
        tracing::error!(%user_id, count = mismatches.len(), "store and ledger disagree");
    }

    Ok(AuditReport {
        user_id,
        balance: account.balance,
        journal_entries: journal.len(),
        digest: hex::encode(journal_digest(&journal)),
        awaiting_status,
        mismatches,
    })
}

fn describe(entry: Option<&LedgerEntry>) -> String {
    entry.map_or_else(
        || "nothing".to_string(),
        |e| format!("{} of {}", e.kind, e.amount),
    )
}

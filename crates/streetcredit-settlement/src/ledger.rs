//! The credit ledger: sole authority over user balances.
//!
//! Both mutations are a single conditional step performed while holding
//! the account's exclusive entry guard:
//! 1. Look the key up in the idempotency guard; if present, answer with
//!    the recorded outcome and stop
//! 2. Compare and mutate the balance (debit only if `balance ≥ amount`)
//! 3. Append the journal entry and mark the key applied
//!
//! No other code path reads-then-writes a balance.

use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use streetcredit_types::{
    Account, BalanceRequestId, CreditError, CreditReceipt, Credits, DebitReceipt, LedgerEntry,
    LedgerEntryKind, OrderId, Result, SettlementKey, UserId,
};

use crate::audit;
use crate::idempotency::IdempotencyGuard;

/// Account balance plus everything needed to audit and replay it.
#[derive(Debug, Clone)]
struct AccountState {
    account: Account,
    journal: Vec<LedgerEntry>,
    applied: IdempotencyGuard,
}

impl AccountState {
    fn new(account: Account) -> Self {
        Self {
            account,
            journal: Vec::new(),
            applied: IdempotencyGuard::new(),
        }
    }

    fn prior(&self, key: &SettlementKey) -> Option<&LedgerEntry> {
        self.applied.lookup(key).and_then(|i| self.journal.get(i))
    }

    fn record(
        &mut self,
        key: SettlementKey,
        kind: LedgerEntryKind,
        amount: Credits,
        balance_before: Credits,
    ) -> Result<LedgerEntry> {
        let entry = LedgerEntry {
            key,
            user_id: self.account.user_id,
            kind,
            amount,
            balance_before,
            balance_after: self.account.balance,
            recorded_at: Utc::now(),
        };
        self.applied.mark_applied(key, self.journal.len())?;
        self.journal.push(entry.clone());
        Ok(entry)
    }
}

/// Concurrent, per-user-serialized credit ledger.
#[derive(Debug, Default)]
pub struct Ledger {
    accounts: DashMap<UserId, AccountState>,
}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an account holding `opening_balance` credits.
    ///
    /// # Errors
    /// Returns `DuplicateAccount` if the user already has one.
    pub fn open_account(
        &self,
        user_id: UserId,
        display_name: impl Into<String>,
        opening_balance: Credits,
    ) -> Result<Account> {
        match self.accounts.entry(user_id) {
            Entry::Occupied(_) => Err(CreditError::DuplicateAccount(user_id)),
            Entry::Vacant(slot) => {
                let account = Account::new(user_id, display_name, opening_balance);
                tracing::info!(%user_id, opening_balance, "account opened");
                slot.insert(AccountState::new(account.clone()));
                Ok(account)
            }
        }
    }

    /// Debit `amount` iff the balance covers it, keyed by `order_id`.
    ///
    /// A repeated `order_id` returns the first outcome without touching the
    /// balance: the original receipt with `replayed = true`, or the original
    /// `InsufficientFunds`.
    ///
    /// # Errors
    /// - `InsufficientFunds` if `amount > balance` (balance unchanged)
    /// - `UserNotFound` if the user has no account
    pub fn try_debit(&self, user_id: UserId, amount: Credits, order_id: OrderId) -> Result<DebitReceipt> {
        let key = SettlementKey::Order(order_id);
        let mut state = self
            .accounts
            .get_mut(&user_id)
            .ok_or(CreditError::UserNotFound(user_id))?;

        if let Some(prior) = state.prior(&key) {
            tracing::debug!(%key, %user_id, kind = %prior.kind, "debit already applied; replaying outcome");
            return replay_debit(prior);
        }

        let before = state.account.balance;
        if !state.account.can_cover(amount) {
            state.record(key, LedgerEntryKind::RejectedDebit, amount, before)?;
            let shortfall = state.account.shortfall(amount);
            tracing::warn!(%key, %user_id, needed = amount, available = before, shortfall, "debit rejected: insufficient funds");
            return Err(CreditError::InsufficientFunds {
                needed: amount,
                available: before,
                shortfall,
            });
        }

        state.account.balance = before - amount;
        let entry = state.record(key, LedgerEntryKind::Debit, amount, before)?;
        tracing::info!(%key, %user_id, amount, balance = entry.balance_after, "debit applied");
        Ok(DebitReceipt {
            key,
            amount,
            new_balance: entry.balance_after,
            replayed: false,
        })
    }

    /// Add `amount` to the balance, keyed by `request_id`.
    ///
    /// A repeated `request_id` returns the first receipt with
    /// `replayed = true` and leaves the balance alone.
    ///
    /// # Errors
    /// - `UserNotFound` if the user has no account
    /// - `BalanceOverflow` if the result does not fit in [`Credits`]
    pub fn credit(&self, user_id: UserId, amount: Credits, request_id: BalanceRequestId) -> Result<CreditReceipt> {
        let key = SettlementKey::BalanceRequest(request_id);
        let mut state = self
            .accounts
            .get_mut(&user_id)
            .ok_or(CreditError::UserNotFound(user_id))?;

        if let Some(prior) = state.prior(&key) {
            tracing::debug!(%key, %user_id, "credit already applied; replaying outcome");
            return replay_credit(prior);
        }

        let before = state.account.balance;
        let after = before
            .checked_add(amount)
            .ok_or(CreditError::BalanceOverflow(user_id))?;
        state.account.balance = after;
        let entry = state.record(key, LedgerEntryKind::Credit, amount, before)?;
        tracing::info!(%key, %user_id, amount, balance = entry.balance_after, "credit applied");
        Ok(CreditReceipt {
            key,
            amount,
            new_balance: entry.balance_after,
            replayed: false,
        })
    }

    /// Current balance.
    pub fn balance(&self, user_id: UserId) -> Result<Credits> {
        self.accounts
            .get(&user_id)
            .map(|s| s.account.balance)
            .ok_or(CreditError::UserNotFound(user_id))
    }

    /// Snapshot of the account.
    pub fn account(&self, user_id: UserId) -> Result<Account> {
        self.accounts
            .get(&user_id)
            .map(|s| s.account.clone())
            .ok_or(CreditError::UserNotFound(user_id))
    }

    /// Snapshot of the account's journal, oldest first.
    pub fn journal(&self, user_id: UserId) -> Result<Vec<LedgerEntry>> {
        self.accounts
            .get(&user_id)
            .map(|s| s.journal.clone())
            .ok_or(CreditError::UserNotFound(user_id))
    }

    /// Account and journal read under one guard, so the pair is consistent.
    pub fn snapshot(&self, user_id: UserId) -> Result<(Account, Vec<LedgerEntry>)> {
        self.accounts
            .get(&user_id)
            .map(|s| (s.account.clone(), s.journal.clone()))
            .ok_or(CreditError::UserNotFound(user_id))
    }

    /// The recorded outcome for `key`, if it was applied.
    pub fn outcome(&self, user_id: UserId, key: SettlementKey) -> Result<Option<LedgerEntry>> {
        self.accounts
            .get(&user_id)
            .map(|s| s.prior(&key).cloned())
            .ok_or(CreditError::UserNotFound(user_id))
    }

    /// Hex SHA-256 over the account's journal.
    pub fn journal_digest(&self, user_id: UserId) -> Result<String> {
        self.accounts
            .get(&user_id)
            .map(|s| hex::encode(audit::journal_digest(&s.journal)))
            .ok_or(CreditError::UserNotFound(user_id))
    }

    /// Check that the balance equals opening balance plus credits minus
    /// debits, and that the journal chains without gaps.
    ///
    /// The check runs under the account guard, so it sees a consistent
    /// snapshot even while settlements are in flight.
    pub fn verify_account(&self, user_id: UserId) -> Result<()> {
        let state = self
            .accounts
            .get(&user_id)
            .ok_or(CreditError::UserNotFound(user_id))?;
        audit::verify_journal(&state.account, &state.journal)
    }

    /// Run [`Self::verify_account`] on every account.
    pub fn verify_all(&self) -> Result<()> {
        for state in &self.accounts {
            audit::verify_journal(&state.account, &state.journal)?;
        }
        Ok(())
    }
}

fn replay_debit(prior: &LedgerEntry) -> Result<DebitReceipt> {
    match prior.kind {
        LedgerEntryKind::Debit => Ok(DebitReceipt {
            key: prior.key,
            amount: prior.amount,
            new_balance: prior.balance_after,
            replayed: true,
        }),
        LedgerEntryKind::RejectedDebit => Err(CreditError::InsufficientFunds {
            needed: prior.amount,
            available: prior.balance_before,
            shortfall: prior.amount.saturating_sub(prior.balance_before),
        }),
        LedgerEntryKind::Credit => Err(CreditError::Internal(format!(
            "key {} recorded as credit, replayed as debit",
            prior.key
        ))),
    }
}

fn replay_credit(prior: &LedgerEntry) -> Result<CreditReceipt> {
    match prior.kind {
        LedgerEntryKind::Credit => Ok(CreditReceipt {
            key: prior.key,
            amount: prior.amount,
            new_balance: prior.balance_after,
            replayed: true,
        }),
        LedgerEntryKind::Debit | LedgerEntryKind::RejectedDebit => Err(CreditError::Internal(
            format!("key {} recorded as debit, replayed as credit", prior.key),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with(balance: Credits) -> (Ledger, UserId) {
        let ledger = Ledger::new();
        let user = UserId::new();
        ledger.open_account(user, "Ada", balance).unwrap();
        (ledger, user)
    }

    #[test]
    fn open_account_twice_fails() {
        let (ledger, user) = ledger_with(10);
        let err = ledger.open_account(user, "Ada", 5).unwrap_err();
        assert!(matches!(err, CreditError::DuplicateAccount(u) if u == user));
        assert_eq!(ledger.balance(user).unwrap(), 10);
    }

    #[test]
    fn debit_within_balance() {
        let (ledger, user) = ledger_with(10);
        let receipt = ledger.try_debit(user, 9, OrderId::new()).unwrap();
        assert_eq!(receipt.new_balance, 1);
        assert!(!receipt.replayed);
        assert_eq!(ledger.balance(user).unwrap(), 1);
    }

    #[test]
    fn debit_of_exact_balance_reaches_zero() {
        let (ledger, user) = ledger_with(10);
        ledger.try_debit(user, 10, OrderId::new()).unwrap();
        assert_eq!(ledger.balance(user).unwrap(), 0);
    }

    #[test]
    fn overdraft_rejected_balance_unchanged() {
        let (ledger, user) = ledger_with(10);
        let err = ledger.try_debit(user, 12, OrderId::new()).unwrap_err();
        assert_eq!(
            err,
            CreditError::InsufficientFunds {
                needed: 12,
                available: 10,
                shortfall: 2
            }
        );
        assert_eq!(ledger.balance(user).unwrap(), 10);
    }

    #[test]
    fn repeated_debit_applies_once() {
        let (ledger, user) = ledger_with(10);
        let order = OrderId::new();
        let first = ledger.try_debit(user, 6, order).unwrap();
        let second = ledger.try_debit(user, 6, order).unwrap();
        assert!(!first.replayed);
        assert!(second.replayed);
        assert_eq!(second.new_balance, 4);
        assert_eq!(ledger.balance(user).unwrap(), 4);
        assert_eq!(ledger.journal(user).unwrap().len(), 1);
    }

    #[test]
    fn repeated_rejection_stays_rejected_after_top_up() {
        let (ledger, user) = ledger_with(10);
        let order = OrderId::new();
        assert!(ledger.try_debit(user, 12, order).is_err());

        ledger.credit(user, 50, BalanceRequestId::new()).unwrap();

        // The order's fate was already decided; a redelivery must not flip it.
        let err = ledger.try_debit(user, 12, order).unwrap_err();
        assert!(matches!(
            err,
            CreditError::InsufficientFunds {
                needed: 12,
                available: 10,
                shortfall: 2
            }
        ));
        assert_eq!(ledger.balance(user).unwrap(), 60);
    }

    #[test]
    fn credit_twice_applies_once() {
        let (ledger, user) = ledger_with(0);
        let request = BalanceRequestId::new();
        let first = ledger.credit(user, 50, request).unwrap();
        let second = ledger.credit(user, 50, request).unwrap();
        assert_eq!(first.new_balance, 50);
        assert!(second.replayed);
        assert_eq!(ledger.balance(user).unwrap(), 50);
    }

    #[test]
    fn credit_overflow_refused() {
        let (ledger, user) = ledger_with(Credits::MAX - 1);
        let err = ledger.credit(user, 2, BalanceRequestId::new()).unwrap_err();
        assert!(matches!(err, CreditError::BalanceOverflow(_)));
        assert_eq!(ledger.balance(user).unwrap(), Credits::MAX - 1);
    }

    #[test]
    fn unknown_user_not_found() {
        let ledger = Ledger::new();
        let ghost = UserId::new();
        assert!(matches!(
            ledger.try_debit(ghost, 1, OrderId::new()),
            Err(CreditError::UserNotFound(_))
        ));
        assert!(matches!(
            ledger.credit(ghost, 1, BalanceRequestId::new()),
            Err(CreditError::UserNotFound(_))
        ));
        assert!(ledger.balance(ghost).is_err());
    }

    #[test]
    fn journal_records_rejections_without_balance_change() {
        let (ledger, user) = ledger_with(5);
        let order = OrderId::new();
        let _ = ledger.try_debit(user, 7, order);
        let journal = ledger.journal(user).unwrap();
        assert_eq!(journal.len(), 1);
        assert_eq!(journal[0].kind, LedgerEntryKind::RejectedDebit);
        assert_eq!(journal[0].balance_before, journal[0].balance_after);
        let outcome = ledger.outcome(user, SettlementKey::Order(order)).unwrap();
        assert_eq!(outcome.unwrap().kind, LedgerEntryKind::RejectedDebit);
    }

    #[test]
    fn verify_after_mixed_activity() {
        let (ledger, user) = ledger_with(10);
        ledger.try_debit(user, 3, OrderId::new()).unwrap();
        ledger.credit(user, 30, BalanceRequestId::new()).unwrap();
        let _ = ledger.try_debit(user, 100, OrderId::new());
        ledger.try_debit(user, 7, OrderId::new()).unwrap();
        assert_eq!(ledger.balance(user).unwrap(), 30);
        ledger.verify_account(user).unwrap();
        ledger.verify_all().unwrap();
    }

    #[test]
    fn digest_changes_with_journal() {
        let (ledger, user) = ledger_with(10);
        let d0 = ledger.journal_digest(user).unwrap();
        ledger.try_debit(user, 1, OrderId::new()).unwrap();
        let d1 = ledger.journal_digest(user).unwrap();
        assert_ne!(d0, d1);
        assert_eq!(d1.len(), 64);
        assert_eq!(d1, ledger.journal_digest(user).unwrap());
    }
}

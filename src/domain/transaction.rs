use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, Cents, TransferId};

pub type TransactionId = i64;

/// Direction of a ledger entry. Stored as a single letter, matching the
/// wire/database form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// Money entering the account. Amount is kept non-negative.
    #[serde(rename = "I")]
    Inflow,
    /// Money leaving the account. Amount is kept non-positive.
    #[serde(rename = "O")]
    Outflow,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Inflow => "I",
            TransactionType::Outflow => "O",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "I" => Some(TransactionType::Inflow),
            "O" => Some(TransactionType::Outflow),
            _ => None,
        }
    }

    /// Coerce an amount's sign to this type, regardless of the sign the
    /// caller supplied: inflows are non-negative, outflows non-positive.
    pub fn signed(&self, amount: Cents) -> Cents {
        match self {
            TransactionType::Inflow => amount.abs(),
            TransactionType::Outflow => -amount.abs(),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single ledger entry against an account. Entries created by a transfer
/// carry the owning transfer's id in `transfer_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub description: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub date: DateTime<Utc>,
    /// Signed cents; the sign always matches `transaction_type`.
    pub amount: Cents,
    /// Settled (true) entries count toward balances; pending ones don't.
    pub status: bool,
    pub acc_id: AccountId,
    pub transfer_id: Option<TransferId>,
}

impl Transaction {
    pub fn is_settled(&self) -> bool {
        self.status
    }
}

/// Raw create input, before validation. The type arrives as a raw string
/// so an invalid value can be echoed back in the error.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionDraft {
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub amount: Option<Cents>,
    pub status: Option<bool>,
    pub acc_id: AccountId,
    pub transfer_id: Option<TransferId>,
}

/// Validated create input with the amount sign already normalized.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub description: String,
    pub transaction_type: TransactionType,
    pub date: DateTime<Utc>,
    pub amount: Cents,
    pub status: bool,
    pub acc_id: AccountId,
    pub transfer_id: Option<TransferId>,
}

impl NewTransaction {
    /// Build a new entry, coercing the amount sign to the type.
    pub fn new(
        description: String,
        transaction_type: TransactionType,
        date: DateTime<Utc>,
        amount: Cents,
        status: bool,
        acc_id: AccountId,
        transfer_id: Option<TransferId>,
    ) -> Self {
        Self {
            description,
            transaction_type,
            date,
            amount: transaction_type.signed(amount),
            status,
            acc_id,
            transfer_id,
        }
    }
}

/// Direct field update for an existing entry. Pass-through: no sign
/// normalization happens on update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionPatch {
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub amount: Option<Cents>,
    pub status: Option<bool>,
}

/// Optional equality filters for listing a user's entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionFilter {
    pub acc_id: Option<AccountId>,
    pub transfer_id: Option<TransferId>,
}

impl TransactionFilter {
    pub fn by_account(acc_id: AccountId) -> Self {
        Self {
            acc_id: Some(acc_id),
            ..Self::default()
        }
    }

    pub fn by_transfer(transfer_id: TransferId) -> Self {
        Self {
            transfer_id: Some(transfer_id),
            ..Self::default()
        }
    }
}

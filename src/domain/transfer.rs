use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, Cents, NewTransaction, TransactionType, UserId};

pub type TransferId = i64;

/// A movement of money between two accounts of the same owner.
///
/// A transfer always owns exactly two transactions: an outflow of the full
/// amount on the source account and an inflow of the same amount on the
/// destination. Create, update and delete keep the transfer row and its
/// pair in lockstep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    pub description: String,
    pub date: DateTime<Utc>,
    /// Unsigned cents; the sign is applied per leg.
    pub amount: Cents,
    pub acc_ori_id: AccountId,
    pub acc_dest_id: AccountId,
    pub user_id: UserId,
}

impl Transfer {
    /// Build the balanced transaction pair for this transfer: the outflow
    /// leg on the source account and the inflow leg on the destination,
    /// both tagged with this transfer's id and annotated with the
    /// counterpart account.
    pub fn transaction_pair(&self, status: bool) -> [NewTransaction; 2] {
        [
            NewTransaction::new(
                format!("Transfer to acc {}", self.acc_dest_id),
                TransactionType::Outflow,
                self.date,
                self.amount,
                status,
                self.acc_ori_id,
                Some(self.id),
            ),
            NewTransaction::new(
                format!("Transfer from acc {}", self.acc_ori_id),
                TransactionType::Inflow,
                self.date,
                self.amount,
                status,
                self.acc_dest_id,
                Some(self.id),
            ),
        ]
    }
}

/// Raw create/update input, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransferDraft {
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub amount: Option<Cents>,
    pub acc_ori_id: Option<AccountId>,
    pub acc_dest_id: Option<AccountId>,
}

/// Validated transfer input, ready to persist.
#[derive(Debug, Clone)]
pub struct NewTransfer {
    pub description: String,
    pub date: DateTime<Utc>,
    pub amount: Cents,
    pub acc_ori_id: AccountId,
    pub acc_dest_id: AccountId,
    pub user_id: UserId,
}

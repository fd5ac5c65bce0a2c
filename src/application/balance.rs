use chrono::Utc;
use serde::Serialize;

use crate::domain::{serialize_cents, AccountId, Cents};
use crate::storage::Repository;

use super::{AppError, RequestContext};

/// One line of the balance report. The sum serializes as a fixed
/// 2-decimal string.
#[derive(Debug, Clone, Serialize)]
pub struct AccountBalance {
    pub id: AccountId,
    #[serde(serialize_with = "serialize_cents")]
    pub sum: Cents,
}

/// Computes per-account running balances from confirmed history.
#[derive(Clone)]
pub struct BalanceService {
    repo: Repository,
}

impl BalanceService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Balance per account for the requesting user: settled entries dated
    /// now or earlier, grouped by account, ordered by account id. Accounts
    /// with nothing to count are omitted entirely.
    pub async fn get_balance(&self, ctx: RequestContext) -> Result<Vec<AccountBalance>, AppError> {
        let totals = self.repo.user_balance(ctx.user_id, Utc::now()).await?;
        Ok(totals
            .into_iter()
            .map(|(id, sum)| AccountBalance { id, sum })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_line_serializes_sum_as_fixed_decimal() {
        let line = AccountBalance { id: 3, sum: 10050 };
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["sum"], "100.50");
    }

    #[test]
    fn test_negative_balance_formatting() {
        let line = AccountBalance { id: 1, sum: -10000 };
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["sum"], "-100.00");
    }
}

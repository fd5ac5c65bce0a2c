use crate::domain::{
    NewTransaction, Transaction, TransactionDraft, TransactionFilter, TransactionId,
    TransactionPatch, TransactionType,
};
use crate::storage::Repository;

use super::{AppError, RequestContext};

/// Validates and persists single ledger entries. Mutations are direct
/// pass-throughs by id; ownership is enforced by the callers' guards
/// before they get here.
#[derive(Clone)]
pub struct TransactionService {
    repo: Repository,
}

impl TransactionService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Validate and persist one entry. The stored amount's sign always
    /// matches the entry type, whatever sign the caller supplied.
    pub async fn save(&self, draft: TransactionDraft) -> Result<Transaction, AppError> {
        let entry = validate(draft)?;
        Ok(self.repo.save_transaction(&entry).await?)
    }

    /// List the requesting user's entries, joined through their accounts,
    /// narrowed by the optional equality filters.
    pub async fn find(
        &self,
        ctx: RequestContext,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, AppError> {
        Ok(self.repo.list_transactions(ctx.user_id, filter).await?)
    }

    /// Point read by id.
    pub async fn find_one(&self, id: TransactionId) -> Result<Option<Transaction>, AppError> {
        Ok(self.repo.get_transaction(id).await?)
    }

    /// Direct field update by id. No sign normalization on update.
    pub async fn update(
        &self,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> Result<Transaction, AppError> {
        self.repo
            .update_transaction(id, &patch)
            .await?
            .ok_or_else(|| AppError::NotFound("this transaction does not exist".to_string()))
    }

    /// Direct delete by id.
    pub async fn remove(&self, id: TransactionId) -> Result<(), AppError> {
        self.repo.delete_transaction(id).await?;
        Ok(())
    }
}

/// Ordered validation pipeline; the first failing rule wins.
fn validate(draft: TransactionDraft) -> Result<NewTransaction, AppError> {
    let required = |field: &str| AppError::Validation(format!("{field} is a required attribute"));

    let description = draft
        .description
        .filter(|d| !d.is_empty())
        .ok_or_else(|| required("description"))?;
    let date = draft.date.ok_or_else(|| required("date"))?;
    let amount = draft.amount.ok_or_else(|| required("amount"))?;
    let type_str = draft
        .transaction_type
        .filter(|t| !t.is_empty())
        .ok_or_else(|| required("type"))?;

    let transaction_type = TransactionType::from_str(&type_str)
        .ok_or_else(|| AppError::Validation(format!("\"{type_str}\" is not a valid type")))?;

    Ok(NewTransaction::new(
        description,
        transaction_type,
        date,
        amount,
        draft.status.unwrap_or(false),
        draft.acc_id,
        draft.transfer_id,
    ))
}

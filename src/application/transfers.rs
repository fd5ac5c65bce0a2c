use crate::domain::{NewTransfer, Transfer, TransferDraft, TransferId, UserId};
use crate::storage::Repository;

use super::{AppError, RequestContext};

/// Composes a transfer into two balanced transactions and keeps the
/// transfer row and its pair synchronized across create, update and
/// delete. Every mutation is atomic against the store: a transfer never
/// exists without exactly two balancing transactions, and vice versa.
#[derive(Clone)]
pub struct TransferService {
    repo: Repository,
}

impl TransferService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Ordered validation pipeline; the first failing rule wins. Produces
    /// a persistable transfer owned by the requesting user.
    pub async fn validate(
        &self,
        ctx: RequestContext,
        draft: TransferDraft,
    ) -> Result<NewTransfer, AppError> {
        let required =
            |field: &str| AppError::Validation(format!("{field} is a required attribute"));

        let description = draft
            .description
            .filter(|d| !d.is_empty())
            .ok_or_else(|| required("description"))?;
        let amount = draft.amount.ok_or_else(|| required("amount"))?;
        if amount <= 0 {
            return Err(AppError::Validation(
                "amount must be a positive value".to_string(),
            ));
        }
        let date = draft.date.ok_or_else(|| required("date"))?;
        let acc_ori_id = draft.acc_ori_id.ok_or_else(|| required("acc_ori_id"))?;
        let acc_dest_id = draft.acc_dest_id.ok_or_else(|| required("acc_dest_id"))?;

        if acc_ori_id == acc_dest_id {
            return Err(AppError::Validation(
                "cannot transfer to the same account".to_string(),
            ));
        }

        let source = self
            .repo
            .get_account(acc_ori_id)
            .await?
            .ok_or_else(|| AppError::NotFound("source account does not exist".to_string()))?;
        if source.user_id != ctx.user_id {
            return Err(AppError::Validation(
                "source account does not belong to the user".to_string(),
            ));
        }

        Ok(NewTransfer {
            description,
            date,
            amount,
            acc_ori_id,
            acc_dest_id,
            user_id: ctx.user_id,
        })
    }

    /// Validate and persist a transfer with its settled transaction pair,
    /// all in one atomic unit.
    pub async fn save(&self, ctx: RequestContext, draft: TransferDraft) -> Result<Transfer, AppError> {
        let transfer = self.validate(ctx, draft).await?;
        Ok(self.repo.save_transfer(&transfer).await?)
    }

    /// Validate the patched fields, update the transfer row and replace
    /// its transaction pair wholesale, atomically.
    pub async fn update(
        &self,
        ctx: RequestContext,
        id: TransferId,
        draft: TransferDraft,
    ) -> Result<Transfer, AppError> {
        let transfer = self.validate(ctx, draft).await?;
        self.repo
            .update_transfer(id, &transfer)
            .await?
            .ok_or_else(|| AppError::NotFound("this transfer does not exist".to_string()))
    }

    /// Delete the transfer and every transaction tagged with it,
    /// atomically.
    pub async fn remove(&self, id: TransferId) -> Result<(), AppError> {
        self.repo.delete_transfer(id).await?;
        Ok(())
    }

    /// List the requesting user's transfers.
    pub async fn find(&self, ctx: RequestContext) -> Result<Vec<Transfer>, AppError> {
        Ok(self.repo.list_transfers(ctx.user_id).await?)
    }

    /// Point read by id; no ownership enforcement here (see
    /// `check_ownership`).
    pub async fn find_one(&self, id: TransferId) -> Result<Option<Transfer>, AppError> {
        Ok(self.repo.get_transfer(id).await?)
    }

    /// Per-resource guard: 404 if the transfer doesn't exist, 403 if it
    /// belongs to someone else.
    pub async fn check_ownership(
        &self,
        id: TransferId,
        user_id: UserId,
    ) -> Result<Transfer, AppError> {
        let transfer = self
            .repo
            .get_transfer(id)
            .await?
            .ok_or_else(|| AppError::NotFound("this transfer does not exist".to_string()))?;

        if transfer.user_id != user_id {
            return Err(AppError::Forbidden(
                "this resource does not belong to the user".to_string(),
            ));
        }

        Ok(transfer)
    }
}

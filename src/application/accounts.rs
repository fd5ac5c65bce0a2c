use crate::domain::{Account, AccountDraft, AccountId, AccountPatch, NewAccount, UserId};
use crate::storage::Repository;

use super::{AppError, RequestContext};

/// Owns account identity: creation with per-owner name uniqueness, the
/// deletion-safety check, and the per-resource ownership guard the routing
/// layer runs before delegating.
#[derive(Clone)]
pub struct AccountService {
    repo: Repository,
}

impl AccountService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Create an account for the requesting user.
    pub async fn save(&self, ctx: RequestContext, draft: AccountDraft) -> Result<Account, AppError> {
        let Some(name) = draft.name.filter(|name| !name.is_empty()) else {
            return Err(AppError::Validation(
                "name is a required attribute".to_string(),
            ));
        };

        if self
            .repo
            .get_account_by_name(ctx.user_id, &name)
            .await?
            .is_some()
        {
            return Err(AppError::Validation(
                "there is already an account with this name for this user".to_string(),
            ));
        }

        Ok(self
            .repo
            .save_account(&NewAccount {
                name,
                user_id: ctx.user_id,
            })
            .await?)
    }

    /// List the requesting user's accounts.
    pub async fn find(&self, ctx: RequestContext) -> Result<Vec<Account>, AppError> {
        Ok(self.repo.list_accounts(ctx.user_id).await?)
    }

    /// Point read by id.
    pub async fn find_one(&self, id: AccountId) -> Result<Option<Account>, AppError> {
        Ok(self.repo.get_account(id).await?)
    }

    /// Direct field update. Ownership is the caller's job (see
    /// `check_ownership`).
    pub async fn update(&self, id: AccountId, patch: AccountPatch) -> Result<Account, AppError> {
        self.repo
            .update_account(id, &patch)
            .await?
            .ok_or_else(|| AppError::NotFound("this account does not exist".to_string()))
    }

    /// Delete an account, refusing while any transaction references it.
    pub async fn remove(&self, id: AccountId) -> Result<(), AppError> {
        if self.repo.account_has_transactions(id).await? {
            return Err(AppError::Conflict(
                "cannot delete accounts that have transactions".to_string(),
            ));
        }

        self.repo.delete_account(id).await?;
        Ok(())
    }

    /// Per-resource guard: 404 if the account doesn't exist, 403 if it
    /// belongs to someone else. Returns the account on success.
    pub async fn check_ownership(
        &self,
        id: AccountId,
        user_id: UserId,
    ) -> Result<Account, AppError> {
        let account = self
            .repo
            .get_account(id)
            .await?
            .ok_or_else(|| AppError::NotFound("this account does not exist".to_string()))?;

        if account.user_id != user_id {
            return Err(AppError::Forbidden(
                "this resource does not belong to the user".to_string(),
            ));
        }

        Ok(account)
    }
}

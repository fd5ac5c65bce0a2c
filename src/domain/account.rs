use serde::{Deserialize, Serialize};

use super::UserId;

pub type AccountId = i64;

/// A user-owned account. Names are unique per owner, and an account can
/// only be deleted while no transaction references it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub user_id: UserId,
}

/// Raw create input, before validation. Fields are optional so missing
/// ones can be reported individually.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountDraft {
    pub name: Option<String>,
}

/// Validated create input.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub user_id: UserId,
}

/// Field update for an existing account.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountPatch {
    pub name: Option<String>,
}

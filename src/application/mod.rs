// Application layer: one service per ledger concern, a shared error
// taxonomy, and the request context the outer layer threads through.

mod accounts;
mod balance;
mod context;
mod error;
mod transactions;
mod transfers;

pub use accounts::*;
pub use balance::*;
pub use context::*;
pub use error::*;
pub use transactions::*;
pub use transfers::*;

use anyhow::Result;

use crate::domain::{NewUser, User};
use crate::storage::Repository;

/// The full set of ledger services over one shared repository. This is
/// the primary interface for any client (CLI, HTTP layer, tests).
#[derive(Clone)]
pub struct Ledger {
    pub accounts: AccountService,
    pub transactions: TransactionService,
    pub transfers: TransferService,
    pub balance: BalanceService,
    repo: Repository,
}

impl Ledger {
    pub fn new(repo: Repository) -> Self {
        Self {
            accounts: AccountService::new(repo.clone()),
            transactions: TransactionService::new(repo.clone()),
            transfers: TransferService::new(repo.clone()),
            balance: BalanceService::new(repo.clone()),
            repo,
        }
    }

    /// Initialize a new database at the given path (create + migrate).
    pub async fn init(database_path: &str) -> Result<Self> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Register an account owner. Identity only; authentication lives
    /// outside this crate.
    pub async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        if self.repo.find_user_by_mail(&user.mail).await?.is_some() {
            return Err(AppError::Validation(
                "there is already a user with this mail".to_string(),
            ));
        }
        Ok(self.repo.save_user(&user).await?)
    }
}

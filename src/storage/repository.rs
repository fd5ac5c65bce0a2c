use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::domain::{
    Account, AccountId, AccountPatch, Cents, NewAccount, NewTransaction, NewTransfer, NewUser,
    Transaction, TransactionFilter, TransactionId, TransactionPatch, TransactionType, Transfer,
    TransferId, User, UserId,
};

use super::MIGRATION_001_INITIAL;

/// Repository for persisting and querying users, accounts, transactions
/// and transfers. Cloning is cheap; the pool is shared.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // User operations
    // ========================

    /// Save a new user and return the stored row.
    pub async fn save_user(&self, user: &NewUser) -> Result<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (name, mail)
            VALUES (?, ?)
            RETURNING id, name, mail
            "#,
        )
        .bind(&user.name)
        .bind(&user.mail)
        .fetch_one(&self.pool)
        .await
        .context("Failed to save user")?;

        Self::row_to_user(&row)
    }

    /// Get a user by mail address.
    pub async fn find_user_by_mail(&self, mail: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, name, mail FROM users WHERE mail = ?")
            .bind(mail)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user by mail")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
        Ok(User {
            id: row.get("id"),
            name: row.get("name"),
            mail: row.get("mail"),
        })
    }

    // ========================
    // Account operations
    // ========================

    /// Save a new account and return the stored row.
    pub async fn save_account(&self, account: &NewAccount) -> Result<Account> {
        let row = sqlx::query(
            r#"
            INSERT INTO accounts (name, user_id)
            VALUES (?, ?)
            RETURNING id, name, user_id
            "#,
        )
        .bind(&account.name)
        .bind(account.user_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to save account")?;

        Self::row_to_account(&row)
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query("SELECT id, name, user_id FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch account")?;

        row.as_ref().map(Self::row_to_account).transpose()
    }

    /// Get an account by owner and name (names are unique per owner).
    pub async fn get_account_by_name(
        &self,
        user_id: UserId,
        name: &str,
    ) -> Result<Option<Account>> {
        let row = sqlx::query("SELECT id, name, user_id FROM accounts WHERE user_id = ? AND name = ?")
            .bind(user_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch account by name")?;

        row.as_ref().map(Self::row_to_account).transpose()
    }

    /// List all accounts owned by a user, ordered by id.
    pub async fn list_accounts(&self, user_id: UserId) -> Result<Vec<Account>> {
        let rows = sqlx::query("SELECT id, name, user_id FROM accounts WHERE user_id = ? ORDER BY id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list accounts")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    /// Update an account's fields. Returns the updated row, or None if the
    /// account doesn't exist (or the patch is empty).
    pub async fn update_account(
        &self,
        id: AccountId,
        patch: &AccountPatch,
    ) -> Result<Option<Account>> {
        let Some(name) = &patch.name else {
            return self.get_account(id).await;
        };

        let row = sqlx::query(
            r#"
            UPDATE accounts SET name = ?
            WHERE id = ?
            RETURNING id, name, user_id
            "#,
        )
        .bind(name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update account")?;

        row.as_ref().map(Self::row_to_account).transpose()
    }

    /// Delete an account by ID. Returns true if a row was deleted.
    pub async fn delete_account(&self, id: AccountId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete account")?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether any transaction references the account.
    pub async fn account_has_transactions(&self, id: AccountId) -> Result<bool> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM transactions WHERE acc_id = ?) AS present")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check account transactions")?;

        Ok(row.get::<i32, _>("present") != 0)
    }

    fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account> {
        Ok(Account {
            id: row.get("id"),
            name: row.get("name"),
            user_id: row.get("user_id"),
        })
    }

    // ========================
    // Transaction operations
    // ========================

    /// Save a single ledger entry and return the stored row.
    pub async fn save_transaction(&self, transaction: &NewTransaction) -> Result<Transaction> {
        Self::insert_transaction(&self.pool, transaction).await
    }

    /// Insert one entry through any executor, so the same statement serves
    /// both standalone saves and the transfer-scoped atomic writes.
    async fn insert_transaction<'e, E>(executor: E, transaction: &NewTransaction) -> Result<Transaction>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let row = sqlx::query(
            r#"
            INSERT INTO transactions (description, type, date, amount, status, acc_id, transfer_id)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, description, type, date, amount, status, acc_id, transfer_id
            "#,
        )
        .bind(&transaction.description)
        .bind(transaction.transaction_type.as_str())
        .bind(transaction.date.to_rfc3339())
        .bind(transaction.amount)
        .bind(transaction.status)
        .bind(transaction.acc_id)
        .bind(transaction.transfer_id)
        .fetch_one(executor)
        .await
        .context("Failed to save transaction")?;

        Self::row_to_transaction(&row)
    }

    /// Get a transaction by ID.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>> {
        let row = sqlx::query(
            r#"
            SELECT id, description, type, date, amount, status, acc_id, transfer_id
            FROM transactions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch transaction")?;

        row.as_ref().map(Self::row_to_transaction).transpose()
    }

    /// List a user's transactions: joined through accounts so only entries
    /// on the user's own accounts come back, narrowed by the optional
    /// equality filters. One statement.
    pub async fn list_transactions(
        &self,
        user_id: UserId,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        let mut query = String::from(
            "SELECT t.id, t.description, t.type, t.date, t.amount, t.status, t.acc_id, t.transfer_id \
             FROM transactions t \
             JOIN accounts a ON a.id = t.acc_id \
             WHERE a.user_id = ?",
        );

        if filter.acc_id.is_some() {
            query.push_str(" AND t.acc_id = ?");
        }
        if filter.transfer_id.is_some() {
            query.push_str(" AND t.transfer_id = ?");
        }
        query.push_str(" ORDER BY t.id");

        let mut sql_query = sqlx::query(&query).bind(user_id);
        if let Some(acc_id) = filter.acc_id {
            sql_query = sql_query.bind(acc_id);
        }
        if let Some(transfer_id) = filter.transfer_id {
            sql_query = sql_query.bind(transfer_id);
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// Update a transaction's fields. Returns the updated row, or None if
    /// the transaction doesn't exist (or the patch is empty).
    pub async fn update_transaction(
        &self,
        id: TransactionId,
        patch: &TransactionPatch,
    ) -> Result<Option<Transaction>> {
        let mut assignments: Vec<&str> = Vec::new();
        if patch.description.is_some() {
            assignments.push("description = ?");
        }
        if patch.date.is_some() {
            assignments.push("date = ?");
        }
        if patch.amount.is_some() {
            assignments.push("amount = ?");
        }
        if patch.status.is_some() {
            assignments.push("status = ?");
        }
        if assignments.is_empty() {
            return self.get_transaction(id).await;
        }

        let query = format!(
            "UPDATE transactions SET {} WHERE id = ? \
             RETURNING id, description, type, date, amount, status, acc_id, transfer_id",
            assignments.join(", ")
        );

        let mut sql_query = sqlx::query(&query);
        if let Some(description) = &patch.description {
            sql_query = sql_query.bind(description);
        }
        if let Some(date) = patch.date {
            sql_query = sql_query.bind(date.to_rfc3339());
        }
        if let Some(amount) = patch.amount {
            sql_query = sql_query.bind(amount);
        }
        if let Some(status) = patch.status {
            sql_query = sql_query.bind(status);
        }

        let row = sql_query
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to update transaction")?;

        row.as_ref().map(Self::row_to_transaction).transpose()
    }

    /// Delete a transaction by ID. Returns true if a row was deleted.
    pub async fn delete_transaction(&self, id: TransactionId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete transaction")?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<Transaction> {
        let type_str: String = row.get("type");
        let date_str: String = row.get("date");

        Ok(Transaction {
            id: row.get("id"),
            description: row.get("description"),
            transaction_type: TransactionType::from_str(&type_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid transaction type: {}", type_str))?,
            date: Self::parse_datetime(&date_str)?,
            amount: row.get("amount"),
            status: row.get::<i32, _>("status") != 0,
            acc_id: row.get("acc_id"),
            transfer_id: row.get("transfer_id"),
        })
    }

    // ========================
    // Transfer operations
    // ========================

    /// Save a transfer together with its balanced transaction pair.
    ///
    /// The transfer row and both entries go in as one database transaction;
    /// if any insert fails nothing is persisted. The pair is marked settled.
    pub async fn save_transfer(&self, transfer: &NewTransfer) -> Result<Transfer> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let row = sqlx::query(
            r#"
            INSERT INTO transfers (description, date, amount, acc_ori_id, acc_dest_id, user_id)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, description, date, amount, acc_ori_id, acc_dest_id, user_id
            "#,
        )
        .bind(&transfer.description)
        .bind(transfer.date.to_rfc3339())
        .bind(transfer.amount)
        .bind(transfer.acc_ori_id)
        .bind(transfer.acc_dest_id)
        .bind(transfer.user_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to save transfer")?;

        let stored = Self::row_to_transfer(&row)?;
        for entry in stored.transaction_pair(true) {
            Self::insert_transaction(&mut *tx, &entry).await?;
        }

        tx.commit().await.context("Failed to commit transfer")?;
        tracing::debug!(transfer_id = stored.id, amount = stored.amount, "transfer saved");
        Ok(stored)
    }

    /// Update a transfer and regenerate its transaction pair.
    ///
    /// Atomically updates the transfer row, deletes every entry tagged with
    /// the transfer id and inserts a fresh balanced pair built from the
    /// updated fields. The regenerated pair is marked settled, same as on
    /// save. Returns None (and changes nothing) if the transfer is absent.
    pub async fn update_transfer(
        &self,
        id: TransferId,
        transfer: &NewTransfer,
    ) -> Result<Option<Transfer>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let row = sqlx::query(
            r#"
            UPDATE transfers
            SET description = ?, date = ?, amount = ?, acc_ori_id = ?, acc_dest_id = ?
            WHERE id = ?
            RETURNING id, description, date, amount, acc_ori_id, acc_dest_id, user_id
            "#,
        )
        .bind(&transfer.description)
        .bind(transfer.date.to_rfc3339())
        .bind(transfer.amount)
        .bind(transfer.acc_ori_id)
        .bind(transfer.acc_dest_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to update transfer")?;

        let Some(row) = row else {
            tx.rollback().await.context("Failed to roll back")?;
            return Ok(None);
        };

        sqlx::query("DELETE FROM transactions WHERE transfer_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete transfer transactions")?;

        let stored = Self::row_to_transfer(&row)?;
        for entry in stored.transaction_pair(true) {
            Self::insert_transaction(&mut *tx, &entry).await?;
        }

        tx.commit().await.context("Failed to commit transfer update")?;
        tracing::debug!(transfer_id = stored.id, "transfer updated, pair regenerated");
        Ok(Some(stored))
    }

    /// Delete a transfer and every transaction tagged with it, atomically.
    /// Returns true if a transfer row was deleted.
    pub async fn delete_transfer(&self, id: TransferId) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM transactions WHERE transfer_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete transfer transactions")?;

        let result = sqlx::query("DELETE FROM transfers WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete transfer")?;

        tx.commit().await.context("Failed to commit transfer delete")?;
        tracing::debug!(transfer_id = id, "transfer removed");
        Ok(result.rows_affected() > 0)
    }

    /// Get a transfer by ID.
    pub async fn get_transfer(&self, id: TransferId) -> Result<Option<Transfer>> {
        let row = sqlx::query(
            r#"
            SELECT id, description, date, amount, acc_ori_id, acc_dest_id, user_id
            FROM transfers
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch transfer")?;

        row.as_ref().map(Self::row_to_transfer).transpose()
    }

    /// List all transfers owned by a user, ordered by id.
    pub async fn list_transfers(&self, user_id: UserId) -> Result<Vec<Transfer>> {
        let rows = sqlx::query(
            r#"
            SELECT id, description, date, amount, acc_ori_id, acc_dest_id, user_id
            FROM transfers
            WHERE user_id = ?
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transfers")?;

        rows.iter().map(Self::row_to_transfer).collect()
    }

    fn row_to_transfer(row: &sqlx::sqlite::SqliteRow) -> Result<Transfer> {
        let date_str: String = row.get("date");

        Ok(Transfer {
            id: row.get("id"),
            description: row.get("description"),
            date: Self::parse_datetime(&date_str)?,
            amount: row.get("amount"),
            acc_ori_id: row.get("acc_ori_id"),
            acc_dest_id: row.get("acc_dest_id"),
            user_id: row.get("user_id"),
        })
    }

    // ========================
    // Balance aggregation
    // ========================

    /// Per-account balance for a user's accounts: the sum of settled,
    /// past-or-present entries, grouped by account and ordered by account
    /// id. Accounts with no qualifying entries don't appear at all. Single
    /// aggregate statement, exact integer-cents arithmetic.
    pub async fn user_balance(
        &self,
        user_id: UserId,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<(AccountId, Cents)>> {
        let rows = sqlx::query(
            r#"
            SELECT a.id AS account_id, SUM(t.amount) AS total
            FROM transactions t
            JOIN accounts a ON a.id = t.acc_id
            WHERE a.user_id = ? AND t.status = 1 AND t.date <= ?
            GROUP BY a.id
            ORDER BY a.id
            "#,
        )
        .bind(user_id)
        .bind(as_of.to_rfc3339())
        .fetch_all(&self.pool)
        .await
        .context("Failed to compute balance")?;

        Ok(rows
            .iter()
            .map(|row| (row.get("account_id"), row.get("total")))
            .collect())
    }

    /// Dates are stored as RFC 3339 UTC strings, which also makes them
    /// compare correctly as text in SQL.
    fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
        Ok(DateTime::parse_from_rfc3339(s)
            .context("Invalid timestamp")?
            .with_timezone(&Utc))
    }
}

// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use librum::application::{Ledger, RequestContext};
use librum::domain::{Account, AccountDraft, NewUser, TransactionDraft, TransferDraft, User};
use tempfile::TempDir;

/// Helper to create a test ledger backed by a temporary database
pub async fn test_ledger() -> Result<(Ledger, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let ledger = Ledger::init(db_path.to_str().unwrap()).await?;
    Ok((ledger, temp_dir))
}

pub fn ctx(user: &User) -> RequestContext {
    RequestContext::new(user.id)
}

/// Helper to parse a date string into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

pub fn days_from_now(days: i64) -> DateTime<Utc> {
    Utc::now() + Duration::days(days)
}

pub async fn seed_user(ledger: &Ledger, tag: &str) -> Result<User> {
    let user = ledger
        .create_user(NewUser {
            name: format!("user {tag}"),
            mail: format!("{tag}@mail.com"),
        })
        .await?;
    Ok(user)
}

pub async fn seed_account(ledger: &Ledger, user: &User, name: &str) -> Result<Account> {
    let account = ledger
        .accounts
        .save(
            ctx(user),
            AccountDraft {
                name: Some(name.to_string()),
            },
        )
        .await?;
    Ok(account)
}

/// A settled entry draft dated now. Amount sign is left to the service.
pub fn entry_draft(acc_id: i64, type_str: &str, amount: i64) -> TransactionDraft {
    TransactionDraft {
        description: Some("test entry".to_string()),
        transaction_type: Some(type_str.to_string()),
        date: Some(Utc::now()),
        amount: Some(amount),
        status: Some(true),
        acc_id,
        transfer_id: None,
    }
}

pub fn transfer_draft(from: i64, to: i64, amount: i64) -> TransferDraft {
    TransferDraft {
        description: Some("test transfer".to_string()),
        date: Some(Utc::now()),
        amount: Some(amount),
        acc_ori_id: Some(from),
        acc_dest_id: Some(to),
    }
}

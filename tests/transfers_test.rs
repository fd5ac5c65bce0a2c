mod common;

use anyhow::Result;
use common::{ctx, seed_account, seed_user, test_ledger, transfer_draft};
use librum::application::AppError;
use librum::domain::{TransactionFilter, TransactionType, TransferDraft};

#[tokio::test]
async fn test_save_creates_transfer_and_balanced_pair() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    let user = seed_user(&ledger, "alice").await?;
    let source = seed_account(&ledger, &user, "Checking").await?;
    let dest = seed_account(&ledger, &user, "Savings").await?;

    let transfer = ledger
        .transfers
        .save(ctx(&user), transfer_draft(source.id, dest.id, 20_000))
        .await?;

    assert!(transfer.id > 0);
    assert_eq!(transfer.amount, 20_000);
    assert_eq!(transfer.user_id, user.id);

    let pair = ledger
        .transactions
        .find(ctx(&user), TransactionFilter::by_transfer(transfer.id))
        .await?;
    assert_eq!(pair.len(), 2);

    let outflow = &pair[0];
    let inflow = &pair[1];
    assert_eq!(outflow.transaction_type, TransactionType::Outflow);
    assert_eq!(outflow.amount, -20_000);
    assert_eq!(outflow.acc_id, source.id);
    assert_eq!(
        outflow.description,
        format!("Transfer to acc {}", dest.id)
    );
    assert_eq!(inflow.transaction_type, TransactionType::Inflow);
    assert_eq!(inflow.amount, 20_000);
    assert_eq!(inflow.acc_id, dest.id);
    assert_eq!(
        inflow.description,
        format!("Transfer from acc {}", source.id)
    );
    assert_eq!(outflow.amount + inflow.amount, 0);
    assert!(pair.iter().all(|entry| entry.is_settled()));
    Ok(())
}

#[tokio::test]
async fn test_validation_rejects_missing_fields_in_order() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    let user = seed_user(&ledger, "alice").await?;
    let source = seed_account(&ledger, &user, "Checking").await?;
    let dest = seed_account(&ledger, &user, "Savings").await?;

    let mut draft = transfer_draft(source.id, dest.id, 20_000);
    draft.description = None;
    draft.date = None;
    let err = ledger.transfers.save(ctx(&user), draft).await.unwrap_err();
    assert_eq!(err.to_string(), "description is a required attribute");

    let mut draft = transfer_draft(source.id, dest.id, 20_000);
    draft.amount = None;
    let err = ledger.transfers.save(ctx(&user), draft).await.unwrap_err();
    assert_eq!(err.to_string(), "amount is a required attribute");

    let mut draft = transfer_draft(source.id, dest.id, 20_000);
    draft.acc_dest_id = None;
    let err = ledger.transfers.save(ctx(&user), draft).await.unwrap_err();
    assert_eq!(err.to_string(), "acc_dest_id is a required attribute");
    Ok(())
}

#[tokio::test]
async fn test_self_transfer_is_rejected_and_persists_nothing() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    let user = seed_user(&ledger, "alice").await?;
    let account = seed_account(&ledger, &user, "Checking").await?;

    let err = ledger
        .transfers
        .save(ctx(&user), transfer_draft(account.id, account.id, 20_000))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(err.to_string(), "cannot transfer to the same account");

    assert!(ledger.transfers.find(ctx(&user)).await?.is_empty());
    let entries = ledger
        .transactions
        .find(ctx(&user), TransactionFilter::default())
        .await?;
    assert!(entries.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_source_account_must_belong_to_the_user() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    let alice = seed_user(&ledger, "alice").await?;
    let bob = seed_user(&ledger, "bob").await?;
    let bob_acc = seed_account(&ledger, &bob, "Checking").await?;
    let alice_acc = seed_account(&ledger, &alice, "Savings").await?;

    let err = ledger
        .transfers
        .save(ctx(&alice), transfer_draft(bob_acc.id, alice_acc.id, 20_000))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(err.to_string(), "source account does not belong to the user");
    Ok(())
}

#[tokio::test]
async fn test_missing_source_account_is_not_found() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    let user = seed_user(&ledger, "alice").await?;
    let dest = seed_account(&ledger, &user, "Savings").await?;

    let err = ledger
        .transfers
        .save(ctx(&user), transfer_draft(9999, dest.id, 20_000))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(err.to_string(), "source account does not exist");
    Ok(())
}

#[tokio::test]
async fn test_non_positive_amount_is_rejected() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    let user = seed_user(&ledger, "alice").await?;
    let source = seed_account(&ledger, &user, "Checking").await?;
    let dest = seed_account(&ledger, &user, "Savings").await?;

    let err = ledger
        .transfers
        .save(ctx(&user), transfer_draft(source.id, dest.id, 0))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "amount must be a positive value");

    let err = ledger
        .transfers
        .save(ctx(&user), transfer_draft(source.id, dest.id, -5_000))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "amount must be a positive value");
    Ok(())
}

#[tokio::test]
async fn test_update_replaces_the_pair_entirely() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    let user = seed_user(&ledger, "alice").await?;
    let source = seed_account(&ledger, &user, "Checking").await?;
    let dest = seed_account(&ledger, &user, "Savings").await?;

    let transfer = ledger
        .transfers
        .save(ctx(&user), transfer_draft(source.id, dest.id, 20_000))
        .await?;

    // Flip direction and change the amount.
    let mut draft = transfer_draft(dest.id, source.id, 50_000);
    draft.description = Some("corrected".to_string());
    let updated = ledger.transfers.update(ctx(&user), transfer.id, draft).await?;

    assert_eq!(updated.id, transfer.id);
    assert_eq!(updated.amount, 50_000);
    assert_eq!(updated.acc_ori_id, dest.id);
    assert_eq!(updated.acc_dest_id, source.id);
    assert_eq!(updated.description, "corrected");

    // Exactly the new pair, never a stale or duplicated set.
    let pair = ledger
        .transactions
        .find(ctx(&user), TransactionFilter::by_transfer(transfer.id))
        .await?;
    assert_eq!(pair.len(), 2);
    assert_eq!(pair[0].amount, -50_000);
    assert_eq!(pair[0].acc_id, dest.id);
    assert_eq!(pair[1].amount, 50_000);
    assert_eq!(pair[1].acc_id, source.id);
    // Regenerated entries stay settled.
    assert!(pair.iter().all(|entry| entry.is_settled()));
    Ok(())
}

#[tokio::test]
async fn test_update_missing_transfer_is_not_found() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    let user = seed_user(&ledger, "alice").await?;
    let source = seed_account(&ledger, &user, "Checking").await?;
    let dest = seed_account(&ledger, &user, "Savings").await?;

    let err = ledger
        .transfers
        .update(ctx(&user), 9999, transfer_draft(source.id, dest.id, 20_000))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn test_remove_deletes_transfer_and_pair() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    let user = seed_user(&ledger, "alice").await?;
    let source = seed_account(&ledger, &user, "Checking").await?;
    let dest = seed_account(&ledger, &user, "Savings").await?;

    let transfer = ledger
        .transfers
        .save(ctx(&user), transfer_draft(source.id, dest.id, 20_000))
        .await?;

    ledger.transfers.remove(transfer.id).await?;

    assert!(ledger.transfers.find_one(transfer.id).await?.is_none());
    let entries = ledger
        .transactions
        .find(ctx(&user), TransactionFilter::by_transfer(transfer.id))
        .await?;
    assert!(entries.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_find_lists_only_own_transfers() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    let alice = seed_user(&ledger, "alice").await?;
    let bob = seed_user(&ledger, "bob").await?;
    let alice_src = seed_account(&ledger, &alice, "Checking").await?;
    let alice_dst = seed_account(&ledger, &alice, "Savings").await?;
    let bob_src = seed_account(&ledger, &bob, "Checking").await?;
    let bob_dst = seed_account(&ledger, &bob, "Savings").await?;

    ledger
        .transfers
        .save(ctx(&alice), transfer_draft(alice_src.id, alice_dst.id, 10_000))
        .await?;
    ledger
        .transfers
        .save(ctx(&bob), transfer_draft(bob_src.id, bob_dst.id, 20_000))
        .await?;

    let transfers = ledger.transfers.find(ctx(&alice)).await?;
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].user_id, alice.id);
    Ok(())
}

#[tokio::test]
async fn test_ownership_guard_for_transfers() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    let alice = seed_user(&ledger, "alice").await?;
    let bob = seed_user(&ledger, "bob").await?;
    let source = seed_account(&ledger, &alice, "Checking").await?;
    let dest = seed_account(&ledger, &alice, "Savings").await?;

    let transfer = ledger
        .transfers
        .save(ctx(&alice), transfer_draft(source.id, dest.id, 20_000))
        .await?;

    let err = ledger
        .transfers
        .check_ownership(transfer.id, bob.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = ledger
        .transfers
        .check_ownership(9999, alice.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn test_validate_produces_a_persistable_transfer() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    let user = seed_user(&ledger, "alice").await?;
    let source = seed_account(&ledger, &user, "Checking").await?;
    let dest = seed_account(&ledger, &user, "Savings").await?;

    let draft = TransferDraft {
        description: Some("rent split".to_string()),
        date: Some(common::parse_date("2024-06-01")),
        amount: Some(75_050),
        acc_ori_id: Some(source.id),
        acc_dest_id: Some(dest.id),
    };
    let validated = ledger.transfers.validate(ctx(&user), draft).await?;

    assert_eq!(validated.description, "rent split");
    assert_eq!(validated.amount, 75_050);
    assert_eq!(validated.user_id, user.id);
    Ok(())
}

mod common;

use perk_ledger::LedgerError;

#[tokio::test]
async fn redeem_debits_and_hands_out_the_oldest_item() {
    let pool = common::setup_pool().await;
    let accounts = common::accounts(&pool);
    let inventory = common::inventory(&pool);
    let redemptions = common::redemptions(&pool);

    accounts.ensure_account(1, None, None).await.unwrap();
    accounts.adjust_balance(1, 10).await.unwrap();
    inventory.add_item("GIFT-1").await.unwrap();

    let redemption = redemptions.redeem(1, 7).await.unwrap();
    assert_eq!(redemption.item.payload, "GIFT-1");
    assert_eq!(redemption.new_balance, 3);
    assert_eq!(accounts.get_balance(1).await.unwrap(), 3);
    assert_eq!(inventory.count().await.unwrap(), 0);
}

#[tokio::test]
async fn redeem_with_insufficient_funds_mutates_nothing() {
    let pool = common::setup_pool().await;
    let accounts = common::accounts(&pool);
    let inventory = common::inventory(&pool);
    let redemptions = common::redemptions(&pool);

    accounts.ensure_account(1, None, None).await.unwrap();
    accounts.adjust_balance(1, 5).await.unwrap();
    let item_id = inventory.add_item("GIFT-1").await.unwrap();

    match redemptions.redeem(1, 7).await {
        Err(LedgerError::InsufficientFunds { balance: 5, required: 7 }) => {}
        other => panic!("expected InsufficientFunds, got {:?}", other),
    }

    // The claimed item was released back to its original position.
    assert_eq!(accounts.get_balance(1).await.unwrap(), 5);
    assert_eq!(inventory.count().await.unwrap(), 1);
    let peeked = inventory.peek_oldest_unclaimed().await.unwrap().unwrap();
    assert_eq!(peeked.id, item_id);
    assert!(!peeked.claimed);
}

#[tokio::test]
async fn redeem_against_empty_stock_mutates_nothing() {
    let pool = common::setup_pool().await;
    let accounts = common::accounts(&pool);
    let redemptions = common::redemptions(&pool);

    accounts.ensure_account(1, None, None).await.unwrap();
    accounts.adjust_balance(1, 10).await.unwrap();

    match redemptions.redeem(1, 7).await {
        Err(LedgerError::OutOfStock) => {}
        other => panic!("expected OutOfStock, got {:?}", other),
    }
    assert_eq!(accounts.get_balance(1).await.unwrap(), 10);
}

#[tokio::test]
async fn redeem_for_unknown_account_releases_the_claim() {
    let pool = common::setup_pool().await;
    let inventory = common::inventory(&pool);
    let redemptions = common::redemptions(&pool);

    inventory.add_item("GIFT-1").await.unwrap();

    match redemptions.redeem(404, 7).await {
        Err(LedgerError::AccountNotFound(404)) => {}
        other => panic!("expected AccountNotFound, got {:?}", other),
    }
    assert_eq!(inventory.count().await.unwrap(), 1);
}

#[tokio::test]
async fn concurrent_redemptions_settle_exactly() {
    let pool = common::setup_pool().await;
    let accounts = common::accounts(&pool);
    let inventory = common::inventory(&pool);
    let redemptions = common::redemptions(&pool);

    // Balance covers both redemptions exactly.
    accounts.ensure_account(1, None, None).await.unwrap();
    accounts.adjust_balance(1, 14).await.unwrap();
    for i in 0..5 {
        inventory.add_item(&format!("item-{}", i)).await.unwrap();
    }

    let mut handles = Vec::new();
    for _ in 0..2 {
        let redemptions = redemptions.clone();
        handles.push(tokio::spawn(async move { redemptions.redeem(1, 7).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(accounts.get_balance(1).await.unwrap(), 0);
    assert_eq!(inventory.count().await.unwrap(), 3);
}

#[tokio::test]
async fn losing_redemption_returns_its_item() {
    let pool = common::setup_pool().await;
    let accounts = common::accounts(&pool);
    let inventory = common::inventory(&pool);
    let redemptions = common::redemptions(&pool);

    // Balance covers only one of the two concurrent redemptions.
    accounts.ensure_account(1, None, None).await.unwrap();
    accounts.adjust_balance(1, 10).await.unwrap();
    inventory.add_item("only-one-affordable").await.unwrap();
    inventory.add_item("second").await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..2 {
        let redemptions = redemptions.clone();
        handles.push(tokio::spawn(async move { redemptions.redeem(1, 7).await }));
    }
    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(LedgerError::InsufficientFunds { .. }) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(accounts.get_balance(1).await.unwrap(), 3);
    // The loser's claim was compensated back into the queue.
    assert_eq!(inventory.count().await.unwrap(), 1);
}

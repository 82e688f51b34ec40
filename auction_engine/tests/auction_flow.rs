//! End-to-end flows through the auction engine against a real SQLite store.

use auction_engine::{
    commission::CommissionConfig,
    db_types::{
        BidStatusType, CommissionStatus, CommissionTier, CustomerId, DeliveryStatus, MasterId, OrderStatusType,
    },
    events::EventProducers,
    test_utils::{prepare_test_env, random_db_path, seed_bid, seed_order},
    AuctionError, AuctionFlowApi, MarketApi, SqliteDatabase, WalletApi,
};
use cap_common::Money;

fn flow_api(db: &SqliteDatabase) -> AuctionFlowApi<SqliteDatabase> {
    AuctionFlowApi::new(db.clone(), CommissionConfig::default(), EventProducers::default())
}

async fn new_test_db() -> SqliteDatabase {
    prepare_test_env(&random_db_path()).await
}

#[tokio::test]
async fn accept_bid_auto_pays_when_wallet_covers_commission() {
    let db = new_test_db().await;
    let flow = flow_api(&db);
    let wallet = WalletApi::new(db.clone());
    let market = MarketApi::new(db.clone());

    let order = flow.process_new_order(seed_order(1)).await.unwrap();
    let customer = order.customer_id.clone();
    let master = MasterId::from("master-alice");
    wallet.deposit(&master, Money::from(10_000), "bank_transfer", None).await.unwrap();

    let winning = flow.submit_bid(seed_bid(&order.order_id, "master-alice", 200_000, 14)).await.unwrap();
    let losing = flow.submit_bid(seed_bid(&order.order_id, "master-bob", 250_000, 10)).await.unwrap();

    let accepted = flow.accept_bid(winning.id, &customer).await.unwrap();
    assert!(accepted.auto_paid);
    assert_eq!(accepted.commission.commission_amount, Money::from(5_000));
    assert_eq!(accepted.commission.tier, CommissionTier::FirstMonth);
    assert_eq!(accepted.commission.rate, None);
    assert_eq!(accepted.commission.status, CommissionStatus::Paid);
    assert!(accepted.commission.paid_at.is_some());
    assert_eq!(accepted.order.status, OrderStatusType::InProgress);
    assert_eq!(accepted.order.assigned_master, Some(master.clone()));
    assert_eq!(accepted.order.final_price, Some(Money::from(200_000)));
    assert_eq!(accepted.bid.status, BidStatusType::Accepted);

    let profile = wallet.profile(&master).await.unwrap();
    assert_eq!(profile.wallet_balance, Money::from(5_000));
    assert_eq!(profile.commission_balance, Money::from(0));
    assert_eq!(profile.total_commission_paid, Money::from(5_000));
    assert_eq!(profile.first_month_orders, 1);

    // The ledger always reconciles with the balance
    let history = market.wallet_history(&master).await.unwrap();
    let ledger_total: Money = history.iter().map(|t| t.amount).sum();
    assert_eq!(ledger_total, profile.wallet_balance);
    assert_eq!(history.len(), 2);

    // The sibling bid was rejected at the same instant
    let bids = market.list_bids(&order.order_id, &customer).await.unwrap();
    let loser = bids.iter().find(|b| b.id == losing.id).unwrap();
    assert_eq!(loser.status, BidStatusType::Rejected);
}

#[tokio::test]
async fn accept_bid_registers_debt_when_wallet_cannot_cover() {
    let db = new_test_db().await;
    let flow = flow_api(&db);
    let wallet = WalletApi::new(db.clone());

    let order = flow.process_new_order(seed_order(1)).await.unwrap();
    let customer = order.customer_id.clone();
    let master = MasterId::from("master-alice");
    wallet.deposit(&master, Money::from(3_000), "bank_transfer", None).await.unwrap();

    let bid = flow.submit_bid(seed_bid(&order.order_id, "master-alice", 200_000, 14)).await.unwrap();
    let accepted = flow.accept_bid(bid.id, &customer).await.unwrap();

    // The commission becomes a debt, not a blocker for this order
    assert!(!accepted.auto_paid);
    assert_eq!(accepted.commission.status, CommissionStatus::Pending);
    assert_eq!(accepted.commission.commission_amount, Money::from(5_000));
    assert!(accepted.commission.paid_at.is_none());
    assert_eq!(accepted.order.status, OrderStatusType::InProgress);

    let profile = wallet.profile(&master).await.unwrap();
    assert_eq!(profile.wallet_balance, Money::from(3_000));
    assert_eq!(profile.commission_balance, Money::from(5_000));
    assert_eq!(profile.total_commission_paid, Money::from(0));
}

#[tokio::test]
async fn debt_blocks_bidding_until_settled() {
    let db = new_test_db().await;
    let flow = flow_api(&db);
    let wallet = WalletApi::new(db.clone());

    let first = flow.process_new_order(seed_order(1)).await.unwrap();
    let second = flow.process_new_order(seed_order(2)).await.unwrap();
    let master = MasterId::from("master-alice");

    let bid = flow.submit_bid(seed_bid(&first.order_id, "master-alice", 100_000, 7)).await.unwrap();
    flow.accept_bid(bid.id, &first.customer_id).await.unwrap();

    let err = flow.submit_bid(seed_bid(&second.order_id, "master-alice", 80_000, 7)).await.unwrap_err();
    match err {
        AuctionError::UnpaidCommissionsExist { owed, .. } => assert_eq!(owed, Money::from(5_000)),
        e => panic!("Expected UnpaidCommissionsExist, got {e}"),
    }

    wallet.deposit(&master, Money::from(6_000), "card", None).await.unwrap();
    let settled = wallet.pay_all_pending(&master).await.unwrap();
    assert_eq!(settled.total, Money::from(5_000));

    flow.submit_bid(seed_bid(&second.order_id, "master-alice", 80_000, 7)).await.unwrap();
}

#[tokio::test]
async fn debt_is_rechecked_at_acceptance() {
    let db = new_test_db().await;
    let flow = flow_api(&db);

    let first = flow.process_new_order(seed_order(1)).await.unwrap();
    let second = flow.process_new_order(seed_order(2)).await.unwrap();

    // Both bids go in while the master is debt-free
    let bid_a = flow.submit_bid(seed_bid(&first.order_id, "master-alice", 100_000, 7)).await.unwrap();
    let bid_b = flow.submit_bid(seed_bid(&second.order_id, "master-alice", 90_000, 7)).await.unwrap();

    // Winning the first order with an empty wallet puts the master in debt...
    flow.accept_bid(bid_a.id, &first.customer_id).await.unwrap();
    // ...which blocks the second win even though the bid predates the debt
    let err = flow.accept_bid(bid_b.id, &second.customer_id).await.unwrap_err();
    assert!(matches!(err, AuctionError::UnpaidCommissionsExist { .. }));
}

#[tokio::test]
async fn concurrent_accepts_on_same_order_yield_one_winner() {
    let url = random_db_path();
    prepare_test_env(&url).await;
    // A single-connection pool serialises the two settlement transactions while both calls race for it.
    let db = SqliteDatabase::new_with_url(&url, 1).await.unwrap();
    let flow = flow_api(&db);

    let order = flow.process_new_order(seed_order(1)).await.unwrap();
    let customer = order.customer_id.clone();
    let bid_a = flow.submit_bid(seed_bid(&order.order_id, "master-alice", 100_000, 7)).await.unwrap();
    let bid_b = flow.submit_bid(seed_bid(&order.order_id, "master-bob", 90_000, 9)).await.unwrap();

    let (ra, rb) = tokio::join!(flow.accept_bid(bid_a.id, &customer), flow.accept_bid(bid_b.id, &customer));
    let (winner, loser) = match (ra, rb) {
        (Ok(a), Err(e)) => (a, e),
        (Err(e), Ok(b)) => (b, e),
        (Ok(_), Ok(_)) => panic!("Both accepts succeeded on the same order"),
        (Err(e1), Err(e2)) => panic!("Both accepts failed: {e1} / {e2}"),
    };
    assert_eq!(winner.order.status, OrderStatusType::InProgress);
    assert!(matches!(loser, AuctionError::OrderNotInAuction { .. }));

    // Retrying the winning accept is a conflict, with no further side effects
    let err = flow.accept_bid(winner.bid.id, &customer).await.unwrap_err();
    assert!(matches!(err, AuctionError::OrderNotInAuction { .. }));
}

#[tokio::test]
async fn racing_accepts_on_a_contended_pool_resolve_to_one_winner() {
    let url = random_db_path();
    prepare_test_env(&url).await;
    // A wide pool lets both settlement transactions start concurrently, so the writers genuinely collide inside
    // SQLite and the lock-conflict retry path is exercised rather than serialised away.
    let db = SqliteDatabase::new_with_url(&url, 25).await.unwrap();
    let flow = flow_api(&db);

    for round in 1..=10u32 {
        let order = flow.process_new_order(seed_order(round)).await.unwrap();
        let customer = order.customer_id.clone();
        // Fresh masters every round so no commission debt carries over
        let first = format!("master-{round}-a");
        let second = format!("master-{round}-b");
        let bid_a = flow.submit_bid(seed_bid(&order.order_id, &first, 100_000, 7)).await.unwrap();
        let bid_b = flow.submit_bid(seed_bid(&order.order_id, &second, 90_000, 9)).await.unwrap();

        let (ra, rb) = tokio::join!(flow.accept_bid(bid_a.id, &customer), flow.accept_bid(bid_b.id, &customer));
        let (winner, loser) = match (ra, rb) {
            (Ok(a), Err(e)) => (a, e),
            (Err(e), Ok(b)) => (b, e),
            (Ok(_), Ok(_)) => panic!("Round {round}: both accepts succeeded on the same order"),
            (Err(e1), Err(e2)) => panic!("Round {round}: both accepts failed: {e1} / {e2}"),
        };
        assert_eq!(winner.order.status, OrderStatusType::InProgress);
        assert_eq!(winner.bid.status, BidStatusType::Accepted);
        // The loser observes the closed auction, whether it lost the race outright or after a retried conflict
        assert!(
            matches!(loser, AuctionError::OrderNotInAuction { .. }),
            "Round {round}: expected OrderNotInAuction, got {loser}"
        );
    }
}

#[tokio::test]
async fn fourth_order_in_enrollment_month_is_billed_percentage() {
    let db = new_test_db().await;
    let flow = flow_api(&db);
    let wallet = WalletApi::new(db.clone());
    let master = MasterId::from("master-alice");
    wallet.deposit(&master, Money::from(100_000), "bank_transfer", None).await.unwrap();

    let mut tiers = Vec::new();
    let mut amounts = Vec::new();
    for n in 1..=4 {
        let order = flow.process_new_order(seed_order(n)).await.unwrap();
        let bid = flow.submit_bid(seed_bid(&order.order_id, "master-alice", 200_000, 7)).await.unwrap();
        let accepted = flow.accept_bid(bid.id, &order.customer_id).await.unwrap();
        tiers.push(accepted.commission.tier);
        amounts.push(accepted.commission.commission_amount);
    }
    assert_eq!(
        tiers,
        vec![
            CommissionTier::FirstMonth,
            CommissionTier::FirstMonth,
            CommissionTier::FirstMonth,
            CommissionTier::Percentage
        ]
    );
    assert_eq!(amounts[..3], [Money::from(5_000), Money::from(5_000), Money::from(5_000)]);
    assert_eq!(amounts[3], Money::from(6_000));

    let profile = wallet.profile(&master).await.unwrap();
    assert_eq!(profile.first_month_orders, 3);
    assert_eq!(profile.total_commission_paid, Money::from(21_000));
}

#[tokio::test]
async fn resubmitting_a_bid_replaces_it_in_place() {
    let db = new_test_db().await;
    let flow = flow_api(&db);
    let market = MarketApi::new(db.clone());

    let order = flow.process_new_order(seed_order(1)).await.unwrap();
    let first = flow.submit_bid(seed_bid(&order.order_id, "master-alice", 120_000, 20)).await.unwrap();
    let second = flow
        .submit_bid(seed_bid(&order.order_id, "master-alice", 95_000, 15).with_note("Sharpened my pencil"))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    let bids = market.list_bids(&order.order_id, &order.customer_id).await.unwrap();
    assert_eq!(bids.len(), 1);
    assert_eq!(bids[0].price, Money::from(95_000));
    assert_eq!(bids[0].days, 15);
    assert_eq!(bids[0].note.as_deref(), Some("Sharpened my pencil"));
    assert_eq!(bids[0].status, BidStatusType::Pending);
}

#[tokio::test]
async fn bid_validation_and_auction_gating() {
    let db = new_test_db().await;
    let flow = flow_api(&db);

    let order = flow.process_new_order(seed_order(1)).await.unwrap();
    let err = flow.submit_bid(seed_bid(&order.order_id, "master-alice", 0, 7)).await.unwrap_err();
    assert!(matches!(err, AuctionError::InvalidAmount(_)));
    let err = flow.submit_bid(seed_bid(&order.order_id, "master-alice", 50_000, 0)).await.unwrap_err();
    assert!(matches!(err, AuctionError::InvalidDuration(0)));
    let err = flow.submit_bid(seed_bid(&"order-missing".into(), "master-alice", 50_000, 7)).await.unwrap_err();
    assert!(matches!(err, AuctionError::OrderNotFound(_)));

    let bid = flow.submit_bid(seed_bid(&order.order_id, "master-alice", 50_000, 7)).await.unwrap();
    flow.accept_bid(bid.id, &order.customer_id).await.unwrap();
    let err = flow.submit_bid(seed_bid(&order.order_id, "master-bob", 45_000, 7)).await.unwrap_err();
    assert!(matches!(err, AuctionError::OrderNotInAuction { .. }));
}

#[tokio::test]
async fn withdraw_bid_checks_owner_and_auction_state() {
    let db = new_test_db().await;
    let flow = flow_api(&db);
    let market = MarketApi::new(db.clone());

    let order = flow.process_new_order(seed_order(1)).await.unwrap();
    let bid = flow.submit_bid(seed_bid(&order.order_id, "master-alice", 50_000, 7)).await.unwrap();

    let err = flow.withdraw_bid(bid.id, &MasterId::from("master-mallory")).await.unwrap_err();
    assert!(matches!(err, AuctionError::NotBidOwner { .. }));
    let err = flow.withdraw_bid(9_999, &MasterId::from("master-alice")).await.unwrap_err();
    assert!(matches!(err, AuctionError::BidNotFound(9_999)));

    flow.withdraw_bid(bid.id, &MasterId::from("master-alice")).await.unwrap();
    assert!(market.list_bids(&order.order_id, &order.customer_id).await.unwrap().is_empty());

    // Once the auction closes, remaining bids are frozen
    let bid = flow.submit_bid(seed_bid(&order.order_id, "master-alice", 50_000, 7)).await.unwrap();
    let rejected = flow.submit_bid(seed_bid(&order.order_id, "master-bob", 60_000, 7)).await.unwrap();
    flow.accept_bid(bid.id, &order.customer_id).await.unwrap();
    let err = flow.withdraw_bid(rejected.id, &MasterId::from("master-bob")).await.unwrap_err();
    assert!(matches!(err, AuctionError::OrderNotInAuction { .. }));
}

#[tokio::test]
async fn bid_board_is_sorted_and_customer_only() {
    let db = new_test_db().await;
    let flow = flow_api(&db);
    let market = MarketApi::new(db.clone());

    let order = flow.process_new_order(seed_order(1)).await.unwrap();
    flow.submit_bid(seed_bid(&order.order_id, "master-bob", 80_000, 10)).await.unwrap();
    flow.submit_bid(seed_bid(&order.order_id, "master-alice", 60_000, 14)).await.unwrap();
    flow.submit_bid(seed_bid(&order.order_id, "master-carol", 80_000, 12)).await.unwrap();

    let bids = market.list_bids(&order.order_id, &order.customer_id).await.unwrap();
    let prices: Vec<i64> = bids.iter().map(|b| b.price.value()).collect();
    assert_eq!(prices, vec![60_000, 80_000, 80_000]);
    // Equal prices tie-break on earliest submission
    assert_eq!(bids[1].master_id, MasterId::from("master-bob"));
    assert_eq!(bids[2].master_id, MasterId::from("master-carol"));

    let err = market.list_bids(&order.order_id, &CustomerId::from("customer-nosy")).await.unwrap_err();
    assert!(matches!(err, AuctionError::NotOrderOwner { .. }));
}

#[tokio::test]
async fn competition_summary_counts_pending_bids_only() {
    let db = new_test_db().await;
    let flow = flow_api(&db);
    let market = MarketApi::new(db.clone());

    let order = flow.process_new_order(seed_order(1)).await.unwrap();
    let empty = market.competition_summary(&order.order_id).await.unwrap();
    assert_eq!(empty.bid_count, 0);
    assert_eq!(empty.min_price, None);

    flow.submit_bid(seed_bid(&order.order_id, "master-alice", 60_000, 14)).await.unwrap();
    flow.submit_bid(seed_bid(&order.order_id, "master-bob", 100_000, 10)).await.unwrap();
    let summary = market.competition_summary(&order.order_id).await.unwrap();
    assert_eq!(summary.bid_count, 2);
    assert_eq!(summary.min_price, Some(Money::from(60_000)));
    assert_eq!(summary.max_price, Some(Money::from(100_000)));
    assert_eq!(summary.avg_price, Some(Money::from(80_000)));

    let err = market.competition_summary(&"order-missing".into()).await.unwrap_err();
    assert!(matches!(err, AuctionError::OrderNotFound(_)));
}

#[tokio::test]
async fn delivery_transitions_are_guarded() {
    let db = new_test_db().await;
    let flow = flow_api(&db);

    let order = flow.process_new_order(seed_order(1)).await.unwrap();
    let customer = order.customer_id.clone();
    let master = MasterId::from("master-alice");
    let bid = flow.submit_bid(seed_bid(&order.order_id, "master-alice", 50_000, 7)).await.unwrap();

    // Nothing ships while the order is still in auction
    let err = flow.mark_shipped(&order.order_id, &master).await.unwrap_err();
    assert!(matches!(err, AuctionError::NotAssignedMaster { .. }));

    flow.accept_bid(bid.id, &customer).await.unwrap();

    let err = flow.mark_shipped(&order.order_id, &MasterId::from("master-mallory")).await.unwrap_err();
    assert!(matches!(err, AuctionError::NotAssignedMaster { .. }));
    let err = flow.confirm_delivery(&order.order_id, &customer).await.unwrap_err();
    assert!(matches!(err, AuctionError::InvalidDeliveryState { .. }));

    let shipped = flow.mark_shipped(&order.order_id, &master).await.unwrap();
    assert_eq!(shipped.delivery_status, DeliveryStatus::Shipped);
    assert_eq!(shipped.status, OrderStatusType::InProgress);
    let err = flow.mark_shipped(&order.order_id, &master).await.unwrap_err();
    assert!(matches!(err, AuctionError::InvalidDeliveryState { .. }));

    let err = flow.confirm_delivery(&order.order_id, &CustomerId::from("customer-nosy")).await.unwrap_err();
    assert!(matches!(err, AuctionError::NotOrderOwner { .. }));
    let delivered = flow.confirm_delivery(&order.order_id, &customer).await.unwrap();
    assert_eq!(delivered.delivery_status, DeliveryStatus::Delivered);
    assert_eq!(delivered.status, OrderStatusType::Completed);
}

#[tokio::test]
async fn cancelling_an_order_rejects_bids_and_cancels_pending_commission() {
    let db = new_test_db().await;
    let flow = flow_api(&db);
    let wallet = WalletApi::new(db.clone());
    let market = MarketApi::new(db.clone());

    // Cancel during auction: bids are rejected
    let auction = flow.process_new_order(seed_order(1)).await.unwrap();
    flow.submit_bid(seed_bid(&auction.order_id, "master-alice", 50_000, 7)).await.unwrap();
    let cancelled = flow.cancel_order(&auction.order_id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatusType::Cancelled);
    let bids = market.list_bids(&auction.order_id, &auction.customer_id).await.unwrap();
    assert!(bids.iter().all(|b| b.status == BidStatusType::Rejected));

    // Cancel in progress: the unpaid commission dies with the order
    let order = flow.process_new_order(seed_order(2)).await.unwrap();
    let master = MasterId::from("master-bob");
    let bid = flow.submit_bid(seed_bid(&order.order_id, "master-bob", 100_000, 7)).await.unwrap();
    flow.accept_bid(bid.id, &order.customer_id).await.unwrap();
    assert_eq!(wallet.profile(&master).await.unwrap().commission_balance, Money::from(5_000));

    flow.cancel_order(&order.order_id).await.unwrap();
    let profile = wallet.profile(&master).await.unwrap();
    assert_eq!(profile.commission_balance, Money::from(0));
    assert!(market.pending_commissions(&master).await.unwrap().is_empty());

    // A completed order cannot be cancelled
    let err = flow.cancel_order(&order.order_id).await.unwrap_err();
    assert!(matches!(err, AuctionError::InvalidOrderTransition { .. }));
}

#[tokio::test]
async fn order_intake_is_idempotent() {
    let db = new_test_db().await;
    let flow = flow_api(&db);
    let order = flow.process_new_order(seed_order(1)).await.unwrap();
    let replay = flow.process_new_order(seed_order(1)).await.unwrap();
    assert_eq!(order.id, replay.id);
    assert_eq!(replay.status, OrderStatusType::Auction);
}

#[tokio::test]
async fn accepting_an_unknown_bid_or_foreign_order_fails_cleanly() {
    let db = new_test_db().await;
    let flow = flow_api(&db);
    let order = flow.process_new_order(seed_order(1)).await.unwrap();
    let bid = flow.submit_bid(seed_bid(&order.order_id, "master-alice", 50_000, 7)).await.unwrap();

    let err = flow.accept_bid(404, &order.customer_id).await.unwrap_err();
    assert!(matches!(err, AuctionError::BidNotFound(404)));
    let err = flow.accept_bid(bid.id, &CustomerId::from("customer-nosy")).await.unwrap_err();
    assert!(matches!(err, AuctionError::NotOrderOwner { .. }));

    // Neither failure left a mark
    let market = MarketApi::new(db.clone());
    let fresh = market.order(&order.order_id).await.unwrap().unwrap();
    assert_eq!(fresh.status, OrderStatusType::Auction);
    assert_eq!(fresh.assigned_master, None);
}

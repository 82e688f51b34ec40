use actix_web::http::StatusCode;
use auction_engine::db_types::{Bid, CommissionTransaction, MasterProfile, WalletTransaction};
use cap_common::Money;
use serde_json::json;

use super::helpers::{get_request, new_test_db, post_request, Identity};
use auction_engine::SqliteDatabase;

const MASTER: Identity<'static> = Identity::Master("master-alice");

/// Wins an order for master-alice with an empty wallet, leaving one pending commission. Returns its id.
async fn incur_debt(db: &SqliteDatabase, order_no: u32) -> i64 {
    let customer = Identity::Customer("customer-1");
    let order_id = format!("order-{order_no}");
    post_request(db, customer, "/api/orders", json!({ "order_id": order_id, "title": "Oak table" })).await;
    let (_, body) =
        post_request(db, MASTER, &format!("/api/orders/{order_id}/bids"), json!({ "price": 90_000, "days": 10 }))
            .await;
    let bid: Bid = serde_json::from_str(&body).unwrap();
    post_request(db, customer, &format!("/api/bids/{}/accept", bid.id), json!({})).await;
    let (_, body) = get_request(db, MASTER, "/api/commissions").await;
    let pending: Vec<CommissionTransaction> = serde_json::from_str(&body).unwrap();
    pending.last().unwrap().id
}

#[actix_web::test]
async fn deposits_show_up_in_balance_and_history() {
    let db = new_test_db().await;

    let deposit = json!({ "amount": 10_000, "method": "bank_transfer", "details": "ref 772" });
    let (status, body) = post_request(&db, MASTER, "/api/wallet/deposit", deposit).await;
    assert_eq!(status, StatusCode::OK);
    let tx: WalletTransaction = serde_json::from_str(&body).unwrap();
    assert_eq!(tx.amount, Money::from(10_000));

    let (status, body) = get_request(&db, MASTER, "/api/wallet/balance").await;
    assert_eq!(status, StatusCode::OK);
    let profile: MasterProfile = serde_json::from_str(&body).unwrap();
    assert_eq!(profile.wallet_balance, Money::from(10_000));

    let (status, body) = get_request(&db, MASTER, "/api/wallet/history").await;
    assert_eq!(status, StatusCode::OK);
    let history: Vec<WalletTransaction> = serde_json::from_str(&body).unwrap();
    assert_eq!(history.len(), 1);
}

#[actix_web::test]
async fn non_positive_deposits_are_a_bad_request() {
    let db = new_test_db().await;
    let (status, body) = post_request(&db, MASTER, "/api/wallet/deposit", json!({ "amount": 0, "method": "card" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("must be positive"));
}

#[actix_web::test]
async fn commission_settlement_over_http() {
    let db = new_test_db().await;
    let tx_id = incur_debt(&db, 1).await;

    // Not enough in the wallet: 402, and the debt stays
    post_request(&db, MASTER, "/api/wallet/deposit", json!({ "amount": 3_000, "method": "card" })).await;
    let (status, _) = post_request(&db, MASTER, "/api/wallet/pay-commission", json!({ "commissionId": tx_id })).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);

    post_request(&db, MASTER, "/api/wallet/deposit", json!({ "amount": 3_000, "method": "card" })).await;
    let (status, body) = post_request(&db, MASTER, "/api/wallet/pay-commission", json!({ "commissionId": tx_id })).await;
    assert_eq!(status, StatusCode::OK);
    let paid: CommissionTransaction = serde_json::from_str(&body).unwrap();
    assert!(paid.paid_at.is_some());

    // Paying again is a conflict
    let (status, _) = post_request(&db, MASTER, "/api/wallet/pay-commission", json!({ "commissionId": tx_id })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = get_request(&db, MASTER, "/api/commissions").await;
    let pending: Vec<CommissionTransaction> = serde_json::from_str(&body).unwrap();
    assert!(pending.is_empty());
    let (_, body) = get_request(&db, MASTER, "/api/wallet/balance").await;
    let profile: MasterProfile = serde_json::from_str(&body).unwrap();
    assert_eq!(profile.wallet_balance, Money::from(1_000));
    assert_eq!(profile.commission_balance, Money::from(0));
}

#[actix_web::test]
async fn pay_all_sweeps_the_outstanding_debt() {
    let db = new_test_db().await;
    incur_debt(&db, 1).await;
    post_request(&db, MASTER, "/api/wallet/deposit", json!({ "amount": 8_000, "method": "bank_transfer" })).await;

    let (status, body) = post_request(&db, MASTER, "/api/wallet/pay-all", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let settled: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(settled["total"], 5_000);
    assert_eq!(settled["settled"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn calculator_quotes_a_new_master_at_the_flat_fee() {
    let db = new_test_db().await;
    let (status, body) =
        post_request(&db, MASTER, "/api/commissions/calculate", json!({ "orderAmount": 200_000 })).await;
    assert_eq!(status, StatusCode::OK);
    let quote: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(quote["amount"], 5_000);
    assert_eq!(quote["tier"], "FirstMonth");
}

use actix_web::http::StatusCode;
use auction_engine::db_types::{Bid, Order, OrderStatusType};
use serde_json::json;

use super::helpers::{delete_request, get_request, new_test_db, post_request, Identity};

#[actix_web::test]
async fn full_auction_flow_over_http() {
    let db = new_test_db().await;
    let customer = Identity::Customer("customer-1");
    let master = Identity::Master("master-alice");

    let order_body = json!({ "order_id": "order-1", "title": "Walnut bookshelf", "description": "Two metres tall" });
    let (status, body) = post_request(&db, customer, "/api/orders", order_body).await;
    assert_eq!(status, StatusCode::OK);
    let order: Order = serde_json::from_str(&body).unwrap();
    assert_eq!(order.status, OrderStatusType::Auction);

    let bid_body = json!({ "price": 150_000, "days": 21 });
    let (status, body) = post_request(&db, master, "/api/orders/order-1/bids", bid_body).await;
    assert_eq!(status, StatusCode::OK);
    let bid: Bid = serde_json::from_str(&body).unwrap();

    let (status, body) = get_request(&db, customer, "/api/orders/order-1/bids").await;
    assert_eq!(status, StatusCode::OK);
    let bids: Vec<Bid> = serde_json::from_str(&body).unwrap();
    assert_eq!(bids.len(), 1);

    // Accepting with an empty wallet books the commission as a debt
    let (status, body) = post_request(&db, customer, &format!("/api/bids/{}/accept", bid.id), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let settlement: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(settlement["commissionAmount"], 5_000);
    assert_eq!(settlement["commissionPaid"], false);

    let (status, body) = get_request(&db, Identity::Anonymous, "/api/orders/order-1").await;
    assert_eq!(status, StatusCode::OK);
    let order: Order = serde_json::from_str(&body).unwrap();
    assert_eq!(order.status, OrderStatusType::InProgress);
    assert_eq!(order.final_price, Some(150_000.into()));
}

#[actix_web::test]
async fn identity_headers_are_enforced() {
    let db = new_test_db().await;
    let bid_body = json!({ "price": 150_000, "days": 21 });

    let (status, body) = post_request(&db, Identity::Anonymous, "/api/orders/order-1/bids", bid_body.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("No verified identity"));

    // A customer cannot use a master-only endpoint
    let (status, _) = post_request(&db, Identity::Customer("customer-1"), "/api/orders/order-1/bids", bid_body).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn bid_board_is_visible_to_the_order_owner_only() {
    let db = new_test_db().await;
    let order_body = json!({ "order_id": "order-1", "title": "Walnut bookshelf" });
    post_request(&db, Identity::Customer("customer-1"), "/api/orders", order_body).await;

    let (status, _) = get_request(&db, Identity::Customer("customer-2"), "/api/orders/order-1/bids").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Masters get the anonymised summary instead
    let (status, body) = get_request(&db, Identity::Master("master-bob"), "/api/orders/order-1/competition").await;
    assert_eq!(status, StatusCode::OK);
    let summary: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(summary["bid_count"], 0);

    let (status, _) = get_request(&db, Identity::Anonymous, "/api/orders/order-1/competition").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn unknown_order_is_a_json_404() {
    let db = new_test_db().await;
    let (status, body) = get_request(&db, Identity::Anonymous, "/api/orders/no-such-order").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let err: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(err["error"].as_str().unwrap().contains("no-such-order"));
}

#[actix_web::test]
async fn indebted_master_is_refused_new_bids() {
    let db = new_test_db().await;
    let customer = Identity::Customer("customer-1");
    let master = Identity::Master("master-alice");

    post_request(&db, customer, "/api/orders", json!({ "order_id": "order-1", "title": "Oak table" })).await;
    let (_, body) = post_request(&db, master, "/api/orders/order-1/bids", json!({ "price": 90_000, "days": 10 })).await;
    let bid: Bid = serde_json::from_str(&body).unwrap();
    post_request(&db, customer, &format!("/api/bids/{}/accept", bid.id), json!({})).await;

    post_request(&db, customer, "/api/orders", json!({ "order_id": "order-2", "title": "Oak chairs" })).await;
    let (status, body) =
        post_request(&db, master, "/api/orders/order-2/bids", json!({ "price": 40_000, "days": 5 })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("unpaid commissions totalling 5000"));
}

#[actix_web::test]
async fn withdraw_and_cancel_round_out_the_flow() {
    let db = new_test_db().await;
    let customer = Identity::Customer("customer-1");
    let master = Identity::Master("master-alice");

    post_request(&db, customer, "/api/orders", json!({ "order_id": "order-1", "title": "Oak table" })).await;
    let (_, body) = post_request(&db, master, "/api/orders/order-1/bids", json!({ "price": 90_000, "days": 10 })).await;
    let bid: Bid = serde_json::from_str(&body).unwrap();

    // Only the bid's owner can withdraw it
    let (status, _) = delete_request(&db, Identity::Master("master-bob"), &format!("/api/bids/{}", bid.id)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = delete_request(&db, master, &format!("/api/bids/{}", bid.id)).await;
    assert_eq!(status, StatusCode::OK);

    // Only the order's owner can cancel it
    let (status, _) = post_request(&db, Identity::Customer("customer-2"), "/api/orders/order-1/cancel", json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = post_request(&db, customer, "/api/orders/order-1/cancel", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let order: Order = serde_json::from_str(&body).unwrap();
    assert_eq!(order.status, OrderStatusType::Cancelled);

    // Cancelling twice is a conflict
    let (status, _) = post_request(&db, customer, "/api/orders/order-1/cancel", json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

use cap_common::Money;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{DeliveryStatus, MasterId, NewOrder, Order, OrderId, OrderStatusType},
    traits::AuctionError,
};

const ORDER_COLUMNS: &str = r#"
    id, order_id, customer_id, title, description, budget_min, budget_max, deadline,
    status, delivery_status, assigned_master, final_price, created_at, updated_at
"#;

/// Returns the order for the given `order_id`, or `None` if it does not exist.
pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, AuctionError> {
    let q = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1");
    let order = sqlx::query_as::<_, Order>(&q).bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Inserts a new order in the `Auction` state. Idempotent on `order_id`: replaying an order that already exists
/// returns the stored row untouched.
pub async fn idempotent_insert(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, AuctionError> {
    if let Some(existing) = fetch_order_by_order_id(&order.order_id, &mut *conn).await? {
        debug!("🗃️ Order {} already exists. Nothing to do.", order.order_id);
        return Ok(existing);
    }
    let q = format!(
        r#"
        INSERT INTO orders (order_id, customer_id, title, description, budget_min, budget_max, deadline)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {ORDER_COLUMNS}
        "#
    );
    let inserted = sqlx::query_as::<_, Order>(&q)
        .bind(order.order_id.as_str())
        .bind(&order.customer_id)
        .bind(&order.title)
        .bind(&order.description)
        .bind(order.budget_min)
        .bind(order.budget_max)
        .bind(order.deadline)
        .fetch_one(conn)
        .await?;
    debug!("🗃️ Order {} saved with id {}", inserted.order_id, inserted.id);
    Ok(inserted)
}

/// Moves the order into `InProgress` with the winning master assigned and the final price fixed.
pub async fn assign_master(
    order_id: &OrderId,
    master: &MasterId,
    final_price: Money,
    conn: &mut SqliteConnection,
) -> Result<(), AuctionError> {
    let status = OrderStatusType::InProgress.to_string();
    sqlx::query(
        r#"UPDATE orders SET
           status = $1,
           assigned_master = $2,
           final_price = $3,
           updated_at = CURRENT_TIMESTAMP
           WHERE order_id = $4"#,
    )
    .bind(status)
    .bind(master)
    .bind(final_price)
    .bind(order_id.as_str())
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn update_order_status(
    order_id: &OrderId,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<(), AuctionError> {
    let status = status.to_string();
    sqlx::query("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE order_id = $2")
        .bind(status)
        .bind(order_id.as_str())
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn update_delivery_status(
    order_id: &OrderId,
    delivery: DeliveryStatus,
    conn: &mut SqliteConnection,
) -> Result<(), AuctionError> {
    let delivery = delivery.to_string();
    sqlx::query("UPDATE orders SET delivery_status = $1, updated_at = CURRENT_TIMESTAMP WHERE order_id = $2")
        .bind(delivery)
        .bind(order_id.as_str())
        .execute(conn)
        .await?;
    Ok(())
}

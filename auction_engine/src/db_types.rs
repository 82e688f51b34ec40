use std::{fmt::Display, str::FromStr};

use cap_common::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value for {0}: {1}")]
pub struct ConversionError(pub &'static str, pub String);

//--------------------------------------      OrderId        ---------------------------------------------------------
/// The public identifier of a customer order, assigned by the order-intake system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------      MasterId       ---------------------------------------------------------
/// A lightweight wrapper around the verified identity of a master, as supplied by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct MasterId(pub String);

impl<S: Into<String>> From<S> for MasterId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl Display for MasterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl MasterId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------     CustomerId      ---------------------------------------------------------
/// A lightweight wrapper around the verified identity of a customer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct CustomerId(pub String);

impl<S: Into<String>> From<S> for CustomerId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------   OrderStatusType   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order is open for bidding.
    Auction,
    /// A bid has been accepted and the assigned master is working on the order.
    InProgress,
    /// The work has been delivered and is awaiting the customer's review.
    Review,
    /// The order has been completed.
    Completed,
    /// The order has been cancelled by the customer or an admin.
    Cancelled,
}

impl OrderStatusType {
    /// Whether the main-state machine permits moving from `self` to `new`.
    ///
    /// The forward chain is Auction → InProgress → Review → Completed, with Cancelled reachable from
    /// Auction and InProgress only. InProgress → Completed is permitted directly, since confirming
    /// delivery completes the order without a separate review step.
    pub fn can_transition(&self, new: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!(
            (*self, new),
            (Auction, InProgress) |
                (Auction, Cancelled) |
                (InProgress, Review) |
                (InProgress, Completed) |
                (InProgress, Cancelled) |
                (Review, Completed)
        )
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Auction => write!(f, "Auction"),
            OrderStatusType::InProgress => write!(f, "InProgress"),
            OrderStatusType::Review => write!(f, "Review"),
            OrderStatusType::Completed => write!(f, "Completed"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Auction" => Ok(Self::Auction),
            "InProgress" => Ok(Self::InProgress),
            "Review" => Ok(Self::Review),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError("order status", s.to_string())),
        }
    }
}

//--------------------------------------   DeliveryStatus    ---------------------------------------------------------
/// The delivery sub-state of an order. Only meaningful while the order is `InProgress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum DeliveryStatus {
    Pending,
    Shipped,
    Delivered,
}

impl Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::Pending => write!(f, "Pending"),
            DeliveryStatus::Shipped => write!(f, "Shipped"),
            DeliveryStatus::Delivered => write!(f, "Delivered"),
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            s => Err(ConversionError("delivery status", s.to_string())),
        }
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub title: String,
    pub description: String,
    pub budget_min: Option<Money>,
    pub budget_max: Option<Money>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: OrderStatusType,
    pub delivery_status: DeliveryStatus,
    pub assigned_master: Option<MasterId>,
    pub final_price: Option<Money>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      NewOrder       ---------------------------------------------------------
/// An order as it arrives from the customer-facing intake system. New orders always enter the `Auction` state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub title: String,
    pub description: String,
    pub budget_min: Option<Money>,
    pub budget_max: Option<Money>,
    pub deadline: Option<DateTime<Utc>>,
}

impl NewOrder {
    pub fn new<T: Into<String>>(order_id: OrderId, customer_id: CustomerId, title: T) -> Self {
        Self {
            order_id,
            customer_id,
            title: title.into(),
            description: String::new(),
            budget_min: None,
            budget_max: None,
            deadline: None,
        }
    }

    pub fn with_budget(mut self, min: Money, max: Money) -> Self {
        self.budget_min = Some(min);
        self.budget_max = Some(max);
        self
    }

    pub fn with_description<T: Into<String>>(mut self, description: T) -> Self {
        self.description = description.into();
        self
    }
}

//--------------------------------------    BidStatusType    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum BidStatusType {
    /// The bid is live and can still win the auction.
    Pending,
    /// The bid won the auction.
    Accepted,
    /// Another bid won the auction, or the order was cancelled.
    Rejected,
}

impl Display for BidStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BidStatusType::Pending => write!(f, "Pending"),
            BidStatusType::Accepted => write!(f, "Accepted"),
            BidStatusType::Rejected => write!(f, "Rejected"),
        }
    }
}

impl FromStr for BidStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Accepted" => Ok(Self::Accepted),
            "Rejected" => Ok(Self::Rejected),
            s => Err(ConversionError("bid status", s.to_string())),
        }
    }
}

//--------------------------------------         Bid         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Bid {
    pub id: i64,
    pub order_id: OrderId,
    pub master_id: MasterId,
    pub price: Money,
    pub days: i64,
    pub note: Option<String>,
    pub status: BidStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       NewBid        ---------------------------------------------------------
/// A master's proposal against an order. Submitting a second proposal for the same order replaces the first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBid {
    pub order_id: OrderId,
    pub master_id: MasterId,
    pub price: Money,
    pub days: i64,
    pub note: Option<String>,
}

impl NewBid {
    pub fn new(order_id: OrderId, master_id: MasterId, price: Money, days: i64) -> Self {
        Self { order_id, master_id, price, days, note: None }
    }

    pub fn with_note<T: Into<String>>(mut self, note: T) -> Self {
        self.note = Some(note.into());
        self
    }
}

//--------------------------------------    MasterProfile    ---------------------------------------------------------
/// The commission and wallet bookkeeping record for a single master.
///
/// `commission_balance` is the sum of the master's pending commission transactions, `wallet_balance` the sum of the
/// master's wallet transaction ledger. Both invariants are maintained by the settlement transactions and asserted in
/// the integration tests.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct MasterProfile {
    pub id: i64,
    pub master_id: MasterId,
    pub enrolled_at: DateTime<Utc>,
    pub first_month_orders: i64,
    pub commission_balance: Money,
    pub total_commission_paid: Money,
    pub wallet_balance: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------   CommissionTier    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum CommissionTier {
    /// Flat fee charged during the master's enrollment month, capped at a configured number of orders.
    FirstMonth,
    /// Standard percentage-of-order-amount commission.
    Percentage,
}

impl Display for CommissionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommissionTier::FirstMonth => write!(f, "FirstMonth"),
            CommissionTier::Percentage => write!(f, "Percentage"),
        }
    }
}

impl FromStr for CommissionTier {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FirstMonth" => Ok(Self::FirstMonth),
            "Percentage" => Ok(Self::Percentage),
            s => Err(ConversionError("commission tier", s.to_string())),
        }
    }
}

//--------------------------------------  CommissionStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum CommissionStatus {
    Pending,
    Paid,
    Cancelled,
}

impl Display for CommissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommissionStatus::Pending => write!(f, "Pending"),
            CommissionStatus::Paid => write!(f, "Paid"),
            CommissionStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for CommissionStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError("commission status", s.to_string())),
        }
    }
}

//------------------------------------ CommissionTransaction -------------------------------------------------------
/// One commission obligation per (master, order) pair, created the instant a bid is accepted.
///
/// Status only ever moves Pending → Paid or Pending → Cancelled. Amount, tier and rate are immutable after creation
/// so that the row doubles as an audit record of the policy that was applied.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct CommissionTransaction {
    pub id: i64,
    pub master_id: MasterId,
    pub order_id: OrderId,
    pub order_amount: Money,
    pub commission_amount: Money,
    pub tier: CommissionTier,
    pub rate: Option<f64>,
    pub status: CommissionStatus,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

//--------------------------------------    WalletTxType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum WalletTxType {
    Deposit,
    CommissionPayment,
}

impl Display for WalletTxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalletTxType::Deposit => write!(f, "Deposit"),
            WalletTxType::CommissionPayment => write!(f, "CommissionPayment"),
        }
    }
}

impl FromStr for WalletTxType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Deposit" => Ok(Self::Deposit),
            "CommissionPayment" => Ok(Self::CommissionPayment),
            s => Err(ConversionError("wallet transaction type", s.to_string())),
        }
    }
}

//--------------------------------------  WalletTxStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum WalletTxStatus {
    Completed,
}

impl Display for WalletTxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalletTxStatus::Completed => write!(f, "Completed"),
        }
    }
}

//------------------------------------  WalletTransaction    -------------------------------------------------------
/// An append-only wallet ledger row. Deposits carry a positive amount, commission payments a negative one.
/// The sum of a master's rows always equals the profile's `wallet_balance`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: i64,
    pub master_id: MasterId,
    pub amount: Money,
    pub tx_type: WalletTxType,
    pub commission_tx_id: Option<i64>,
    pub method: Option<String>,
    pub details: Option<String>,
    pub status: WalletTxStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers are generic over the backend traits they need, so endpoint tests can run against any backend. Since
//! actix-web cannot register generic handlers directly, each handler gets a concrete `HttpServiceFactory` shim via
//! the `route!` macro.

use actix_web::{get, web, HttpResponse, Responder};
use auction_engine::{
    db_types::OrderId,
    traits::{AuctionDatabase, MarketReader, WalletManagement},
    AuctionFlowApi,
    MarketApi,
    WalletApi,
};
use chrono::Utc;
use log::*;

use crate::{
    auth::{CustomerClaims, MasterClaims},
    config::ServerConfig,
    data_objects::{
        BidRequest,
        CalculateCommissionRequest,
        DepositRequest,
        JsonResponse,
        NewOrderRequest,
        PayCommissionRequest,
        SettlementResult,
    },
    errors::ServerError,
};

// Actix-web cannot handle generics in handlers, so the registration shim is implemented manually using this macro.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

//----------------------------------------------   Health   ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ GET health");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders   ----------------------------------------------------
route!(new_order => Post "/orders" impl AuctionDatabase);
/// Accepts a new order from the intake service and opens its auction. Replays of the same order id return the
/// existing order unchanged, so upstream retries are harmless.
pub async fn new_order<B: AuctionDatabase>(
    claims: CustomerClaims,
    body: web::Json<NewOrderRequest>,
    api: web::Data<AuctionFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order = body.into_inner().into_new_order(claims.customer_id);
    debug!("💻️ POST new_order {} for {}", order.order_id, order.customer_id);
    let order = api.process_new_order(order).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(order_by_id => Get "/orders/{order_id}" impl MarketReader);
pub async fn order_by_id<B: MarketReader>(
    path: web::Path<String>,
    api: web::Data<MarketApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    let order = api
        .order(&order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} does not exist")))?;
    Ok(HttpResponse::Ok().json(order))
}

route!(cancel_order => Post "/orders/{order_id}/cancel" impl AuctionDatabase, MarketReader);
/// Cancels an order on behalf of its customer. Pending bids are rejected and any unpaid commission on the order is
/// written off.
pub async fn cancel_order<TA, TM>(
    claims: CustomerClaims,
    path: web::Path<String>,
    api: web::Data<AuctionFlowApi<TA>>,
    market: web::Data<MarketApi<TM>>,
) -> Result<HttpResponse, ServerError>
where
    TA: AuctionDatabase + 'static,
    TM: MarketReader + 'static,
{
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ POST cancel_order {order_id} by {}", claims.customer_id);
    let order = market
        .order(&order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} does not exist")))?;
    if order.customer_id != claims.customer_id {
        return Err(auction_engine::AuctionError::NotOrderOwner {
            order_id,
            customer_id: claims.customer_id,
        }
        .into());
    }
    let order = api.cancel_order(&order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(mark_shipped => Post "/orders/{order_id}/ship" impl AuctionDatabase);
pub async fn mark_shipped<B: AuctionDatabase>(
    claims: MasterClaims,
    path: web::Path<String>,
    api: web::Data<AuctionFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ POST mark_shipped {order_id} by {}", claims.master_id);
    let order = api.mark_shipped(&order_id, &claims.master_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(confirm_delivery => Post "/orders/{order_id}/confirm-delivery" impl AuctionDatabase);
pub async fn confirm_delivery<B: AuctionDatabase>(
    claims: CustomerClaims,
    path: web::Path<String>,
    api: web::Data<AuctionFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ POST confirm_delivery {order_id} by {}", claims.customer_id);
    let order = api.confirm_delivery(&order_id, &claims.customer_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------    Bids    ----------------------------------------------------
route!(submit_bid => Post "/orders/{order_id}/bids" impl AuctionDatabase);
/// Places (or replaces) the calling master's bid on an open auction. A master with unpaid commissions is refused.
pub async fn submit_bid<B: AuctionDatabase>(
    claims: MasterClaims,
    path: web::Path<String>,
    body: web::Json<BidRequest>,
    api: web::Data<AuctionFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    let bid = body.into_inner().into_new_bid(order_id, claims.master_id);
    debug!("💻️ POST submit_bid on {} by {}", bid.order_id, bid.master_id);
    let bid = api.submit_bid(bid).await?;
    Ok(HttpResponse::Ok().json(bid))
}

route!(withdraw_bid => Delete "/bids/{bid_id}" impl AuctionDatabase);
pub async fn withdraw_bid<B: AuctionDatabase>(
    claims: MasterClaims,
    path: web::Path<i64>,
    api: web::Data<AuctionFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let bid_id = path.into_inner();
    debug!("💻️ DELETE withdraw_bid #{bid_id} by {}", claims.master_id);
    api.withdraw_bid(bid_id, &claims.master_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Bid #{bid_id} withdrawn"))))
}

route!(accept_bid => Post "/bids/{bid_id}/accept" impl AuctionDatabase);
/// The customer's accept. The settlement (winner assignment, sibling rejection, commission billing) is atomic in the
/// engine; by the time this handler returns the auction is closed for good.
pub async fn accept_bid<B: AuctionDatabase>(
    claims: CustomerClaims,
    path: web::Path<i64>,
    api: web::Data<AuctionFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let bid_id = path.into_inner();
    debug!("💻️ POST accept_bid #{bid_id} by {}", claims.customer_id);
    let accepted = api.accept_bid(bid_id, &claims.customer_id).await?;
    Ok(HttpResponse::Ok().json(SettlementResult::from(accepted)))
}

route!(order_bids => Get "/orders/{order_id}/bids" impl MarketReader);
/// The full bid board for an order. Only the order's customer may see it.
pub async fn order_bids<B: MarketReader>(
    claims: CustomerClaims,
    path: web::Path<String>,
    api: web::Data<MarketApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    let bids = api.list_bids(&order_id, &claims.customer_id).await?;
    Ok(HttpResponse::Ok().json(bids))
}

route!(competition => Get "/orders/{order_id}/competition" impl MarketReader);
/// Anonymised bid statistics for masters sizing up a bid. Individual bids and bidder identities stay hidden.
pub async fn competition<B: MarketReader>(
    claims: MasterClaims,
    path: web::Path<String>,
    api: web::Data<MarketApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ GET competition on {order_id} for {}", claims.master_id);
    let summary = api.competition_summary(&order_id).await?;
    Ok(HttpResponse::Ok().json(summary))
}

//----------------------------------------------   Wallet   ----------------------------------------------------
route!(my_wallet => Get "/wallet/balance" impl WalletManagement);
pub async fn my_wallet<B: WalletManagement>(
    claims: MasterClaims,
    api: web::Data<WalletApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_wallet for {}", claims.master_id);
    let profile = api.profile(&claims.master_id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

route!(deposit => Post "/wallet/deposit" impl WalletManagement);
pub async fn deposit<B: WalletManagement>(
    claims: MasterClaims,
    body: web::Json<DepositRequest>,
    api: web::Data<WalletApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻️ POST deposit of {} for {}", req.amount, claims.master_id);
    let tx = api.deposit(&claims.master_id, req.amount, &req.method, req.details).await?;
    Ok(HttpResponse::Ok().json(tx))
}

route!(wallet_history => Get "/wallet/history" impl MarketReader);
pub async fn wallet_history<B: MarketReader>(
    claims: MasterClaims,
    api: web::Data<MarketApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let history = api.wallet_history(&claims.master_id).await?;
    Ok(HttpResponse::Ok().json(history))
}

//--------------------------------------------  Commissions  ---------------------------------------------------
route!(pending_commissions => Get "/commissions" impl MarketReader);
pub async fn pending_commissions<B: MarketReader>(
    claims: MasterClaims,
    api: web::Data<MarketApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let pending = api.pending_commissions(&claims.master_id).await?;
    Ok(HttpResponse::Ok().json(pending))
}

route!(pay_commission => Post "/wallet/pay-commission" impl WalletManagement);
pub async fn pay_commission<B: WalletManagement>(
    claims: MasterClaims,
    body: web::Json<PayCommissionRequest>,
    api: web::Data<WalletApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let tx_id = body.into_inner().commission_id;
    debug!("💻️ POST pay_commission #{tx_id} by {}", claims.master_id);
    let paid = api.pay_commission(&claims.master_id, tx_id).await?;
    Ok(HttpResponse::Ok().json(paid))
}

route!(pay_all_commissions => Post "/wallet/pay-all" impl WalletManagement);
/// Settles every pending commission in one sweep, or none at all if the wallet cannot cover the total.
pub async fn pay_all_commissions<B: WalletManagement>(
    claims: MasterClaims,
    api: web::Data<WalletApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST pay_all_commissions by {}", claims.master_id);
    let settled = api.pay_all_pending(&claims.master_id).await?;
    Ok(HttpResponse::Ok().json(settled))
}

route!(calculate_commission => Post "/commissions/calculate" impl MarketReader);
/// Quotes the commission the calling master would owe for winning an order of the given amount right now. No state
/// is touched.
pub async fn calculate_commission<B: MarketReader>(
    claims: MasterClaims,
    body: web::Json<CalculateCommissionRequest>,
    api: web::Data<MarketApi<B>>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServerError> {
    let amount = body.into_inner().order_amount;
    let quote = api.commission_preview(&claims.master_id, amount, &config.commission, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(quote))
}

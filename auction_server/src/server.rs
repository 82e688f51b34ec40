use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use auction_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    AuctionFlowApi,
    MarketApi,
    SqliteDatabase,
    WalletApi,
};
use log::*;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    routes::{
        health,
        AcceptBidRoute,
        CalculateCommissionRoute,
        CancelOrderRoute,
        CompetitionRoute,
        ConfirmDeliveryRoute,
        DepositRoute,
        MarkShippedRoute,
        MyWalletRoute,
        NewOrderRoute,
        OrderBidsRoute,
        OrderByIdRoute,
        PayAllCommissionsRoute,
        PayCommissionRoute,
        PendingCommissionsRoute,
        SubmitBidRoute,
        WalletHistoryRoute,
        WithdrawBidRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = EventHandlers::new(config.event_buffer_size, default_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// The stock post-settlement hooks. The chat service and notification dispatcher are separate systems; until their
/// clients are wired in, the hooks record what would be sent.
pub fn default_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_bid_accepted(|ev| {
            Box::pin(async move {
                let order_id = &ev.accepted.order.order_id;
                let master = &ev.accepted.bid.master_id;
                let customer = &ev.accepted.order.customer_id;
                info!("📬️ Opening a chat channel for order {order_id} between [{customer}] and [{master}]");
                info!("📬️ Notifying [{master}] that their bid on order {order_id} was accepted");
            })
        })
        .on_bid_placed(|ev| {
            Box::pin(async move {
                info!("📬️ Notifying the customer of a new bid on order {} from [{}]", ev.bid.order_id, ev.bid.master_id);
            })
        });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let auction_api = AuctionFlowApi::new(db.clone(), config.commission.clone(), producers.clone());
        let wallet_api = WalletApi::new(db.clone());
        let market_api = MarketApi::new(db.clone());
        let api_scope = web::scope("/api")
            .service(NewOrderRoute::<SqliteDatabase>::new())
            .service(OrderBidsRoute::<SqliteDatabase>::new())
            .service(CompetitionRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase, SqliteDatabase>::new())
            .service(MarkShippedRoute::<SqliteDatabase>::new())
            .service(ConfirmDeliveryRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(SubmitBidRoute::<SqliteDatabase>::new())
            .service(WithdrawBidRoute::<SqliteDatabase>::new())
            .service(AcceptBidRoute::<SqliteDatabase>::new())
            .service(MyWalletRoute::<SqliteDatabase>::new())
            .service(DepositRoute::<SqliteDatabase>::new())
            .service(WalletHistoryRoute::<SqliteDatabase>::new())
            .service(PendingCommissionsRoute::<SqliteDatabase>::new())
            .service(CalculateCommissionRoute::<SqliteDatabase>::new())
            .service(PayAllCommissionsRoute::<SqliteDatabase>::new())
            .service(PayCommissionRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("cap::access_log"))
            .app_data(web::Data::new(auction_api))
            .app_data(web::Data::new(wallet_api))
            .app_data(web::Data::new(market_api))
            .app_data(web::Data::new(config.clone()))
            .service(health)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}

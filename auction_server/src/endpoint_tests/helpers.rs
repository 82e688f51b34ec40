use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use auction_engine::{
    events::EventProducers,
    test_utils::{prepare_test_env, random_db_path},
    AuctionFlowApi,
    MarketApi,
    SqliteDatabase,
    WalletApi,
};

use crate::{
    auth::{KIND_CUSTOMER, KIND_MASTER, USER_ID_HEADER, USER_KIND_HEADER},
    config::ServerConfig,
    routes::{
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

#[derive(Debug, Clone, Copy)]
pub enum Identity<'a> {
    Master(&'a str),
    Customer(&'a str),
    Anonymous,
}

pub async fn new_test_db() -> SqliteDatabase {
    prepare_test_env(&random_db_path()).await
}

/// Registers the full `/api` surface against `db`, the same wiring as `create_server_instance`.
pub fn configure_all(db: SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let config = ServerConfig::default();
        let auction_api = AuctionFlowApi::new(db.clone(), config.commission.clone(), EventProducers::default());
        let wallet_api = WalletApi::new(db.clone());
        let market_api = MarketApi::new(db.clone());
        cfg.app_data(web::Data::new(auction_api))
            .app_data(web::Data::new(wallet_api))
            .app_data(web::Data::new(market_api))
            .app_data(web::Data::new(config))
            .service(
                web::scope("/api")
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
                    .service(PayCommissionRoute::<SqliteDatabase>::new()),
            );
    }
}

fn with_identity(mut req: TestRequest, identity: Identity<'_>) -> TestRequest {
    match identity {
        Identity::Master(id) => {
            req = req.insert_header((USER_ID_HEADER, id)).insert_header((USER_KIND_HEADER, KIND_MASTER));
        },
        Identity::Customer(id) => {
            req = req.insert_header((USER_ID_HEADER, id)).insert_header((USER_KIND_HEADER, KIND_CUSTOMER));
        },
        Identity::Anonymous => {},
    }
    req
}

async fn send(db: &SqliteDatabase, req: TestRequest) -> (StatusCode, String) {
    let app = App::new().configure(configure_all(db.clone()));
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}

pub async fn get_request(db: &SqliteDatabase, identity: Identity<'_>, path: &str) -> (StatusCode, String) {
    send(db, with_identity(TestRequest::get().uri(path), identity)).await
}

pub async fn post_request(
    db: &SqliteDatabase,
    identity: Identity<'_>,
    path: &str,
    body: serde_json::Value,
) -> (StatusCode, String) {
    send(db, with_identity(TestRequest::post().uri(path).set_json(body), identity)).await
}

pub async fn delete_request(db: &SqliteDatabase, identity: Identity<'_>, path: &str) -> (StatusCode, String) {
    send(db, with_identity(TestRequest::delete().uri(path), identity)).await
}

// region:    --- Imports
use crate::database::DatabaseManager;
use crate::registry::LockRegistry;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Modules
mod bidding;
mod database;
mod expiry;
mod handlers;
mod query;
mod registry;
mod store;

// endregion: --- Modules

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // DatabaseManager 생성
    let db_manager = Arc::new(DatabaseManager::new().await);

    // 데이터베이스 초기화
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // 경매별 잠금 레지스트리 (프로세스 시작 시 1회 생성, 전체 핸들러가 공유)
    let lock_registry = Arc::new(LockRegistry::new());

    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = Router::new()
        .route("/bid", post(handlers::handle_bid))
        .route("/bids/:auction_id", get(handlers::handle_list_bids))
        .route("/auction", post(handlers::handle_create_auction))
        .route("/auction/:id", get(handlers::handle_get_auction))
        .route("/auction/:id/close", post(handlers::handle_close_auction))
        .route("/auctions", get(handlers::handle_list_auctions))
        .route("/user", post(handlers::handle_create_user))
        .route("/users", get(handlers::handle_list_users))
        .layer(cors)
        .with_state((db_manager, lock_registry));

    // 리스너 생성(로컬 호스트의 3000번 포트를 사용)
    let listener = TcpListener::bind("0.0.0.0:3000").await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main

// region:    --- Imports
use crate::bidding::commands::{self, handle_place_bid, PlaceBidCommand};
use crate::bidding::outcome::PlaceBidError;
use crate::database::DatabaseManager;
use crate::expiry;
use crate::query;
use crate::registry::LockRegistry;
use crate::store::{AuctionStore, PostgresAuctionStore};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Transport Commands

/// 사용자 생성 명령
#[derive(Debug, Deserialize)]
pub struct CreateUserCommand {
    pub name: String,
}

/// 경매 생성 명령
#[derive(Debug, Deserialize)]
pub struct CreateAuctionCommand {
    pub item_name: String,
    #[serde(default)]
    pub start_price: i64,
    #[serde(default = "default_min_increment")]
    pub min_increment: i64,
    #[serde(default = "default_duration_seconds")]
    pub duration_seconds: i64,
}

fn default_min_increment() -> i64 {
    1
}

fn default_duration_seconds() -> i64 {
    60
}

/// 경매 목록 조회 파라미터 (?all=1 이면 종료된 경매 포함)
#[derive(Debug, Deserialize)]
pub struct ListAuctionsParams {
    pub all: Option<String>,
}

// endregion: --- Transport Commands

// region:    --- Command Handlers

/// 입찰 요청 처리
pub async fn handle_bid(
    State((db_manager, lock_registry)): State<(Arc<DatabaseManager>, Arc<LockRegistry>)>,
    Json(cmd): Json<PlaceBidCommand>,
) -> impl IntoResponse {
    info!("{:<12} --> 입찰 요청 수신: {:?}", "Command", cmd);

    // 저장소 생성
    let store = PostgresAuctionStore::new(Arc::clone(&db_manager));

    match handle_place_bid(cmd, &lock_registry, &store, &store).await {
        Ok(accepted) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "auction_id": accepted.auction_id,
                "user_id": accepted.user_id,
                "amount": accepted.amount,
                "current_price": accepted.current_price,
            })),
        )
            .into_response(),
        Err(e) => (status_for(&e), Json(e.to_json())).into_response(),
    }
}

/// 입찰 거절/실패 분류별 상태 코드
fn status_for(e: &PlaceBidError) -> StatusCode {
    match e {
        PlaceBidError::AuctionNotFound | PlaceBidError::UserNotFound => StatusCode::NOT_FOUND,
        PlaceBidError::Closed
        | PlaceBidError::UserInactive
        | PlaceBidError::AmountTooLow { .. }
        | PlaceBidError::Validation(_) => StatusCode::BAD_REQUEST,
        PlaceBidError::ContentionTimeout => StatusCode::SERVICE_UNAVAILABLE,
        PlaceBidError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// 사용자 생성 요청 처리
pub async fn handle_create_user(
    State((db_manager, _)): State<(Arc<DatabaseManager>, Arc<LockRegistry>)>,
    Json(cmd): Json<CreateUserCommand>,
) -> impl IntoResponse {
    info!("{:<12} --> 사용자 생성 요청: {:?}", "Command", cmd);

    if cmd.name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "name이 필요합니다.", "code": "INVALID_INPUT"})),
        )
            .into_response();
    }

    let store = PostgresAuctionStore::new(Arc::clone(&db_manager));
    match store.create_user(cmd.name.trim()).await {
        Ok(user) => (
            StatusCode::CREATED,
            Json(json!({"user_id": user.id, "name": user.name})),
        )
            .into_response(),
        Err(e) => store_failure(e),
    }
}

/// 경매 생성 요청 처리
pub async fn handle_create_auction(
    State((db_manager, _)): State<(Arc<DatabaseManager>, Arc<LockRegistry>)>,
    Json(cmd): Json<CreateAuctionCommand>,
) -> impl IntoResponse {
    info!("{:<12} --> 경매 생성 요청: {:?}", "Command", cmd);

    if cmd.item_name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "item_name이 필요합니다.", "code": "INVALID_INPUT"})),
        )
            .into_response();
    }
    if cmd.start_price < 0 || cmd.min_increment <= 0 || cmd.duration_seconds <= 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "start_price는 0 이상, min_increment와 duration_seconds는 양수여야 합니다.",
                "code": "INVALID_INPUT",
            })),
        )
            .into_response();
    }

    let end_time = Utc::now() + Duration::seconds(cmd.duration_seconds);
    let store = PostgresAuctionStore::new(Arc::clone(&db_manager));
    match store
        .create_auction(
            cmd.item_name.trim(),
            cmd.start_price,
            cmd.min_increment,
            end_time,
        )
        .await
    {
        Ok(auction) => (
            StatusCode::CREATED,
            Json(json!({
                "auction_id": auction.id,
                "item_name": auction.item_name,
                "end_time": auction.end_time,
            })),
        )
            .into_response(),
        Err(e) => store_failure(e),
    }
}

/// 경매 강제 종료 요청 처리 (멱등)
pub async fn handle_close_auction(
    State((db_manager, _)): State<(Arc<DatabaseManager>, Arc<LockRegistry>)>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> 경매 종료 요청 id: {}", "Command", auction_id);

    let store = PostgresAuctionStore::new(Arc::clone(&db_manager));
    match store.mark_inactive(auction_id).await {
        Ok(_) => (StatusCode::OK, Json(json!({"closed": auction_id}))).into_response(),
        Err(e) => store_failure(e),
    }
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 경매 조회 (조회 시점에 만료를 반영)
pub async fn handle_get_auction(
    State((db_manager, _)): State<(Arc<DatabaseManager>, Arc<LockRegistry>)>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> 경매 조회 id: {}", "HandlerQuery", auction_id);

    let auction = match query::handlers::get_auction(&db_manager, auction_id).await {
        Ok(Some(auction)) => auction,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "경매를 찾을 수 없습니다.", "code": "AUCTION_NOT_FOUND"})),
            )
                .into_response()
        }
        Err(e) => return store_failure(e),
    };

    // 지연 만료: 조회가 만료를 관측하면 비활성 상태를 영속화하고 응답에도 반영
    let store = PostgresAuctionStore::new(Arc::clone(&db_manager));
    let mut auction = auction;
    match expiry::check_and_expire(&store, &auction, Utc::now()).await {
        Ok(expired) => {
            if expired {
                auction.active = false;
            }
        }
        Err(e) => return store_failure(e),
    }

    Json(auction).into_response()
}

/// 경매 목록 조회 (조회 전에 만료 일괄 처리)
pub async fn handle_list_auctions(
    State((db_manager, _)): State<(Arc<DatabaseManager>, Arc<LockRegistry>)>,
    Query(params): Query<ListAuctionsParams>,
) -> impl IntoResponse {
    let show_all = params.all.as_deref() == Some("1");
    info!(
        "{:<12} --> 경매 목록 조회 show_all: {}",
        "HandlerQuery", show_all
    );

    if let Err(e) = expiry::sweep_expired(&db_manager, Utc::now()).await {
        return store_failure(e);
    }

    match query::handlers::get_auctions(&db_manager, show_all).await {
        Ok(auctions) => Json(auctions).into_response(),
        Err(e) => store_failure(e),
    }
}

/// 입찰 이력 조회
pub async fn handle_list_bids(
    State((db_manager, _)): State<(Arc<DatabaseManager>, Arc<LockRegistry>)>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    info!(
        "{:<12} --> 입찰 이력 조회 id: {}",
        "HandlerQuery", auction_id
    );

    let store = PostgresAuctionStore::new(Arc::clone(&db_manager));
    match commands::list_bids(&store, auction_id).await {
        Ok(bids) => Json(bids).into_response(),
        Err(e) => store_failure(e),
    }
}

/// 모든 사용자 조회
pub async fn handle_list_users(
    State((db_manager, _)): State<(Arc<DatabaseManager>, Arc<LockRegistry>)>,
) -> impl IntoResponse {
    info!("{:<12} --> 모든 사용자 조회", "HandlerQuery");
    match query::handlers::get_all_users(&db_manager).await {
        Ok(users) => Json(users).into_response(),
        Err(e) => store_failure(e),
    }
}

/// 저장소 오류 응답
fn store_failure(e: sqlx::Error) -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": e.to_string(), "code": "STORE_FAILURE"})),
    )
        .into_response()
}

// endregion: --- Query Handlers

// region:    --- Imports
use super::queries;
use crate::bidding::model::{Auction, User};
use crate::database::DatabaseManager;
use sqlx::Error as SqlxError;
use tracing::info;

// endregion: --- Imports

// region:    --- Query Handlers

/// 경매 조회
pub async fn get_auction(
    db_manager: &DatabaseManager,
    auction_id: i64,
) -> Result<Option<Auction>, SqlxError> {
    info!("{:<12} --> 경매 조회 id: {}", "Query", auction_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
                    .bind(auction_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// 모든 사용자 조회
pub async fn get_all_users(db_manager: &DatabaseManager) -> Result<Vec<User>, SqlxError> {
    info!("{:<12} --> 모든 사용자 조회", "Query");
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, User>(queries::GET_ALL_USERS)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 경매 목록 조회 (기본은 진행 중인 경매만, show_all이면 전체)
pub async fn get_auctions(
    db_manager: &DatabaseManager,
    show_all: bool,
) -> Result<Vec<Auction>, SqlxError> {
    info!("{:<12} --> 경매 목록 조회 show_all: {}", "Query", show_all);
    let sql = if show_all {
        queries::GET_ALL_AUCTIONS
    } else {
        queries::GET_ACTIVE_AUCTIONS
    };
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Auction>(sql)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

// endregion: --- Query Handlers

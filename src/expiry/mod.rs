/// 지연 만료 처리
/// 별도 타이머 없이, 경매를 건드리는 시점에만 종료 시각 경과를 검사한다.
/// 만료가 처음 관측되면 active = false를 영속화한다. 저장소상으로는
/// 다음 접근 전까지 만료된 경매가 active로 남아 있을 수 있다.
// region:    --- Imports
use crate::bidding::model::Auction;
use crate::database::DatabaseManager;
use crate::query::queries;
use crate::store::AuctionStore;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

// endregion: --- Imports

// region:    --- Expiry Guard

/// 종료 시각 경과 여부
pub fn is_expired(end_time: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= end_time
}

/// 만료 관측 시 비활성화 (멱등)
/// 만료된 경매이면 true를 반환한다.
pub async fn check_and_expire(
    store: &impl AuctionStore,
    auction: &Auction,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    if !is_expired(auction.end_time, now) {
        return Ok(false);
    }
    if auction.active {
        info!(
            "{:<12} --> 종료 시각 경과로 경매 비활성화 id: {}",
            "Expiry", auction.id
        );
        store.mark_inactive(auction.id).await?;
    }
    Ok(true)
}

/// 목록 조회 시 일괄 만료 처리
pub async fn sweep_expired(
    db_manager: &DatabaseManager,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(queries::SWEEP_EXPIRED)
        .bind(now)
        .execute(db_manager.pool())
        .await?;
    debug!(
        "{:<12} --> 만료 일괄 처리: {}건 비활성화",
        "Expiry",
        result.rows_affected()
    );
    Ok(result.rows_affected())
}

// endregion: --- Expiry Guard

/// 입찰 커맨드 처리
/// 사전 검사(빠른 실패) 후 경매별 잠금 안에서
/// 재조회 -> 검증 -> 원자 커밋을 수행한다.
// region:    --- Imports
use crate::bidding::outcome::{BidAccepted, PlaceBidError};
use crate::expiry;
use crate::registry::LockRegistry;
use crate::store::{AuctionStore, UserDirectory};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Commands

/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub auction_id: i64,
    pub user_id: i64,
    pub amount: i64,
}

// 잠금 획득 대기 상한
pub const LOCK_WAIT: Duration = Duration::from_secs(5);

/// 입찰 처리 (기본 잠금 대기 상한 적용)
pub async fn handle_place_bid(
    cmd: PlaceBidCommand,
    registry: &LockRegistry,
    store: &impl AuctionStore,
    users: &impl UserDirectory,
) -> Result<BidAccepted, PlaceBidError> {
    handle_place_bid_with_timeout(cmd, registry, store, users, LOCK_WAIT).await
}

/// 입찰 처리
/// 잠금 대기 상한 초과 시 LOCK_TIMEOUT으로 실패하며 내부 재시도는 없다.
pub async fn handle_place_bid_with_timeout(
    cmd: PlaceBidCommand,
    registry: &LockRegistry,
    store: &impl AuctionStore,
    users: &impl UserDirectory,
    lock_wait: Duration,
) -> Result<BidAccepted, PlaceBidError> {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);

    // 입력 검증 (잠금/저장소 접근 전)
    if cmd.amount <= 0 {
        return Err(PlaceBidError::Validation(
            "입찰 금액은 양수여야 합니다.".to_string(),
        ));
    }

    // 사전 검사 단계: 잠금 밖의 빠른 실패.
    // 만료 정정 외의 부수효과는 없다.
    let auction = store
        .read_auction(cmd.auction_id)
        .await?
        .ok_or(PlaceBidError::AuctionNotFound)?;

    let now = Utc::now();
    if expiry::check_and_expire(store, &auction, now).await? {
        return Err(PlaceBidError::Closed);
    }
    if !auction.active {
        return Err(PlaceBidError::Closed);
    }

    let user = users.is_active(cmd.user_id).await?;
    if !user.found {
        return Err(PlaceBidError::UserNotFound);
    }
    if !user.active {
        return Err(PlaceBidError::UserInactive);
    }

    // 경매별 잠금 획득 (대기 상한 적용)
    let handle = registry.handle_for(cmd.auction_id).await;
    let _guard = match tokio::time::timeout(lock_wait, handle.lock()).await {
        Ok(guard) => guard,
        Err(_) => {
            warn!(
                "{:<12} --> 잠금 획득 시간 초과 id: {}",
                "Command", cmd.auction_id
            );
            return Err(PlaceBidError::ContentionTimeout);
        }
    };

    // 임계 영역. 잠금 안의 재조회만이 판정 기준이다:
    // 사전 검사에서 읽은 가격/증가분은 잠금 대기 동안
    // 다른 수락된 입찰로 이미 바뀌었을 수 있다.
    let auction = store
        .read_auction(cmd.auction_id)
        .await?
        .ok_or(PlaceBidError::AuctionNotFound)?;

    let required_minimum = auction.current_price + auction.min_increment;
    if cmd.amount < required_minimum {
        info!(
            "{:<12} --> 입찰 거절 (금액 미달) amount: {}, required: {}",
            "Command", cmd.amount, required_minimum
        );
        return Err(PlaceBidError::AmountTooLow {
            current_price: auction.current_price,
            required_minimum,
        });
    }

    // 입찰 기록 + 가격/낙찰자 갱신은 단일 원자 커밋.
    // bid_time은 잠금 안에서 확정되므로 수락 순서와 시각 순서가 일치한다.
    let bid_time = Utc::now();
    let bid = store
        .commit_bid(cmd.auction_id, cmd.user_id, cmd.amount, bid_time)
        .await?;

    info!(
        "{:<12} --> 입찰 수락 bid: {}, 현재 가격: {}",
        "Command", bid.id, bid.amount
    );

    // 잠금은 모든 경로에서 스코프 종료와 함께 해제된다.
    Ok(BidAccepted {
        auction_id: cmd.auction_id,
        user_id: cmd.user_id,
        amount: cmd.amount,
        current_price: cmd.amount,
    })
}

/// 입찰 이력 조회 (수락 순서 그대로, bid_time 오름차순)
pub async fn list_bids(
    store: &impl AuctionStore,
    auction_id: i64,
) -> Result<Vec<crate::bidding::model::Bid>, sqlx::Error> {
    store.list_bids(auction_id).await
}

// endregion: --- Commands

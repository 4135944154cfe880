/// 경매 저장소
/// 코어가 소비하는 계약(AuctionStore, UserDirectory)과
/// Postgres 구현체를 제공한다.
// region:    --- Imports
use crate::bidding::model::{Auction, Bid, User};
use crate::database::DatabaseManager;
use crate::query::queries;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Store Traits

/// 사용자 조회 결과
#[derive(Debug, Clone, Copy)]
pub struct UserStatus {
    pub found: bool,
    pub active: bool,
}

/// 경매 저장소 트레이트
#[async_trait]
pub trait AuctionStore: Send + Sync {
    /// 경매 스냅샷 조회
    async fn read_auction(&self, auction_id: i64) -> Result<Option<Auction>, sqlx::Error>;

    /// 입찰 기록 추가 + 경매 가격/낙찰자 갱신
    /// 두 쓰기는 단일 원자 커밋이어야 한다 (둘 다 반영되거나 둘 다 아니거나).
    async fn commit_bid(
        &self,
        auction_id: i64,
        user_id: i64,
        amount: i64,
        bid_time: DateTime<Utc>,
    ) -> Result<Bid, sqlx::Error>;

    /// 경매 비활성화 (멱등)
    async fn mark_inactive(&self, auction_id: i64) -> Result<(), sqlx::Error>;

    /// 입찰 이력 조회 (bid_time 오름차순)
    async fn list_bids(&self, auction_id: i64) -> Result<Vec<Bid>, sqlx::Error>;
}

/// 사용자 디렉터리 트레이트
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn is_active(&self, user_id: i64) -> Result<UserStatus, sqlx::Error>;
}

// endregion: --- Store Traits

// region:    --- Postgres Store

/// 저장소 구현체
pub struct PostgresAuctionStore {
    db: Arc<DatabaseManager>,
}

/// 저장소 생성 및 CRUD 쓰기
impl PostgresAuctionStore {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// 사용자 생성
    pub async fn create_user(&self, name: &str) -> Result<User, sqlx::Error> {
        info!("{:<12} --> 사용자 생성: {}", "Store", name);
        let name = name.to_string();
        self.db
            .transaction(|tx| {
                Box::pin(async move {
                    sqlx::query_as::<_, User>(queries::INSERT_USER)
                        .bind(&name)
                        .fetch_one(&mut **tx)
                        .await
                })
            })
            .await
    }

    /// 경매 생성
    pub async fn create_auction(
        &self,
        item_name: &str,
        start_price: i64,
        min_increment: i64,
        end_time: DateTime<Utc>,
    ) -> Result<Auction, sqlx::Error> {
        info!("{:<12} --> 경매 생성: {}", "Store", item_name);
        let item_name = item_name.to_string();
        self.db
            .transaction(|tx| {
                Box::pin(async move {
                    sqlx::query_as::<_, Auction>(queries::INSERT_AUCTION)
                        .bind(&item_name)
                        .bind(start_price)
                        .bind(min_increment)
                        .bind(end_time)
                        .fetch_one(&mut **tx)
                        .await
                })
            })
            .await
    }
}

/// 저장소 트레이트 구현
#[async_trait]
impl AuctionStore for PostgresAuctionStore {
    async fn read_auction(&self, auction_id: i64) -> Result<Option<Auction>, sqlx::Error> {
        self.db
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

    async fn commit_bid(
        &self,
        auction_id: i64,
        user_id: i64,
        amount: i64,
        bid_time: DateTime<Utc>,
    ) -> Result<Bid, sqlx::Error> {
        info!(
            "{:<12} --> 입찰 커밋 auction: {}, user: {}, amount: {}",
            "Store", auction_id, user_id, amount
        );
        self.db
            .transaction(|tx| {
                Box::pin(async move {
                    let bid = sqlx::query_as::<_, Bid>(queries::INSERT_BID)
                        .bind(auction_id)
                        .bind(user_id)
                        .bind(amount)
                        .bind(bid_time)
                        .fetch_one(&mut **tx)
                        .await?;

                    sqlx::query(queries::UPDATE_AUCTION_PRICE)
                        .bind(amount)
                        .bind(user_id)
                        .bind(auction_id)
                        .execute(&mut **tx)
                        .await?;

                    Ok::<_, sqlx::Error>(bid)
                })
            })
            .await
    }

    async fn mark_inactive(&self, auction_id: i64) -> Result<(), sqlx::Error> {
        info!("{:<12} --> 경매 비활성화 id: {}", "Store", auction_id);
        self.db
            .transaction(|tx| {
                Box::pin(async move {
                    sqlx::query(queries::MARK_INACTIVE)
                        .bind(auction_id)
                        .execute(&mut **tx)
                        .await?;
                    Ok::<_, sqlx::Error>(())
                })
            })
            .await
    }

    async fn list_bids(&self, auction_id: i64) -> Result<Vec<Bid>, sqlx::Error> {
        self.db
            .transaction(|tx| {
                Box::pin(async move {
                    sqlx::query_as::<_, Bid>(queries::GET_BID_HISTORY)
                        .bind(auction_id)
                        .fetch_all(&mut **tx)
                        .await
                })
            })
            .await
    }
}

/// 사용자 디렉터리 구현
#[async_trait]
impl UserDirectory for PostgresAuctionStore {
    async fn is_active(&self, user_id: i64) -> Result<UserStatus, sqlx::Error> {
        let user = self
            .db
            .transaction(|tx| {
                Box::pin(async move {
                    sqlx::query_as::<_, User>(queries::GET_USER)
                        .bind(user_id)
                        .fetch_optional(&mut **tx)
                        .await
                })
            })
            .await?;

        Ok(match user {
            Some(u) => UserStatus {
                found: true,
                active: u.active,
            },
            None => UserStatus {
                found: false,
                active: false,
            },
        })
    }
}

// endregion: --- Postgres Store

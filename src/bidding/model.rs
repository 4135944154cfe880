use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 경매 모델
// current_price는 수락된 입찰에 의해서만 단조 증가하고,
// active는 true -> false 방향으로만 전이된다.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Auction {
    pub id: i64,
    pub item_name: String,
    pub starting_price: i64,
    pub current_price: i64,
    pub current_winner: Option<i64>,
    pub min_increment: i64,
    pub end_time: DateTime<Utc>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

// 입찰 모델 (append-only, bid_time은 임계 영역 안에서 확정)
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Bid {
    pub id: i64,
    pub auction_id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub bid_time: DateTime<Utc>,
}

// 사용자 모델
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub active: bool,
}

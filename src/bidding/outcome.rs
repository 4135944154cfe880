/// 입찰 처리 결과 타입
/// 수락(BidAccepted) 또는 거절/실패(PlaceBidError)로 구분된다.
// region:    --- Imports
use serde::Serialize;
use serde_json::{json, Value};

// endregion: --- Imports

// region:    --- Accepted

/// 수락된 입찰 결과
#[derive(Debug, Serialize, Clone)]
pub struct BidAccepted {
    pub auction_id: i64,
    pub user_id: i64,
    pub amount: i64,
    /// 수락 직후의 경매 가격 (= amount)
    pub current_price: i64,
}

// endregion: --- Accepted

// region:    --- Errors

/// 입찰 거절 및 실패 분류
/// 도메인 거절(NOT_FOUND, CLOSED, USER_INACTIVE, AMOUNT_TOO_LOW)과
/// 시스템 실패(LOCK_TIMEOUT, STORE_FAILURE)를 구분한다.
#[derive(Debug)]
pub enum PlaceBidError {
    /// 경매가 존재하지 않음
    AuctionNotFound,
    /// 사용자가 존재하지 않음
    UserNotFound,
    /// 사용자가 비활성 상태
    UserInactive,
    /// 경매가 종료됨 (비활성 또는 종료 시각 경과)
    Closed,
    /// 입찰 금액이 현재 가격 + 최소 증가분 미만
    AmountTooLow {
        current_price: i64,
        required_minimum: i64,
    },
    /// 제한 시간 내에 경매 잠금을 획득하지 못함 (재시도는 호출자 몫)
    ContentionTimeout,
    /// 저장소 접근 전에 걸러지는 입력 검증 실패
    Validation(String),
    /// 저장소 오류 (도메인 거절이 아님)
    Store(sqlx::Error),
}

impl PlaceBidError {
    /// 기계 판독용 오류 코드
    pub fn code(&self) -> &'static str {
        match self {
            PlaceBidError::AuctionNotFound => "AUCTION_NOT_FOUND",
            PlaceBidError::UserNotFound => "USER_NOT_FOUND",
            PlaceBidError::UserInactive => "USER_INACTIVE",
            PlaceBidError::Closed => "AUCTION_CLOSED",
            PlaceBidError::AmountTooLow { .. } => "AMOUNT_TOO_LOW",
            PlaceBidError::ContentionTimeout => "LOCK_TIMEOUT",
            PlaceBidError::Validation(_) => "INVALID_INPUT",
            PlaceBidError::Store(_) => "STORE_FAILURE",
        }
    }

    /// 응답 본문 (error + code 형식)
    pub fn to_json(&self) -> Value {
        match self {
            PlaceBidError::AuctionNotFound => {
                json!({"error": "경매를 찾을 수 없습니다.", "code": self.code()})
            }
            PlaceBidError::UserNotFound => {
                json!({"error": "사용자를 찾을 수 없습니다.", "code": self.code()})
            }
            PlaceBidError::UserInactive => {
                json!({"error": "비활성 사용자는 입찰할 수 없습니다.", "code": self.code()})
            }
            PlaceBidError::Closed => {
                json!({"error": "경매가 이미 종료되었습니다.", "code": self.code()})
            }
            PlaceBidError::AmountTooLow {
                current_price,
                required_minimum,
            } => json!({
                "error": "입찰 금액이 최소 요구 금액보다 낮습니다.",
                "code": self.code(),
                "current_price": current_price,
                "required_minimum": required_minimum,
            }),
            PlaceBidError::ContentionTimeout => json!({
                "error": "경매 잠금을 획득하지 못했습니다. 다시 시도해 주세요.",
                "code": self.code(),
            }),
            PlaceBidError::Validation(msg) => {
                json!({"error": msg, "code": self.code()})
            }
            PlaceBidError::Store(e) => {
                json!({"error": e.to_string(), "code": self.code()})
            }
        }
    }
}

/// 저장소 오류는 별도 실패 분류로 전파
impl From<sqlx::Error> for PlaceBidError {
    fn from(e: sqlx::Error) -> Self {
        PlaceBidError::Store(e)
    }
}

// endregion: --- Errors

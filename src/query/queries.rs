/// 경매 스냅샷 조회
pub const GET_AUCTION: &str =
    "SELECT id, item_name, starting_price, current_price, current_winner, min_increment, end_time, active, created_at FROM auctions WHERE id = $1";

/// 사용자 조회
pub const GET_USER: &str = "SELECT id, name, active FROM users WHERE id = $1";

/// 입찰 이력 조회 (수락 순서 = bid_time 오름차순)
pub const GET_BID_HISTORY: &str = r#"
    SELECT id, auction_id, user_id, amount, bid_time
    FROM bids
    WHERE auction_id = $1
    ORDER BY bid_time ASC, id ASC
"#;

/// 입찰 기록 추가
pub const INSERT_BID: &str = r#"
    INSERT INTO bids (auction_id, user_id, amount, bid_time)
    VALUES ($1, $2, $3, $4)
    RETURNING id, auction_id, user_id, amount, bid_time
"#;

/// 경매 가격/낙찰자 갱신
pub const UPDATE_AUCTION_PRICE: &str =
    "UPDATE auctions SET current_price = $1, current_winner = $2 WHERE id = $3";

/// 경매 비활성화 (멱등)
pub const MARK_INACTIVE: &str = "UPDATE auctions SET active = FALSE WHERE id = $1";

/// 종료 시각이 지난 경매 일괄 비활성화
pub const SWEEP_EXPIRED: &str =
    "UPDATE auctions SET active = FALSE WHERE active = TRUE AND end_time <= $1";

/// 사용자 생성
pub const INSERT_USER: &str =
    "INSERT INTO users (name, active) VALUES ($1, TRUE) RETURNING id, name, active";

/// 경매 생성
pub const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (item_name, starting_price, current_price, min_increment, end_time, active)
    VALUES ($1, $2, $2, $3, $4, TRUE)
    RETURNING id, item_name, starting_price, current_price, current_winner, min_increment, end_time, active, created_at
"#;

/// 모든 사용자 조회
pub const GET_ALL_USERS: &str = "SELECT id, name, active FROM users ORDER BY id";

/// 모든 경매 조회
pub const GET_ALL_AUCTIONS: &str =
    "SELECT id, item_name, starting_price, current_price, current_winner, min_increment, end_time, active, created_at FROM auctions ORDER BY id DESC";

/// 진행 중인 경매 조회
pub const GET_ACTIVE_AUCTIONS: &str =
    "SELECT id, item_name, starting_price, current_price, current_winner, min_increment, end_time, active, created_at FROM auctions WHERE active = TRUE ORDER BY id DESC";

use async_trait::async_trait;
use bidding_service::bidding::commands::{
    handle_place_bid, handle_place_bid_with_timeout, PlaceBidCommand,
};
use bidding_service::bidding::model::{Auction, Bid, User};
use bidding_service::bidding::outcome::PlaceBidError;
use bidding_service::expiry;
use bidding_service::registry::LockRegistry;
use bidding_service::store::{AuctionStore, UserDirectory, UserStatus};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

// region:    --- In-Memory Store

/// 인메모리 저장소 상태
struct MemoryState {
    auctions: HashMap<i64, Auction>,
    bids: Vec<Bid>,
    next_bid_id: i64,
}

/// 저장소 트레이트의 인메모리 구현체 (테스트 전용)
/// 커밋은 상태 뮤텍스 안에서 한 번에 반영되므로 원자적이다.
struct MemoryStore {
    state: Mutex<MemoryState>,
    users: HashMap<i64, User>,
}

impl MemoryStore {
    fn new(auctions: Vec<Auction>, users: Vec<User>) -> Self {
        MemoryStore {
            state: Mutex::new(MemoryState {
                auctions: auctions.into_iter().map(|a| (a.id, a)).collect(),
                bids: Vec::new(),
                next_bid_id: 1,
            }),
            users: users.into_iter().map(|u| (u.id, u)).collect(),
        }
    }

    /// 경매 스냅샷 (테스트 검증용)
    async fn auction(&self, auction_id: i64) -> Auction {
        self.state.lock().await.auctions[&auction_id].clone()
    }

    /// 입찰 기록 수 (테스트 검증용)
    async fn bid_count(&self, auction_id: i64) -> usize {
        self.state
            .lock()
            .await
            .bids
            .iter()
            .filter(|b| b.auction_id == auction_id)
            .count()
    }

    /// 종료 시각 조작 (만료 확정성 검증용)
    async fn set_end_time(&self, auction_id: i64, end_time: DateTime<Utc>) {
        self.state
            .lock()
            .await
            .auctions
            .get_mut(&auction_id)
            .unwrap()
            .end_time = end_time;
    }
}

#[async_trait]
impl AuctionStore for MemoryStore {
    async fn read_auction(&self, auction_id: i64) -> Result<Option<Auction>, sqlx::Error> {
        Ok(self.state.lock().await.auctions.get(&auction_id).cloned())
    }

    async fn commit_bid(
        &self,
        auction_id: i64,
        user_id: i64,
        amount: i64,
        bid_time: DateTime<Utc>,
    ) -> Result<Bid, sqlx::Error> {
        let mut state = self.state.lock().await;
        {
            let auction = state
                .auctions
                .get_mut(&auction_id)
                .ok_or(sqlx::Error::RowNotFound)?;
            auction.current_price = amount;
            auction.current_winner = Some(user_id);
        }
        let bid = Bid {
            id: state.next_bid_id,
            auction_id,
            user_id,
            amount,
            bid_time,
        };
        state.next_bid_id += 1;
        state.bids.push(bid.clone());
        Ok(bid)
    }

    async fn mark_inactive(&self, auction_id: i64) -> Result<(), sqlx::Error> {
        if let Some(auction) = self.state.lock().await.auctions.get_mut(&auction_id) {
            auction.active = false;
        }
        Ok(())
    }

    async fn list_bids(&self, auction_id: i64) -> Result<Vec<Bid>, sqlx::Error> {
        let state = self.state.lock().await;
        let mut bids: Vec<Bid> = state
            .bids
            .iter()
            .filter(|b| b.auction_id == auction_id)
            .cloned()
            .collect();
        bids.sort_by(|a, b| a.bid_time.cmp(&b.bid_time).then(a.id.cmp(&b.id)));
        Ok(bids)
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn is_active(&self, user_id: i64) -> Result<UserStatus, sqlx::Error> {
        Ok(match self.users.get(&user_id) {
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

// endregion: --- In-Memory Store

// region:    --- Fixtures

/// 테스트용 경매 생성
fn test_auction(
    id: i64,
    start_price: i64,
    min_increment: i64,
    end_time: DateTime<Utc>,
) -> Auction {
    Auction {
        id,
        item_name: format!("테스트 경매 {}", id),
        starting_price: start_price,
        current_price: start_price,
        current_winner: None,
        min_increment,
        end_time,
        active: true,
        created_at: Utc::now(),
    }
}

/// 테스트용 사용자 생성
fn test_user(id: i64, active: bool) -> User {
    User {
        id,
        name: format!("사용자 {}", id),
        active,
    }
}

fn bid_cmd(auction_id: i64, user_id: i64, amount: i64) -> PlaceBidCommand {
    PlaceBidCommand {
        auction_id,
        user_id,
        amount,
    }
}

fn far_future() -> DateTime<Utc> {
    Utc::now() + chrono::Duration::hours(2)
}

// endregion: --- Fixtures

// region:    --- Tests

/// 기본 입찰 흐름 테스트
/// 시작가 10, 최소 증가분 1: 11 수락 -> 11 거절(요구 최소 12) -> 12 수락
#[tokio::test]
async fn test_place_bid_basic_flow() {
    let store = MemoryStore::new(
        vec![test_auction(1, 10, 1, far_future())],
        vec![test_user(1, true), test_user(2, true)],
    );
    let registry = LockRegistry::new();

    // 첫 입찰 수락
    let accepted = handle_place_bid(bid_cmd(1, 1, 11), &registry, &store, &store)
        .await
        .unwrap();
    assert_eq!(accepted.current_price, 11);
    assert_eq!(store.auction(1).await.current_price, 11);
    assert_eq!(store.auction(1).await.current_winner, Some(1));

    // 동일 금액 재입찰은 최소 요구 금액 미달로 거절
    let err = handle_place_bid(bid_cmd(1, 2, 11), &registry, &store, &store)
        .await
        .unwrap_err();
    match err {
        PlaceBidError::AmountTooLow {
            current_price,
            required_minimum,
        } => {
            assert_eq!(current_price, 11);
            assert_eq!(required_minimum, 12);
        }
        other => panic!("AmountTooLow를 기대했으나 {:?}", other),
    }

    // 최소 요구 금액이면 수락, 낙찰 후보 교체
    let accepted = handle_place_bid(bid_cmd(1, 2, 12), &registry, &store, &store)
        .await
        .unwrap();
    assert_eq!(accepted.current_price, 12);
    let auction = store.auction(1).await;
    assert_eq!(auction.current_price, 12);
    assert_eq!(auction.current_winner, Some(2));
}

/// 종료 시각이 지난 경매 입찰 테스트
/// 입찰은 AUCTION_CLOSED로 거절되고 active = false가 영속화된다.
#[tokio::test]
async fn test_bid_on_expired_auction() {
    let store = MemoryStore::new(
        vec![test_auction(1, 10, 1, Utc::now() - chrono::Duration::hours(1))],
        vec![test_user(1, true)],
    );
    let registry = LockRegistry::new();

    let err = handle_place_bid(bid_cmd(1, 1, 100), &registry, &store, &store)
        .await
        .unwrap_err();
    assert!(matches!(err, PlaceBidError::Closed));

    // 만료 관측의 부수효과: 이후 조회는 비활성 상태를 본다
    let auction = store.auction(1).await;
    assert!(!auction.active);
    assert_eq!(store.bid_count(1).await, 0);
}

/// 만료 확정성 테스트
/// 한 번 만료가 관측되면 종료 시각을 미래로 되돌려도 다시 활성화되지 않는다.
#[tokio::test]
async fn test_expiry_is_final() {
    let store = MemoryStore::new(
        vec![test_auction(1, 10, 1, Utc::now() - chrono::Duration::seconds(1))],
        vec![test_user(1, true)],
    );
    let registry = LockRegistry::new();

    let err = handle_place_bid(bid_cmd(1, 1, 100), &registry, &store, &store)
        .await
        .unwrap_err();
    assert!(matches!(err, PlaceBidError::Closed));
    assert!(!store.auction(1).await.active);

    // 종료 시각을 미래로 조작해도 active는 false -> true로 전이되지 않는다
    store.set_end_time(1, far_future()).await;
    let err = handle_place_bid(bid_cmd(1, 1, 100), &registry, &store, &store)
        .await
        .unwrap_err();
    assert!(matches!(err, PlaceBidError::Closed));
    assert_eq!(store.bid_count(1).await, 0);
}

/// 거절 순수성 테스트
/// AMOUNT_TOO_LOW 거절은 입찰 기록도 가격/낙찰자 변경도 남기지 않는다.
#[tokio::test]
async fn test_rejection_leaves_no_state() {
    let store = MemoryStore::new(
        vec![test_auction(1, 10, 5, far_future())],
        vec![test_user(1, true)],
    );
    let registry = LockRegistry::new();

    let err = handle_place_bid(bid_cmd(1, 1, 11), &registry, &store, &store)
        .await
        .unwrap_err();
    assert!(matches!(err, PlaceBidError::AmountTooLow { .. }));

    let auction = store.auction(1).await;
    assert_eq!(auction.current_price, 10);
    assert_eq!(auction.current_winner, None);
    assert_eq!(store.bid_count(1).await, 0);
}

/// 입력 검증 테스트
/// 양수가 아닌 금액은 저장소 접근 전에 거절된다.
#[tokio::test]
async fn test_non_positive_amount_rejected() {
    let store = MemoryStore::new(
        vec![test_auction(1, 10, 1, far_future())],
        vec![test_user(1, true)],
    );
    let registry = LockRegistry::new();

    for amount in [0, -5] {
        let err = handle_place_bid(bid_cmd(1, 1, amount), &registry, &store, &store)
            .await
            .unwrap_err();
        assert!(matches!(err, PlaceBidError::Validation(_)));
    }
    assert_eq!(store.bid_count(1).await, 0);
}

/// 존재/상태 검사 테스트
#[tokio::test]
async fn test_missing_auction_and_user_checks() {
    let store = MemoryStore::new(
        vec![test_auction(1, 10, 1, far_future())],
        vec![test_user(1, true), test_user(2, false)],
    );
    let registry = LockRegistry::new();

    // 존재하지 않는 경매
    let err = handle_place_bid(bid_cmd(99, 1, 11), &registry, &store, &store)
        .await
        .unwrap_err();
    assert!(matches!(err, PlaceBidError::AuctionNotFound));

    // 존재하지 않는 사용자
    let err = handle_place_bid(bid_cmd(1, 99, 11), &registry, &store, &store)
        .await
        .unwrap_err();
    assert!(matches!(err, PlaceBidError::UserNotFound));

    // 비활성 사용자
    let err = handle_place_bid(bid_cmd(1, 2, 11), &registry, &store, &store)
        .await
        .unwrap_err();
    assert!(matches!(err, PlaceBidError::UserInactive));
}

/// 관리자 종료 후 입찰 테스트
#[tokio::test]
async fn test_bid_after_admin_close() {
    let store = MemoryStore::new(
        vec![test_auction(1, 10, 1, far_future())],
        vec![test_user(1, true)],
    );
    let registry = LockRegistry::new();

    store.mark_inactive(1).await.unwrap();
    // 멱등: 다시 호출해도 동일
    store.mark_inactive(1).await.unwrap();

    let err = handle_place_bid(bid_cmd(1, 1, 100), &registry, &store, &store)
        .await
        .unwrap_err();
    assert!(matches!(err, PlaceBidError::Closed));
}

/// 잠금 경합 시간 초과 테스트
/// 잠금을 쥔 채로 입찰하면 상한 내에 획득하지 못하고 LOCK_TIMEOUT으로 실패한다.
#[tokio::test]
async fn test_contention_timeout() {
    let store = MemoryStore::new(
        vec![test_auction(1, 10, 1, far_future())],
        vec![test_user(1, true)],
    );
    let registry = LockRegistry::new();

    // 경매 1의 잠금을 선점
    let handle = registry.handle_for(1).await;
    let _guard = handle.lock().await;

    let err = handle_place_bid_with_timeout(
        bid_cmd(1, 1, 11),
        &registry,
        &store,
        &store,
        std::time::Duration::from_millis(100),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PlaceBidError::ContentionTimeout));

    // 시간 초과 경로에서도 부분 상태는 남지 않는다
    assert_eq!(store.bid_count(1).await, 0);
    assert_eq!(store.auction(1).await.current_price, 10);
}

/// 동시 입찰 2건 테스트
/// 시작가 10/증가분 1에 11과 12가 동시에 들어오면, 먼저 임계 영역에 들어간
/// 쪽이 수락되고 나머지는 갱신된 가격 기준으로 판정된다. 둘 다 같은 가격에
/// 수락되는 일은 없다.
#[tokio::test]
async fn test_two_concurrent_bidders() {
    let store = Arc::new(MemoryStore::new(
        vec![test_auction(1, 10, 1, far_future())],
        vec![test_user(1, true), test_user(2, true)],
    ));
    let registry = Arc::new(LockRegistry::new());

    let mut handles = vec![];
    for (user_id, amount) in [(1, 11), (2, 12)] {
        let store = Arc::clone(&store);
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            handle_place_bid(bid_cmd(1, user_id, amount), &registry, &*store, &*store).await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            accepted += 1;
        }
    }

    // 12 입찰은 어느 순서로도 수락 가능하므로 최종 가격은 항상 12
    let auction = store.auction(1).await;
    assert_eq!(auction.current_price, 12);
    assert_eq!(auction.current_winner, Some(2));
    assert!(accepted == 1 || accepted == 2);
    assert_eq!(store.bid_count(1).await, accepted);

    // 수락된 금액 열은 증가분 이상으로 엄격 증가
    assert_strictly_increasing(&store.list_bids(1).await.unwrap(), 1);
}

/// 동시성 입찰 테스트
/// 50개의 동시 입찰 중 직렬화된 가격 열 기준으로 증가 규칙을 만족하는
/// 입찰만 수락되고, 최종 가격은 수락된 금액의 최댓값이다.
#[tokio::test]
async fn test_concurrent_bidding() {
    let start_price = 10_000;
    let increment = 1_000;
    let store = Arc::new(MemoryStore::new(
        vec![test_auction(1, start_price, increment, far_future())],
        (1..=50).map(|id| test_user(id, true)).collect(),
    ));
    let registry = Arc::new(LockRegistry::new());

    // 50개의 동시 입찰 생성
    let mut handles = vec![];
    for i in 1..=50 {
        let store = Arc::clone(&store);
        let registry = Arc::clone(&registry);
        let amount = start_price + i * increment;
        handles.push(tokio::spawn(async move {
            handle_place_bid(bid_cmd(1, i, amount), &registry, &*store, &*store).await
        }));
    }

    // 모든 입찰 처리 대기 및 결과 확인
    let mut successful_bids = 0;
    let mut failed_bids = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successful_bids += 1,
            Err(PlaceBidError::AmountTooLow { .. }) => failed_bids += 1,
            Err(other) => panic!("예상하지 못한 실패: {:?}", other),
        }
    }
    assert_eq!(successful_bids + failed_bids, 50);
    assert!(successful_bids >= 1);

    // 최고 금액 입찰은 어떤 직렬화 순서에서도 수락되므로
    // 최종 가격은 시작가 + 50 * 증가분이다
    let auction = store.auction(1).await;
    assert_eq!(auction.current_price, start_price + 50 * increment);
    assert_eq!(auction.current_winner, Some(50));

    // 입찰 이력: 수락 건수와 일치하고, 증가분 이상으로 엄격 증가
    let bids = store.list_bids(1).await.unwrap();
    assert_eq!(bids.len(), successful_bids);
    assert_strictly_increasing(&bids, increment);
}

/// 입찰 이력 순서 테스트
/// listBids는 수락 순서와 동일한 bid_time 오름차순을 반환한다.
#[tokio::test]
async fn test_bid_history_ordering() {
    let store = MemoryStore::new(
        vec![test_auction(1, 10, 1, far_future())],
        vec![test_user(1, true), test_user(2, true)],
    );
    let registry = LockRegistry::new();

    for (user_id, amount) in [(1, 11), (2, 12), (1, 13)] {
        handle_place_bid(bid_cmd(1, user_id, amount), &registry, &store, &store)
            .await
            .unwrap();
    }

    let bids = store.list_bids(1).await.unwrap();
    assert_eq!(
        bids.iter().map(|b| b.amount).collect::<Vec<_>>(),
        vec![11, 12, 13]
    );
    for pair in bids.windows(2) {
        assert!(pair[0].bid_time <= pair[1].bid_time);
        assert!(pair[0].id < pair[1].id);
    }
}

/// 잠금 레지스트리 테스트
/// 같은 경매 id로 동시에 처음 요청해도 모두 동일한 핸들을 받는다.
#[tokio::test]
async fn test_registry_returns_single_handle() {
    let registry = Arc::new(LockRegistry::new());

    let mut handles = vec![];
    for _ in 0..32 {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move { registry.handle_for(7).await }));
    }

    let mut acquired = vec![];
    for handle in handles {
        acquired.push(handle.await.unwrap());
    }
    let first = &acquired[0];
    assert!(acquired.iter().all(|h| Arc::ptr_eq(first, h)));
    assert_eq!(registry.len().await, 1);

    // 다른 id는 다른 핸들
    let other = registry.handle_for(8).await;
    assert!(!Arc::ptr_eq(first, &other));
    assert_eq!(registry.len().await, 2);
}

/// 만료 판정 테스트 (순수 함수)
#[tokio::test]
async fn test_is_expired_boundary() {
    let now = Utc::now();
    assert!(expiry::is_expired(now, now));
    assert!(expiry::is_expired(now - chrono::Duration::seconds(1), now));
    assert!(!expiry::is_expired(now + chrono::Duration::seconds(1), now));
}

// endregion: --- Tests

// region:    --- Assertions

/// 수락된 금액 열이 매 단계 최소 증가분 이상으로 엄격 증가하는지 검증
fn assert_strictly_increasing(bids: &[Bid], min_increment: i64) {
    for pair in bids.windows(2) {
        assert!(
            pair[1].amount >= pair[0].amount + min_increment,
            "단조 증가 위반: {} -> {} (최소 증가분 {})",
            pair[0].amount,
            pair[1].amount,
            min_increment
        );
    }
}

// endregion: --- Assertions

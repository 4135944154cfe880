/// 경매별 잠금 레지스트리
/// 경매 id당 정확히 하나의 뮤텍스 핸들을 제공한다.
/// 레지스트리 내부 맵을 보호하는 가드는 핸들 조회/생성 단계에서만 잡고,
/// 경매별 임계 영역 동안에는 절대 잡지 않는다.
// region:    --- Imports
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

// endregion: --- Imports

// region:    --- Lock Registry

/// 경매 id -> 잠금 핸들 매핑
/// 핸들은 프로세스 수명 동안 유지된다 (제거 없음).
pub struct LockRegistry {
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// LockRegistry 구현
impl LockRegistry {
    pub fn new() -> Self {
        LockRegistry {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// 경매 잠금 핸들 조회/생성
    /// 같은 id로 동시에 처음 호출되어도 모두 동일한 핸들을 받는다.
    pub async fn handle_for(&self, auction_id: i64) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        let handle = locks
            .entry(auction_id)
            .or_insert_with(|| {
                debug!("{:<12} --> 경매 잠금 핸들 생성 id: {}", "Registry", auction_id);
                Arc::new(Mutex::new(()))
            });
        Arc::clone(handle)
    }

    /// 등록된 핸들 수 (진단용)
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.locks.lock().await.is_empty()
    }
}

// endregion: --- Lock Registry

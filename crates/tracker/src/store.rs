//! 상태 저장소 추상화 -- 마지막으로 기록된 스냅샷의 읽기/쓰기/삭제
//!
//! [`StateStore`] trait은 외부 키-값 저장소를 추상화하여, 운영 환경에서는
//! [`RedisStateStore`]를, 테스트에서는 메모리 구현을 사용할 수 있게 합니다.
//!
//! # 저장 형식
//!
//! ```text
//! key:   "<prefix>-<unit_code>"      (예: "packages-4B")
//! value: hash { vendor => count }    (예: acme => "3", globex => "5")
//! ```
//!
//! # 불변 조건
//!
//! - 빈 스냅샷은 저장되지 않습니다. 빈 스냅샷을 쓰면 레코드가 삭제됩니다.
//! - 비어 있지 않은 스냅샷 쓰기는 전체 덮어쓰기입니다 (병합 아님).
//! - 쓰기는 하나의 트랜잭션(MULTI/EXEC)으로 수행되어 부분 기록 상태가 보이지 않습니다.
//! - 프로세스 내 캐싱은 하지 않습니다.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use redis::AsyncCommands;
use tracing::debug;

use crate::error::TrackerError;
use crate::types::Snapshot;

/// 추적 식별자의 저장소 키를 생성합니다.
pub fn state_key(prefix: &str, identifier: &str) -> String {
    format!("{prefix}-{identifier}")
}

/// 스냅샷 저장소 trait
///
/// 모든 호출은 백엔드 저장소에 직접 접근합니다.
pub trait StateStore: Send + Sync + 'static {
    /// 저장된 스냅샷을 읽습니다. 레코드가 없으면 빈 스냅샷을 반환합니다.
    ///
    /// # Errors
    ///
    /// - `TrackerError::StoreUnavailable`: 저장소에 연결할 수 없음
    /// - `TrackerError::StoreDecode`: 저장된 값이 정수가 아님
    fn read(&self, key: &str) -> impl Future<Output = Result<Snapshot, TrackerError>> + Send;

    /// 스냅샷을 기록합니다.
    ///
    /// 빈 스냅샷이면 레코드를 삭제하고, 아니면 모든 필드를 원자적으로 교체합니다.
    fn write(
        &self,
        key: &str,
        snapshot: &Snapshot,
    ) -> impl Future<Output = Result<(), TrackerError>> + Send;

    /// 레코드를 삭제합니다. 레코드가 없어도 성공합니다.
    fn clear(&self, key: &str) -> impl Future<Output = Result<(), TrackerError>> + Send;
}

/// 저장된 필드/값 쌍을 스냅샷으로 디코딩합니다.
///
/// # Errors
///
/// 값이 음이 아닌 정수가 아니면 `TrackerError::StoreDecode`
pub fn decode_fields(fields: HashMap<String, String>) -> Result<Snapshot, TrackerError> {
    let mut snapshot = Snapshot::new();
    for (vendor, value) in fields {
        let count = value
            .trim()
            .parse::<u64>()
            .map_err(|_| TrackerError::StoreDecode {
                vendor: vendor.clone(),
                value: value.clone(),
            })?;
        snapshot.insert_if_absent(vendor, count);
    }
    Ok(snapshot)
}

/// Redis hash 기반 운영용 저장소
#[derive(Clone)]
pub struct RedisStateStore {
    client: redis::Client,
    connect_timeout: Duration,
}

impl RedisStateStore {
    /// 연결 문자열로 클라이언트를 생성합니다 (실제 연결은 첫 호출 시).
    ///
    /// # Errors
    ///
    /// 연결 문자열이 유효하지 않으면 `TrackerError::Config`
    pub fn open(redis_url: &str, connect_timeout: Duration) -> Result<Self, TrackerError> {
        let client = redis::Client::open(redis_url).map_err(|e| TrackerError::Config {
            field: "store.redis_url".to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            connect_timeout,
        })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, TrackerError> {
        tokio::time::timeout(
            self.connect_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| {
            TrackerError::StoreUnavailable(format!(
                "connection timed out after {}s",
                self.connect_timeout.as_secs()
            ))
        })?
        .map_err(|e| TrackerError::StoreUnavailable(e.to_string()))
    }
}

impl StateStore for RedisStateStore {
    async fn read(&self, key: &str) -> Result<Snapshot, TrackerError> {
        let mut conn = self.connection().await?;
        let fields: HashMap<String, String> = conn.hgetall(key).await?;
        debug!(key, fields = fields.len(), "read stored state");
        decode_fields(fields)
    }

    async fn write(&self, key: &str, snapshot: &Snapshot) -> Result<(), TrackerError> {
        let mut conn = self.connection().await?;

        if snapshot.is_empty() {
            let _: () = conn.del(key).await?;
            debug!(key, "empty snapshot, stored state deleted");
            return Ok(());
        }

        let items: Vec<(&str, u64)> = snapshot.iter().collect();
        let _: () = redis::pipe()
            .atomic()
            .del(key)
            .ignore()
            .hset_multiple(key, items.as_slice())
            .ignore()
            .query_async(&mut conn)
            .await?;
        debug!(key, vendors = items.len(), "stored state replaced");
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), TrackerError> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(key).await?;
        debug!(key, "stored state cleared");
        Ok(())
    }
}

/// 테스트용 메모리 저장소
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStateStore {
    /// key => (vendor => count 문자열)
    pub records: std::sync::Mutex<HashMap<String, HashMap<String, String>>>,
}

#[cfg(test)]
impl StateStore for MemoryStateStore {
    async fn read(&self, key: &str) -> Result<Snapshot, TrackerError> {
        let fields = self
            .records
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_default();
        decode_fields(fields)
    }

    async fn write(&self, key: &str, snapshot: &Snapshot) -> Result<(), TrackerError> {
        let mut records = self.records.lock().unwrap();
        if snapshot.is_empty() {
            records.remove(key);
        } else {
            let fields = snapshot
                .iter()
                .map(|(vendor, count)| (vendor.to_owned(), count.to_string()))
                .collect();
            records.insert(key.to_owned(), fields);
        }
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), TrackerError> {
        self.records.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_key_is_namespaced() {
        assert_eq!(state_key("packages", "4B"), "packages-4B");
    }

    #[test]
    fn decode_fields_parses_counts() {
        let fields = HashMap::from([
            ("acme".to_owned(), "3".to_owned()),
            ("globex".to_owned(), "5".to_owned()),
        ]);
        let snapshot = decode_fields(fields).unwrap();
        assert_eq!(snapshot, Snapshot::from([("acme", 3), ("globex", 5)]));
    }

    #[test]
    fn decode_fields_rejects_non_numeric_value() {
        let fields = HashMap::from([("acme".to_owned(), "three".to_owned())]);
        let err = decode_fields(fields).unwrap_err();
        assert!(matches!(err, TrackerError::StoreDecode { .. }));
    }

    #[test]
    fn decode_fields_empty_hash_is_empty_snapshot() {
        assert!(decode_fields(HashMap::new()).unwrap().is_empty());
    }

    #[test]
    fn open_rejects_invalid_url() {
        let result = RedisStateStore::open("not a url", Duration::from_secs(1));
        assert!(matches!(result, Err(TrackerError::Config { .. })));
    }

    #[tokio::test]
    async fn empty_write_deletes_record() {
        let store = MemoryStateStore::default();
        store
            .write("packages-4B", &Snapshot::from([("acme", 1)]))
            .await
            .unwrap();
        store.write("packages-4B", &Snapshot::new()).await.unwrap();

        assert!(store.read("packages-4B").await.unwrap().is_empty());
        assert!(!store.records.lock().unwrap().contains_key("packages-4B"));
    }

    #[tokio::test]
    async fn write_replaces_all_fields() {
        let store = MemoryStateStore::default();
        store
            .write("packages-4B", &Snapshot::from([("acme", 3), ("globex", 5)]))
            .await
            .unwrap();
        store
            .write("packages-4B", &Snapshot::from([("acme", 5)]))
            .await
            .unwrap();

        let stored = store.read("packages-4B").await.unwrap();
        assert_eq!(stored, Snapshot::from([("acme", 5)]));
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let store = MemoryStateStore::default();
        store.clear("packages-4B").await.unwrap();
        store.clear("packages-4B").await.unwrap();
        assert!(store.read("packages-4B").await.unwrap().is_empty());
    }
}

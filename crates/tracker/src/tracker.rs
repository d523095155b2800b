//! 트래커 오케스트레이터 -- 조회/검증/추출/저장/비교/알림 한 사이클 실행
//!
//! [`Tracker`]는 한 번의 호출에 한 사이클을 실행합니다. 사이클 간 상태는
//! 저장소에만 존재하며, 트래커 자체는 상태를 갖지 않습니다.
//!
//! # 상태 흐름
//! ```text
//! Idle -> Fetching -> Validating -> Extracting -> Persisting -> Diffing -> Notifying? -> Done
//!                         |
//!                         +-> Invalid -> Done   (저장소 변경 없음, 알림 없음)
//! ```
//!
//! # 에러 처리
//! - API 조회 실패, 스키마 불일치: [`CycleOutcome::Invalid`]로 정상 종료
//! - 저장소 에러: 사이클 중단, 호출자에게 전파
//! - 알림 실패: 수신자별 [`DeliveryReport`]에 기록, 사이클은 성공

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use packwatch_core::metrics as m;
use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::config::TrackerConfig;
use crate::delta::difference;
use crate::error::TrackerError;
use crate::extract::{my_summary, parse_listing};
use crate::notify::{DeliveryReport, Notifier, SmsSender};
use crate::source::InventorySource;
use crate::store::StateStore;
use crate::types::{Delta, Snapshot};

/// 사이클 실행 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleMode {
    /// 저장 + 알림
    Live,
    /// 조회/추출/비교만 수행
    DryRun,
}

/// 사이클 결과
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum CycleOutcome {
    /// 사이클 완료
    Completed(CycleReport),
    /// 업스트림 응답이 유효하지 않아 아무것도 변경하지 않음
    Invalid {
        /// 사이클 식별자
        cycle_id: String,
        /// 사유
        reason: String,
    },
}

impl CycleOutcome {
    /// 완료된 사이클의 보고서
    pub fn report(&self) -> Option<&CycleReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Invalid { .. } => None,
        }
    }

    /// 유효하지 않은 응답으로 종료되었는지 여부
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }
}

/// 완료된 사이클 보고서
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    /// 사이클 식별자 (UUID v4)
    pub cycle_id: String,
    /// 추적 유닛 코드
    pub unit_code: String,
    /// 저장소 키
    pub key: String,
    /// 사이클 시작 시점의 저장된 스냅샷
    pub previous: Snapshot,
    /// 이번 사이클에서 추출한 스냅샷
    pub snapshot: Snapshot,
    /// 증가분
    pub delta: Delta,
    /// 수신자별 발송 결과 (알림이 없었으면 비어 있음)
    pub deliveries: Vec<DeliveryReport>,
    /// 저장 여부 (dry run이면 `false`)
    pub persisted: bool,
}

/// 패키지 트래커
pub struct Tracker<St, Src, Snd> {
    config: TrackerConfig,
    store: Arc<St>,
    source: Arc<Src>,
    notifier: Option<Notifier<Snd>>,
}

impl<St, Src, Snd> Tracker<St, Src, Snd>
where
    St: StateStore,
    Src: InventorySource,
    Snd: SmsSender,
{
    /// 트래커 설정
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// 추적 유닛의 저장소 키
    pub fn state_key(&self) -> String {
        self.config.state_key()
    }

    /// 알림 활성화 여부
    pub fn notifications_enabled(&self) -> bool {
        self.notifier.is_some()
    }

    /// 한 사이클을 실행합니다 (저장 + 알림).
    ///
    /// # Errors
    ///
    /// 저장소 읽기/쓰기 실패 시 저장소 계열 `TrackerError`
    pub async fn run_cycle(&self) -> Result<CycleOutcome, TrackerError> {
        self.cycle(CycleMode::Live).await
    }

    /// 저장과 알림 없이 사이클을 미리 실행합니다.
    ///
    /// # Errors
    ///
    /// 저장소 읽기 실패 시 저장소 계열 `TrackerError`
    pub async fn preview(&self) -> Result<CycleOutcome, TrackerError> {
        self.cycle(CycleMode::DryRun).await
    }

    /// 저장된 스냅샷을 읽습니다.
    pub async fn stored_state(&self) -> Result<Snapshot, TrackerError> {
        self.store.read(&self.state_key()).await
    }

    /// 저장된 스냅샷을 삭제합니다. 레코드가 없어도 성공합니다.
    pub async fn reset(&self) -> Result<(), TrackerError> {
        let key = self.state_key();
        self.store.clear(&key).await?;
        info!(key = %key, "stored state reset");
        Ok(())
    }

    async fn cycle(&self, mode: CycleMode) -> Result<CycleOutcome, TrackerError> {
        let cycle_id = uuid::Uuid::new_v4().to_string();
        let span = info_span!(
            "cycle",
            cycle_id = %cycle_id,
            unit = %self.config.unit_code,
            dry_run = (mode == CycleMode::DryRun),
        );

        let started = Instant::now();
        let result = self.execute(cycle_id, mode).instrument(span).await;

        let label = match &result {
            Ok(CycleOutcome::Completed(_)) => "completed",
            Ok(CycleOutcome::Invalid { .. }) => "invalid",
            Err(_) => "failed",
        };
        counter!(m::CYCLES_TOTAL, m::LABEL_RESULT => label).increment(1);
        histogram!(m::CYCLE_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        result
    }

    async fn execute(
        &self,
        cycle_id: String,
        mode: CycleMode,
    ) -> Result<CycleOutcome, TrackerError> {
        let key = self.state_key();

        let previous = self
            .store
            .read(&key)
            .await
            .inspect_err(|e| error!(key = %key, error = %e, "failed to read stored state"))?;
        debug!(key = %key, vendors = previous.len(), "loaded stored state");

        let snapshot = match self.fetch_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) if e.is_upstream() => {
                warn!(error = %e, "inventory api probably down, leaving stored state untouched");
                return Ok(CycleOutcome::Invalid {
                    cycle_id,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        let persisted = match mode {
            CycleMode::Live => {
                self.store
                    .write(&key, &snapshot)
                    .await
                    .inspect_err(|e| error!(key = %key, error = %e, "failed to persist snapshot"))?;
                true
            }
            CycleMode::DryRun => false,
        };

        let delta = difference(&snapshot, &previous);
        info!(
            current = %snapshot,
            new = %delta,
            total = snapshot.total(),
            "snapshot extracted"
        );

        if mode == CycleMode::Live {
            for (vendor, added) in delta.iter() {
                counter!(m::NEW_PACKAGES_TOTAL, m::LABEL_VENDOR => vendor.to_owned())
                    .increment(added);
            }
        }

        let deliveries = match (&self.notifier, mode) {
            (Some(notifier), CycleMode::Live) if !delta.is_empty() => {
                notifier.notify(&delta, &snapshot).await
            }
            (None, CycleMode::Live) if !delta.is_empty() => {
                info!(new = delta.total(), "notifications disabled, skipping");
                Vec::new()
            }
            _ => Vec::new(),
        };

        Ok(CycleOutcome::Completed(CycleReport {
            cycle_id,
            unit_code: self.config.unit_code.clone(),
            key,
            previous,
            snapshot,
            delta,
            deliveries,
            persisted,
        }))
    }

    async fn fetch_snapshot(&self) -> Result<Snapshot, TrackerError> {
        let payload = self.source.fetch().await?;
        let listing = parse_listing(payload)?;
        my_summary(&self.config.unit_code, &listing)
    }
}

/// 트래커 빌더
pub struct TrackerBuilder<St, Src, Snd> {
    config: TrackerConfig,
    store: Option<Arc<St>>,
    source: Option<Arc<Src>>,
    notifier: Option<Notifier<Snd>>,
}

impl<St, Src, Snd> TrackerBuilder<St, Src, Snd>
where
    St: StateStore,
    Src: InventorySource,
    Snd: SmsSender,
{
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: TrackerConfig::default(),
            store: None,
            source: None,
            notifier: None,
        }
    }

    /// 트래커 설정을 지정합니다.
    pub fn config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    /// 상태 저장소를 설정합니다.
    pub fn store(mut self, store: Arc<St>) -> Self {
        self.store = Some(store);
        self
    }

    /// 인벤토리 조회 구현을 설정합니다.
    pub fn source(mut self, source: Arc<Src>) -> Self {
        self.source = Some(source);
        self
    }

    /// 알림 발송기를 설정합니다. 설정하지 않으면 알림 없이 실행됩니다.
    pub fn notifier(mut self, notifier: Notifier<Snd>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// 트래커를 빌드합니다.
    pub fn build(self) -> Result<Tracker<St, Src, Snd>, TrackerError> {
        self.config.validate()?;

        let store = self.store.ok_or_else(|| TrackerError::Config {
            field: "store".to_owned(),
            reason: "state store must be provided".to_owned(),
        })?;

        let source = self.source.ok_or_else(|| TrackerError::Config {
            field: "source".to_owned(),
            reason: "inventory source must be provided".to_owned(),
        })?;

        if self
            .notifier
            .as_ref()
            .is_some_and(|notifier| notifier.recipients().is_empty())
        {
            return Err(TrackerError::Config {
                field: "notifier".to_owned(),
                reason: "notifier has no recipients".to_owned(),
            });
        }

        Ok(Tracker {
            config: self.config,
            store,
            source,
            notifier: self.notifier,
        })
    }
}

impl<St, Src, Snd> Default for TrackerBuilder<St, Src, Snd>
where
    St: StateStore,
    Src: InventorySource,
    Snd: SmsSender,
{
    fn default() -> Self {
        Self::new()
    }
}

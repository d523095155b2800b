//! 트래커 에러 타입
//!
//! [`TrackerError`]는 트래커 모듈 내에서 발생할 수 있는 모든 에러를 나타냅니다.
//! `From<TrackerError> for PackwatchError` 구현을 통해 `?` 연산자로
//! 상위 에러 타입으로 자연스럽게 전파됩니다.
//!
//! # 에러 카테고리
//!
//! - **저장소** (사이클 중단): `StoreUnavailable`, `StoreCommand`, `StoreDecode`
//! - **API 조회** (사이클 내부 복구): `FetchFailure`, `FetchStatus`, `MalformedPayload`
//! - **알림** (수신자 단위 보고): `NotificationDelivery`
//! - **설정**: `Config`

use packwatch_core::error::{
    ConfigError, FetchError, NotifyError, PackwatchError, StoreError,
};

/// 트래커 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// 저장소에 연결할 수 없음
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// 저장소 명령 실패
    #[error("store command failed: {0}")]
    StoreCommand(String),

    /// 저장된 값이 정수가 아님
    #[error("stored value for vendor '{vendor}' is not a count: '{value}'")]
    StoreDecode {
        /// 벤더 필드명
        vendor: String,
        /// 저장된 원본 값
        value: String,
    },

    /// 인벤토리 API 요청 실패
    #[error("fetch failed: {0}")]
    FetchFailure(String),

    /// 인벤토리 API가 2xx 이외의 상태를 반환
    #[error("inventory api returned status {0}")]
    FetchStatus(u16),

    /// 페이로드가 예상 스키마와 다름
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// 수신자에게 알림 발송 실패
    #[error("notification delivery to '{recipient}' failed: {reason}")]
    NotificationDelivery {
        /// 수신자
        recipient: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl TrackerError {
    /// 사이클 내부에서 복구되는 에러인지 여부
    ///
    /// API 조회 실패와 스키마 불일치는 "API probably down"으로 처리되어
    /// 저장된 상태를 건드리지 않고 사이클을 종료합니다.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::FetchFailure(_) | Self::FetchStatus(_) | Self::MalformedPayload(_)
        )
    }

    /// 저장소 에러인지 여부
    pub fn is_store(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable(_) | Self::StoreCommand(_) | Self::StoreDecode { .. }
        )
    }
}

impl From<TrackerError> for PackwatchError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::StoreUnavailable(msg) => {
                PackwatchError::Store(StoreError::Unavailable(msg))
            }
            TrackerError::StoreCommand(msg) => PackwatchError::Store(StoreError::Command(msg)),
            TrackerError::StoreDecode { vendor, value } => {
                PackwatchError::Store(StoreError::Decode {
                    field: vendor,
                    value,
                })
            }
            TrackerError::FetchFailure(msg) => PackwatchError::Fetch(FetchError::Request(msg)),
            TrackerError::FetchStatus(status) => PackwatchError::Fetch(FetchError::Status(status)),
            TrackerError::MalformedPayload(msg) => {
                PackwatchError::Fetch(FetchError::MalformedPayload(msg))
            }
            TrackerError::NotificationDelivery { recipient, reason } => {
                PackwatchError::Notify(NotifyError::Delivery { recipient, reason })
            }
            TrackerError::Config { field, reason } => {
                PackwatchError::Config(ConfigError::InvalidValue { field, reason })
            }
        }
    }
}

impl From<redis::RedisError> for TrackerError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error() || err.is_connection_refusal() || err.is_timeout() {
            Self::StoreUnavailable(err.to_string())
        } else {
            Self::StoreCommand(err.to_string())
        }
    }
}

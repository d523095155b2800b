//! 트래커 설정
//!
//! [`TrackerConfig`]는 core의 [`PackwatchConfig`](packwatch_core::config::PackwatchConfig) 중
//! 사이클 실행에 필요한 값(`[tracker]`, `[store]`의 키 접두어)만 모은 설정입니다.
//!
//! # 사용 예시
//! ```ignore
//! use packwatch_core::config::PackwatchConfig;
//! use packwatch_tracker::config::TrackerConfig;
//!
//! let core_config = PackwatchConfig::default();
//! let config = TrackerConfig::from_core(&core_config);
//! ```

use std::time::Duration;

use packwatch_core::config::{MAX_REQUEST_TIMEOUT_SECS, PackwatchConfig};
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;
use crate::store::state_key;

/// 트래커 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// 추적할 유닛 코드
    pub unit_code: String,
    /// 인벤토리 API 엔드포인트
    pub api_url: String,
    /// API 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 저장소 키 접두어
    pub key_prefix: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            unit_code: String::new(),
            api_url: String::new(),
            request_timeout_secs: 10,
            key_prefix: "packages".to_owned(),
        }
    }
}

impl TrackerConfig {
    /// core 설정에서 트래커 설정을 생성합니다.
    pub fn from_core(core: &PackwatchConfig) -> Self {
        Self {
            unit_code: core.tracker.unit_code.clone(),
            api_url: core.tracker.api_url.clone(),
            request_timeout_secs: core.tracker.request_timeout_secs,
            key_prefix: core.store.key_prefix.clone(),
        }
    }

    /// 추적 유닛의 저장소 키
    pub fn state_key(&self) -> String {
        state_key(&self.key_prefix, &self.unit_code)
    }

    /// API 요청 타임아웃
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.unit_code.trim().is_empty() {
            return Err(TrackerError::Config {
                field: "unit_code".to_owned(),
                reason: "tracked unit code must not be empty".to_owned(),
            });
        }

        if self.key_prefix.is_empty() {
            return Err(TrackerError::Config {
                field: "key_prefix".to_owned(),
                reason: "key prefix must not be empty".to_owned(),
            });
        }

        if self.request_timeout_secs == 0 || self.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS
        {
            return Err(TrackerError::Config {
                field: "request_timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_REQUEST_TIMEOUT_SECS}"),
            });
        }

        Ok(())
    }
}

/// 트래커 설정 빌더
#[derive(Default)]
pub struct TrackerConfigBuilder {
    config: TrackerConfig,
}

impl TrackerConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 추적할 유닛 코드를 설정합니다.
    pub fn unit_code(mut self, code: impl Into<String>) -> Self {
        self.config.unit_code = code.into();
        self
    }

    /// 인벤토리 API 엔드포인트를 설정합니다.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// API 요청 타임아웃(초)을 설정합니다.
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    /// 저장소 키 접두어를 설정합니다.
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.key_prefix = prefix.into();
        self
    }

    /// 설정을 검증하고 빌드합니다.
    pub fn build(self) -> Result<TrackerConfig, TrackerError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

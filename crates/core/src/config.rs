//! 설정 관리 -- packwatch.toml 파싱 및 런타임 설정
//!
//! [`PackwatchConfig`]는 모든 컴포넌트의 설정을 담는 최상위 구조체입니다.
//! 프로세스 시작 시 한 번 생성되어 참조로 전달되며, 컴포넌트는 환경변수를 직접 읽지 않습니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`PACKWATCH_TRACKER_UNIT_CODE=4B` 형식)
//! 3. 설정 파일 (`packwatch.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 프로파일
//! - `local`: 설정 파일이 반드시 있어야 합니다.
//! - `production`: 설정 파일은 선택이며, 없으면 기본값 + 환경변수로 구성합니다.
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), packwatch_core::error::PackwatchError> {
//! use packwatch_core::config::{PackwatchConfig, Profile};
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = PackwatchConfig::load("packwatch.toml", Some(Profile::Local)).await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = PackwatchConfig::parse("[tracker]\nunit_code = \"4B\"")?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, PackwatchError};

/// 프로파일 환경변수 키
const PROFILE_ENV_KEY: &str = "PACKWATCH_GENERAL_PROFILE";

/// 인벤토리 API 요청 타임아웃 상한 (초)
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Packwatch 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackwatchConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 추적 대상 및 인벤토리 API 설정
    #[serde(default)]
    pub tracker: TrackerSection,
    /// 상태 저장소 설정
    #[serde(default)]
    pub store: StoreConfig,
    /// 알림 설정
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl PackwatchConfig {
    /// 프로파일에 맞게 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// `profile`이 `None`이면 `PACKWATCH_GENERAL_PROFILE` 환경변수, 그 다음 기본값(`local`)을 사용합니다.
    pub async fn load(
        path: impl AsRef<Path>,
        profile: Option<Profile>,
    ) -> Result<Self, PackwatchError> {
        let profile = profile.or_else(profile_from_env).unwrap_or_default();

        let mut config = match profile {
            Profile::Local => Self::from_file(path).await?,
            Profile::Production => match Self::from_file(path.as_ref()).await {
                Ok(config) => config,
                Err(PackwatchError::Config(ConfigError::FileNotFound { path })) => {
                    debug!(path = %path, "no config file, using defaults and environment");
                    Self::default()
                }
                Err(e) => return Err(e),
            },
        };

        config.general.profile = profile;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일을 파싱합니다 (환경변수 오버라이드, 검증 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, PackwatchError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PackwatchError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                PackwatchError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, PackwatchError> {
        toml::from_str(toml_str).map_err(|e| {
            PackwatchError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `PACKWATCH_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "PACKWATCH_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "PACKWATCH_GENERAL_LOG_FORMAT");

        // Tracker
        override_string(&mut self.tracker.unit_code, "PACKWATCH_TRACKER_UNIT_CODE");
        override_string(&mut self.tracker.api_url, "PACKWATCH_TRACKER_API_URL");
        override_u64(
            &mut self.tracker.request_timeout_secs,
            "PACKWATCH_TRACKER_REQUEST_TIMEOUT_SECS",
        );

        // Store
        override_string(&mut self.store.redis_url, "PACKWATCH_STORE_REDIS_URL");
        override_string(&mut self.store.key_prefix, "PACKWATCH_STORE_KEY_PREFIX");
        override_u64(
            &mut self.store.connect_timeout_secs,
            "PACKWATCH_STORE_CONNECT_TIMEOUT_SECS",
        );

        // Notify
        override_bool(&mut self.notify.enabled, "PACKWATCH_NOTIFY_ENABLED");
        override_csv(&mut self.notify.recipients, "PACKWATCH_NOTIFY_RECIPIENTS");
        override_string(&mut self.notify.sender, "PACKWATCH_NOTIFY_SENDER");
        override_string(&mut self.notify.account_sid, "PACKWATCH_NOTIFY_ACCOUNT_SID");
        override_string(&mut self.notify.auth_token, "PACKWATCH_NOTIFY_AUTH_TOKEN");
        override_string(&mut self.notify.api_base_url, "PACKWATCH_NOTIFY_API_BASE_URL");
        override_u64(
            &mut self.notify.request_timeout_secs,
            "PACKWATCH_NOTIFY_REQUEST_TIMEOUT_SECS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), PackwatchError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.tracker.unit_code.trim().is_empty() {
            return Err(invalid(
                "tracker.unit_code",
                "tracked unit code must not be empty".to_owned(),
            ));
        }

        if !is_http_url(&self.tracker.api_url) {
            return Err(invalid(
                "tracker.api_url",
                "must start with http:// or https://".to_owned(),
            ));
        }

        if !(1..=MAX_REQUEST_TIMEOUT_SECS).contains(&self.tracker.request_timeout_secs) {
            return Err(invalid(
                "tracker.request_timeout_secs",
                format!("must be 1-{MAX_REQUEST_TIMEOUT_SECS}"),
            ));
        }

        if self.store.redis_url.is_empty() {
            return Err(invalid(
                "store.redis_url",
                "store connection string must not be empty".to_owned(),
            ));
        }

        if self.store.key_prefix.is_empty() {
            return Err(invalid(
                "store.key_prefix",
                "key prefix must not be empty".to_owned(),
            ));
        }

        if self.store.connect_timeout_secs == 0 {
            return Err(invalid(
                "store.connect_timeout_secs",
                "must be greater than 0".to_owned(),
            ));
        }

        // 알림이 비활성화되어 있으면 자격 증명 검증을 건너뜀
        if self.notify.enabled {
            if self.notify.recipients.iter().all(|r| r.trim().is_empty()) {
                return Err(invalid(
                    "notify.recipients",
                    "at least one recipient required when notify is enabled".to_owned(),
                ));
            }

            let required = [
                ("notify.sender", &self.notify.sender),
                ("notify.account_sid", &self.notify.account_sid),
                ("notify.auth_token", &self.notify.auth_token),
            ];
            for (field, value) in required {
                if value.is_empty() {
                    return Err(invalid(
                        field,
                        "must not be empty when notify is enabled".to_owned(),
                    ));
                }
            }

            if !is_http_url(&self.notify.api_base_url) {
                return Err(invalid(
                    "notify.api_base_url",
                    "must start with http:// or https://".to_owned(),
                ));
            }

            if self.notify.request_timeout_secs == 0 {
                return Err(invalid(
                    "notify.request_timeout_secs",
                    "must be greater than 0".to_owned(),
                ));
            }
        }

        Ok(())
    }
}

/// 설정 로딩 프로파일
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// 로컬 개발: 설정 파일 필수
    #[default]
    Local,
    /// 운영: 설정 파일 선택, 환경변수 중심
    Production,
}

impl Profile {
    /// 대소문자 무시 파싱
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Some(Self::Local),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 설정 로딩 프로파일
    pub profile: Profile,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            profile: Profile::Local,
        }
    }
}

/// 추적 대상 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSection {
    /// 추적할 유닛 코드
    pub unit_code: String,
    /// 인벤토리 API 엔드포인트
    pub api_url: String,
    /// API 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl Default for TrackerSection {
    fn default() -> Self {
        Self {
            unit_code: String::new(),
            api_url: String::new(),
            request_timeout_secs: 10,
        }
    }
}

/// 상태 저장소 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Redis 연결 문자열
    pub redis_url: String,
    /// 키 접두어 (`<prefix>-<unit_code>`)
    pub key_prefix: String,
    /// 연결 타임아웃 (초)
    pub connect_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_owned(),
            key_prefix: "packages".to_owned(),
            connect_timeout_secs: 5,
        }
    }
}

/// 알림 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 수신자 목록
    pub recipients: Vec<String>,
    /// 발신자 번호
    pub sender: String,
    /// SMS 제공자 계정 SID
    pub account_sid: String,
    /// SMS 제공자 인증 토큰
    pub auth_token: String,
    /// SMS 제공자 API 기본 URL
    pub api_base_url: String,
    /// 발송 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            recipients: Vec::new(),
            sender: String::new(),
            account_sid: String::new(),
            auth_token: String::new(),
            api_base_url: "https://api.twilio.com".to_owned(),
            request_timeout_secs: 10,
        }
    }
}

fn invalid(field: &str, reason: String) -> PackwatchError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn profile_from_env() -> Option<Profile> {
    let val = std::env::var(PROFILE_ENV_KEY).ok()?;
    let parsed = Profile::from_str_loose(&val);
    if parsed.is_none() {
        warn!(
            env_key = PROFILE_ENV_KEY,
            value = val.as_str(),
            "unknown profile in env var, ignoring"
        );
    }
    parsed
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn valid_config() -> PackwatchConfig {
        let mut config = PackwatchConfig::default();
        config.tracker.unit_code = "4B".to_owned();
        config.tracker.api_url = "https://inventory.example.com/packages".to_owned();
        config.notify.recipients = vec!["+15550001".to_owned()];
        config.notify.sender = "+15559999".to_owned();
        config.notify.account_sid = "AC123".to_owned();
        config.notify.auth_token = "secret".to_owned();
        config
    }

    #[test]
    fn default_config_has_sane_values() {
        let config = PackwatchConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.general.profile, Profile::Local);
        assert_eq!(config.store.key_prefix, "packages");
        assert!(config.notify.enabled);
    }

    #[test]
    fn default_config_requires_unit_code() {
        let err = PackwatchConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("unit_code"));
    }

    #[test]
    fn complete_config_passes_validation() {
        valid_config().validate().unwrap();
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml = r#"
[tracker]
unit_code = "4B"
api_url = "http://localhost:8080/packages"

[notify]
enabled = false
"#;
        let config = PackwatchConfig::parse(toml).unwrap();
        assert_eq!(config.tracker.unit_code, "4B");
        assert_eq!(config.tracker.request_timeout_secs, 10);
        assert_eq!(config.store.redis_url, "redis://localhost:6379");
        config.validate().unwrap();
    }

    #[test]
    fn from_str_parses_profile() {
        let config = PackwatchConfig::parse("[general]\nprofile = \"production\"").unwrap();
        assert_eq!(config.general.profile, Profile::Production);
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let err = PackwatchConfig::parse("invalid = [[[toml").unwrap_err();
        assert!(matches!(
            err,
            PackwatchError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = valid_config();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_non_http_api_url() {
        let mut config = valid_config();
        config.tracker.api_url = "ftp://inventory.example.com".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("api_url"));
    }

    #[test]
    fn validate_rejects_missing_recipients_when_enabled() {
        let mut config = valid_config();
        config.notify.recipients.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("recipients"));
    }

    #[test]
    fn validate_rejects_missing_auth_token_when_enabled() {
        let mut config = valid_config();
        config.notify.auth_token.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("auth_token"));
    }

    #[test]
    fn validate_skips_notify_fields_when_disabled() {
        let mut config = valid_config();
        config.notify.enabled = false;
        config.notify.recipients.clear();
        config.notify.auth_token.clear();
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = valid_config();
        config.store.connect_timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("connect_timeout_secs"));
    }

    #[test]
    fn validate_rejects_request_timeout_above_limit() {
        let mut config = valid_config();
        config.tracker.request_timeout_secs = MAX_REQUEST_TIMEOUT_SECS;
        config.validate().unwrap();

        config.tracker.request_timeout_secs = MAX_REQUEST_TIMEOUT_SECS + 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("request_timeout_secs"));
    }

    #[test]
    fn profile_from_str_loose() {
        assert_eq!(Profile::from_str_loose("LOCAL"), Some(Profile::Local));
        assert_eq!(Profile::from_str_loose("prod"), Some(Profile::Production));
        assert_eq!(Profile::from_str_loose("staging"), None);
    }

    #[test]
    #[serial]
    fn env_override_csv_drops_empty_entries() {
        let mut val = vec!["a".to_owned()];
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_PACKWATCH_CSV", "+1555, ,+1666") };
        override_csv(&mut val, "TEST_PACKWATCH_CSV");
        assert_eq!(val, vec!["+1555", "+1666"]);
        unsafe { std::env::remove_var("TEST_PACKWATCH_CSV") };
    }

    #[test]
    #[serial]
    fn env_override_u64_invalid_keeps_original() {
        let mut val = 10;
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_PACKWATCH_U64", "ten") };
        override_u64(&mut val, "TEST_PACKWATCH_U64");
        assert_eq!(val, 10);
        unsafe { std::env::remove_var("TEST_PACKWATCH_U64") };
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = "original".to_owned();
        override_string(&mut val, "TEST_PACKWATCH_NONEXISTENT_12345");
        assert_eq!(val, "original");
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = valid_config();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = PackwatchConfig::parse(&toml_str).unwrap();
        assert_eq!(config.tracker.unit_code, parsed.tracker.unit_code);
        assert_eq!(config.notify.recipients, parsed.notify.recipients);
    }

    #[tokio::test]
    async fn local_profile_requires_file() {
        let err = PackwatchConfig::load("/nonexistent/path/packwatch.toml", Some(Profile::Local))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PackwatchError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}

//! 에러 타입 -- 도메인별 에러 정의

/// Packwatch 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum PackwatchError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 상태 저장소 에러
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// 인벤토리 API 조회 에러
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// 알림 발송 에러
    #[error("notify error: {0}")]
    Notify(#[from] NotifyError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 상태 저장소 에러
///
/// 저장소 에러는 사이클 전체를 중단시킵니다.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 연결 실패
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// 명령 실행 실패
    #[error("store command failed: {0}")]
    Command(String),

    /// 저장된 값 디코딩 실패
    #[error("stored value for field '{field}' is not a count: '{value}'")]
    Decode { field: String, value: String },
}

/// 인벤토리 API 조회 에러
///
/// 사이클 내부에서 복구됩니다 ("API probably down").
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// 요청 실패 (연결 불가, 타임아웃 등)
    #[error("request failed: {0}")]
    Request(String),

    /// 2xx가 아닌 응답
    #[error("unexpected status: {0}")]
    Status(u16),

    /// 응답 본문 파싱 실패 또는 스키마 불일치
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// 알림 발송 에러 (수신자 단위)
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// 발송 요청 실패
    #[error("delivery to '{recipient}' failed: {reason}")]
    Delivery { recipient: String, reason: String },
}

//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! `metrics` 파사드로 기록되며, recorder가 설치되지 않은 경우 no-op 입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `packwatch_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(packwatch_core::metrics::CYCLES_TOTAL, "result" => "completed").increment(1);
//! ```

use metrics::{describe_counter, describe_histogram};

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (completed, invalid, failed / success, failure)
pub const LABEL_RESULT: &str = "result";

/// 벤더 레이블 키
pub const LABEL_VENDOR: &str = "vendor";

// ─── 사이클 메트릭 ─────────────────────────────────────────────────

/// 실행된 사이클 수 (counter, label: result)
pub const CYCLES_TOTAL: &str = "packwatch_cycles_total";

/// 사이클 소요 시간 (histogram, 초)
pub const CYCLE_DURATION_SECONDS: &str = "packwatch_cycle_duration_seconds";

/// 새로 감지된 패키지 수 (counter, label: vendor)
pub const NEW_PACKAGES_TOTAL: &str = "packwatch_new_packages_total";

// ─── 알림 메트릭 ───────────────────────────────────────────────────

/// 수신자별 발송 시도 수 (counter, label: result)
pub const NOTIFICATIONS_TOTAL: &str = "packwatch_notifications_total";

/// 모든 메트릭의 설명을 등록합니다.
///
/// recorder 설치 직후 한 번 호출합니다.
pub fn describe_all() {
    describe_counter!(CYCLES_TOTAL, "Total number of tracking cycles by result");
    describe_histogram!(
        CYCLE_DURATION_SECONDS,
        "Time to complete a single tracking cycle in seconds"
    );
    describe_counter!(
        NEW_PACKAGES_TOTAL,
        "Total number of newly detected packages by vendor"
    );
    describe_counter!(
        NOTIFICATIONS_TOTAL,
        "Total number of per-recipient notification attempts by result"
    );
}

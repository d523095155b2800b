//! 스냅샷 추출 -- 인벤토리 페이로드에서 추적 유닛의 벤더별 패키지 수를 계산
//!
//! # 흐름
//!
//! ```text
//! serde_json::Value --parse_listing--> PackageListing
//!                                           |
//!                                     unit_packages (유닛 코드 매칭)
//!                                           |
//!                                     package_summary (first-wins fold)
//!                                           |
//!                                        Snapshot
//! ```
//!
//! # 유닛 코드 매칭
//!
//! 유닛 코드에 추적 식별자가 포함되어 있으면 매칭됩니다 (정확히 일치할 필요 없음).
//! 따라서 `"4"`를 추적하면 `"4B"`나 `"14"`도 매칭될 수 있으며, 목록에서 먼저 나오는 유닛이 선택됩니다.

use serde::Deserialize;
use tracing::debug;

use crate::error::TrackerError;
use crate::types::{PackageListing, Snapshot, Unit};

/// 페이로드 형태를 검증하고 타입이 있는 스키마로 파싱합니다.
///
/// 페이로드는 비어 있지 않은 `packages` 배열을 가진 객체여야 합니다.
/// 개별 유닛 레코드는 여기서 검사하지 않습니다.
///
/// # Errors
///
/// 형태가 맞지 않으면 `TrackerError::MalformedPayload`
pub fn parse_listing(payload: serde_json::Value) -> Result<PackageListing, TrackerError> {
    let Some(object) = payload.as_object() else {
        return Err(TrackerError::MalformedPayload(
            "payload is not a JSON object".to_owned(),
        ));
    };

    match object.get("packages") {
        None => {
            return Err(TrackerError::MalformedPayload(
                "payload has no 'packages' field".to_owned(),
            ));
        }
        Some(serde_json::Value::Array(units)) if units.is_empty() => {
            return Err(TrackerError::MalformedPayload(
                "'packages' is empty".to_owned(),
            ));
        }
        Some(serde_json::Value::Array(_)) => {}
        Some(_) => {
            return Err(TrackerError::MalformedPayload(
                "'packages' is not an array".to_owned(),
            ));
        }
    }

    serde_json::from_value(payload)
        .map_err(|e| TrackerError::MalformedPayload(format!("unexpected listing: {e}")))
}

/// 유닛 코드에 `identifier`가 포함된 첫 번째 유닛을 찾아 해석합니다.
///
/// 매칭된 레코드만 [`Unit`] 스키마로 역직렬화합니다.
///
/// # Errors
///
/// 매칭된 유닛 레코드가 스키마와 다르면 `TrackerError::MalformedPayload`
pub fn unit_packages(
    identifier: &str,
    listing: &PackageListing,
) -> Result<Option<Unit>, TrackerError> {
    let Some((code, record)) = listing.units().find(|(code, _)| code.contains(identifier)) else {
        return Ok(None);
    };

    Unit::deserialize(record)
        .map(Some)
        .map_err(|e| TrackerError::MalformedPayload(format!("unit '{code}' is malformed: {e}")))
}

/// 유닛의 패키지 수 레코드를 벤더별 스냅샷으로 요약합니다.
///
/// 같은 벤더가 여러 번 나오면 처음 나온 값만 남습니다 (합산하지 않음).
///
/// # Errors
///
/// `vendor` 또는 `count`가 없는 레코드가 있으면 `TrackerError::MalformedPayload`
pub fn package_summary(unit: &Unit) -> Result<Snapshot, TrackerError> {
    unit.package_counts
        .iter()
        .enumerate()
        .try_fold(Snapshot::new(), |mut snapshot, (index, record)| {
            let (Some(vendor), Some(count)) = (record.vendor.as_deref(), record.count) else {
                return Err(TrackerError::MalformedPayload(format!(
                    "unit '{}' record {index} lacks vendor or count",
                    unit.unit_code
                )));
            };
            if !snapshot.insert_if_absent(vendor, count) {
                debug!(unit = %unit.unit_code, vendor, count, "duplicate vendor ignored");
            }
            Ok(snapshot)
        })
}

/// 추적 식별자의 스냅샷을 계산합니다.
///
/// 매칭되는 유닛이 없으면 빈 스냅샷을 반환합니다 (에러 아님).
///
/// # Errors
///
/// 매칭된 유닛이나 그 레코드가 잘못되었으면 `TrackerError::MalformedPayload`
pub fn my_summary(identifier: &str, listing: &PackageListing) -> Result<Snapshot, TrackerError> {
    match unit_packages(identifier, listing)? {
        Some(unit) => package_summary(&unit),
        None => {
            debug!(identifier, units = listing.packages.len(), "no matching unit");
            Ok(Snapshot::new())
        }
    }
}

//! 도메인 타입 -- 인벤토리 페이로드, 스냅샷, 델타
//!
//! - [`PackageListing`]: 인벤토리 API 응답 (유닛 레코드는 원본 JSON)
//! - [`Unit`] / [`PackageCount`]: 매칭된 유닛의 스키마
//! - [`Snapshot`]: 벤더별 패키지 수 (한 유닛 기준)
//! - [`Delta`]: 이전 스냅샷 대비 증가분 (항상 양수)
//!
//! `Snapshot`과 `Delta`는 `BTreeMap` 기반이라 순회 순서(벤더명 순)가 항상 안정적입니다.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 인벤토리 API 응답
///
/// 유닛 레코드는 원본 JSON으로 보관하고, 추적 유닛으로 매칭된 레코드만
/// [`Unit`]으로 해석합니다. 다른 유닛의 레코드 형식은 검사하지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageListing {
    /// 유닛 레코드 목록 (원본)
    pub packages: Vec<serde_json::Value>,
}

impl PackageListing {
    /// `unitCode`가 문자열인 유닛 레코드를 목록 순서대로 순회합니다.
    ///
    /// 코드가 없거나 문자열이 아닌 레코드는 건너뜁니다.
    pub fn units(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.packages.iter().filter_map(|record| {
            record
                .get("unitCode")
                .and_then(serde_json::Value::as_str)
                .map(|code| (code, record))
        })
    }
}

/// 매칭된 유닛 레코드
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    /// 유닛 코드 (자유 형식 텍스트)
    pub unit_code: String,
    /// 벤더별 패키지 수 레코드
    pub package_counts: Vec<PackageCount>,
}

/// 벤더별 패키지 수 레코드
///
/// 필드 누락은 스키마 파싱 단계가 아니라 요약 단계에서
/// `MalformedPayload`로 보고됩니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageCount {
    /// 벤더 식별자
    pub vendor: Option<String>,
    /// 패키지 수
    pub count: Option<u64>,
}

/// 벤더별 패키지 수 스냅샷
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<String, u64>);

impl Snapshot {
    /// 빈 스냅샷을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 벤더가 아직 없을 때만 추가합니다 (first wins).
    ///
    /// 추가되었으면 `true`, 이미 있어서 무시되었으면 `false`를 반환합니다.
    pub fn insert_if_absent(&mut self, vendor: impl Into<String>, count: u64) -> bool {
        match self.0.entry(vendor.into()) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(count);
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    /// 벤더의 패키지 수 (없으면 `None`)
    pub fn get(&self, vendor: &str) -> Option<u64> {
        self.0.get(vendor).copied()
    }

    /// 벤더 수
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 전체 패키지 수 합계
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    /// 벤더명 순으로 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(vendor, count)| (vendor.as_str(), *count))
    }
}

impl<const N: usize> From<[(&str, u64); N]> for Snapshot {
    fn from(pairs: [(&str, u64); N]) -> Self {
        let mut snapshot = Self::new();
        for (vendor, count) in pairs {
            snapshot.insert_if_absent(vendor, count);
        }
        snapshot
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(none)");
        }
        let rendered: Vec<String> = self
            .iter()
            .map(|(vendor, count)| format!("{vendor} {count}"))
            .collect();
        write!(f, "{}", rendered.join(", "))
    }
}

/// 벤더별 증가분
///
/// 값은 항상 0보다 큽니다. 생성은 [`difference`](crate::delta::difference)를 통해서만 합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Delta(BTreeMap<String, u64>);

impl Delta {
    /// 증가분을 기록합니다. 0은 무시됩니다.
    pub(crate) fn record_growth(&mut self, vendor: &str, added: u64) {
        if added > 0 {
            self.0.insert(vendor.to_owned(), added);
        }
    }

    /// 벤더의 증가분 (없으면 `None`)
    pub fn get(&self, vendor: &str) -> Option<u64> {
        self.0.get(vendor).copied()
    }

    /// 증가한 벤더 수
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 새로 추가된 패키지 수 합계
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    /// 벤더명 순으로 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(vendor, added)| (vendor.as_str(), *added))
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(none)");
        }
        let rendered: Vec<String> = self
            .iter()
            .map(|(vendor, added)| format!("{vendor} +{added}"))
            .collect();
        write!(f, "{}", rendered.join(", "))
    }
}

//! 인벤토리 API 조회
//!
//! [`InventorySource`] trait은 단일 GET 요청을 추상화합니다.
//! 한 사이클에 정확히 한 번 호출되며, 재시도하지 않습니다.
//! 타임아웃은 구현체(HTTP 클라이언트)가 강제합니다.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::TrackerError;

/// 인벤토리 페이로드 조회 trait
pub trait InventorySource: Send + Sync + 'static {
    /// 원시 JSON 페이로드를 가져옵니다.
    ///
    /// # Errors
    ///
    /// - `TrackerError::FetchFailure`: 연결 실패, 타임아웃
    /// - `TrackerError::FetchStatus`: 2xx 이외의 응답
    /// - `TrackerError::MalformedPayload`: 본문이 JSON이 아님
    fn fetch(&self) -> impl Future<Output = Result<serde_json::Value, TrackerError>> + Send;
}

/// `reqwest` 기반 HTTP 조회 구현
#[derive(Debug, Clone)]
pub struct HttpInventorySource {
    http: reqwest::Client,
    url: String,
}

impl HttpInventorySource {
    /// 요청 타임아웃을 적용한 클라이언트를 생성합니다.
    ///
    /// # Errors
    ///
    /// HTTP 클라이언트 생성 실패 시 `TrackerError::Config`
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TrackerError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrackerError::Config {
                field: "tracker.api_url".to_owned(),
                reason: format!("failed to build http client: {e}"),
            })?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// 조회 대상 URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl InventorySource for HttpInventorySource {
    async fn fetch(&self) -> Result<serde_json::Value, TrackerError> {
        debug!(url = %self.url, "fetching inventory");

        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| TrackerError::FetchFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrackerError::FetchStatus(status.as_u16()));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| TrackerError::MalformedPayload(format!("response is not JSON: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// 요청 하나에 고정 응답을 돌려주는 로컬 HTTP 서버를 띄웁니다.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/packages")
    }

    #[tokio::test]
    async fn fetch_returns_json_on_success() {
        let url = serve_once("200 OK", r#"{"packages":[]}"#).await;
        let source = HttpInventorySource::new(url, Duration::from_secs(5)).unwrap();
        let payload = source.fetch().await.unwrap();
        assert!(payload["packages"].is_array());
    }

    #[tokio::test]
    async fn fetch_reports_non_success_status() {
        let url = serve_once("503 Service Unavailable", "{}").await;
        let source = HttpInventorySource::new(url, Duration::from_secs(5)).unwrap();
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, TrackerError::FetchStatus(503)));
    }

    #[tokio::test]
    async fn fetch_reports_non_json_body() {
        let url = serve_once("200 OK", "<html>maintenance</html>").await;
        let source = HttpInventorySource::new(url, Duration::from_secs(5)).unwrap();
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, TrackerError::MalformedPayload(_)));
    }

    #[tokio::test]
    async fn fetch_reports_unreachable_host() {
        // 바인딩 후 즉시 닫은 포트로 요청
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source =
            HttpInventorySource::new(format!("http://{addr}/packages"), Duration::from_secs(2))
                .unwrap();
        let err = source.fetch().await.unwrap_err();
        assert!(err.is_upstream());
    }
}

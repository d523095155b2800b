//! SMS 알림 -- 델타와 현재 스냅샷을 메시지로 만들어 수신자별로 발송
//!
//! [`SmsSender`] trait은 단일 수신자 발송을 추상화합니다.
//! [`Notifier`]는 모든 수신자에게 독립적으로 발송하고, 수신자별 결과를
//! [`DeliveryReport`]로 수집합니다. 한 수신자의 실패가 다른 수신자 발송을 막지 않습니다.
//!
//! # 메시지 형식
//!
//! ```text
//! New packages: acme +3, globex +5
//! Current counts: acme 3, globex 5
//! ```

use std::future::Future;
use std::time::Duration;

use metrics::counter;
use packwatch_core::config::NotifyConfig;
use packwatch_core::metrics as m;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::TrackerError;
use crate::types::{Delta, Snapshot};

/// 단일 수신자 SMS 발송 trait
pub trait SmsSender: Send + Sync + 'static {
    /// 메시지를 발송하고 제공자의 전달 식별자를 반환합니다.
    ///
    /// # Errors
    ///
    /// 발송 실패 시 `TrackerError::NotificationDelivery`
    fn send(
        &self,
        recipient: &str,
        body: &str,
    ) -> impl Future<Output = Result<String, TrackerError>> + Send;
}

/// 수신자별 발송 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    /// 수신자
    pub recipient: String,
    /// 결과
    pub outcome: DeliveryOutcome,
}

impl DeliveryReport {
    /// 발송 성공 여부
    pub fn is_sent(&self) -> bool {
        matches!(self.outcome, DeliveryOutcome::Sent { .. })
    }
}

/// 발송 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DeliveryOutcome {
    /// 발송됨 (제공자 전달 식별자)
    Sent {
        /// 전달 식별자
        sid: String,
    },
    /// 발송 실패
    Failed {
        /// 실패 사유
        reason: String,
    },
}

/// 델타와 현재 스냅샷으로 메시지 본문을 만듭니다.
pub fn render_message(delta: &Delta, snapshot: &Snapshot) -> String {
    format!("New packages: {delta}\nCurrent counts: {snapshot}")
}

/// 수신자 목록에 대한 알림 발송기
pub struct Notifier<S> {
    sender: S,
    recipients: Vec<String>,
}

impl<S: SmsSender> Notifier<S> {
    /// 발송 구현과 수신자 목록으로 생성합니다. 빈 항목은 제외됩니다.
    pub fn new(sender: S, recipients: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let recipients = recipients
            .into_iter()
            .map(Into::into)
            .map(|r: String| r.trim().to_owned())
            .filter(|r| !r.is_empty())
            .collect();
        Self { sender, recipients }
    }

    /// 설정된 수신자 목록
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// 모든 수신자에게 같은 메시지를 발송하고 수신자별 결과를 반환합니다.
    pub async fn notify(&self, delta: &Delta, snapshot: &Snapshot) -> Vec<DeliveryReport> {
        let body = render_message(delta, snapshot);
        let mut reports = Vec::with_capacity(self.recipients.len());

        for recipient in &self.recipients {
            let outcome = match self.sender.send(recipient, &body).await {
                Ok(sid) => {
                    info!(recipient = %recipient, sid = %sid, "notification sent");
                    counter!(m::NOTIFICATIONS_TOTAL, m::LABEL_RESULT => "success").increment(1);
                    DeliveryOutcome::Sent { sid }
                }
                Err(e) => {
                    warn!(recipient = %recipient, error = %e, "notification delivery failed");
                    counter!(m::NOTIFICATIONS_TOTAL, m::LABEL_RESULT => "failure").increment(1);
                    DeliveryOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            reports.push(DeliveryReport {
                recipient: recipient.clone(),
                outcome,
            });
        }

        reports
    }
}

/// Twilio Messages REST API 발송 구현
#[derive(Debug, Clone)]
pub struct TwilioSender {
    http: reqwest::Client,
    messages_url: String,
    account_sid: String,
    auth_token: String,
    from: String,
}

/// Twilio 응답 중 필요한 필드
#[derive(Deserialize)]
struct MessageResource {
    sid: String,
}

/// Twilio 에러 응답
#[derive(Deserialize)]
struct ErrorResource {
    message: Option<String>,
}

impl TwilioSender {
    /// 알림 설정에서 발송기를 생성합니다.
    ///
    /// # Errors
    ///
    /// HTTP 클라이언트 생성 실패 시 `TrackerError::Config`
    pub fn from_core(config: &NotifyConfig) -> Result<Self, TrackerError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| TrackerError::Config {
                field: "notify.api_base_url".to_owned(),
                reason: format!("failed to build http client: {e}"),
            })?;

        let base = config.api_base_url.trim_end_matches('/');
        Ok(Self {
            http,
            messages_url: format!(
                "{base}/2010-04-01/Accounts/{}/Messages.json",
                config.account_sid
            ),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from: config.sender.clone(),
        })
    }
}

impl SmsSender for TwilioSender {
    async fn send(&self, recipient: &str, body: &str) -> Result<String, TrackerError> {
        let delivery_error = |reason: String| TrackerError::NotificationDelivery {
            recipient: recipient.to_owned(),
            reason,
        };

        let response = self
            .http
            .post(&self.messages_url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", recipient), ("From", self.from.as_str()), ("Body", body)])
            .send()
            .await
            .map_err(|e| delivery_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorResource>()
                .await
                .ok()
                .and_then(|r| r.message)
                .unwrap_or_else(|| "no error detail".to_owned());
            return Err(delivery_error(format!("status {}: {detail}", status.as_u16())));
        }

        let resource = response
            .json::<MessageResource>()
            .await
            .map_err(|e| delivery_error(format!("unexpected response body: {e}")))?;
        Ok(resource.sid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// 지정한 수신자에게만 실패하는 발송기
    #[derive(Default)]
    struct RecordingSender {
        fail_for: Vec<String>,
        sent: Mutex<Vec<(String, String)>>,
    }

    impl SmsSender for RecordingSender {
        async fn send(&self, recipient: &str, body: &str) -> Result<String, TrackerError> {
            if self.fail_for.iter().any(|r| r == recipient) {
                return Err(TrackerError::NotificationDelivery {
                    recipient: recipient.to_owned(),
                    reason: "unreachable handset".to_owned(),
                });
            }
            let mut sent = self.sent.lock().unwrap();
            sent.push((recipient.to_owned(), body.to_owned()));
            Ok(format!("SM{}", sent.len()))
        }
    }

    fn sample() -> (Delta, Snapshot) {
        let snapshot = Snapshot::from([("acme", 3), ("globex", 5)]);
        let delta = crate::delta::difference(&snapshot, &Snapshot::new());
        (delta, snapshot)
    }

    #[test]
    fn render_message_lists_delta_then_snapshot() {
        let (delta, snapshot) = sample();
        assert_eq!(
            render_message(&delta, &snapshot),
            "New packages: acme +3, globex +5\nCurrent counts: acme 3, globex 5"
        );
    }

    #[test]
    fn new_drops_blank_recipients() {
        let notifier = Notifier::new(RecordingSender::default(), ["+15550001", " ", ""]);
        assert_eq!(notifier.recipients(), ["+15550001"]);
    }

    #[tokio::test]
    async fn notify_sends_same_body_to_every_recipient() {
        let notifier = Notifier::new(RecordingSender::default(), ["+15550001", "+15550002"]);
        let (delta, snapshot) = sample();

        let reports = notifier.notify(&delta, &snapshot).await;
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(DeliveryReport::is_sent));

        let sent = notifier.sender.sent.lock().unwrap();
        assert_eq!(sent[0].1, sent[1].1);
    }

    #[tokio::test]
    async fn failed_recipient_does_not_block_others() {
        let sender = RecordingSender {
            fail_for: vec!["+15550001".to_owned()],
            ..RecordingSender::default()
        };
        let notifier = Notifier::new(sender, ["+15550001", "+15550002"]);
        let (delta, snapshot) = sample();

        let reports = notifier.notify(&delta, &snapshot).await;
        assert!(matches!(
            reports[0].outcome,
            DeliveryOutcome::Failed { ref reason } if reason.contains("unreachable handset")
        ));
        assert_eq!(
            reports[1].outcome,
            DeliveryOutcome::Sent {
                sid: "SM1".to_owned()
            }
        );
    }

    #[test]
    fn delivery_report_serializes_with_status_tag() {
        let report = DeliveryReport {
            recipient: "+15550001".to_owned(),
            outcome: DeliveryOutcome::Sent {
                sid: "SM1".to_owned(),
            },
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"]["status"], "sent");
        assert_eq!(json["outcome"]["sid"], "SM1");
    }

    /// 요청 하나를 받아 원문을 돌려주고 고정 응답을 보내는 로컬 서버
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });
        (format!("http://{addr}"), handle)
    }

    fn notify_config(base: String) -> NotifyConfig {
        NotifyConfig {
            recipients: vec!["+15550001".to_owned()],
            sender: "+15559999".to_owned(),
            account_sid: "AC123".to_owned(),
            auth_token: "secret".to_owned(),
            api_base_url: base,
            ..NotifyConfig::default()
        }
    }

    #[tokio::test]
    async fn twilio_sender_posts_to_account_messages() {
        let (base, request) = serve_once("201 Created", r#"{"sid":"SM42","status":"queued"}"#).await;
        let sender = TwilioSender::from_core(&notify_config(base)).unwrap();

        let sid = sender.send("+15550001", "hello").await.unwrap();
        assert_eq!(sid, "SM42");

        let raw = request.await.unwrap();
        assert!(raw.starts_with("POST /2010-04-01/Accounts/AC123/Messages.json"));
        assert!(raw.to_lowercase().contains("authorization: basic"));
    }

    #[tokio::test]
    async fn twilio_sender_reports_provider_error() {
        let (base, _request) = serve_once(
            "400 Bad Request",
            r#"{"code":21211,"message":"Invalid 'To' Phone Number"}"#,
        )
        .await;
        let sender = TwilioSender::from_core(&notify_config(base)).unwrap();

        let err = sender.send("+1", "hello").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("400"));
        assert!(msg.contains("Invalid 'To' Phone Number"));
    }
}

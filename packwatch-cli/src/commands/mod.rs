//! Command handlers -- one module per subcommand

pub mod config;
pub mod reset;
pub mod run;
pub mod show;

use std::sync::Arc;
use std::time::Duration;

use packwatch_core::config::PackwatchConfig;
use packwatch_tracker::{
    HttpInventorySource, Notifier, RedisStateStore, Tracker, TrackerBuilder, TrackerConfig,
    TwilioSender,
};
use tracing::debug;

use crate::error::CliError;

/// Tracker wired to Redis, the HTTP inventory API and Twilio.
pub type LiveTracker = Tracker<RedisStateStore, HttpInventorySource, TwilioSender>;

/// Build the tracker from a validated configuration.
///
/// The notifier is attached only when `[notify] enabled = true`.
pub fn build_tracker(config: &PackwatchConfig) -> Result<LiveTracker, CliError> {
    let store = RedisStateStore::open(
        &config.store.redis_url,
        Duration::from_secs(config.store.connect_timeout_secs),
    )?;

    let tracker_config = TrackerConfig::from_core(config);
    let source = HttpInventorySource::new(&tracker_config.api_url, tracker_config.request_timeout())?;

    let mut builder = TrackerBuilder::new()
        .config(tracker_config)
        .store(Arc::new(store))
        .source(Arc::new(source));

    if config.notify.enabled {
        let sender = TwilioSender::from_core(&config.notify)?;
        builder = builder.notifier(Notifier::new(sender, config.notify.recipients.iter().cloned()));
    } else {
        debug!("notifications disabled by configuration");
    }

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PackwatchConfig {
        PackwatchConfig::parse(
            r#"
[tracker]
unit_code = "4B"
api_url = "http://127.0.0.1:9/packages"

[store]
redis_url = "redis://127.0.0.1:6379"
key_prefix = "mail"

[notify]
enabled = false
"#,
        )
        .expect("test config should parse")
    }

    #[test]
    fn test_build_tracker_without_notifier() {
        let tracker = build_tracker(&config()).expect("should build");
        assert!(!tracker.notifications_enabled());
        assert_eq!(tracker.state_key(), "mail-4B");
    }

    #[test]
    fn test_build_tracker_with_notifier() {
        let mut config = config();
        config.notify.enabled = true;
        config.notify.recipients = vec!["+15550001".to_owned()];
        config.notify.sender = "+15559990".to_owned();
        config.notify.account_sid = "AC1".to_owned();
        config.notify.auth_token = "token".to_owned();

        let tracker = build_tracker(&config).expect("should build");
        assert!(tracker.notifications_enabled());
    }

    #[test]
    fn test_build_tracker_rejects_bad_store_url() {
        let mut config = config();
        config.store.redis_url = "not a url".to_owned();
        let err = build_tracker(&config).err().expect("should fail");
        assert_eq!(err.exit_code(), 2);
    }
}

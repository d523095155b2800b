#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`TrackerError`)
//! - [`config`]: Tracker configuration (`TrackerConfig`, builder)
//! - [`types`]: Payload schema and value types (`PackageListing`, `Snapshot`, `Delta`)
//! - [`extract`]: Snapshot extraction (`parse_listing`, `my_summary`)
//! - [`delta`]: Positive-only change detection (`difference`)
//! - [`store`]: State store abstraction (`StateStore` trait, `RedisStateStore`)
//! - [`source`]: Inventory API abstraction (`InventorySource` trait, `HttpInventorySource`)
//! - [`notify`]: SMS notification (`SmsSender` trait, `TwilioSender`, `Notifier`)
//! - [`tracker`]: Cycle orchestrator (`Tracker`, `TrackerBuilder`)
//!
//! # Architecture
//!
//! ```text
//! InventorySource.fetch() --> parse_listing --> my_summary --> Snapshot
//!                                                                 |
//!          StateStore.read() --previous--> difference(current, previous) --> Delta
//!                                                                 |
//!          StateStore.write(current)                   Notifier.notify (non-empty only)
//! ```

pub mod config;
pub mod delta;
pub mod error;
pub mod extract;
pub mod notify;
pub mod source;
pub mod store;
pub mod tracker;
pub mod types;

// --- Public API Re-exports ---

// Tracker (main orchestrator)
pub use tracker::{CycleOutcome, CycleReport, Tracker, TrackerBuilder};

// Configuration
pub use config::{TrackerConfig, TrackerConfigBuilder};

// Error
pub use error::TrackerError;

// Types
pub use types::{Delta, PackageCount, PackageListing, Snapshot, Unit};

// Extraction and diff
pub use delta::difference;
pub use extract::{my_summary, package_summary, parse_listing, unit_packages};

// Collaborators
pub use notify::{DeliveryOutcome, DeliveryReport, Notifier, SmsSender, TwilioSender, render_message};
pub use source::{HttpInventorySource, InventorySource};
pub use store::{RedisStateStore, StateStore, state_key};

//! Session management: per-session registries, notification channels and
//! lifecycle.

pub mod client;
pub mod manager;

pub use client::{ClientSession, NotificationReceiver};
pub use manager::{SessionHandle, SessionManager, DEFAULT_NOTIFICATION_CAPACITY};

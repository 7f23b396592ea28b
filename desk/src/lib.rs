//! FXDesk Desk
//!
//! The desk walks each user through a short conversion dialogue: pick a
//! direction, pick how the amount is read, type the amount. Rates come
//! from the quote engine and stay locked for the whole dialogue.

pub mod config;
pub mod desk;
pub mod metrics;
pub mod session;
pub mod store;
pub mod telegram;

pub use config::{ConfigError, DeskConfig, QuoteConfig, SessionConfig};
pub use desk::{Desk, ErrorReply, Event, Reply};
pub use metrics::{DeskMetrics, MetricsSnapshot, SharedMetrics};
pub use session::{ConversionSession, SessionError, SubmitError};
pub use store::SessionStore;
pub use telegram::TelegramFrontend;

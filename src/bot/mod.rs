/// Caption building for delivered videos
pub mod caption;
/// Command and message handlers
pub mod handlers;
/// Retry wrappers around Telegram API sends
pub mod resilient;

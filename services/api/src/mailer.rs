//! Outbound mail delivery interface
//!
//! Password-reset messages leave the process through this trait. The
//! shipped implementation writes to the application log; a real delivery
//! backend plugs in behind the same interface.

use anyhow::Result;
use tracing::info;

/// Narrow interface to an email delivery backend
pub trait Mailer: Send + Sync {
    /// Deliver a single plain-text message
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Mailer that logs messages instead of delivering them
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        info!("Mail to {}: {} - {}", to, subject, body);
        Ok(())
    }
}

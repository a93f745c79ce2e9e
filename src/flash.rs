//! One-shot notifications carried in the session from a redirect to the next rendered page.

use serde::{Deserialize, Serialize};
use tower_sessions::{Session, session};

const FLASH_KEY: &str = "flash";

/// Flash
///
/// Pending messages, grouped by severity. Read and cleared in one step by [`take`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Flash {
    pub success: Vec<String>,
    pub error: Vec<String>,
}

impl Flash {
    pub fn is_empty(&self) -> bool {
        self.success.is_empty() && self.error.is_empty()
    }
}

pub async fn success(session: &Session, message: impl Into<String>) -> Result<(), session::Error> {
    push(session, |flash| flash.success.push(message.into())).await
}

pub async fn error(session: &Session, message: impl Into<String>) -> Result<(), session::Error> {
    push(session, |flash| flash.error.push(message.into())).await
}

async fn push(session: &Session, add: impl FnOnce(&mut Flash)) -> Result<(), session::Error> {
    let mut flash = session.get::<Flash>(FLASH_KEY).await?.unwrap_or_default();
    add(&mut flash);
    session.insert(FLASH_KEY, flash).await
}

/// Removes and returns every pending message.
pub async fn take(session: &Session) -> Result<Flash, session::Error> {
    Ok(session.remove::<Flash>(FLASH_KEY).await?.unwrap_or_default())
}

//! Identity provider seam used by registration and account deletion.

pub mod gotrue;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::models::NewIdentity;

pub use gotrue::GoTrueAdmin;

#[derive(Debug, Error)]
pub enum IdentityError {
    /// The provider answered with an error; the message is passed through
    #[error("{0}")]
    Rejected(String),

    #[error("Identity provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Administrative access to login identities
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create a confirmed identity and return its id
    async fn create_user(&self, identity: &NewIdentity) -> Result<String, IdentityError>;

    async fn delete_user(&self, user_id: &str) -> Result<(), IdentityError>;
}

/// Error bodies differ across provider versions; take the first message present
#[derive(Debug, Default, Deserialize)]
pub struct ProviderErrorBody {
    pub msg: Option<String>,
    pub message: Option<String>,
    pub error_description: Option<String>,
    pub error: Option<String>,
}

impl ProviderErrorBody {
    pub fn into_message(self, status: u16) -> String {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
            .unwrap_or_else(|| format!("Identity provider returned status {status}"))
    }
}

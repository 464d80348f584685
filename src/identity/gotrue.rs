use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use super::{IdentityError, IdentityProvider, ProviderErrorBody};
use crate::clients::service_role_client;
use crate::constants::ERR_USER_NOT_FOUND;
use crate::error::AppError;
use crate::models::NewIdentity;

/// Admin API of a GoTrue-compatible auth server (`{base}/auth/v1/admin`)
#[derive(Clone)]
pub struct GoTrueAdmin {
    client: Client,
    admin_url: String,
}

#[derive(Serialize)]
struct CreateUserBody<'a> {
    email: &'a str,
    password: &'a str,
    email_confirm: bool,
    user_metadata: UserMetadata<'a>,
}

#[derive(Serialize)]
struct UserMetadata<'a> {
    full_name: &'a str,
}

#[derive(Deserialize)]
struct CreatedUser {
    id: String,
}

impl GoTrueAdmin {
    pub fn new(baas_url: &str, service_role_key: &str, timeout_secs: u64) -> Result<Self, AppError> {
        Ok(Self {
            client: service_role_client(service_role_key, timeout_secs)?,
            admin_url: format!("{}/auth/v1/admin", baas_url.trim_end_matches('/')),
        })
    }

    fn users_url(&self) -> String {
        format!("{}/users", self.admin_url)
    }

    /// The id is one encoded path segment; it can never leave `/users/`
    fn user_url(&self, user_id: &str) -> String {
        format!("{}/{}", self.users_url(), urlencoding::encode(user_id))
    }

    async fn rejection(response: Response) -> IdentityError {
        let status = response.status().as_u16();
        let body = response
            .json::<ProviderErrorBody>()
            .await
            .unwrap_or_default();
        IdentityError::Rejected(body.into_message(status))
    }
}

#[async_trait]
impl IdentityProvider for GoTrueAdmin {
    async fn create_user(&self, identity: &NewIdentity) -> Result<String, IdentityError> {
        let body = CreateUserBody {
            email: &identity.email,
            password: &identity.password,
            email_confirm: true,
            user_metadata: UserMetadata {
                full_name: &identity.full_name,
            },
        };

        let response = self.client.post(self.users_url()).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let created: CreatedUser = response.json().await?;
        tracing::debug!(user_id = %created.id, "Identity created");
        Ok(created.id)
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), IdentityError> {
        // Dot segments survive encoding and would be resolved by the URL parser
        if user_id.is_empty() || user_id == "." || user_id == ".." {
            return Err(IdentityError::Rejected(ERR_USER_NOT_FOUND.to_string()));
        }

        let response = self.client.delete(self.user_url(user_id)).send().await?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        tracing::debug!(user_id = %user_id, "Identity deleted");
        Ok(())
    }
}

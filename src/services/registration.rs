use crate::constants::ERR_PROFILE_CREATION_FAILED;
use crate::db::RecordStore;
use crate::error::{AppError, Result};
use crate::identity::IdentityProvider;
use crate::models::{NewIdentity, NewProfile, Role};

/// Validated registration input
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub student_id: Option<String>,
    pub department: Option<String>,
    pub faculty: Option<String>,
    pub phone: Option<String>,
}

/// Create an identity and its profile, returning the new user id
///
/// If the profile cannot be written the identity is deleted again, so a
/// failed registration never leaves a login without a profile.
pub async fn register(
    store: &dyn RecordStore,
    identity: &dyn IdentityProvider,
    registration: Registration,
) -> Result<String> {
    let Registration {
        email,
        password,
        full_name,
        student_id,
        department,
        faculty,
        phone,
    } = registration;

    let user_id = identity
        .create_user(&NewIdentity {
            email: email.clone(),
            password,
            full_name: full_name.clone(),
        })
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Identity creation failed");
            AppError::Identity(e.to_string())
        })?;

    let profile = NewProfile {
        id: user_id.clone(),
        email,
        full_name,
        role: Role::Student,
        student_id,
        department,
        faculty,
        phone,
        is_active: true,
    };

    if let Err(e) = store.upsert_profile(&profile).await {
        tracing::error!(user_id = %user_id, error = %e, "Profile creation failed, rolling back identity");

        if let Err(rollback) = identity.delete_user(&user_id).await {
            tracing::error!(
                user_id = %user_id,
                error = %rollback,
                "Identity rollback failed; identity exists without a profile"
            );
        }

        return Err(AppError::Profile(format!("{ERR_PROFILE_CREATION_FAILED}: {e}")));
    }

    tracing::info!(user_id = %user_id, "User registered");
    Ok(user_id)
}

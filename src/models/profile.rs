use serde::{Deserialize, Serialize};

/// Application role stored on the profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Student,
    Seller,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Seller => "seller",
            Role::Admin => "admin",
        }
    }
}

/// Profile row written at registration, keyed by the identity's id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProfile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub student_id: Option<String>,
    pub department: Option<String>,
    pub faculty: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
}

/// Credentials and metadata sent to the identity provider
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

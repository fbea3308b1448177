use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One catalog listing. `position` is the sole display-order key; the public
/// list endpoint returns rows ordered by it ascending.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Antique {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub image_url: Option<String>,
    pub position: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub token_hash: String,
    pub expires_at: String,
    pub created_at: String,
}

// DTOs for API

#[derive(Debug, Deserialize)]
pub struct CreateAntiqueRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub price: f64,
    pub image_url: Option<String>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAntiqueRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// User without the password hash, safe to return to clients.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

/// Public contact form body. Never persisted; flows through the pipeline and
/// is dropped. `company` is the honeypot: humans never see the field, so a
/// non-empty value marks the submission as automated.
#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub recaptcha_token: String,
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ApplicationStatus, JobStatus, User, UserType};

// -- JWT Claims --

/// JWT claims shared across sezora-api (REST middleware) and sezora-gateway
/// (WebSocket authentication).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub user_type: UserType,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub token: String,
    pub profile: User,
}

// -- Profile --

/// Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub bio: Option<String>,
    pub company_name: Option<String>,
}

// -- Jobs --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateJobRequest {
    pub title: String,
    pub company_name: String,
    pub location: String,
    pub description: String,
    pub pay: String,
}

/// Query string of the public board. Both terms are case-insensitive
/// substring matches; blank terms match everything.
#[derive(Debug, Default, Deserialize)]
pub struct JobSearch {
    /// Matched against title, company and description.
    pub q: Option<String>,
    pub location: Option<String>,
}

/// Query string of the admin review queue. `q` is matched against title,
/// company and the poster's name.
#[derive(Debug, Default, Deserialize)]
pub struct PendingJobSearch {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewJobRequest {
    pub status: JobStatus,
}

// -- Applications --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewApplicationRequest {
    pub status: ApplicationStatus,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub receiver_id: Uuid,
    pub content: String,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::person::Role;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub username: Option<String>,
    pub role: Option<Role>,
    pub exp: Option<u64>,
    pub iat: Option<u64>,
}

/// The authenticated identity injected into request extensions by the auth
/// middleware. This is what the authorization gate and the services see;
/// nothing downstream touches raw tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub valid: bool,
    pub person_id: Uuid,
    pub username: String,
    pub role: Role,
}

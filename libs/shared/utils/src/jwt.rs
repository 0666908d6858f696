use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::{JwtClaims, SessionUser};
use shared_models::person::Role;

type HmacSha256 = Hmac<Sha256>;

/// Mint an HS256 token for an authenticated person.
pub fn issue_token(
    person_id: Uuid,
    username: &str,
    role: Role,
    jwt_secret: &str,
    ttl_hours: i64,
) -> Result<String, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let now = Utc::now();
    let exp = now + Duration::hours(ttl_hours);

    let header = json!({
        "alg": "HS256",
        "typ": "JWT"
    });
    let claims = json!({
        "sub": person_id.to_string(),
        "username": username,
        "role": role,
        "iat": now.timestamp(),
        "exp": exp.timestamp()
    });

    let header_b64 = URL_SAFE_NO_PAD.encode(header.to_string());
    let claims_b64 = URL_SAFE_NO_PAD.encode(claims.to_string());
    let signing_input = format!("{}.{}", header_b64, claims_b64);

    let mut mac = HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", signing_input, signature))
}

pub fn validate_token(token: &str, jwt_secret: &str) -> Result<SessionUser, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    // Split token into parts
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Failed to decode signature: {}", e);
            return Err("Invalid signature encoding".to_string());
        }
    };

    let signing_input = format!("{}.{}", header_b64, claims_b64);

    let mut mac = match HmacSha256::new_from_slice(jwt_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return Err("Failed to create HMAC".to_string()),
    };
    mac.update(signing_input.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    // Decode claims
    let claims_json = match URL_SAFE_NO_PAD.decode(claims_b64) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err("Invalid claims encoding".to_string()),
        },
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    let claims: JwtClaims = match serde_json::from_str(&claims_json) {
        Ok(c) => c,
        Err(e) => {
            debug!("Failed to parse claims: {}", e);
            return Err("Invalid claims format".to_string());
        }
    };

    // Check expiration
    if let Some(exp) = claims.exp {
        let now = Utc::now().timestamp() as u64;
        if exp < now {
            debug!("Token expired at {} (now: {})", exp, now);
            return Err("Token expired".to_string());
        }
    }

    let id = Uuid::parse_str(&claims.sub).map_err(|_| "Invalid token subject".to_string())?;
    let role = claims.role.ok_or_else(|| "Token carries no role".to_string())?;
    let username = claims.username.unwrap_or_default();

    let user = SessionUser { id, username, role };

    debug!("Token validated successfully for person: {}", user.id);
    Ok(user)
}

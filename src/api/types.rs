//! Wire types for the OPD backend.
//!
//! Every endpoint answers with `{ success, message?, data? }`. Login is the
//! exception: `token` and `user` may sit at the top level or inside `data`.

use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::models::{Role, User};

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub role: Role,
}

/// Successful login: identity plus bearer credential.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Standard response envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// The payload, or a decode error naming the endpoint.
    pub fn into_data(self, endpoint: &str) -> Result<T, ApiError> {
        if self.success == Some(false) {
            return Err(ApiError::Status {
                status: 200,
                message: self.message,
            });
        }
        self.data
            .ok_or_else(|| ApiError::Decode(format!("{endpoint}: response has no data")))
    }
}

/// Error bodies carry `message` (sometimes `error`).
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn parse(body: &str) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        parsed
            .message
            .or(parsed.error)
            .filter(|m| !m.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct LoginData {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<User>,
}

/// Login body in either shape.
#[derive(Debug, Deserialize)]
pub struct LoginEnvelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    data: Option<LoginData>,
}

impl LoginEnvelope {
    pub fn into_login(self) -> Result<LoginResponse, ApiError> {
        if self.success == Some(false) {
            return Err(ApiError::Status {
                status: 200,
                message: self.message,
            });
        }
        let (nested_token, nested_user) = match self.data {
            Some(d) => (d.token, d.user),
            None => (None, None),
        };
        let token = self
            .token
            .or(nested_token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Decode("login: response has no token".into()))?;
        let user = self
            .user
            .or(nested_user)
            .ok_or_else(|| ApiError::Decode("login: response has no user".into()))?;
        Ok(LoginResponse { token, user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_json() -> serde_json::Value {
        json!({"id": "u1", "fullName": "Admin", "email": "admin@tekisky.com", "role": "admin"})
    }

    #[test]
    fn login_with_top_level_token() {
        let env: LoginEnvelope =
            serde_json::from_value(json!({"success": true, "token": "t1", "user": user_json()}))
                .unwrap();
        let login = env.into_login().unwrap();
        assert_eq!(login.token, "t1");
        assert_eq!(login.user.role, Role::Admin);
    }

    #[test]
    fn login_with_nested_data() {
        let env: LoginEnvelope =
            serde_json::from_value(json!({"data": {"token": "t2", "user": user_json()}})).unwrap();
        assert_eq!(env.into_login().unwrap().token, "t2");
    }

    #[test]
    fn login_without_token_is_decode_error() {
        let env: LoginEnvelope = serde_json::from_value(json!({"user": user_json()})).unwrap();
        assert!(matches!(env.into_login(), Err(ApiError::Decode(_))));
    }

    fn decode<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ApiError> {
        let env: Envelope<T> =
            serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        env.into_data("generic")
    }

    #[test]
    fn envelope_decodes_for_any_owned_payload() {
        let body = json!({"success": true, "data": [user_json()]}).to_string();
        let users: Vec<User> = decode(&body).unwrap();
        assert_eq!(users[0].id, "u1");

        let missing: Result<Vec<User>, _> = decode(r#"{"success":true}"#);
        assert!(matches!(missing, Err(ApiError::Decode(_))));
    }

    #[test]
    fn envelope_without_data_is_decode_error() {
        let env: Envelope<Vec<User>> = serde_json::from_value(json!({"success": true})).unwrap();
        assert!(matches!(env.into_data("users"), Err(ApiError::Decode(_))));
    }

    #[test]
    fn unsuccessful_envelope_surfaces_message() {
        let env: Envelope<Vec<User>> =
            serde_json::from_value(json!({"success": false, "message": "Not allowed"})).unwrap();
        let err = env.into_data("users").unwrap_err();
        assert_eq!(err.server_message(), Some("Not allowed"));
    }

    #[test]
    fn error_body_prefers_message() {
        assert_eq!(
            ErrorBody::parse(r#"{"message":"Invalid credentials"}"#).as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(ErrorBody::parse(r#"{"error":"boom"}"#).as_deref(), Some("boom"));
        assert_eq!(ErrorBody::parse("<html>"), None);
    }
}

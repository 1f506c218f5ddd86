use std::sync::RwLock;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::types::{Envelope, ErrorBody, LoginEnvelope, LoginRequest, LoginResponse};
use super::{ApiError, OpdApi};
use crate::config::ClientConfig;
use crate::models::{NewUser, Patient, PatientRegistration, Prescription, Role, User, UserUpdate};
use crate::session::BearerToken;

/// Blocking HTTP client for the OPD backend.
pub struct HttpOpdClient {
    base_url: String,
    client: Client,
    timeout_secs: u64,
    bearer: RwLock<Option<BearerToken>>,
}

impl HttpOpdClient {
    /// Create a client from configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::HttpClient(e.to_string()))?;
        Ok(Self::with_client(&config.api_base_url, client, config.timeout_secs))
    }

    /// Wrap an already configured reqwest client.
    pub fn with_client(base_url: &str, client: Client, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
            bearer: RwLock::new(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match self.bearer.read() {
            Ok(guard) => match guard.as_ref() {
                Some(token) => builder.bearer_auth(token.as_str()),
                None => builder,
            },
            Err(_) => {
                tracing::warn!("Bearer lock poisoned; sending request without credential");
                builder
            }
        }
    }

    /// Send and return the raw body of a 2xx response.
    fn execute(&self, builder: RequestBuilder, endpoint: &str) -> Result<String, ApiError> {
        let response = builder.send().map_err(|e| {
            if e.is_connect() {
                ApiError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                ApiError::Timeout(self.timeout_secs)
            } else {
                ApiError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response.text().unwrap_or_default();
        if !status.is_success() {
            tracing::warn!(endpoint, status = status.as_u16(), "OPD request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: ErrorBody::parse(&body),
            });
        }

        tracing::debug!(endpoint, status = status.as_u16(), "OPD request ok");
        Ok(body)
    }

    fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.execute(self.request(Method::GET, path), path)?;
        decode_envelope(&body, path)
    }

    fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        payload: &B,
    ) -> Result<T, ApiError> {
        let body = self.execute(self.request(method, path).json(payload), path)?;
        decode_envelope(&body, path)
    }
}

fn decode_envelope<T: DeserializeOwned>(body: &str, endpoint: &str) -> Result<T, ApiError> {
    let envelope: Envelope<T> = serde_json::from_str(body)
        .map_err(|e| ApiError::Decode(format!("{endpoint}: {e}")))?;
    envelope.into_data(endpoint)
}

impl OpdApi for HttpOpdClient {
    fn set_bearer(&self, token: Option<&BearerToken>) {
        match self.bearer.write() {
            Ok(mut guard) => *guard = token.cloned(),
            Err(poisoned) => *poisoned.into_inner() = token.cloned(),
        }
    }

    fn login(&self, email: &str, password: &str, role: Role) -> Result<LoginResponse, ApiError> {
        let path = "/auth/login";
        let payload = LoginRequest {
            email,
            password,
            role,
        };
        let body = self.execute(self.request(Method::POST, path).json(&payload), path)?;
        let envelope: LoginEnvelope = serde_json::from_str(&body)
            .map_err(|e| ApiError::Decode(format!("{path}: {e}")))?;
        envelope.into_login()
    }

    fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.fetch("/admin/users")
    }

    fn create_user(&self, user: &NewUser) -> Result<User, ApiError> {
        self.send_json(Method::POST, "/admin/users", user)
    }

    fn update_user(&self, id: &str, update: &UserUpdate) -> Result<User, ApiError> {
        self.send_json(Method::PUT, &format!("/admin/users/{id}"), update)
    }

    fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        let path = format!("/admin/users/{id}");
        self.execute(self.request(Method::DELETE, &path), &path)?;
        Ok(())
    }

    fn list_patients(&self) -> Result<Vec<Patient>, ApiError> {
        self.fetch("/patient")
    }

    fn list_doctors(&self) -> Result<Vec<User>, ApiError> {
        self.fetch("/doctor")
    }

    fn register_patient(&self, registration: &PatientRegistration) -> Result<Patient, ApiError> {
        self.send_json(Method::POST, "/patient/register", registration)
    }

    fn list_today_patients(&self, doctor_id: &str) -> Result<Vec<Patient>, ApiError> {
        self.fetch(&format!("/patient/today/{doctor_id}"))
    }

    fn save_prescription(
        &self,
        patient_id: &str,
        prescription: &Prescription,
    ) -> Result<Patient, ApiError> {
        self.send_json(
            Method::PUT,
            &format!("/prescription/{patient_id}"),
            prescription,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Serve exactly one request with a canned response; hand back the raw request.
    fn one_shot_server(status_line: &'static str, body: &'static str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
                if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = v.trim().parse().unwrap_or(0);
                }
                head.push_str(&line);
            }
            let mut req_body = vec![0u8; content_length];
            reader.read_exact(&mut req_body).unwrap();
            head.push_str("\r\n");
            head.push_str(&String::from_utf8_lossy(&req_body));
            tx.send(head).unwrap();

            let mut stream = stream;
            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
        });

        (format!("http://{addr}/api"), rx)
    }

    fn test_client(base_url: &str) -> HttpOpdClient {
        let client = Client::builder().no_proxy().build().unwrap();
        HttpOpdClient::with_client(base_url, client, 5)
    }

    #[test]
    fn constructor_trims_trailing_slash() {
        let client = test_client("http://localhost:5000/api/");
        assert_eq!(client.base_url(), "http://localhost:5000/api");
    }

    #[test]
    fn requests_carry_bearer_credential() {
        let (url, rx) = one_shot_server("HTTP/1.1 200 OK", r#"{"success":true,"data":[]}"#);
        let client = test_client(&url);
        client.set_bearer(Some(&BearerToken::new("tok-abc")));

        let users = client.list_users().unwrap();
        assert!(users.is_empty());

        let request = rx.recv().unwrap();
        assert!(request.starts_with("GET /api/admin/users"));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer tok-abc"));
    }

    #[test]
    fn requests_without_session_have_no_authorization() {
        let (url, rx) = one_shot_server("HTTP/1.1 200 OK", r#"{"success":true,"data":[]}"#);
        let client = test_client(&url);

        client.list_doctors().unwrap();

        let request = rx.recv().unwrap();
        assert!(request.starts_with("GET /api/doctor"));
        assert!(!request.to_ascii_lowercase().contains("authorization:"));
    }

    #[test]
    fn login_posts_credentials_and_role() {
        let (url, rx) = one_shot_server(
            "HTTP/1.1 200 OK",
            r#"{"success":true,"token":"t-1","user":{"id":"u1","fullName":"Dr. Asha","email":"a@t.com","role":"doctor"}}"#,
        );
        let client = test_client(&url);

        let login = client.login("a@t.com", "pw", Role::Doctor).unwrap();
        assert_eq!(login.token, "t-1");
        assert_eq!(login.user.full_name, "Dr. Asha");

        let request = rx.recv().unwrap();
        assert!(request.starts_with("POST /api/auth/login"));
        assert!(request.contains(r#""role":"doctor""#));
    }

    #[test]
    fn non_success_status_surfaces_server_message() {
        let (url, _rx) = one_shot_server(
            "HTTP/1.1 400 Bad Request",
            r#"{"success":false,"message":"Email already exists"}"#,
        );
        let client = test_client(&url);

        let err = client.delete_user("u9").unwrap_err();
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message.as_deref(), Some("Email already exists"));
            }
            other => panic!("Expected Status, got: {other}"),
        }
    }

    #[test]
    fn undecodable_body_is_decode_error() {
        let (url, _rx) = one_shot_server("HTTP/1.1 200 OK", r#"{"success":true,"data":{"oops":1}}"#);
        let client = test_client(&url);
        assert!(matches!(client.list_patients(), Err(ApiError::Decode(_))));
    }

    #[test]
    fn unreachable_server_is_connection_error() {
        // Bind then drop to obtain a port with nothing listening.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = test_client(&format!("http://127.0.0.1:{port}/api"));
        assert!(matches!(client.list_users(), Err(ApiError::Connection(_))));
    }
}

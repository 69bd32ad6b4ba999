//! API client for communicating with the HydroGrow REST API.
//!
//! This module provides the `ApiClient` struct for the authentication
//! endpoints and the authenticated profile/items reads.

use std::time::Duration;

use reqwest::{header, Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::models::{AccountProfile, ItemsResponse, RegisterConfirmation, UserProfile};

use super::{ApiError, Gateway};

const LOGIN_PATH: &str = "/api/login";
const REGISTER_PATH: &str = "/api/register";
const PROFILE_PATH: &str = "/api/me";
const ITEMS_PATH: &str = "/api/items";

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    pub user: UserProfile,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
    fullname: Option<&'a str>,
}

/// API client for the HydroGrow backend.
/// Clone is cheap - reqwest::Client and Gateway are both Arc-backed.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    gateway: Gateway,
}

impl ApiClient {
    /// Create a client that attaches whatever credential `gateway` holds
    pub fn new(config: &Config, gateway: Gateway) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            gateway,
        })
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = self.gateway.current_credential() {
            let mut value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::MalformedToken)?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), body = %ApiError::truncate_body(&body), "Request failed");
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, path: &str) -> Result<T, ApiError> {
        debug!(path = path, "Sending request");
        let response = request.send().await?;
        let response = Self::check_response(response).await?;
        // Headers arrived, so a failure here is a broken response rather than no response
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to read body from {}: {}", path, e)))?;
        serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("{} from {}", e, path)))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.client.get(self.url(path)).headers(self.auth_headers()?);
        self.send_json(request, path).await
    }

    // ===== Authentication =====

    /// Exchange email/password for a token and profile.
    /// Does not touch the gateway; the session manager owns that.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let request = self
            .client
            .post(self.url(LOGIN_PATH))
            .json(&LoginRequest { email, password });
        self.send_json(request, LOGIN_PATH).await
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        fullname: Option<&str>,
    ) -> Result<RegisterConfirmation, ApiError> {
        let request = self.client.post(self.url(REGISTER_PATH)).json(&RegisterRequest {
            email,
            password,
            fullname,
        });
        self.send_json(request, REGISTER_PATH).await
    }

    // ===== Authenticated reads =====

    pub async fn fetch_profile(&self) -> Result<AccountProfile, ApiError> {
        self.get(PROFILE_PATH).await
    }

    pub async fn fetch_items(&self) -> Result<ItemsResponse, ApiError> {
        self.get(ITEMS_PATH).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard) -> ApiClient {
        ApiClient::new(&Config::with_base_url(server.url()), Gateway::new())
            .expect("Failed to build client")
    }

    #[test]
    fn test_parse_login_response() {
        let json = r#"{"access_token":"eyJ.abc","token_type":"bearer","user":{"email":"farmer@example.com","fullname":"Demo Farmer"}}"#;
        let resp: LoginResponse = serde_json::from_str(json).expect("Failed to parse login JSON");
        assert_eq!(resp.access_token, "eyJ.abc");
        assert_eq!(resp.token_type, "bearer");
        assert_eq!(resp.user.fullname, "Demo Farmer");
    }

    #[tokio::test]
    async fn test_login_posts_credentials() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/login")
            .match_body(Matcher::Json(serde_json::json!({
                "email": "farmer@example.com",
                "password": "password123"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"tok","token_type":"bearer","user":{"email":"farmer@example.com","fullname":"Demo Farmer"}}"#)
            .create_async()
            .await;

        let resp = client_for(&server)
            .login("farmer@example.com", "password123")
            .await
            .expect("login should succeed");

        mock.assert_async().await;
        assert_eq!(resp.access_token, "tok");
    }

    #[tokio::test]
    async fn test_register_sends_fullname() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/register")
            .match_body(Matcher::PartialJson(serde_json::json!({ "fullname": "Ada" })))
            .with_status(200)
            .with_body(r#"{"message":"User registered successfully","email":"ada@example.com"}"#)
            .create_async()
            .await;

        let confirmation = client_for(&server)
            .register("ada@example.com", "secret1", Some("Ada"))
            .await
            .expect("register should succeed");

        mock.assert_async().await;
        assert_eq!(confirmation.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_authenticated_read_attaches_bearer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/items")
            .match_header("authorization", "Bearer tok-123")
            .with_status(200)
            .with_body(r#"{"items":[{"id":2,"name":"Basil Plant","status":"healthy","ph":6.2}],"user":"farmer@example.com"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        client.gateway().set_credential(Some("tok-123".to_string()));

        let items = client.fetch_items().await.expect("items should load");
        mock.assert_async().await;
        assert_eq!(items.items[0].name, "Basil Plant");
    }

    #[tokio::test]
    async fn test_read_without_credential_sends_no_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/me")
            .match_header("authorization", Matcher::Missing)
            .with_status(401)
            .with_body(r#"{"detail":"Not authenticated"}"#)
            .create_async()
            .await;

        let err = client_for(&server).fetch_profile().await.expect_err("should be unauthorized");
        mock.assert_async().await;
        assert!(err.is_unauthorized());
        assert_eq!(err.detail(), Some("Not authenticated"));
    }

    #[tokio::test]
    async fn test_unparseable_success_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/me")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let err = client_for(&server).fetch_profile().await.expect_err("should fail to parse");
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_malformed_token_is_rejected_locally() {
        let server = mockito::Server::new_async().await;
        let client = client_for(&server);
        client.gateway().set_credential(Some("bad\ntoken".to_string()));

        let err = client.fetch_items().await.expect_err("header should be rejected");
        assert!(matches!(err, ApiError::MalformedToken));
    }

    #[tokio::test]
    async fn test_truncated_success_body_is_invalid_response() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // Promises more body than it sends, then hangs up
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let url = format!("http://{}", listener.local_addr().expect("addr"));
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 200\r\n\r\n{\"email\":")
                    .await;
            }
        });

        let client = ApiClient::new(&Config::with_base_url(url), Gateway::new()).expect("client");
        let err = client.fetch_profile().await.expect_err("body should be incomplete");
        assert!(matches!(err, ApiError::InvalidResponse(_)), "got {:?}", err);
        assert!(!err.is_connectivity());
    }
}

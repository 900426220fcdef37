// ABOUTME: Async HTTP client for the profiMaktab API
// ABOUTME: Single-flight login, one re-login on 401, fail-fast errors

use crate::auth::{Credential, Credentials};
use crate::model::{Profile, RawLessonEntry, StudentContacts};
use crate::util::{iso_date, today, truncate_str};
use crate::{Error, Result};
use chrono::NaiveDate;
use rand::Rng;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.profimaktab.uz/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const TOKEN_ENDPOINT: &str = "/token/";

pub struct ApiClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
    timeout: Duration,
    credential: RwLock<Credential>,
    // Held only while a login is in flight
    login_lock: Mutex<()>,
    throttle_min: u64,
    throttle_max: u64,
}

impl ApiClient {
    pub fn new(credentials: Credentials, base_url: Option<String>) -> Result<Self> {
        let client = Client::builder().user_agent("maktab/0.1 (Rust)").build()?;
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.into());

        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            timeout: DEFAULT_TIMEOUT,
            credential: RwLock::new(Credential::Absent),
            login_lock: Mutex::new(()),
            throttle_min: 100,
            throttle_max: 300,
        })
    }

    /// Total time allowed for each HTTP call, login included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_throttle(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.throttle_min = min_ms;
        self.throttle_max = max_ms;
        self
    }

    pub fn disable_throttle(mut self) -> Self {
        self.throttle_min = 0;
        self.throttle_max = 0;
        self
    }

    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    pub async fn is_authenticated(&self) -> bool {
        self.credential.read().await.is_valid()
    }

    async fn throttle(&self) {
        if self.throttle_max > 0 {
            let sleep_ms = rand::thread_rng().gen_range(self.throttle_min..=self.throttle_max);
            tokio::time::sleep(Duration::from_millis(sleep_ms)).await;
        }
    }

    async fn current_token(&self) -> Option<String> {
        self.credential.read().await.token().map(str::to_owned)
    }

    /// Return a usable bearer token, logging in first if there is none.
    ///
    /// Concurrent callers share one login: whoever takes the lock first
    /// performs it, the rest find the token already set once they get in.
    pub async fn ensure_authenticated(&self) -> Result<String> {
        if let Some(token) = self.current_token().await {
            return Ok(token);
        }

        let _guard = self.login_lock.lock().await;
        if let Some(token) = self.current_token().await {
            return Ok(token);
        }

        self.login().await
    }

    async fn login(&self) -> Result<String> {
        #[derive(serde::Deserialize)]
        struct TokenResponse {
            #[serde(default)]
            access: Option<String>,
        }

        let url = format!("{}{}", self.base_url, TOKEN_ENDPOINT);
        debug!(username = %self.credentials.username, "logging in");

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("Accept", "application/json")
            .json(&json!({
                "username": self.credentials.username,
                "password": self.credentials.password,
            }))
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            error!(
                status = status.as_u16(),
                body = %truncate_str(&body, 200),
                "login failed"
            );
            return Err(Error::Auth(format!(
                "login rejected with status {}",
                status.as_u16()
            )));
        }

        let body = response.text().await?;
        let token = serde_json::from_str::<TokenResponse>(&body)
            .ok()
            .and_then(|r| r.access)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                error!("access token missing in login response");
                Error::Auth("access token missing in login response".into())
            })?;

        *self.credential.write().await = Credential::Valid(token.clone());
        info!(username = %self.credentials.username, "login successful");
        Ok(token)
    }

    /// Authenticated call against `base_url + path`, decoded from JSON.
    ///
    /// A 401 drops the token, logs in again and repeats the call once. A
    /// second 401, or any other status >= 400, is returned as `Error::Api`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut token = self.ensure_authenticated().await?;
        let mut retried = false;

        loop {
            let mut request = self
                .client
                .request(method.clone(), &url)
                .bearer_auth(&token)
                .header("Accept", "application/json")
                .timeout(self.timeout);
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;
            self.throttle().await;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED && !retried {
                debug!(path, "401 received, re-authenticating");
                self.credential.write().await.invalidate(&token);
                token = self.ensure_authenticated().await?;
                retried = true;
                continue;
            }

            if status.is_client_error() || status.is_server_error() {
                let message = response.text().await.unwrap_or_default();
                let preview = truncate_str(&message, 100);
                error!(status = status.as_u16(), path, body = %preview, "API error");
                return Err(Error::Api {
                    endpoint: path.into(),
                    status: status.as_u16(),
                    message: preview,
                });
            }

            let text = response.text().await?;
            return serde_json::from_str(&text).map_err(|e| {
                warn!(
                    path,
                    error = %e,
                    body = %truncate_str(&text, 500),
                    "failed to parse response"
                );
                Error::Parse(e)
            });
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        self.request(Method::GET, path, query, None).await
    }

    pub async fn get_profile(&self) -> Result<Profile> {
        self.get("/profile/", &[]).await
    }

    pub async fn get_student_contacts(&self, contact_id: u64) -> Result<StudentContacts> {
        self.get(&format!("/student_contacts/{}/", contact_id), &[])
            .await
    }

    pub async fn get_student(&self, student_id: u64) -> Result<serde_json::Value> {
        self.get(&format!("/student_students/{}", student_id), &[])
            .await
    }

    /// Lessons for one student on one day (today when `for_date` is None).
    pub async fn get_diary(
        &self,
        student_id: u64,
        for_date: Option<NaiveDate>,
    ) -> Result<Vec<RawLessonEntry>> {
        let for_date = for_date.unwrap_or_else(today);
        let query = [
            ("for_date", iso_date(for_date)),
            ("student", student_id.to_string()),
        ];
        self.get("/dairy/", &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials::new("parent", "secret")
    }

    #[test]
    fn test_api_client_new() {
        let client = ApiClient::new(creds(), None).unwrap();
        assert_eq!(client.base_url, "https://api.profimaktab.uz/api");
        assert_eq!(client.timeout, Duration::from_secs(30));
        assert_eq!(client.username(), "parent");
    }

    #[test]
    fn test_api_client_custom_base_trims_slash() {
        let client = ApiClient::new(creds(), Some("https://custom.api/".into())).unwrap();
        assert_eq!(client.base_url, "https://custom.api");
    }

    #[test]
    fn test_api_client_throttle_config() {
        let client = ApiClient::new(creds(), None).unwrap().with_throttle(50, 150);
        assert_eq!(client.throttle_min, 50);
        assert_eq!(client.throttle_max, 150);

        let client = client.disable_throttle();
        assert_eq!(client.throttle_min, 0);
        assert_eq!(client.throttle_max, 0);
    }

    #[test]
    fn test_api_client_timeout_config() {
        let client = ApiClient::new(creds(), None)
            .unwrap()
            .with_timeout(Duration::from_secs(5));
        assert_eq!(client.timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_new_client_is_unauthenticated() {
        let client = ApiClient::new(creds(), None).unwrap();
        assert!(!client.is_authenticated().await);
    }
}

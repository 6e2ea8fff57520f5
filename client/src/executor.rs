//! The request executor: one authenticated round-trip per call.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use url::Url;

use crate::error::ApiError;
use crate::loading::{CallGuard, LoadingTracker};
use crate::payload::ResponsePayload;
use crate::{CONNECT_TIMEOUT_SECS, CSRF_COOKIE, CSRF_ENDPOINT, CSRF_HEADER};

/// Executes authenticated requests against the service origin.
///
/// Owns no domain data, only the transient per-call bookkeeping and the
/// session's cached CSRF token. Clones share the loading tracker, the CSRF
/// cache, and the cookie jar, so every model in a session drives one busy
/// signal and one credential set.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    tracker: LoadingTracker,
    csrf: Arc<Mutex<Option<String>>>,
    jar: Arc<Jar>,
}

impl ApiClient {
    /// Build a client against a service origin, e.g. `https://host/`.
    ///
    /// The tracker is passed in rather than reached for globally so tests
    /// can instantiate isolated instances.
    pub fn new(base_url: Url, tracker: LoadingTracker) -> Result<Self, ApiError> {
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .cookie_provider(Arc::clone(&jar))
            .build()?;

        Ok(Self {
            http,
            base_url,
            tracker,
            csrf: Arc::new(Mutex::new(None)),
            jar,
        })
    }

    #[must_use]
    pub fn tracker(&self) -> &LoadingTracker {
        &self.tracker
    }

    /// Perform one round-trip and classify the result.
    ///
    /// The call is registered with the loading tracker before anything
    /// else and released exactly once on every exit path. Non-GET methods
    /// resolve the CSRF token first and carry it alongside the fixed
    /// `Accept`/`Content-Type` headers; GET never does, which is what lets
    /// the token bootstrap ride through this same path without recursing.
    ///
    /// HTTP 5xx raises [`ApiError::Server`] with the body's `detail`
    /// message when present, 403 raises [`ApiError::Authentication`], and
    /// everything else returns the normalized payload for the caller to
    /// inspect.
    pub async fn fetch(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<ResponsePayload, ApiError> {
        let guard = CallGuard::register(&self.tracker);

        let csrf = if method == Method::GET {
            None
        } else {
            Some(self.csrf_token().await?)
        };

        let payload = self
            .dispatch(guard, method, endpoint, csrf.as_deref(), body)
            .await?;

        classify(payload)
    }

    /// `fetch` specialized to a plain read.
    pub async fn get(&self, endpoint: &str) -> Result<ResponsePayload, ApiError> {
        self.fetch(Method::GET, endpoint, None).await
    }

    /// Persist a record: PATCH when updating, POST when creating.
    ///
    /// Succeeds only on 200/201; any other status that survives
    /// classification is a [`ApiError::Validation`] with the same `detail`
    /// extraction as server errors.
    pub async fn save(
        &self,
        endpoint: &str,
        payload: &Value,
        is_update: bool,
    ) -> Result<ResponsePayload, ApiError> {
        let method = if is_update { Method::PATCH } else { Method::POST };
        let response = self.fetch(method, endpoint, Some(payload)).await?;

        match response.status {
            StatusCode::OK | StatusCode::CREATED => Ok(response),
            _ => Err(ApiError::Validation(response.detail_or_unknown())),
        }
    }

    /// Remove a record. Succeeds only on 204.
    pub async fn delete(&self, endpoint: &str) -> Result<ResponsePayload, ApiError> {
        let response = self.fetch(Method::DELETE, endpoint, None).await?;

        match response.status {
            StatusCode::NO_CONTENT => Ok(response),
            _ => Err(ApiError::Validation(response.detail_or_unknown())),
        }
    }

    /// Resolve the CSRF token: session cache, then cookie jar, then a
    /// dedicated bootstrap round-trip.
    ///
    /// Concurrent first calls may each bootstrap independently; they
    /// converge on the same cached value, so no coalescing is attempted.
    async fn csrf_token(&self) -> Result<String, ApiError> {
        if let Some(token) = self.cached_csrf() {
            return Ok(token);
        }

        if let Some(token) = self.cookie_csrf() {
            self.cache_csrf(&token);
            return Ok(token);
        }

        tracing::debug!(endpoint = CSRF_ENDPOINT, "bootstrapping csrf token");
        let guard = CallGuard::register(&self.tracker);
        let payload = self
            .dispatch(guard, Method::GET, CSRF_ENDPOINT, None, None)
            .await?;
        let payload = classify(payload)?;

        let token = payload
            .csrf_token()
            .map(str::to_string)
            .ok_or_else(|| ApiError::Server("csrf bootstrap returned no token".to_string()))?;
        self.cache_csrf(&token);

        Ok(token)
    }

    /// Issue the request and normalize the response.
    ///
    /// Takes ownership of the call guard so the tracker is released here
    /// exactly once, whether the transport fails, the body read fails, or
    /// the payload goes on to fail classification in the caller.
    async fn dispatch(
        &self,
        guard: CallGuard,
        method: Method,
        endpoint: &str,
        csrf: Option<&str>,
        body: Option<&Value>,
    ) -> Result<ResponsePayload, ApiError> {
        let url = self.base_url.join(endpoint)?;
        tracing::debug!(method = %method, endpoint = %endpoint, "dispatching request");

        let mut request = self.http.request(method, url);

        if let Some(token) = csrf {
            request = request
                .header(ACCEPT, "application/json")
                .header(CONTENT_TYPE, "application/json")
                .header(CSRF_HEADER, token);
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        drop(guard);

        Ok(ResponsePayload::from_body(status, body))
    }

    fn cached_csrf(&self) -> Option<String> {
        self.lock_csrf().clone()
    }

    fn cache_csrf(&self, token: &str) {
        if !token.is_empty() {
            *self.lock_csrf() = Some(token.to_string());
        }
    }

    /// Look for a previously issued token in the cookie jar.
    fn cookie_csrf(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base_url)?;
        let raw = header.to_str().ok()?;

        raw.split("; ")
            .filter_map(|pair| pair.split_once('='))
            .find(|(name, value)| *name == CSRF_COOKIE && !value.is_empty())
            .map(|(_, value)| value.to_string())
    }

    fn lock_csrf(&self) -> MutexGuard<'_, Option<String>> {
        self.csrf.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn classify(payload: ResponsePayload) -> Result<ResponsePayload, ApiError> {
    if payload.status.is_server_error() {
        tracing::warn!(status = %payload.status, "server error");
        return Err(ApiError::Server(payload.detail_or_unknown()));
    }

    if payload.status == StatusCode::FORBIDDEN {
        tracing::warn!("request forbidden, session likely expired");
        return Err(ApiError::Authentication);
    }

    Ok(payload)
}


#[cfg(test)]
mod integration_tests {
    use super::ApiClient;
    use crate::error::ApiError;
    use crate::loading::LoadingTracker;
    use crate::payload::PayloadData;
    use crate::{CSRF_HEADER, RUNS_ENDPOINT};
    use reqwest::{Method, StatusCode};
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        let base = Url::parse(&server.uri()).expect("mock server uri");
        ApiClient::new(base, LoadingTracker::new()).expect("client must build")
    }

    async fn mount_csrf(server: &MockServer, token: &str, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path("/api/auth/csrf"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn get_returns_normalized_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/runs/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let payload = client.get(RUNS_ENDPOINT).await.expect("get should succeed");

        assert_eq!(payload.status, StatusCode::OK);
        assert_eq!(payload.data, PayloadData::Json(json!({"data": []})));
        assert!(!client.tracker().is_loading());
    }

    #[tokio::test]
    async fn get_never_sends_the_csrf_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/runs/"))
            .respond_with(|req: &wiremock::Request| {
                assert!(
                    req.headers.get(CSRF_HEADER).is_none(),
                    "GET must not carry a CSRF header"
                );
                ResponseTemplate::new(200).set_body_json(json!({"data": []}))
            })
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.get(RUNS_ENDPOINT).await.expect("get should succeed");
    }

    #[tokio::test]
    async fn non_get_bootstraps_then_caches_the_csrf_token() {
        let server = MockServer::start().await;
        mount_csrf(&server, "tok-123", 1).await;
        Mock::given(method("POST"))
            .and(path("/api/runs/"))
            .and(header(CSRF_HEADER, "tok-123"))
            .and(header("accept", "application/json"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let body = json!({"distance_m": 5000.0});

        client
            .save(RUNS_ENDPOINT, &body, false)
            .await
            .expect("first save should succeed");

        // Second call reuses the cached token: the bootstrap mock allows
        // exactly one hit.
        client
            .save(RUNS_ENDPOINT, &body, false)
            .await
            .expect("second save should succeed");

        assert!(!client.tracker().is_loading());
    }

    #[tokio::test]
    async fn cookie_token_short_circuits_the_bootstrap() {
        let server = MockServer::start().await;
        mount_csrf(&server, "never-used", 0).await;
        Mock::given(method("GET"))
            .and(path("/api/runs/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": []}))
                    .insert_header("set-cookie", "csrftoken=cookie-tok; Path=/"),
            )
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/runs/3"))
            .and(header(CSRF_HEADER, "cookie-tok"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.get(RUNS_ENDPOINT).await.expect("get should succeed");
        client
            .delete("api/runs/3")
            .await
            .expect("delete should use the cookie token");
    }

    #[tokio::test]
    async fn forbidden_raises_authentication_and_releases_the_tracker() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/runs/"))
            .respond_with(ResponseTemplate::new(403).set_body_json("CSRF token missing"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.get(RUNS_ENDPOINT).await;

        assert!(matches!(result, Err(ApiError::Authentication)));
        assert!(!client.tracker().is_loading());
    }

    #[tokio::test]
    async fn server_error_carries_the_detail_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/runs/"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"detail": "database gone"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        match client.get(RUNS_ENDPOINT).await {
            Err(ApiError::Server(message)) => assert_eq!(message, "database gone"),
            other => panic!("expected Server error, got {other:?}"),
        }
        assert!(!client.tracker().is_loading());
    }

    #[tokio::test]
    async fn non_json_body_survives_as_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/runs/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy page</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let payload = client.get(RUNS_ENDPOINT).await.expect("200 is a success");
        assert_eq!(
            payload.data,
            PayloadData::Text("<html>proxy page</html>".to_string())
        );
    }

    #[tokio::test]
    async fn transport_failure_still_releases_the_tracker() {
        // Grab a port the OS just released so the connection is refused.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("local addr").port()
        };

        let base = Url::parse(&format!("http://127.0.0.1:{port}/")).expect("url");
        let tracker = LoadingTracker::new();
        let client = ApiClient::new(base, tracker.clone()).expect("client must build");

        let result = client.get(RUNS_ENDPOINT).await;
        assert!(matches!(result, Err(ApiError::Network(_))));
        assert!(!tracker.is_loading());
    }

    #[tokio::test]
    async fn save_rejects_statuses_outside_its_success_set() {
        let server = MockServer::start().await;
        mount_csrf(&server, "tok-123", 1).await;
        Mock::given(method("PATCH"))
            .and(path("/api/runs/"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(json!({"detail": "distance must be positive"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        match client.save(RUNS_ENDPOINT, &json!({"id": 1}), true).await {
            Err(ApiError::Validation(message)) => {
                assert_eq!(message, "distance must be positive");
            }
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_requires_204() {
        let server = MockServer::start().await;
        mount_csrf(&server, "tok-123", 1).await;
        Mock::given(method("DELETE"))
            .and(path("/api/runs/9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"deleted": true})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        match client.delete("api/runs/9").await {
            Err(ApiError::Validation(message)) => assert_eq!(message, "unknown error"),
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_csrf_bootstrap_is_a_server_error() {
        let server = MockServer::start().await;
        mount_csrf(&server, "", 1).await;

        let client = client_for(&server);
        let result = client
            .fetch(Method::POST, RUNS_ENDPOINT, Some(&json!({})))
            .await;

        match result {
            Err(ApiError::Server(message)) => {
                assert_eq!(message, "csrf bootstrap returned no token");
            }
            other => panic!("expected Server error, got {other:?}"),
        }
        assert!(!client.tracker().is_loading());
    }
}

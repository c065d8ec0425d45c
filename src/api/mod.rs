//! HTTP client for the platform API. Gated requests carry the bearer token
//! and route 401/403 through the session authority; everything else is
//! returned to the caller untouched for its own status handling.

pub mod auth;
pub mod lessons;
pub mod types;

use crate::session::{AuthError, SessionAuthority};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info_span, Instrument};
use url::Url;

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

pub(crate) const MSG_NETWORK: &str = "خطأ في الاتصال. تحقق من اتصالك بالإنترنت";

pub struct ApiClient {
    base_url: String,
    http: Client,
    session: SessionAuthority,
}

impl ApiClient {
    /// # Errors
    /// Returns an error if `base_url` cannot be parsed, has no host, or uses
    /// an unsupported scheme, or if the HTTP client cannot be built.
    pub fn new(base_url: &str, session: SessionAuthority) -> Result<Self, AuthError> {
        let parsed = Url::parse(base_url)
            .map_err(|err| AuthError::Validation(format!("invalid API base URL: {err}")))?;

        match parsed.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(AuthError::Validation(format!(
                    "invalid API base URL: unsupported scheme {scheme}"
                )))
            }
        }
        if parsed.host().is_none() {
            return Err(AuthError::Validation(
                "invalid API base URL: no host specified".to_string(),
            ));
        }

        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .map_err(|err| AuthError::Network(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            session,
        })
    }

    #[must_use]
    pub fn session(&self) -> &SessionAuthority {
        &self.session
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Gated request, strict variant: a missing token fails immediately with
    /// [`AuthError::Unauthenticated`] and never reaches the network.
    ///
    /// The mandatory JSON content type and `Authorization` headers always win
    /// over caller-supplied headers; callers may add headers but not unset
    /// these two. A 401 clears the session and redirects before this call
    /// resolves to [`AuthError::SessionExpired`]; a 403 carrying
    /// `requiresVerification` resolves to [`AuthError::VerificationRequired`]
    /// with the session left intact.
    ///
    /// # Errors
    /// See the taxonomy on [`AuthError`].
    pub async fn authorized_request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        headers: &[(String, String)],
    ) -> Result<Response, AuthError> {
        let Some(token) = self.session.token() else {
            return Err(AuthError::Unauthenticated);
        };
        self.send_gated(method, path, body, headers, &token).await
    }

    /// Gated request, soft variant: auth failures (missing token, expired
    /// session, unverified account) are handled centrally and resolve to
    /// `Ok(None)` so the caller can simply skip rendering.
    ///
    /// # Errors
    /// Only for non-auth failures: transport errors and invalid input.
    pub async fn authorized_request_soft(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        headers: &[(String, String)],
    ) -> Result<Option<Response>, AuthError> {
        let Some(token) = self.session.token() else {
            self.session
                .handle_auth_failure(crate::session::authority::MSG_MISSING_TOKEN);
            return Ok(None);
        };

        match self.send_gated(method, path, body, headers, &token).await {
            Ok(response) => Ok(Some(response)),
            Err(AuthError::SessionExpired | AuthError::VerificationRequired { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn send_gated(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        headers: &[(String, String)],
        token: &SecretString,
    ) -> Result<Response, AuthError> {
        let url = self.endpoint(path);

        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| AuthError::Validation(format!("invalid header name: {name}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| AuthError::Validation(format!("invalid header value for {name}")))?;
            header_map.insert(name, value);
        }
        // Mandatory headers take precedence on conflict.
        header_map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = format!("Bearer {}", token.expose_secret());
        header_map.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer)
                .map_err(|_| AuthError::Validation("token is not header-safe".to_string()))?,
        );

        let mut request = self.http.request(method.clone(), &url).headers(header_map);
        if let Some(body) = body {
            request = request.json(body);
        }

        let span = info_span!(
            "api.request",
            http.method = %method,
            url = %url
        );
        let response = request.send().instrument(span).await.map_err(|err| {
            error!("request to {url} failed: {err}");
            self.session
                .notify(MSG_NETWORK, crate::session::Severity::Error);
            AuthError::Network(MSG_NETWORK.to_string())
        })?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("401 from {url}, ending session");
            self.session.handle_session_expired();
            return Err(AuthError::SessionExpired);
        }

        if response.status() == StatusCode::FORBIDDEN {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            if body.get("requiresVerification").and_then(Value::as_bool) == Some(true) {
                let email = self.session.user().and_then(|user| user.email);
                self.session.handle_verification_required(email.as_deref());
                return Err(AuthError::VerificationRequired { email });
            }
            // The body was consumed to check the flag, so a plain 403
            // surfaces as a structured rejection instead of a raw response.
            return Err(AuthError::Rejected {
                status: StatusCode::FORBIDDEN.as_u16(),
                message: server_message(&body),
            });
        }

        Ok(response)
    }

    pub(crate) async fn post_public<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, AuthError> {
        let url = self.endpoint(path);
        let span = info_span!(
            "api.request",
            http.method = "POST",
            url = %url
        );
        self.http
            .post(&url)
            .json(body)
            .send()
            .instrument(span)
            .await
            .map_err(|err| {
                error!("request to {url} failed: {err}");
                AuthError::Network(MSG_NETWORK.to_string())
            })
    }

    pub(crate) async fn post_with_bearer<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        bearer: &SecretString,
    ) -> Result<Response, AuthError> {
        let url = self.endpoint(path);
        let span = info_span!(
            "api.request",
            http.method = "POST",
            url = %url
        );
        self.http
            .post(&url)
            .bearer_auth(bearer.expose_secret())
            .json(body)
            .send()
            .instrument(span)
            .await
            .map_err(|err| {
                error!("request to {url} failed: {err}");
                AuthError::Network(MSG_NETWORK.to_string())
            })
    }
}

/// Pull the server's failure message out of a `{message}` or
/// `{errors:[{msg}]}` payload.
pub(crate) fn server_message(body: &Value) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .or_else(|| {
            body.get("errors")
                .and_then(|errors| errors.get(0))
                .and_then(|entry| entry.get("msg"))
                .and_then(Value::as_str)
        })
        .unwrap_or("فشل الطلب")
        .to_string()
}

/// Decode a response: 2xx bodies parse into `T`, anything else becomes a
/// structured rejection with the server's message.
pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AuthError> {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if status.is_success() {
        serde_json::from_value(body).map_err(|err| {
            error!("unreadable {status} response: {err}");
            AuthError::Rejected {
                status: status.as_u16(),
                message: "تعذر قراءة استجابة الخادم".to_string(),
            }
        })
    } else {
        Err(AuthError::Rejected {
            status: status.as_u16(),
            message: server_message(&body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemoryStore, Navigator, Notifier, SessionAuthority, Severity, User};
    use anyhow::{anyhow, Result};
    use serde_json::json;
    use std::net::TcpListener;
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    #[derive(Clone, Default)]
    struct Recorder {
        notices: Arc<Mutex<Vec<(String, Severity)>>>,
        redirects: Arc<Mutex<u32>>,
    }

    impl Notifier for Recorder {
        fn notify(&self, message: &str, severity: Severity) {
            self.notices
                .lock()
                .expect("notices lock")
                .push((message.to_string(), severity));
        }
    }

    impl Navigator for Recorder {
        fn redirect_to_entry_point(&self) {
            *self.redirects.lock().expect("redirects lock") += 1;
        }

        fn refresh(&self) {}
    }

    fn client(base_url: &str) -> Result<(ApiClient, Recorder)> {
        let recorder = Recorder::default();
        let session = SessionAuthority::new(
            Box::new(MemoryStore::new()),
            Box::new(recorder.clone()),
            Box::new(recorder.clone()),
            crate::session::DEFAULT_AVATAR,
        );
        let client = ApiClient::new(base_url, session).map_err(|err| anyhow!("{err}"))?;
        Ok((client, recorder))
    }

    fn student() -> User {
        User {
            id: Some("u-1".to_string()),
            name: Some("Ali Hassan".to_string()),
            email: Some("ali@example.com".to_string()),
            role: Some("student".to_string()),
            grade: Some("g2".to_string()),
            ..User::default()
        }
    }

    #[test]
    fn new_rejects_bad_base_urls() -> Result<()> {
        let session = SessionAuthority::with_defaults(Box::new(MemoryStore::new()));
        let err = ApiClient::new("ftp://example.com", session)
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;
        assert!(err.to_string().contains("unsupported scheme"));
        Ok(())
    }

    #[tokio::test]
    async fn strict_variant_fails_without_token_before_any_network() -> Result<()> {
        let (client, recorder) = client("http://127.0.0.1:9/api")?;
        let result = client
            .authorized_request(Method::GET, "/lessons", None, &[])
            .await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
        // Strict variant reports to the caller only; no central handling.
        assert!(recorder.notices.lock().expect("lock").is_empty());
        assert_eq!(*recorder.redirects.lock().expect("lock"), 0);
        Ok(())
    }

    #[tokio::test]
    async fn soft_variant_recovers_without_token() -> Result<()> {
        let (client, recorder) = client("http://127.0.0.1:9/api")?;
        let result = client
            .authorized_request_soft(Method::GET, "/lessons", None, &[])
            .await?;
        assert!(result.is_none());
        assert_eq!(recorder.notices.lock().expect("lock").len(), 1);
        assert_eq!(*recorder.redirects.lock().expect("lock"), 1);
        Ok(())
    }

    #[tokio::test]
    async fn mandatory_headers_win_over_caller_headers() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/lessons"))
            .and(header("authorization", "Bearer tok-1"))
            .and(header("content-type", "application/json"))
            .and(header("x-requested-page", "lessons"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"lessons": []})))
            .mount(&server)
            .await;

        let (client, _) = client(&server.uri())?;
        client.session().start_session("tok-1", student())?;

        let response = client
            .authorized_request(
                Method::GET,
                "/lessons",
                None,
                &[
                    ("Authorization".to_string(), "Bearer forged".to_string()),
                    ("Content-Type".to_string(), "text/plain".to_string()),
                    ("X-Requested-Page".to_string(), "lessons".to_string()),
                ],
            )
            .await?;
        assert_eq!(response.status(), 200);
        Ok(())
    }

    #[tokio::test]
    async fn unauthorized_response_ends_session_and_redirects_once() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/lessons"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "message": "token expired"
            })))
            .mount(&server)
            .await;

        let (client, recorder) = client(&server.uri())?;
        client.session().start_session("tok-1", student())?;

        let result = client
            .authorized_request(Method::GET, "/lessons", None, &[])
            .await;
        assert!(matches!(result, Err(AuthError::SessionExpired)));
        assert!(!client.session().is_active());
        assert!(client.session().token().is_none());
        assert_eq!(*recorder.redirects.lock().expect("lock"), 1);

        let notices = recorder.notices.lock().expect("lock").clone();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].1, Severity::Error);
        Ok(())
    }

    #[tokio::test]
    async fn verification_required_flags_without_clearing() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/lessons"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "requiresVerification": true
            })))
            .mount(&server)
            .await;

        let (client, recorder) = client(&server.uri())?;
        client.session().start_session("tok-1", student())?;

        let result = client
            .authorized_request(Method::POST, "/lessons", Some(&json!({})), &[])
            .await;
        match result {
            Err(AuthError::VerificationRequired { email }) => {
                assert_eq!(email.as_deref(), Some("ali@example.com"));
            }
            other => return Err(anyhow!("unexpected result: {other:?}")),
        }
        assert!(client.session().is_active());
        assert_eq!(
            client.session().pending_email().as_deref(),
            Some("ali@example.com")
        );
        assert_eq!(*recorder.redirects.lock().expect("lock"), 0);
        Ok(())
    }

    #[tokio::test]
    async fn plain_forbidden_surfaces_server_message() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/lessons"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "message": "instructors only"
            })))
            .mount(&server)
            .await;

        let (client, _) = client(&server.uri())?;
        client.session().start_session("tok-1", student())?;

        let result = client
            .authorized_request(Method::GET, "/lessons", None, &[])
            .await;
        match result {
            Err(AuthError::Rejected { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "instructors only");
            }
            other => return Err(anyhow!("unexpected result: {other:?}")),
        }
        assert!(client.session().is_active());
        Ok(())
    }

    #[tokio::test]
    async fn other_statuses_return_the_raw_response() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/lessons/l-404"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "message": "not found"
            })))
            .mount(&server)
            .await;

        let (client, recorder) = client(&server.uri())?;
        client.session().start_session("tok-1", student())?;

        let response = client
            .authorized_request(Method::GET, "/lessons/l-404", None, &[])
            .await?;
        assert_eq!(response.status(), 404);
        let body: Value = response.json().await?;
        assert_eq!(body["message"], "not found");
        assert!(recorder.notices.lock().expect("lock").is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn transport_failure_translates_to_network_error() -> Result<()> {
        // Port 9 (discard) is almost never listening.
        let (client, _) = client("http://127.0.0.1:9/api")?;
        client.session().start_session("tok-1", student())?;

        let result = client
            .authorized_request(Method::GET, "/lessons", None, &[])
            .await;
        assert!(matches!(result, Err(AuthError::Network(_))));
        // Session survives a transport failure.
        assert!(client.session().is_active());
        Ok(())
    }

    #[test]
    fn server_message_prefers_message_then_errors() {
        assert_eq!(server_message(&json!({"message": "m"})), "m");
        assert_eq!(
            server_message(&json!({"errors": [{"msg": "first"}, {"msg": "second"}]})),
            "first"
        );
        assert_eq!(server_message(&json!({})), "فشل الطلب");
    }
}

//! Allow-list CORS middleware.
//!
//! A request whose `Origin` is on the list gets it echoed back in
//! `Access-Control-Allow-Origin`. The method, header and credentials
//! headers are sent on every response. Any `OPTIONS` request is answered
//! here with 204 and never reaches a handler.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN, VARY,
};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

const ALLOW_METHODS: &str = "POST, GET, OPTIONS, PUT, DELETE, PATCH";
const ALLOW_HEADERS: &str =
    "Accept, Content-Type, Content-Length, Accept-Encoding, X-CSRF-Token, Authorization";

/// Origins allowed to make credentialed cross-origin requests.
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
}

impl CorsPolicy {
    /// Policy from an explicit origin list. Entries are trimmed; blanks dropped.
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_origins: origins
                .into_iter()
                .map(|o| o.as_ref().trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
        }
    }

    /// Whether `origin` matches an entry exactly.
    pub fn allows(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|o| o == origin)
    }

    fn apply(&self, origin: Option<&HeaderValue>, headers: &mut HeaderMap) {
        if let Some(origin) = origin.filter(|o| o.to_str().is_ok_and(|o| self.allows(o))) {
            let _ = headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
            let _ = headers.append(VARY, HeaderValue::from_static("Origin"));
        }
        let _ = headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        let _ = headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        let _ = headers.insert(
            ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
    }
}

/// Middleware entry point, for `axum::middleware::from_fn_with_state`.
pub async fn cors_layer(
    State(policy): State<Arc<CorsPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request.headers().get(ORIGIN).cloned();
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };
    policy.apply(origin.as_ref(), response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_exact() {
        let policy = CorsPolicy::new([" http://localhost:3000 ", "", "https://app.example"]);
        assert!(policy.allows("http://localhost:3000"));
        assert!(policy.allows("https://app.example"));
        assert!(!policy.allows(""));
        assert!(!policy.allows("http://localhost:3000/"));
        assert!(!policy.allows("http://evil.example"));
    }

    #[test]
    fn apply_echoes_allowed_origin() {
        let policy = CorsPolicy::new(["http://localhost:3000"]);
        let mut headers = HeaderMap::new();
        policy.apply(
            Some(&HeaderValue::from_static("http://localhost:3000")),
            &mut headers,
        );
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:3000");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], ALLOW_METHODS);
    }

    #[test]
    fn apply_omits_unknown_origin() {
        let policy = CorsPolicy::new(["http://localhost:3000"]);
        let mut headers = HeaderMap::new();
        policy.apply(Some(&HeaderValue::from_static("http://other")), &mut headers);
        assert!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], ALLOW_HEADERS);
    }

    #[test]
    fn apply_without_origin_still_sets_static_headers() {
        let policy = CorsPolicy::default();
        let mut headers = HeaderMap::new();
        policy.apply(None, &mut headers);
        assert!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert!(headers.get(ACCESS_CONTROL_ALLOW_METHODS).is_some());
    }
}

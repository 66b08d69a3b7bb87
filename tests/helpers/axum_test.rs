// ABOUTME: In-process HTTP helpers that drive an axum Router through tower's oneshot
// ABOUTME: Builds JSON requests with bearer tokens and buffers responses for assertions

use axum::{
    body::{to_bytes, Body},
    http::{header, header::IntoHeaderName, HeaderMap, HeaderValue, Method, Request, StatusCode},
    Router,
};
use serde::{de::DeserializeOwned, Serialize};
use tower::ServiceExt;

/// Request under construction
pub struct AxumTestRequest {
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Body,
}

impl AxumTestRequest {
    fn with_method(method: Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_owned(),
            headers: HeaderMap::new(),
            body: Body::empty(),
        }
    }

    pub fn get(uri: &str) -> Self {
        Self::with_method(Method::GET, uri)
    }

    pub fn post(uri: &str) -> Self {
        Self::with_method(Method::POST, uri)
    }

    #[allow(dead_code)]
    pub fn put(uri: &str) -> Self {
        Self::with_method(Method::PUT, uri)
    }

    #[allow(dead_code)]
    pub fn delete(uri: &str) -> Self {
        Self::with_method(Method::DELETE, uri)
    }

    #[allow(dead_code)]
    pub fn options(uri: &str) -> Self {
        Self::with_method(Method::OPTIONS, uri)
    }

    /// Set a header, replacing an earlier value with the same name
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: &str) -> Self {
        let value = HeaderValue::from_str(value).expect("header value must be visible ASCII");
        self.headers.insert(name, value);
        self
    }

    /// Set `Authorization` to a full `Bearer <token>` value
    #[allow(dead_code)]
    pub fn bearer(self, authorization: &str) -> Self {
        self.header(header::AUTHORIZATION, authorization)
    }

    /// Send `data` as a JSON body
    pub fn json<T: Serialize>(mut self, data: &T) -> Self {
        let bytes = serde_json::to_vec(data).expect("test body must serialize");
        self.body = Body::from(bytes);
        self.header(header::CONTENT_TYPE, "application/json")
    }

    /// Run the request through the router and buffer the response
    pub async fn send(self, app: Router) -> AxumTestResponse {
        let mut request = Request::builder()
            .method(self.method)
            .uri(self.uri)
            .body(self.body)
            .expect("test request must be valid");
        *request.headers_mut() = self.headers;

        let response = app.oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body must be readable")
            .to_vec();

        AxumTestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Buffered response
pub struct AxumTestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl AxumTestResponse {
    pub const fn status(&self) -> u16 {
        self.status.as_u16()
    }

    #[allow(dead_code)]
    pub const fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Header value as text, if present
    #[allow(dead_code)]
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned)
    }

    /// Body parsed as JSON; panics with the raw body when it is not JSON
    pub fn json<T: DeserializeOwned>(self) -> T {
        match serde_json::from_slice(&self.body) {
            Ok(value) => value,
            Err(e) => panic!(
                "response is not JSON ({e}): {}",
                String::from_utf8_lossy(&self.body)
            ),
        }
    }

    #[allow(dead_code)]
    pub fn text(self) -> String {
        String::from_utf8(self.body).expect("response body must be UTF-8")
    }

    /// Assert the status, printing the body on mismatch
    #[allow(dead_code)]
    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.status,
            expected,
            "unexpected status, body: {}",
            String::from_utf8_lossy(&self.body)
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        routing::{get, post},
        Json,
    };
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_bearer_and_json_reach_the_handler() {
        let app = Router::new().route(
            "/echo",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let auth = headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_owned();
                Json(json!({ "auth": auth, "body": body }))
            }),
        );

        let response = AxumTestRequest::post("/echo")
            .bearer("Bearer abc")
            .json(&json!({ "barcode": "8996001600269" }))
            .send(app)
            .await;
        assert_eq!(response.status(), 200);
        let body: Value = response.json();
        assert_eq!(body["auth"], "Bearer abc");
        assert_eq!(body["body"]["barcode"], "8996001600269");
    }

    #[tokio::test]
    async fn test_text_and_headers_are_buffered() {
        let app = Router::new().route(
            "/",
            get(|| async { ([("x-note", "hai")], "API is running...") }),
        );
        let response = AxumTestRequest::get("/")
            .send(app)
            .await
            .assert_status(StatusCode::OK);
        assert_eq!(response.header("x-note").as_deref(), Some("hai"));
        assert_eq!(response.text(), "API is running...");
    }
}

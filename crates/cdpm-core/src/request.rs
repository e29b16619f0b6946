//! Transport-neutral request and response values.

use std::fmt;

use chrono::Utc;
use cookie::Cookie;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, HttpError};
use crate::tokens::{HeaderToken, SessionToken};

/// HTTP methods used by the cluster APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    Json(serde_json::Value),
    /// `application/x-www-form-urlencoded` payload, already encoded.
    Form(String),
}

/// One logical request, independent of the host it is sent to.
///
/// Requests are plain values so they can be re-issued verbatim after a
/// session renewal or against the next host during failover.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    /// Path relative to the host base URL.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Body,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: Body::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append several query parameters.
    pub fn query_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.to_string())));
        self
    }

    /// Append a request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set a JSON body.
    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, Error> {
        self.body = Body::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Set a pre-encoded form body.
    pub fn form(mut self, body: impl Into<String>) -> Self {
        self.body = Body::Form(body.into());
        self
    }
}

/// Credentials attached to one request.
#[derive(Clone, Default)]
pub enum RequestAuth {
    /// Nothing from the session layer; transport-level providers may still apply.
    #[default]
    None,
    Basic {
        username: String,
        password: String,
    },
    /// `Authorization: Basic <token>`.
    Header(HeaderToken),
    /// Cookie jar contents, sent as a `Cookie` header.
    Cookies(Vec<(String, String)>),
}

impl RequestAuth {
    /// Cookie auth carrying only a `SESSION` cookie.
    pub fn session(token: &SessionToken) -> Self {
        RequestAuth::Cookies(vec![(
            crate::SESSION_COOKIE.to_string(),
            token.as_str().to_string(),
        )])
    }

    /// Render cookies as a `Cookie` header value.
    pub fn cookie_header(&self) -> Option<String> {
        match self {
            RequestAuth::Cookies(cookies) if !cookies.is_empty() => Some(
                cookies
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, RequestAuth::None)
    }
}

impl fmt::Debug for RequestAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestAuth::None => f.write_str("None"),
            RequestAuth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            RequestAuth::Header(token) => f.debug_tuple("Header").field(token).finish(),
            RequestAuth::Cookies(cookies) => {
                let names: Vec<&str> = cookies.iter().map(|(k, _)| k.as_str()).collect();
                f.debug_tuple("Cookies").field(&names).finish()
            }
        }
    }
}

/// A fully-read HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Client-side success: any status below 400.
    pub fn is_success(&self) -> bool {
        self.status < 400
    }

    /// First header with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Cookies set by this response, from `Set-Cookie` headers.
    ///
    /// Deletions are left out: an empty value, `Max-Age=0` or an `Expires`
    /// date in the past.
    pub fn cookies(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("set-cookie"))
            .filter_map(|(_, v)| Cookie::parse(v.as_str()).ok())
            .filter(is_live)
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect()
    }

    /// Value of a cookie set by this response.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies()
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Body as text (lossy UTF-8).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Capture this response as an [`HttpError`].
    pub fn into_http_error(self) -> HttpError {
        let body = self.text();
        HttpError::new(self.status, self.headers, body)
    }
}

fn is_live(cookie: &Cookie<'_>) -> bool {
    if cookie.value().is_empty() {
        return false;
    }
    if cookie.max_age().is_some_and(|age| age.whole_seconds() <= 0) {
        return false;
    }
    cookie
        .expires_datetime()
        .is_none_or(|expires| expires.unix_timestamp() > Utc::now().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_query_and_headers() {
        let req = Request::get("/api/v41/hosts")
            .query("view", "FULL")
            .query_pairs([("limit", 10), ("offset", 0)])
            .header("x-do-as", "hue");
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.query.len(), 3);
        assert_eq!(req.query[1], ("limit".to_string(), "10".to_string()));
        assert_eq!(req.headers[0].0, "x-do-as");
    }

    #[test]
    fn parses_set_cookie_headers() {
        let resp = Response::new(
            200,
            vec![
                ("Set-Cookie".into(), "SESSION=abc123; Path=/; HttpOnly".into()),
                ("set-cookie".into(), "CLOUDERA_MANAGER_SESSIONID=x1; Path=/".into()),
                ("content-type".into(), "application/json".into()),
            ],
            "{}",
        );
        assert_eq!(resp.cookie("SESSION").as_deref(), Some("abc123"));
        assert_eq!(resp.cookies().len(), 2);
        assert_eq!(resp.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn deleted_and_expired_cookies_are_ignored() {
        let resp = Response::new(
            200,
            vec![
                ("set-cookie".into(), "SESSION=; Max-Age=0; Path=/".into()),
                (
                    "set-cookie".into(),
                    "old=1; Expires=Thu, 01 Jan 1970 00:00:00 GMT".into(),
                ),
                ("set-cookie".into(), "gone=x; Max-Age=0".into()),
                ("set-cookie".into(), "keep=2; Max-Age=3600; HttpOnly".into()),
            ],
            "{}",
        );
        assert_eq!(resp.cookie("SESSION"), None);
        assert_eq!(resp.cookies(), vec![("keep".to_string(), "2".to_string())]);
    }

    #[test]
    fn cookie_header_joins_jar() {
        let auth = RequestAuth::Cookies(vec![
            ("SESSION".into(), "abc".into()),
            ("other".into(), "1".into()),
        ]);
        assert_eq!(auth.cookie_header().as_deref(), Some("SESSION=abc; other=1"));
        assert!(RequestAuth::None.cookie_header().is_none());
    }

    #[test]
    fn debug_hides_cookie_values() {
        let auth = RequestAuth::session(&SessionToken::new("secret-session"));
        let debug = format!("{:?}", auth);
        assert!(debug.contains("SESSION"));
        assert!(!debug.contains("secret-session"));
    }

    #[test]
    fn http_error_keeps_body_and_headers() {
        let resp = Response::new(404, vec![("x-id".into(), "7".into())], "no such app");
        let err = resp.into_http_error();
        assert_eq!(err.status, 404);
        assert_eq!(err.body, "no such app");
        assert_eq!(err.headers[0].1, "7");
    }
}

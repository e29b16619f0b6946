//! Scripted transport for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use cdpm_core::error::TransportError;
use cdpm_core::{HostUrl, Request, RequestAuth, Response, Result, Transport};

/// One recorded call.
#[derive(Debug, Clone)]
pub struct Call {
    pub host: String,
    pub path: String,
    pub auth: String,
}

/// Replays scripted outcomes in order and records every call.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<Response>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: &str) -> Self {
        self.push(Ok(Response::new(status, Vec::new(), body.as_bytes().to_vec())))
    }

    pub fn respond_with_cookie(self, status: u16, cookie: &str) -> Self {
        let headers = vec![("set-cookie".to_string(), format!("{cookie}; Path=/; HttpOnly"))];
        self.push(Ok(Response::new(status, headers, b"{}".to_vec())))
    }

    pub fn refuse(self) -> Self {
        self.push(Err(TransportError::Connection {
            message: "connection refused".into(),
        }
        .into()))
    }

    pub fn push(self, outcome: Result<Response>) -> Self {
        self.script.lock().unwrap().push_back(outcome);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.path).collect()
    }

    pub fn hosts(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.host).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        host: &HostUrl,
        request: &Request,
        auth: &RequestAuth,
    ) -> Result<Response> {
        let auth = match auth {
            RequestAuth::None => "none".to_string(),
            RequestAuth::Basic { username, .. } => format!("basic:{username}"),
            RequestAuth::Header(token) => format!("header:{}", token.as_str()),
            RequestAuth::Cookies(_) => {
                format!("cookie:{}", auth.cookie_header().unwrap_or_default())
            }
        };
        self.calls.lock().unwrap().push(Call {
            host: host.host().unwrap_or_default().to_string(),
            path: request.path.clone(),
            auth,
        });
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unscripted request to {}", request.path))
    }
}

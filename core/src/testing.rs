//! Scripted transport for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::client::TeamCityClient;
use crate::connection::Connection;
use crate::http::{HttpRequest, HttpResponse};
use crate::retry::RetryConfig;
use crate::transport::{Transport, TransportError};

#[derive(Default)]
struct Script {
    responses: VecDeque<HttpResponse>,
    requests: Vec<HttpRequest>,
}

/// Answers requests from a queue and records everything it was sent.
#[derive(Clone, Default)]
pub(crate) struct Scripted {
    script: Arc<Mutex<Script>>,
}

impl Scripted {
    pub(crate) fn new(responses: impl IntoIterator<Item = (u16, &'static str)>) -> Self {
        let scripted = Self::default();
        scripted.script.lock().unwrap().responses = responses
            .into_iter()
            .map(|(status, body)| HttpResponse::new(status, body))
            .collect();
        scripted
    }

    pub(crate) fn client(&self) -> TeamCityClient {
        let conn = Connection::new("http://tc:8111", "token", "", "")
            .unwrap()
            .with_retry(RetryConfig::new(2, Duration::ZERO, Duration::ZERO));
        TeamCityClient::with_transport(conn, self.clone())
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.script.lock().unwrap().requests.clone()
    }
}

impl Transport for Scripted {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut script = self.script.lock().unwrap();
        script.requests.push(request.clone());
        script
            .responses
            .pop_front()
            .ok_or_else(|| TransportError::new("script exhausted"))
    }
}

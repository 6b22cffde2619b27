//! Scripted collaborators for unit tests.

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

use arsys_error::RegistrarError;

use crate::resolver::HostResolver;
use crate::transport::{ApiRequest, Method, Transport, TransportError};

type Reply = Result<String, TransportError>;

/// Answers by `(method, path)`. Queued replies are served in order and the
/// last one repeats. An unscripted route panics so the test names it.
#[derive(Clone, Default)]
pub struct MockTransport {
    routes: Arc<Mutex<HashMap<(Method, String), VecDeque<Reply>>>>,
    log: RequestLog,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: Method, path: &str, body: &str) {
        self.push(method, path, Ok(body.to_string()));
    }

    pub fn fail(&self, method: Method, path: &str, code: i64, message: &str) {
        self.push(
            method,
            path,
            Err(TransportError {
                code,
                message: message.to_string(),
            }),
        );
    }

    pub fn log(&self) -> RequestLog {
        self.log.clone()
    }

    fn push(&self, method: Method, path: &str, reply: Reply) {
        let mut routes = self.routes.lock().expect("routes lock");
        routes
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: ApiRequest) -> Result<String, TransportError> {
        let key = (request.method, request.path.clone());
        self.log.requests.lock().expect("log lock").push(request);

        let mut routes = self.routes.lock().expect("routes lock");
        let queue = routes
            .get_mut(&key)
            .unwrap_or_else(|| panic!("no scripted reply for {} {}", key.0, key.1));
        if queue.len() > 1 {
            queue.pop_front().expect("queued reply")
        } else {
            queue.front().cloned().expect("queued reply")
        }
    }
}

/// Every request the mock saw, in order.
#[derive(Clone, Default)]
pub struct RequestLog {
    requests: Arc<Mutex<Vec<ApiRequest>>>,
}

impl RequestLog {
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().expect("log lock").clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn calls(&self) -> Vec<(Method, String)> {
        self.requests()
            .into_iter()
            .map(|r| (r.method, r.path))
            .collect()
    }
}

/// Fixed host table; unknown hosts fail the lookup.
#[derive(Default)]
pub struct StaticResolver {
    hosts: HashMap<String, IpAddr>,
}

impl StaticResolver {
    pub fn with(mut self, host: &str, ip: &str) -> Self {
        self.hosts
            .insert(host.to_string(), ip.parse().expect("static address"));
        self
    }
}

#[async_trait::async_trait]
impl HostResolver for StaticResolver {
    async fn resolve(&self, host: &str) -> Result<IpAddr, RegistrarError> {
        self.hosts
            .get(host)
            .copied()
            .ok_or_else(|| RegistrarError::Lookup {
                host: host.to_string(),
                message: "unknown host".to_string(),
            })
    }
}

//! Scripted in-memory transport for testing without a backend.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use super::{ApiError, ApiRequest, ApiResult, Method, Transport};

/// Transport that answers from a route table and records every request.
///
/// Routes match on method and exact path; query parameters are ignored for
/// matching but kept in the recorded calls, except that a route registered
/// with [`respond_page`](Self::respond_page) wins for its `pageNumber`.
/// Unrouted requests get a 404.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), ApiResult<Value>>>,
    pages: Mutex<HashMap<(Method, String, u32), ApiResult<Value>>>,
    calls: Mutex<Vec<ApiRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` with `result` from now on.
    pub fn respond(&self, method: Method, path: impl Into<String>, result: ApiResult<Value>) {
        lock(&self.routes).insert((method, path.into()), result);
    }

    pub fn respond_ok(&self, method: Method, path: impl Into<String>, body: Value) {
        self.respond(method, path, Ok(body));
    }

    /// Answer `method path` with the error a real transport produces for `status`.
    pub fn respond_status(&self, method: Method, path: impl Into<String>, status: u16) {
        self.respond(method, path, Err(ApiError::from_status(status, None)));
    }

    /// Answer `method path` with `body` when `pageNumber` equals `page`.
    pub fn respond_page(&self, method: Method, path: impl Into<String>, page: u32, body: Value) {
        lock(&self.pages).insert((method, path.into(), page), Ok(body));
    }

    /// Every request received so far, in order.
    pub fn calls(&self) -> Vec<ApiRequest> {
        lock(&self.calls).clone()
    }

    /// How many times `method path` was requested.
    pub fn call_count(&self, method: Method, path: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    pub fn write_calls(&self) -> Vec<ApiRequest> {
        lock(&self.calls)
            .iter()
            .filter(|c| c.method.is_write())
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> ApiResult<Value> {
        let key = (request.method, request.path.clone());
        let page = request
            .query
            .iter()
            .find(|(k, _)| k == "pageNumber")
            .and_then(|(_, v)| v.parse::<u32>().ok());
        lock(&self.calls).push(request);
        if let Some(page) = page {
            let paged = lock(&self.pages).get(&(key.0, key.1.clone(), page)).cloned();
            if let Some(result) = paged {
                return result;
            }
        }
        lock(&self.routes)
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Err(ApiError::NotFound(format!("no route for {} {}", key.0, key.1))))
    }
}

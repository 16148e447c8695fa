//! In-memory [`HttpTransport`] that replays canned responses and records
//! every request it was given.

use std::collections::VecDeque;
use std::sync::Mutex;

use super::api_client::{ApiError, ApiResult, HttpRequest, HttpResponse, HttpTransport};

#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<ApiResult<HttpResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response; responses are handed out in FIFO order.
    pub fn push(&self, response: HttpResponse) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(Ok(response));
        }
    }

    pub fn push_json(&self, status: u16, body: &str) {
        self.push(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        });
    }

    /// Queues a transport-level failure.
    pub fn push_error(&self, error: ApiError) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(Err(error));
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl HttpTransport for MockTransport {
    fn send(&self, request: &HttpRequest) -> ApiResult<HttpResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        self.responses
            .lock()
            .map_err(|_| ApiError::Transport("mock transport poisoned".to_string()))?
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transport("no mock response queued".to_string())))
    }
}

//! In-memory transport for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;

use crate::error::{NotebookError, Result};
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// Replays canned responses in order and records every request.
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<ApiResponse>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new(responses: Vec<Result<ApiResponse>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue more responses after construction.
    pub(crate) fn push(&self, response: Result<ApiResponse>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn call(&self, request: ApiRequest) -> Result<ApiResponse> {
        let path = request.path.render();
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted response left for {path}"))
    }
}

pub(crate) fn json_response(body: serde_json::Value) -> Result<ApiResponse> {
    Ok(ApiResponse::new(
        StatusCode::OK,
        HeaderMap::new(),
        serde_json::to_vec(&body).unwrap(),
    ))
}

pub(crate) fn error_response(status: u16, body: serde_json::Value) -> Result<ApiResponse> {
    Err(NotebookError::from_response(
        status,
        &serde_json::to_vec(&body).unwrap(),
    ))
}

//! Scripted provider for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::provider::{CompletionRequest, CompletionResponse, FinishReason, LlmProvider};
use crate::error::LlmError;

type ReplyFn = Box<dyn Fn(&CompletionRequest) -> Option<String> + Send + Sync>;

enum Responder {
    /// Replies in order; `None` entries and an exhausted script fail.
    Script(Mutex<VecDeque<Option<String>>>),
    Func(ReplyFn),
}

/// Mock LLM that replays canned replies and records every request.
pub(crate) struct ScriptedLlm {
    responder: Responder,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub(crate) fn replying<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::script(replies.into_iter().map(|s| Some(s.into())))
    }

    /// Mixed script; `None` marks a failed call.
    pub(crate) fn script<I>(steps: I) -> Arc<Self>
    where
        I: IntoIterator<Item = Option<String>>,
    {
        Arc::new(Self {
            responder: Responder::Script(Mutex::new(steps.into_iter().collect())),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Every call fails with a transport error.
    pub(crate) fn failing() -> Arc<Self> {
        Self::script(std::iter::empty())
    }

    /// Reply computed from the request; `None` fails the call.
    pub(crate) fn from_fn<F>(f: F) -> Arc<Self>
    where
        F: Fn(&CompletionRequest) -> Option<String> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Responder::Func(Box::new(f)),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn model_name(&self) -> &str {
        "scripted"
    }

    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let reply = match &self.responder {
            Responder::Script(steps) => steps.lock().unwrap().pop_front().flatten(),
            Responder::Func(f) => f(&request),
        };
        self.requests.lock().unwrap().push(request);

        match reply {
            Some(content) => Ok(CompletionResponse {
                content,
                finish_reason: FinishReason::Stop,
            }),
            None => Err(LlmError::RequestFailed {
                provider: "mock".to_string(),
                reason: "scripted failure".to_string(),
            }),
        }
    }
}

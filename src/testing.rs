//! In-memory stand-ins for the two remote services, with call counters.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use crate::chat::client::{ApiRequest, ChatError, ChatTransport};
use crate::condense::{CondenseError, Condenser, TextGenerator};
use crate::settings::CondenserSettings;

#[derive(Clone, Default)]
pub struct FakeGenerator {
    reply: Option<String>,
    delay: Option<Duration>,
    calls: Rc<Cell<usize>>,
    prompts: Rc<RefCell<Vec<String>>>,
}

impl FakeGenerator {
    /// Answers every prompt with `reply`.
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            ..Default::default()
        }
    }

    /// Fails every call.
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    /// A condenser sharing this fake's counters.
    pub fn condenser(&self, api_key: Option<&str>) -> Condenser<FakeGenerator> {
        Condenser::new(
            self.clone(),
            api_key.map(str::to_string),
            &CondenserSettings::default(),
        )
    }
}

impl TextGenerator for FakeGenerator {
    async fn generate(
        &self,
        _api_key: &str,
        prompt: &str,
        _max_tokens: u32,
    ) -> Result<String, CondenseError> {
        self.calls.set(self.calls.get() + 1);
        self.prompts.borrow_mut().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone().ok_or(CondenseError::Empty)
    }
}

/// Scripted chat service. Unscripted methods answer `{"ok": true}`.
#[derive(Clone, Default)]
pub struct FakeTransport {
    scripted: Rc<RefCell<HashMap<String, VecDeque<Result<serde_json::Value, String>>>>>,
    calls: Rc<RefCell<Vec<(String, ApiRequest)>>>,
}

impl FakeTransport {
    pub fn respond(&self, method: &str, value: serde_json::Value) -> &Self {
        self.scripted
            .borrow_mut()
            .entry(method.to_string())
            .or_default()
            .push_back(Ok(value));
        self
    }

    /// Make the next call to `method` fail at the transport level.
    pub fn fail(&self, method: &str, message: &str) -> &Self {
        self.scripted
            .borrow_mut()
            .entry(method.to_string())
            .or_default()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<(String, ApiRequest)> {
        self.calls.borrow().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(m, _)| m.clone()).collect()
    }

    /// JSON body of the last call to `method`.
    pub fn last_body(&self, method: &str) -> Option<serde_json::Value> {
        self.calls
            .borrow()
            .iter()
            .rev()
            .find_map(|(m, req)| match req {
                ApiRequest::Json(body) if m == method => Some(body.clone()),
                _ => None,
            })
    }
}

impl ChatTransport for FakeTransport {
    async fn call(
        &self,
        method: &str,
        request: ApiRequest,
    ) -> Result<serde_json::Value, ChatError> {
        self.calls.borrow_mut().push((method.to_string(), request));
        let next = self
            .scripted
            .borrow_mut()
            .get_mut(method)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(ChatError::Malformed(message)),
            None => Ok(serde_json::json!({ "ok": true })),
        }
    }
}

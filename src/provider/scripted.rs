// src/provider/scripted.rs
//! Test double answering requests from per-method scripts

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::ProviderError;
use crate::provider::WalletProvider;

type Reply = Result<Value, ProviderError>;

#[derive(Default)]
pub struct ScriptedProvider {
    queued: Mutex<HashMap<String, VecDeque<Reply>>>,
    fixed: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every call to `method` with `reply`
    pub fn always(&self, method: &str, reply: Reply) -> &Self {
        self.fixed.lock().insert(method.to_string(), reply);
        self
    }

    /// Answer the next call to `method` with `reply`, before any fixed reply
    pub fn once(&self, method: &str, reply: Reply) -> &Self {
        self.queued
            .lock()
            .entry(method.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn calls_to(&self, method: &str) -> Vec<Value> {
        self.calls
            .lock()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

#[async_trait]
impl WalletProvider for ScriptedProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.calls.lock().push((method.to_string(), params));

        if let Some(reply) = self.queued.lock().get_mut(method).and_then(|q| q.pop_front()) {
            return reply;
        }
        match self.fixed.lock().get(method) {
            Some(reply) => reply.clone(),
            None => Err(ProviderError::new(format!("no script for {}", method))),
        }
    }

    fn get_name(&self) -> String {
        "Scripted".to_string()
    }

    async fn is_available(&self) -> bool {
        true
    }
}

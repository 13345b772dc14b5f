//! In-crate mock collaborators with call counters.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use super::chain::{ChainClient, ChainError};
use super::decision::{CompletionClient, CompletionError, CompletionRequest};
use super::market::{FeedError, PriceFeed, PriceQuote};

async fn hang<T>() -> T {
    std::future::pending().await
}

#[derive(Debug, Clone)]
pub enum ChainBehavior {
    /// Every view returns these values.
    Fixed(Vec<Value>),
    Fail,
    Hang,
}

pub struct MockChain {
    behavior: ChainBehavior,
    views: HashMap<String, Vec<Value>>,
    resource: Option<Value>,
    calls: AtomicUsize,
    view_calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl MockChain {
    pub fn new(behavior: ChainBehavior) -> Self {
        Self {
            behavior,
            views: HashMap::new(),
            resource: None,
            calls: AtomicUsize::new(0),
            view_calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer views of the named module function with `values`.
    pub fn with_view(mut self, function: &str, values: Vec<Value>) -> Self {
        self.views.insert(function.to_string(), values);
        self
    }

    pub fn with_resource(mut self, resource: Value) -> Self {
        self.resource = Some(resource);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn view_calls(&self) -> Vec<(String, Vec<Value>)> {
        self.view_calls.lock().unwrap().clone()
    }

    async fn answer(&self) -> Result<Vec<Value>, ChainError> {
        match &self.behavior {
            ChainBehavior::Fixed(values) => Ok(values.clone()),
            ChainBehavior::Fail => Err(ChainError::api(500, "node unavailable")),
            ChainBehavior::Hang => hang().await,
        }
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn view(&self, function: &str, arguments: Vec<Value>) -> Result<Vec<Value>, ChainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.view_calls
            .lock()
            .unwrap()
            .push((function.to_string(), arguments));

        if !matches!(self.behavior, ChainBehavior::Fixed(_)) {
            return self.answer().await;
        }
        let name = function.rsplit("::").next().unwrap_or(function);
        match self.views.get(name) {
            Some(values) => Ok(values.clone()),
            None => self.answer().await,
        }
    }

    async fn account_resource(&self, _account: &str, resource_type: &str) -> Result<Value, ChainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match (&self.behavior, &self.resource) {
            (ChainBehavior::Hang, _) => hang().await,
            (ChainBehavior::Fail, _) => Err(ChainError::api(500, "node unavailable")),
            (_, Some(resource)) => Ok(resource.clone()),
            (_, None) => Err(ChainError::api(404, format!("Resource not found: {resource_type}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub enum FeedBehavior {
    Quote(PriceQuote),
    Fail,
    Hang,
}

pub struct MockFeed {
    behavior: FeedBehavior,
    calls: AtomicUsize,
}

impl MockFeed {
    pub fn new(behavior: FeedBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceFeed for MockFeed {
    async fn fetch_price(&self) -> Result<PriceQuote, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            FeedBehavior::Quote(quote) => Ok(*quote),
            FeedBehavior::Fail => Err(FeedError::InvalidResponse),
            FeedBehavior::Hang => hang().await,
        }
    }
}

#[derive(Debug, Clone)]
pub enum CompletionBehavior {
    Text(String),
    Fail,
    Hang,
}

pub struct MockCompletion {
    behavior: CompletionBehavior,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockCompletion {
    pub fn new(behavior: CompletionBehavior) -> Self {
        Self {
            behavior,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for MockCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        self.requests.lock().unwrap().push(request);
        match &self.behavior {
            CompletionBehavior::Text(text) => Ok(text.clone()),
            CompletionBehavior::Fail => Err(CompletionError::MissingApiKey),
            CompletionBehavior::Hang => hang().await,
        }
    }
}

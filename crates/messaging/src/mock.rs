//! Mock Messaging Service Implementation
//!
//! Programmable in-memory backend for testing conversation flows:
//! - `MockMessagingService`: seeded directory and histories, request recording
//! - `MockMessagingBehavior`: per-operation outcome and response delays
//! - `MockOutcome`: Succeed, FailTransport, or FailApplication

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::Utc;

use careline_common::Identity;

use crate::{
    Counterpart, FetchHistoryRequest, Message, MessagingError, MessagingService,
    SendMessageRequest,
};

/// What outcome an operation should produce
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MockOutcome {
    /// Answer from the in-memory store
    #[default]
    Succeed,
    /// Fail as if the connection dropped
    FailTransport,
    /// Answer `{ success: false, message }`
    FailApplication(String),
}

impl MockOutcome {
    fn into_error(self) -> Option<MessagingError> {
        match self {
            MockOutcome::Succeed => None,
            MockOutcome::FailTransport => Some(MessagingError::Transport(
                "Mock messaging: connection refused".to_string(),
            )),
            MockOutcome::FailApplication(message) => Some(MessagingError::Application(message)),
        }
    }
}

/// Programmable behavior for the mock messaging service
#[derive(Debug, Clone, Default)]
pub struct MockMessagingBehavior {
    pub list_outcome: Arc<RwLock<MockOutcome>>,
    pub fetch_outcome: Arc<RwLock<MockOutcome>>,
    pub send_outcome: Arc<RwLock<MockOutcome>>,
    /// Per-counterpart delay before a history response
    pub fetch_delays_ms: Arc<RwLock<HashMap<Identity, u64>>>,
    pub send_delay_ms: Arc<RwLock<u64>>,
}

impl MockMessagingBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_list_outcome(&self, outcome: MockOutcome) {
        *self.list_outcome.write().unwrap() = outcome;
    }

    pub fn set_fetch_outcome(&self, outcome: MockOutcome) {
        *self.fetch_outcome.write().unwrap() = outcome;
    }

    pub fn set_send_outcome(&self, outcome: MockOutcome) {
        *self.send_outcome.write().unwrap() = outcome;
    }

    /// Delay history responses for one counterpart
    pub fn set_fetch_delay_ms(&self, counterpart_id: Identity, delay: u64) {
        self.fetch_delays_ms
            .write()
            .unwrap()
            .insert(counterpart_id, delay);
    }

    pub fn set_send_delay_ms(&self, delay: u64) {
        *self.send_delay_ms.write().unwrap() = delay;
    }

    /// Reset to default behavior
    pub fn reset(&self) {
        *self.list_outcome.write().unwrap() = MockOutcome::Succeed;
        *self.fetch_outcome.write().unwrap() = MockOutcome::Succeed;
        *self.send_outcome.write().unwrap() = MockOutcome::Succeed;
        self.fetch_delays_ms.write().unwrap().clear();
        *self.send_delay_ms.write().unwrap() = 0;
    }

    fn fetch_delay_for(&self, counterpart_id: &Identity) -> u64 {
        self.fetch_delays_ms
            .read()
            .unwrap()
            .get(counterpart_id)
            .copied()
            .unwrap_or(0)
    }
}

/// A recorded request for test assertions
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedRequest {
    ListCounterparts { operator_id: Identity },
    FetchHistory(FetchHistoryRequest),
    SendMessage(SendMessageRequest),
}

#[derive(Debug, Default)]
struct MockStore {
    directory: HashMap<Identity, Vec<Counterpart>>,
    messages: Vec<Message>,
}

/// Mock messaging service with programmable behavior
#[derive(Debug, Clone, Default)]
pub struct MockMessagingService {
    behavior: Arc<MockMessagingBehavior>,
    store: Arc<Mutex<MockStore>>,
    history: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockMessagingService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(behavior: Arc<MockMessagingBehavior>) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }

    /// Get the shared behavior for external configuration
    pub fn behavior(&self) -> &Arc<MockMessagingBehavior> {
        &self.behavior
    }

    /// Seed the directory returned for an operator
    pub fn set_counterparts(&self, operator_id: Identity, counterparts: Vec<Counterpart>) {
        self.store
            .lock()
            .expect("store lock poisoned — prior test panicked")
            .directory
            .insert(operator_id, counterparts);
    }

    /// Seed a message into the stored history
    pub fn seed_message(&self, message: Message) {
        self.store
            .lock()
            .expect("store lock poisoned — prior test panicked")
            .messages
            .push(message);
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.history
            .lock()
            .expect("history lock poisoned — prior test panicked")
            .clone()
    }

    /// Number of history fetches issued so far
    pub fn fetch_count(&self) -> usize {
        self.recorded_requests()
            .iter()
            .filter(|r| matches!(r, RecordedRequest::FetchHistory(_)))
            .count()
    }

    /// Number of sends issued so far
    pub fn send_count(&self) -> usize {
        self.recorded_requests()
            .iter()
            .filter(|r| matches!(r, RecordedRequest::SendMessage(_)))
            .count()
    }

    /// Clear history
    pub fn reset_history(&self) {
        self.history
            .lock()
            .expect("history lock poisoned — prior test panicked")
            .clear();
    }

    fn record(&self, request: RecordedRequest) -> Result<(), MessagingError> {
        self.history
            .lock()
            .map_err(|e| MessagingError::Transport(format!("history lock poisoned: {e}")))?
            .push(request);
        Ok(())
    }

    fn store(&self) -> Result<std::sync::MutexGuard<'_, MockStore>, MessagingError> {
        self.store
            .lock()
            .map_err(|e| MessagingError::Transport(format!("store lock poisoned: {e}")))
    }

    fn outcome(lock: &RwLock<MockOutcome>) -> Result<MockOutcome, MessagingError> {
        lock.read()
            .map(|o| o.clone())
            .map_err(|e| MessagingError::Transport(format!("behavior lock poisoned: {e}")))
    }
}

#[async_trait::async_trait]
impl MessagingService for MockMessagingService {
    async fn list_counterparts(
        &self,
        operator_id: &Identity,
    ) -> Result<Vec<Counterpart>, MessagingError> {
        tracing::debug!(operator_id = %operator_id, "Mock messaging: listing counterparts");
        self.record(RecordedRequest::ListCounterparts {
            operator_id: operator_id.clone(),
        })?;

        if let Some(err) = Self::outcome(&self.behavior.list_outcome)?.into_error() {
            return Err(err);
        }

        Ok(self
            .store()?
            .directory
            .get(operator_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_history(
        &self,
        request: FetchHistoryRequest,
    ) -> Result<Vec<Message>, MessagingError> {
        tracing::debug!(
            operator_id = %request.operator_id,
            counterpart_id = %request.counterpart_id,
            "Mock messaging: fetching history"
        );
        self.record(RecordedRequest::FetchHistory(request.clone()))?;

        let delay = self.behavior.fetch_delay_for(&request.counterpart_id);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if let Some(err) = Self::outcome(&self.behavior.fetch_outcome)?.into_error() {
            return Err(err);
        }

        Ok(self
            .store()?
            .messages
            .iter()
            .filter(|m| m.is_between(&request.operator_id, &request.counterpart_id))
            .cloned()
            .collect())
    }

    async fn send_message(&self, request: SendMessageRequest) -> Result<Message, MessagingError> {
        tracing::debug!(
            sender_id = %request.sender_id,
            receiver_id = %request.receiver_id,
            "Mock messaging: sending message"
        );
        self.record(RecordedRequest::SendMessage(request.clone()))?;

        let delay = *self
            .behavior
            .send_delay_ms
            .read()
            .map_err(|e| MessagingError::Transport(format!("behavior lock poisoned: {e}")))?;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if let Some(err) = Self::outcome(&self.behavior.send_outcome)?.into_error() {
            return Err(err);
        }

        let message = Message::new(
            request.sender_id,
            request.receiver_id,
            request.body,
            Utc::now(),
        )
        .map_err(|e| MessagingError::Application(e.to_string()))?;

        self.store()?.messages.push(message.clone());
        Ok(message)
    }
}

//! Counterpart directory
//!
//! Holds the list of counterparts an operator may converse with. The list is
//! fetched once per operator and replaced wholesale on success; a failed load
//! keeps whatever was held before.

use std::sync::Arc;

use careline_common::Identity;
use careline_messaging::{Counterpart, MessagingService};

use crate::domain::error::DirectoryError;

pub struct ConversationDirectory {
    api: Arc<dyn MessagingService>,
    /// Operator most recently asked for
    requested: Option<Identity>,
    /// Operator whose list is currently held
    loaded_for: Option<Identity>,
    entries: Vec<Counterpart>,
}

impl ConversationDirectory {
    pub fn new(api: Arc<dyn MessagingService>) -> Self {
        Self {
            api,
            requested: None,
            loaded_for: None,
            entries: Vec::new(),
        }
    }

    /// Load the directory for `operator_id`.
    ///
    /// A repeated call for the operator already loaded returns the held list
    /// without a request. There is no retry here; call again or use
    /// [`reload`](Self::reload).
    pub async fn load(&mut self, operator_id: &Identity) -> Result<&[Counterpart], DirectoryError> {
        if self.loaded_for.as_ref() == Some(operator_id) {
            return Ok(&self.entries);
        }
        self.fetch(operator_id.clone()).await
    }

    /// Re-fetch for the most recently requested operator
    pub async fn reload(&mut self) -> Result<&[Counterpart], DirectoryError> {
        let operator_id = self.requested.clone().ok_or(DirectoryError::NoOperator)?;
        self.fetch(operator_id).await
    }

    async fn fetch(&mut self, operator_id: Identity) -> Result<&[Counterpart], DirectoryError> {
        self.requested = Some(operator_id.clone());

        match self.api.list_counterparts(&operator_id).await {
            Ok(entries) => {
                tracing::info!(
                    operator_id = %operator_id,
                    count = entries.len(),
                    "Counterpart directory loaded"
                );
                self.entries = entries;
                self.loaded_for = Some(operator_id);
                Ok(&self.entries)
            }
            Err(e) => {
                tracing::warn!(operator_id = %operator_id, error = %e, "Failed to load counterpart directory");
                Err(DirectoryError::Messaging(e))
            }
        }
    }

    /// Counterparts in backend order
    pub fn entries(&self) -> &[Counterpart] {
        &self.entries
    }

    pub fn find(&self, counterpart_id: &Identity) -> Option<&Counterpart> {
        self.entries.iter().find(|c| &c.id == counterpart_id)
    }

    /// Operator whose list is currently held
    pub fn operator_id(&self) -> Option<&Identity> {
        self.loaded_for.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded_for.is_some()
    }
}

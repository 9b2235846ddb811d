//! Careline application composition root
//!
//! Wires configuration, logging, the messaging backend, the counterpart
//! directory, and a conversation session into one run of the local client.

use std::sync::Arc;

use anyhow::Context;
use careline_common::config::{Config, LogFormat};
use careline_common::Identity;
use careline_conversations::{
    ConversationDirectory, ConversationSession, Direction, FetchOutcome, Message, SendOutcome,
};
use careline_messaging::{MessagingConfig, MessagingService, MessagingServiceFactory, OperatorRole};

/// Install the global tracing subscriber with `directives` as the filter
pub fn init_tracing(format: LogFormat, directives: &str) {
    let filter = tracing_subscriber::EnvFilter::new(directives);
    let result = match format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init(),
    };

    if let Err(e) = result {
        eprintln!("tracing subscriber already installed: {}", e);
    }
}

/// Build the messaging backend from configuration
pub fn create_messaging(config: MessagingConfig) -> anyhow::Result<Arc<dyn MessagingService>> {
    let service = MessagingServiceFactory::create(config)?;
    Ok(Arc::from(service))
}

/// Render one message as a transcript line
pub fn format_message(direction: Direction, message: &Message) -> String {
    let marker = match direction {
        Direction::Outgoing => ">",
        Direction::Incoming => "<",
    };
    format!(
        "{} [{}] {}",
        marker,
        message.sent_at.format("%Y-%m-%d %H:%M"),
        message.body
    )
}

/// Open the configured conversation, optionally send `outgoing`, and return the transcript
pub async fn run(
    api: Arc<dyn MessagingService>,
    role: OperatorRole,
    config: &Config,
    outgoing: Option<String>,
) -> anyhow::Result<Vec<String>> {
    let (session, title) = match role {
        OperatorRole::Doctor => {
            let mut directory = ConversationDirectory::new(api.clone());
            directory
                .load(&config.operator_id)
                .await
                .context("Failed to load patient list")?;

            let counterpart = match &config.counterpart_id {
                Some(id) => directory
                    .find(id)
                    .cloned()
                    .with_context(|| format!("{} is not in the patient list", id))?,
                None => directory
                    .entries()
                    .first()
                    .cloned()
                    .context("No patients to chat with")?,
            };

            let session = ConversationSession::new(api, config.operator_id.clone());
            let outcome = session.select_counterpart(counterpart.id.clone()).await;
            ensure_loaded(outcome)?;
            (session, format!("Chat with {}", counterpart.display_name))
        }
        OperatorRole::Patient => {
            let counterpart_id: Identity = config
                .counterpart_id
                .clone()
                .context("COUNTERPART_ID is required for patient operators")?;

            let session = ConversationSession::with_counterpart(
                api,
                config.operator_id.clone(),
                counterpart_id.clone(),
            );
            ensure_loaded(session.activate().await)?;
            (session, format!("Chat with {}", counterpart_id))
        }
    };

    tracing::info!(
        operator_id = %config.operator_id,
        count = session.messages().len(),
        "Conversation opened"
    );

    if let Some(text) = outgoing {
        match session.send(&text).await {
            SendOutcome::Delivered(message) => {
                tracing::info!(sent_at = %message.sent_at, "Message delivered");
            }
            SendOutcome::Rejected(reason) => anyhow::bail!("Message not sent: {}", reason),
            SendOutcome::Failed(error) => anyhow::bail!("{}", error),
            SendOutcome::Discarded => anyhow::bail!("Conversation changed before delivery"),
        }
    }

    let mut transcript = vec![title];
    transcript.extend(
        session
            .messages()
            .iter()
            .map(|m| format_message(session.direction_of(m), m)),
    );
    Ok(transcript)
}

fn ensure_loaded(outcome: FetchOutcome) -> anyhow::Result<()> {
    match outcome {
        FetchOutcome::Loaded(_) | FetchOutcome::Unchanged => Ok(()),
        FetchOutcome::Failed(error) => Err(anyhow::anyhow!(error)),
        FetchOutcome::Superseded => anyhow::bail!("Conversation changed while loading"),
    }
}

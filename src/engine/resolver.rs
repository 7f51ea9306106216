use std::time::Duration;

use tracing::{debug, error, warn};

use crate::channel::{ChannelError, ControlId, ExternalChannel};
use crate::domain::{PROMPT_NOT_FOUND, PROMPT_RETRIEVAL_FAILED};
use crate::locator::Candidate;

/// Recovers prompts through the host page's copy control.
///
/// The clipboard is a single shared slot. Each resolution takes one turn on
/// it: snapshot, press copy, wait, read, then put the snapshot back if the
/// content changed. Nothing else in the process may use the clipboard while
/// a run is active.
pub struct PromptResolver<'a> {
    channel: &'a dyn ExternalChannel,
    settle: Duration,
}

impl<'a> PromptResolver<'a> {
    pub fn new(channel: &'a dyn ExternalChannel, settle: Duration) -> Self {
        Self { channel, settle }
    }

    /// Fails when the clipboard cannot be read at all.
    pub async fn ensure_access(&self) -> Result<(), ChannelError> {
        self.channel.peek().await.map(|_| ())
    }

    /// Full prompt for `candidate`, or a sentinel. Never fails.
    pub async fn resolve(&self, candidate: &Candidate) -> String {
        let Some(control) = &candidate.copy_control else {
            warn!("No copy control for job {}", candidate.job_id);
            return PROMPT_NOT_FOUND.to_string();
        };

        match self.round_trip(control).await {
            Ok(prompt) => prompt,
            Err(e) => {
                error!("Prompt retrieval failed for job {}: {}", candidate.job_id, e);
                PROMPT_RETRIEVAL_FAILED.to_string()
            }
        }
    }

    async fn round_trip(&self, control: &ControlId) -> Result<String, ChannelError> {
        let original = self.channel.peek().await.unwrap_or_else(|e| {
            warn!("Could not snapshot clipboard: {}", e);
            String::new()
        });

        self.channel.trigger(control).await?;
        tokio::time::sleep(self.settle).await;

        let copied = self.channel.read().await;
        let unchanged = matches!(&copied, Ok(text) if *text == original);
        if !unchanged {
            match self.channel.write(&original).await {
                Ok(()) => debug!("Restored clipboard after copying control {}", control),
                Err(e) => warn!("Failed to restore clipboard: {}", e),
            }
        }

        copied
    }
}

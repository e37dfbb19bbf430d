//! Preview, single confirmation, then chunked permanent deletion

use std::slice::Chunks;

use tracing::{info, warn};

use crate::client::{GmailClient, BATCH_DELETE_LIMIT};
use crate::console::Console;
use crate::error::Result;
use crate::models::Email;

/// Number of top-ranked messages whose detail is shown before confirming
pub const PREVIEW_LIMIT: usize = 10;

/// How a batch run ended. Every variant is a clean exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    NothingToDelete,
    Declined,
    DryRun { count: usize, batches: usize },
    Deleted { count: usize },
}

/// Split ids into consecutive groups accepted by one batchDelete call
pub fn batches(ids: &[String]) -> Chunks<'_, String> {
    ids.chunks(BATCH_DELETE_LIMIT)
}

/// Only a case-insensitive "yes" confirms
pub fn is_confirmation(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

/// Batch confirmation and deletion driver
pub struct BatchDeleter<'a, C: ?Sized, K: ?Sized> {
    client: &'a C,
    console: &'a mut K,
    dry_run: bool,
}

impl<'a, C, K> BatchDeleter<'a, C, K>
where
    C: GmailClient + ?Sized,
    K: Console + ?Sized,
{
    pub fn new(client: &'a C, console: &'a mut K) -> Self {
        Self {
            client,
            console,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run the whole flow over a ranked result set
    pub async fn run(mut self, emails: Vec<Email>) -> Result<BatchOutcome> {
        if emails.is_empty() {
            self.console.say("No messages match the query.")?;
            return Ok(BatchOutcome::NothingToDelete);
        }

        self.preview(&emails).await?;

        let count = emails.len();
        if self.dry_run {
            let batch_count = count.div_ceil(BATCH_DELETE_LIMIT);
            self.console.say(&format!(
                "Dry run: would batch delete {} emails in {} batch calls",
                count, batch_count
            ))?;
            return Ok(BatchOutcome::DryRun {
                count,
                batches: batch_count,
            });
        }

        if !self.confirm(count)? {
            self.console.say("Doing nothing. Exited.")?;
            info!("Batch deletion declined by operator");
            return Ok(BatchOutcome::Declined);
        }

        let ids: Vec<String> = emails.into_iter().map(|e| e.id).collect();
        let deleted = self.delete_all(&ids).await?;
        Ok(BatchOutcome::Deleted { count: deleted })
    }

    /// Show detail for at most [`PREVIEW_LIMIT`] leading records
    async fn preview(&mut self, emails: &[Email]) -> Result<()> {
        for email in emails.iter().take(PREVIEW_LIMIT) {
            let detail = self.client.get_message_detail(&email.id).await?;
            let shown = email.clone().with_detail(&detail);

            self.console.say("")?;
            self.console.say(&format!("Message URL: {}", shown.url()))?;
            self.console.say(&shown.summary_line())?;
        }
        Ok(())
    }

    fn confirm(&mut self, count: usize) -> Result<bool> {
        self.console.say("")?;
        self.console.say(&format!(
            "Do you want to batch delete a total of {} emails",
            count
        ))?;
        let answer = self.console.ask("Type 'yes' to continue: ")?;
        Ok(is_confirmation(&answer))
    }

    /// Issue one batchDelete per chunk, in order. The first failing chunk
    /// aborts the sweep; earlier chunks stay deleted.
    async fn delete_all(&mut self, ids: &[String]) -> Result<usize> {
        self.console
            .say(&format!("Now batch deleting {} emails ...", ids.len()))?;

        let mut remaining = ids.len();
        let mut deleted = 0;
        for chunk in batches(ids) {
            if let Err(e) = self.client.batch_delete(chunk).await {
                warn!(
                    "Batch delete failed after {} of {} messages were deleted",
                    deleted,
                    ids.len()
                );
                return Err(e);
            }
            deleted += chunk.len();
            remaining -= chunk.len();

            info!("Batch deleted {} messages, {} remaining", chunk.len(), remaining);
            self.console.say(&format!(
                "Batch deleted {} emails. There are {} emails remaining",
                chunk.len(),
                remaining
            ))?;
        }

        Ok(deleted)
    }
}

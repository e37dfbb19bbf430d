//! Per-message delete/skip/quit review
//!
//! Walks the ranked result set one message at a time. Each message is shown
//! with its URL and summary line and the operator picks one of:
//!
//! - `d` deletes the message immediately (single delete call)
//! - `s`, an empty line or anything unrecognised skips it
//! - `q` stops the walk
//!
//! Records should be enriched before the walk, otherwise size, date and
//! snippet are shown blank.

use tracing::info;

use crate::client::GmailClient;
use crate::console::Console;
use crate::error::Result;
use crate::models::Email;

/// Operator choice for one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Delete,
    Skip,
    Quit,
}

impl Choice {
    /// Parse an answer; `s` is the default for anything unrecognised
    pub fn parse(answer: &str) -> Self {
        match answer.trim().to_ascii_lowercase().as_str() {
            "d" => Choice::Delete,
            "q" => Choice::Quit,
            _ => Choice::Skip,
        }
    }
}

/// Tally of an interactive walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractiveSummary {
    pub processed: usize,
    pub deleted: usize,
    /// True when the operator stopped the walk with `q`
    pub quit: bool,
}

impl std::fmt::Display for InteractiveSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} messages processed, {} deleted",
            self.processed, self.deleted
        )
    }
}

pub struct InteractiveDeleter<'a, C: ?Sized, K: ?Sized> {
    client: &'a C,
    console: &'a mut K,
}

impl<'a, C, K> InteractiveDeleter<'a, C, K>
where
    C: GmailClient + ?Sized,
    K: Console + ?Sized,
{
    pub fn new(client: &'a C, console: &'a mut K) -> Self {
        Self { client, console }
    }

    /// Walk every record in order. A failed delete aborts the walk.
    pub async fn run(mut self, emails: Vec<Email>) -> Result<InteractiveSummary> {
        let mut summary = InteractiveSummary::default();

        for email in &emails {
            summary.processed += 1;

            self.console.say("")?;
            self.console.say(&format!("Message URL: {}", email.url()))?;
            self.console.say(&email.summary_line())?;
            let answer = self.console.ask("Options: (d)elete, (s)kip, (q)uit: [s] ")?;

            match Choice::parse(&answer) {
                Choice::Delete => {
                    self.client.delete_message(&email.id).await?;
                    summary.deleted += 1;
                    info!("Deleted message {}", email.id);
                }
                Choice::Quit => {
                    summary.quit = true;
                    break;
                }
                Choice::Skip => {}
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_parse() {
        assert_eq!(Choice::parse("d"), Choice::Delete);
        assert_eq!(Choice::parse(" D \n"), Choice::Delete);
        assert_eq!(Choice::parse("q"), Choice::Quit);
        assert_eq!(Choice::parse("s"), Choice::Skip);
    }

    #[test]
    fn test_choice_defaults_to_skip() {
        for answer in ["", "   ", "x", "delete", "quit", "dd"] {
            assert_eq!(Choice::parse(answer), Choice::Skip, "{:?}", answer);
        }
    }

    #[test]
    fn test_summary_display() {
        let summary = InteractiveSummary {
            processed: 3,
            deleted: 1,
            quit: true,
        };
        assert_eq!(summary.to_string(), "3 messages processed, 1 deleted");
    }
}

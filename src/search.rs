//! Paginated search for messages matching a Gmail query

use tracing::{debug, info};

use crate::client::GmailClient;
use crate::error::Result;
use crate::models::Email;

/// Collect every message matching `query`, in the order Gmail returns them.
///
/// Only identifiers are known at this stage. A failing page aborts the whole
/// search; pages are never skipped.
pub async fn search_messages<C>(client: &C, query: &str, page_size: u32) -> Result<Vec<Email>>
where
    C: GmailClient + ?Sized,
{
    let mut emails = Vec::new();
    let mut page_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = client
            .list_message_page(query, page_token.take(), page_size)
            .await?;
        pages += 1;

        info!("Processing {} messages...", page.ids.len());
        let next = page.continuation().map(str::to_string);
        emails.extend(page.ids.into_iter().map(Email::new));

        match next {
            Some(token) => {
                debug!("Fetching page {} with token {}", pages + 1, token);
                page_token = Some(token);
            }
            None => break,
        }
    }

    info!("Total messages matching query: {} ({} pages)", emails.len(), pages);
    Ok(emails)
}

/// Fetch detail for every record, returning enriched copies in the same order
pub async fn enrich_all<C>(client: &C, emails: Vec<Email>) -> Result<Vec<Email>>
where
    C: GmailClient + ?Sized,
{
    let total = emails.len();
    let mut enriched = Vec::with_capacity(total);

    for (i, email) in emails.into_iter().enumerate() {
        let detail = client.get_message_detail(&email.id).await?;
        enriched.push(email.with_detail(&detail));
        if (i + 1) % 100 == 0 {
            info!("Fetched details for {}/{} messages", i + 1, total);
        }
    }

    Ok(enriched)
}

//! Gmail API client with timeouts on every call and retry logic on read calls

use async_trait::async_trait;
use google_gmail1::api::{BatchDeleteMessagesRequest, Message};
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::{GmailHub, FULL_MAIL_SCOPE};
use crate::config::ClientConfig;
use crate::error::{GmailError, Result};
use crate::models::{LabelInfo, MessageDetail, MessagePage};

/// Maximum number of ids Gmail accepts in one batchDelete call
pub const BATCH_DELETE_LIMIT: usize = 100;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Trait defining the Gmail operations the deletion workflow needs
#[async_trait]
pub trait GmailClient: Send + Sync {
    /// List all labels in the account
    async fn list_labels(&self) -> Result<Vec<LabelInfo>>;

    /// Fetch one page of message ids matching a query
    async fn list_message_page(
        &self,
        query: &str,
        page_token: Option<String>,
        page_size: u32,
    ) -> Result<MessagePage>;

    /// Fetch size estimate, headers and snippet for a message
    async fn get_message_detail(&self, id: &str) -> Result<MessageDetail>;

    /// Permanently delete a single message
    async fn delete_message(&self, id: &str) -> Result<()>;

    /// Permanently delete up to [`BATCH_DELETE_LIMIT`] messages in one call
    async fn batch_delete(&self, ids: &[String]) -> Result<()>;
}

/// Production Gmail client backed by the google-gmail1 hub
///
/// Every call runs under a timeout. Read calls are retried with exponential
/// backoff on transient errors; delete calls are issued exactly once.
pub struct ProductionGmailClient {
    hub: GmailHub,
    max_retries: u32,
    request_timeout: Duration,
}

impl ProductionGmailClient {
    pub fn new(hub: GmailHub, config: &ClientConfig) -> Self {
        Self {
            hub,
            max_retries: config.max_retries,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// Address of the authenticated account
    pub async fn account_email(&self) -> Result<String> {
        let (_, profile) = self
            .timed(
                "read the account profile",
                self.hub.users().get_profile("me").add_scope(FULL_MAIL_SCOPE).doit(),
            )
            .await?;
        Ok(profile.email_address.unwrap_or_default())
    }

    /// Check if an error is retryable
    fn should_retry(error: &GmailError) -> bool {
        error.is_transient()
    }

    /// Execute an async operation with exponential backoff retry
    async fn with_retry<T, F, Fut>(
        operation_name: &str,
        max_retries: u32,
        mut operation: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut delay = INITIAL_BACKOFF;
        let mut attempts = 0;

        loop {
            attempts += 1;
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if Self::should_retry(&e) && attempts <= max_retries => {
                    let wait = retry_delay(delay, &e);
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}...",
                        operation_name,
                        attempts,
                        max_retries + 1,
                        e,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                    delay = std::cmp::min(delay * 2, MAX_BACKOFF);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Run a future under the configured request timeout. `target` names the
    /// action in any resulting error.
    async fn timed<T, Fut>(&self, target: &str, call: Fut) -> Result<T>
    where
        Fut: std::future::Future<Output = std::result::Result<T, google_gmail1::Error>>,
    {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result.map_err(|e| GmailError::from_api(target, e)),
            Err(_) => {
                warn!("Gmail API call to {} timed out after {:?}", target, self.request_timeout);
                Err(GmailError::Network {
                    target: target.to_string(),
                    reason: format!("timed out after {:?}", self.request_timeout),
                })
            }
        }
    }
}

/// Wait before the next attempt: the backoff step, stretched to a
/// server-requested Retry-After, never beyond [`MAX_BACKOFF`]
fn retry_delay(backoff: Duration, error: &GmailError) -> Duration {
    error
        .retry_after()
        .map_or(backoff, |requested| backoff.max(requested))
        .min(MAX_BACKOFF)
}

/// Refuse a batch larger than Gmail accepts before any request is made
pub fn check_batch_size(ids: &[String]) -> Result<()> {
    if ids.len() > BATCH_DELETE_LIMIT {
        return Err(GmailError::BadRequest {
            target: format!("batch delete {} messages", ids.len()),
            reason: format!("at most {} ids per call", BATCH_DELETE_LIMIT),
        });
    }
    Ok(())
}

/// Convert a Gmail API Message into our MessageDetail
fn parse_message_detail(msg: Message) -> Result<MessageDetail> {
    let id = msg
        .id
        .ok_or_else(|| GmailError::MalformedResponse("message without an id".to_string()))?;

    let headers = msg
        .payload
        .and_then(|p| p.headers)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|h| match (h.name, h.value) {
            (Some(name), Some(value)) => Some((name, value)),
            _ => None,
        })
        .collect();

    Ok(MessageDetail {
        id,
        size_estimate: msg.size_estimate.and_then(|s| u64::try_from(s).ok()),
        headers,
        snippet: msg.snippet,
        internal_date: msg.internal_date,
    })
}

#[async_trait]
impl GmailClient for ProductionGmailClient {
    async fn list_labels(&self) -> Result<Vec<LabelInfo>> {
        Self::with_retry("list_labels", self.max_retries, || async {
            debug!("Calling Gmail API to list labels...");
            let (_, response) = self
                .timed(
                    "list labels",
                    self.hub
                        .users()
                        .labels_list("me")
                        .add_scope(FULL_MAIL_SCOPE)
                        .doit(),
                )
                .await?;

            let labels: Vec<LabelInfo> = response
                .labels
                .unwrap_or_default()
                .into_iter()
                .filter_map(|label| match (label.id, label.name) {
                    (Some(id), Some(name)) => Some(LabelInfo { id, name }),
                    _ => None,
                })
                .collect();

            debug!("Successfully parsed {} labels", labels.len());
            Ok(labels)
        })
        .await
    }

    async fn list_message_page(
        &self,
        query: &str,
        page_token: Option<String>,
        page_size: u32,
    ) -> Result<MessagePage> {
        let target = format!("list messages matching '{}'", query);
        Self::with_retry("list_messages", self.max_retries, || async {
            let mut call = self
                .hub
                .users()
                .messages_list("me")
                .q(query)
                .max_results(page_size);

            if let Some(token) = page_token.as_deref() {
                call = call.page_token(token);
            }

            let (_, response) = self
                .timed(&target, call.add_scope(FULL_MAIL_SCOPE).doit())
                .await?;

            let ids = response
                .messages
                .unwrap_or_default()
                .into_iter()
                .filter_map(|m| m.id)
                .collect();

            Ok(MessagePage {
                ids,
                next_page_token: response.next_page_token,
            })
        })
        .await
    }

    async fn get_message_detail(&self, id: &str) -> Result<MessageDetail> {
        let target = format!("fetch message {}", id);
        Self::with_retry("get_message", self.max_retries, || async {
            let (_, msg) = self
                .timed(
                    &target,
                    self.hub
                        .users()
                        .messages_get("me", id)
                        .format("metadata")
                        .add_metadata_headers("Date")
                        .add_scope(FULL_MAIL_SCOPE)
                        .doit(),
                )
                .await?;

            parse_message_detail(msg)
        })
        .await
    }

    async fn delete_message(&self, id: &str) -> Result<()> {
        self.timed(
            &format!("delete message {}", id),
            self.hub
                .users()
                .messages_delete("me", id)
                .add_scope(FULL_MAIL_SCOPE)
                .doit(),
        )
        .await?;

        debug!("Deleted message {}", id);
        Ok(())
    }

    async fn batch_delete(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        check_batch_size(ids)?;

        let request = BatchDeleteMessagesRequest {
            ids: Some(ids.to_vec()),
        };

        self.timed(
            &format!("batch delete {} messages", ids.len()),
            self.hub
                .users()
                .messages_batch_delete(request, "me")
                .add_scope(FULL_MAIL_SCOPE)
                .doit(),
        )
        .await?;

        debug!("Batch deleted {} messages", ids.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use google_gmail1::api::{MessagePart, MessagePartHeader};

    fn rate_limited(retry_after: u64) -> GmailError {
        GmailError::RateLimited {
            target: "fetch message m1".to_string(),
            retry_after,
        }
    }

    fn network(reason: &str) -> GmailError {
        GmailError::Network {
            target: "list labels".to_string(),
            reason: reason.to_string(),
        }
    }

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("m{}", i)).collect()
    }

    #[test]
    fn test_check_batch_size_limit() {
        assert!(check_batch_size(&ids(0)).is_ok());
        assert!(check_batch_size(&ids(1)).is_ok());
        assert!(check_batch_size(&ids(BATCH_DELETE_LIMIT)).is_ok());

        let err = check_batch_size(&ids(BATCH_DELETE_LIMIT + 1)).unwrap_err();
        assert!(matches!(
            err,
            GmailError::BadRequest { ref target, .. } if target == "batch delete 101 messages"
        ));
    }

    #[test]
    fn test_retry_delay_honors_retry_after() {
        let step = Duration::from_secs(2);
        assert_eq!(retry_delay(step, &rate_limited(7)), Duration::from_secs(7));
        assert_eq!(retry_delay(step, &rate_limited(1)), step);
        assert_eq!(retry_delay(step, &network("reset")), step);
    }

    #[test]
    fn test_retry_delay_is_capped() {
        let far_future = rate_limited(7 * 24 * 60 * 60);
        assert_eq!(retry_delay(INITIAL_BACKOFF, &far_future), MAX_BACKOFF);
        assert_eq!(retry_delay(Duration::from_secs(3600), &network("reset")), MAX_BACKOFF);
    }

    fn header(name: &str, value: &str) -> MessagePartHeader {
        MessagePartHeader {
            name: Some(name.to_string()),
            value: Some(value.to_string()),
        }
    }

    #[test]
    fn test_should_retry_transient_errors() {
        assert!(ProductionGmailClient::should_retry(&GmailError::ServerError {
            target: "list labels".to_string(),
            status: 500,
        }));
        assert!(ProductionGmailClient::should_retry(&rate_limited(0)));
        assert!(ProductionGmailClient::should_retry(&network("connection reset")));
    }

    #[test]
    fn test_should_not_retry_permanent_errors() {
        assert!(!ProductionGmailClient::should_retry(&GmailError::AuthError(
            "invalid token".to_string()
        )));
        assert!(!ProductionGmailClient::should_retry(&GmailError::Forbidden {
            target: "delete message m1".to_string(),
            reason: "insufficient scope".to_string(),
        }));
    }

    #[test]
    fn test_parse_message_detail() {
        let msg = Message {
            id: Some("m1".to_string()),
            size_estimate: Some(2048),
            snippet: Some("Your invoice".to_string()),
            internal_date: Some(1_704_124_800_000),
            payload: Some(MessagePart {
                headers: Some(vec![
                    header("From", "billing@example.com"),
                    header("Date", "Mon, 1 Jan 2024 10:00:00 -0800"),
                ]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let detail = parse_message_detail(msg).unwrap();
        assert_eq!(detail.id, "m1");
        assert_eq!(detail.size_estimate, Some(2048));
        assert_eq!(detail.snippet.as_deref(), Some("Your invoice"));
        assert_eq!(detail.date_header(), "Mon, 1 Jan 2024 10:00:00 -0800");
        assert_eq!(detail.headers.len(), 2);
    }

    #[test]
    fn test_parse_message_detail_without_payload() {
        let msg = Message {
            id: Some("m2".to_string()),
            ..Default::default()
        };

        let detail = parse_message_detail(msg).unwrap();
        assert!(detail.headers.is_empty());
        assert_eq!(detail.date_header(), "");
        assert_eq!(detail.size_estimate, None);
    }

    #[test]
    fn test_parse_message_detail_missing_id() {
        let result = parse_message_detail(Message::default());
        assert!(matches!(result, Err(GmailError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_with_retry_succeeds_after_transient_error() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;

        let attempt_count = Arc::new(AtomicU32::new(0));
        let attempt_count_clone = Arc::clone(&attempt_count);

        let result = ProductionGmailClient::with_retry("test_op", 3, || {
            let count = Arc::clone(&attempt_count_clone);
            async move {
                if count.fetch_add(1, Ordering::SeqCst) < 1 {
                    Err(network("Connection timeout"))
                } else {
                    Ok("success".to_string())
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(attempt_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_with_retry_fails_on_permanent_error() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;

        let attempt_count = Arc::new(AtomicU32::new(0));
        let attempt_count_clone = Arc::clone(&attempt_count);

        let result = ProductionGmailClient::with_retry("test_op", 3, || {
            let count = Arc::clone(&attempt_count_clone);
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>(GmailError::BadRequest {
                    target: "list messages matching 'from:'".to_string(),
                    reason: "Invalid query".to_string(),
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempt_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_retry_exhausts_all_retries() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;

        let attempt_count = Arc::new(AtomicU32::new(0));
        let attempt_count_clone = Arc::clone(&attempt_count);

        let result = ProductionGmailClient::with_retry("test_op", 1, || {
            let count = Arc::clone(&attempt_count_clone);
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>(rate_limited(0))
            }
        })
        .await;

        assert!(matches!(result, Err(GmailError::RateLimited { .. })));
        // Initial attempt + 1 retry
        assert_eq!(attempt_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_with_retry_zero_retries_fails_fast() {
        let result = ProductionGmailClient::with_retry("test_op", 0, || async {
            Err::<(), _>(network("reset"))
        })
        .await;

        assert!(matches!(result, Err(GmailError::Network { .. })));
    }
}

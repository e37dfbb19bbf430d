use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Web UI link prefix for a single message
pub const MESSAGE_URL_PREFIX: &str = "https://mail.google.com/mail/u/0/#all/";

/// One candidate message for deletion.
///
/// Search only knows the identifier. Size, date, snippet and the received
/// timestamp are filled in by [`Email::with_detail`] for the records whose
/// detail was actually fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub id: String,
    pub size: Option<u64>,
    pub date: Option<String>,
    pub snippet: Option<String>,
    pub received: Option<DateTime<Utc>>,
}

impl Email {
    /// Record holding only the identifier, as produced by search
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            size: None,
            date: None,
            snippet: None,
            received: None,
        }
    }

    /// Consume the record and return it enriched with fetched detail
    pub fn with_detail(self, detail: &MessageDetail) -> Self {
        Self {
            id: self.id,
            size: detail.size_estimate,
            date: Some(detail.date_header().to_string()),
            snippet: detail.snippet.clone(),
            received: detail.received(),
        }
    }

    /// Size used for ranking; unset sizes rank as zero
    pub fn size_or_zero(&self) -> u64 {
        self.size.unwrap_or(0)
    }

    pub fn url(&self) -> String {
        format!("{}{}", MESSAGE_URL_PREFIX, self.id)
    }

    /// `Size: .., Date: .., Snippet: ".."` line shown to the operator
    pub fn summary_line(&self) -> String {
        let size = self.size.map(|s| s.to_string()).unwrap_or_default();
        let mut line = format!(
            "Size: {}, Date: {}, Snippet: {:?}",
            size,
            self.date.as_deref().unwrap_or(""),
            self.snippet.as_deref().unwrap_or("")
        );
        if let Some(received) = self.received {
            line.push_str(&format!(", Received: {}", received.format("%Y-%m-%d %H:%M:%S UTC")));
        }
        line
    }
}

/// Detail returned by the "get message" call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageDetail {
    pub id: String,
    pub size_estimate: Option<u64>,
    /// Header (name, value) pairs in the order Gmail returned them
    pub headers: Vec<(String, String)>,
    pub snippet: Option<String>,
    /// Milliseconds since the epoch
    pub internal_date: Option<i64>,
}

impl MessageDetail {
    /// Value of the first `Date` header, or "" when the message has none
    pub fn date_header(&self) -> &str {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("date"))
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }

    pub fn received(&self) -> Option<DateTime<Utc>> {
        self.internal_date.and_then(DateTime::from_timestamp_millis)
    }
}

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePage {
    pub ids: Vec<String>,
    pub next_page_token: Option<String>,
}

impl MessagePage {
    /// Continuation token, with an empty token treated as the last page
    pub fn continuation(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Label info returned from Gmail API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelInfo {
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(headers: &[(&str, &str)]) -> MessageDetail {
        MessageDetail {
            id: "m1".to_string(),
            size_estimate: Some(4096),
            headers: headers
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            snippet: Some("quarterly report".to_string()),
            internal_date: Some(1_704_124_800_000),
        }
    }

    #[test]
    fn test_new_email_has_only_id() {
        let email = Email::new("abc");
        assert_eq!(email.id, "abc");
        assert!(email.size.is_none());
        assert!(email.date.is_none());
        assert!(email.snippet.is_none());
        assert_eq!(email.size_or_zero(), 0);
    }

    #[test]
    fn test_date_header_first_match_wins() {
        let d = detail(&[
            ("From", "a@example.com"),
            ("Date", "Mon, 1 Jan 2024 10:00:00 -0800"),
            ("Date", "Tue, 2 Jan 2024 10:00:00 -0800"),
        ]);
        assert_eq!(d.date_header(), "Mon, 1 Jan 2024 10:00:00 -0800");
    }

    #[test]
    fn test_date_header_absent_is_empty() {
        let d = detail(&[("Subject", "hi")]);
        assert_eq!(d.date_header(), "");
    }

    #[test]
    fn test_with_detail_enriches_record() {
        let d = detail(&[("Date", "Mon, 1 Jan 2024 10:00:00 -0800")]);
        let email = Email::new("m1").with_detail(&d);

        assert_eq!(email.size, Some(4096));
        assert_eq!(email.date.as_deref(), Some("Mon, 1 Jan 2024 10:00:00 -0800"));
        assert_eq!(email.snippet.as_deref(), Some("quarterly report"));
        assert_eq!(
            email.received.unwrap().to_rfc3339(),
            "2024-01-01T16:00:00+00:00"
        );
    }

    #[test]
    fn test_summary_line_blank_when_not_enriched() {
        let email = Email::new("m1");
        assert_eq!(email.summary_line(), "Size: , Date: , Snippet: \"\"");
        assert_eq!(email.url(), "https://mail.google.com/mail/u/0/#all/m1");
    }

    #[test]
    fn test_summary_line_quotes_snippet() {
        let d = detail(&[("Date", "Mon, 1 Jan 2024")]);
        let email = Email::new("m1").with_detail(&d);
        let line = email.summary_line();
        assert!(line.starts_with("Size: 4096, Date: Mon, 1 Jan 2024, Snippet: \"quarterly report\""));
        assert!(line.ends_with("Received: 2024-01-01 16:00:00 UTC"));
    }

    #[test]
    fn test_empty_continuation_token_ends_paging() {
        let page = MessagePage {
            ids: vec!["a".to_string()],
            next_page_token: Some(String::new()),
        };
        assert_eq!(page.continuation(), None);

        let page = MessagePage {
            ids: vec![],
            next_page_token: Some("t1".to_string()),
        };
        assert_eq!(page.continuation(), Some("t1"));
    }
}

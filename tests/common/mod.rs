//! Common test utilities and fixtures
#![allow(dead_code)]

use gmail_bulk_delete::client::GmailClient;
use gmail_bulk_delete::console::LineConsole;
use gmail_bulk_delete::error::Result;
use gmail_bulk_delete::models::{Email, LabelInfo, MessageDetail, MessagePage};
use mockall::mock;
use std::io::Cursor;

pub type TestConsole = LineConsole<Cursor<Vec<u8>>, Vec<u8>>;

/// Console that reads `input` and captures everything written
pub fn console(input: &str) -> TestConsole {
    LineConsole::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
}

/// Everything the console printed
pub fn output(console: TestConsole) -> String {
    String::from_utf8(console.into_output()).expect("console output is utf-8")
}

/// Create an identifier-only search result
pub fn email(id: &str) -> Email {
    Email::new(id)
}

/// Create `n` identifier-only results named m0, m1, ...
pub fn emails(n: usize) -> Vec<Email> {
    (0..n).map(|i| Email::new(format!("m{}", i))).collect()
}

/// Create a message detail with a Date header
pub fn detail(id: &str, size: u64, date: &str, snippet: &str) -> MessageDetail {
    MessageDetail {
        id: id.to_string(),
        size_estimate: Some(size),
        headers: vec![
            ("From".to_string(), "sender@example.com".to_string()),
            ("Date".to_string(), date.to_string()),
        ],
        snippet: Some(snippet.to_string()),
        internal_date: Some(1_700_000_000_000),
    }
}

/// Create a search result page
pub fn page(ids: &[&str], next: Option<&str>) -> MessagePage {
    MessagePage {
        ids: ids.iter().map(|s| s.to_string()).collect(),
        next_page_token: next.map(str::to_string),
    }
}

pub fn label(id: &str, name: &str) -> LabelInfo {
    LabelInfo {
        id: id.to_string(),
        name: name.to_string(),
    }
}

// Mock implementation of GmailClient for testing
mock! {
    pub GmailClient {}

    #[async_trait::async_trait]
    impl GmailClient for GmailClient {
        async fn list_labels(&self) -> Result<Vec<LabelInfo>>;
        async fn list_message_page(
            &self,
            query: &str,
            page_token: Option<String>,
            page_size: u32,
        ) -> Result<MessagePage>;
        async fn get_message_detail(&self, id: &str) -> Result<MessageDetail>;
        async fn delete_message(&self, id: &str) -> Result<()>;
        async fn batch_delete(&self, ids: &[String]) -> Result<()>;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gmail_bulk_delete::console::Console;

    #[test]
    fn test_detail_fixture_has_date_header() {
        let d = detail("m1", 42, "Mon, 1 Jan 2024 10:00:00 +0000", "hi");
        assert_eq!(d.date_header(), "Mon, 1 Jan 2024 10:00:00 +0000");
        assert_eq!(d.size_estimate, Some(42));
    }

    #[test]
    fn test_page_fixture() {
        let p = page(&["a", "b"], Some("t1"));
        assert_eq!(p.ids, vec!["a", "b"]);
        assert_eq!(p.continuation(), Some("t1"));
    }

    #[test]
    fn test_console_captures_output() {
        let mut c = console("yes\n");
        c.say("hello").unwrap();
        assert_eq!(c.ask("? ").unwrap(), "yes");
        assert_eq!(output(c), "hello\n? ");
    }
}

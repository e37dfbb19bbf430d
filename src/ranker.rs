//! Ordering of search results before deletion

use std::cmp::Ordering;

use crate::models::Email;

/// Sort records with an arbitrary comparator. Equal records keep their order.
pub fn rank_by<F>(mut emails: Vec<Email>, compare: F) -> Vec<Email>
where
    F: FnMut(&Email, &Email) -> Ordering,
{
    emails.sort_by(compare);
    emails
}

/// Largest messages first. Records without a known size rank as zero.
pub fn rank_by_size(emails: Vec<Email>) -> Vec<Email> {
    rank_by(emails, |a, b| b.size_or_zero().cmp(&a.size_or_zero()))
}

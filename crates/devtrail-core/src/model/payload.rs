//! Payloads submitted through `MutateResource`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::field::truncate_chars;

/// Longest location name the backend stores.
pub const LOC_NAME_MAX: usize = 100;
/// Longest company name the backend stores.
pub const COMPANY_MAX: usize = 100;
/// Longest comment the backend stores.
pub const COMMENT_MAX: usize = 500;

/// Body of `POST events`.
///
/// Text fields are clipped to the backend's column limits before sending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewEvent {
    pub dev_id: u64,
    pub user_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_time: Option<String>,
    pub loc_name: String,
    pub company: String,
    pub comment: String,
}

impl NewEvent {
    pub fn new(dev_id: u64, user_id: u64, loc_name: &str, company: &str, comment: &str) -> Self {
        Self {
            dev_id,
            user_id,
            move_time: None,
            loc_name: truncate_chars(loc_name, LOC_NAME_MAX),
            company: truncate_chars(company, COMPANY_MAX),
            comment: truncate_chars(comment, COMMENT_MAX),
        }
    }

    /// Record the move at `at` instead of letting the backend stamp it.
    pub fn at(mut self, at: DateTime<Utc>) -> Self {
        self.move_time = Some(at.format("%Y-%m-%dT%H:%M:%S").to_string());
        self
    }
}

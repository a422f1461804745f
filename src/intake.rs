//! Work request intake
//!
//! Validates submitted work requests against the email domain allowlist and
//! turns them into chore stories for the tracker.

use crate::error::{Error, Result};
use serde::Deserialize;
use tracing::debug;

/// A work request as submitted by the request form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// A validated request, ready to be filed as a chore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chore {
    pub name: String,
    pub description: String,
}

/// Check that `email` has exactly one `@` and an allowed domain
pub fn is_allowed_email(email: &str, domains: &[String]) -> bool {
    let mut parts = email.split('@');
    let (Some(_name), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        debug!("email address malformed or not supported: {email}");
        return false;
    };

    if !domains.iter().any(|d| d == domain) {
        debug!("email address not allowed from: {email}");
        return false;
    }

    true
}

impl WorkRequest {
    /// Validate the request and compose the chore it files
    ///
    /// A description without a title gets a generated title. All field
    /// errors are reported together.
    pub fn into_chore(self, domains: &[String]) -> Result<Chore> {
        let email = self.email.trim();
        let description = self.description.trim();
        let mut title = self.title.trim().to_string();

        if !description.is_empty() && title.is_empty() {
            title = format!("request from {email}");
        }

        let mut errors = Vec::new();
        if email.is_empty() {
            errors.push("email: required".to_string());
        } else if !is_allowed_email(email, domains) {
            errors.push("email: invalid email address".to_string());
        }
        if title.is_empty() && description.is_empty() {
            errors.push("title: required".to_string());
        }
        if !errors.is_empty() {
            return Err(Error::validation(errors));
        }

        let description = if description.is_empty() {
            format!("requested by {email}")
        } else {
            format!("{email} requested:\n\n{description}")
        };

        Ok(Chore {
            name: title,
            description,
        })
    }
}

impl Chore {
    /// Name with runs of whitespace collapsed, for log lines
    pub fn summary(&self) -> String {
        self.name.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

//! SMS models
//!
//! `Sms` is what arrives from the outside world. `SmsRecord` is the
//! classified form that gets persisted: it carries the country reference and
//! the billable flag, both fixed at classification time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inbound SMS delivery event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sms {
    /// Sender identifier (alphanumeric sender id or number)
    pub sender: String,

    /// Recipient number, digits only by convention
    pub recipient: String,

    /// Message body
    #[serde(default)]
    pub text: String,

    /// When the message was sent
    #[serde(default = "Utc::now")]
    pub sent_at: DateTime<Utc>,
}

impl Sms {
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            text: text.into(),
            sent_at: Utc::now(),
        }
    }
}

/// Classified SMS as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsRecord {
    #[serde(flatten)]
    pub sms: Sms,

    /// Code of the matching country fee (weak reference, looked up on read)
    #[serde(default)]
    pub country_code: Option<String>,

    /// True iff a country fee matched when the message was classified
    #[serde(default, alias = "success")]
    pub billable: bool,
}

impl SmsRecord {
    pub fn sender(&self) -> &str {
        &self.sms.sender
    }

    /// Country code the message is billed to; `None` unless billable
    pub fn billed_code(&self) -> Option<&str> {
        if self.billable {
            self.country_code.as_deref()
        } else {
            None
        }
    }
}

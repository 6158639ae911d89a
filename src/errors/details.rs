//! Structured error details returned to clients.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Locale used when a message is coerced from an untyped error.
pub const DEFAULT_LOCALE: &str = "en-EN";

/// Details payload of an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Details {
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    domain: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    locale_messages: BTreeMap<String, String>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Details {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Add a human-readable message for `locale`, replacing any previous one.
    pub fn with_locale_message(mut self, locale: impl Into<String>, message: impl Into<String>) -> Self {
        self.locale_messages.insert(locale.into(), message.into());
        self
    }

    /// Add a free-form field. Empty strings and nulls are skipped.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        let empty = match &value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        };
        if !empty {
            self.fields.insert(key.into(), value);
        }
        self
    }

    pub fn service(&self) -> Option<&str> {
        self.service.as_deref()
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn locale_message(&self, locale: &str) -> Option<&str> {
        self.locale_messages.get(locale).map(String::as_str)
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

//! Access control for consumers
//!
//! Every consumer identity maps to an ordered list of operation-name patterns
//! (see [`Rule`]). The mapping is loaded once at startup and never changes.
//!
//! ```
//! use call_monitor::acl::{AccessController, AclError};
//!
//! let acl = AccessController::from_json(r#"{"alice": ["/main.Biz/Check"]}"#).unwrap();
//! assert!(acl.authorize(Some("alice"), "/main.Biz/Check").is_ok());
//! assert_eq!(
//!     acl.authorize(Some("alice"), "/main.Biz/Add"),
//!     Err(AclError::MethodAccessDenied)
//! );
//! ```

mod rule;

use std::collections::HashMap;

use thiserror::Error;

pub use rule::Rule;

/// Reasons a call is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AclError {
    #[error("consumer not provided")]
    ConsumerNotProvided,
    #[error("consumer not registered")]
    ConsumerNotRegistered,
    #[error("method access denied")]
    MethodAccessDenied,
}

/// Immutable consumer -> allowed-patterns mapping
#[derive(Debug, Clone, Default)]
pub struct AccessController {
    rules: HashMap<String, Vec<Rule>>,
}

impl AccessController {
    /// Build from an already-parsed mapping of consumer to pattern strings
    pub fn new(mapping: HashMap<String, Vec<String>>) -> Self {
        let rules = mapping
            .into_iter()
            .map(|(consumer, patterns)| {
                let rules = patterns.iter().map(|p| Rule::parse(p)).collect();
                (consumer, rules)
            })
            .collect();
        Self { rules }
    }

    /// Parse the JSON form: `{"consumer": ["pattern", ...], ...}`
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        let mapping: HashMap<String, Vec<String>> = serde_json::from_str(data)?;
        Ok(Self::new(mapping))
    }

    /// Decide whether `consumer` may invoke `method`
    ///
    /// `None` means the call carried no consumer metadata at all.
    pub fn authorize(&self, consumer: Option<&str>, method: &str) -> Result<(), AclError> {
        let consumer = consumer.ok_or(AclError::ConsumerNotProvided)?;
        let rules = self
            .rules
            .get(consumer)
            .ok_or(AclError::ConsumerNotRegistered)?;

        if rules.iter().any(|rule| rule.matches(method)) {
            Ok(())
        } else {
            Err(AclError::MethodAccessDenied)
        }
    }

    /// Number of registered consumers
    pub fn consumer_count(&self) -> usize {
        self.rules.len()
    }
}

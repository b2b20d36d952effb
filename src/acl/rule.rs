//! Operation-name patterns

use std::fmt;

/// One allowed-operation pattern from a consumer's access list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// `*` allows every operation
    Any,
    /// `prefix*` allows every operation starting with `prefix`
    Prefix(String),
    /// Anything else must equal the operation name
    Exact(String),
}

impl Rule {
    /// Parse a pattern as written in the access-control mapping
    pub fn parse(pattern: &str) -> Self {
        if pattern == "*" {
            return Rule::Any;
        }
        match pattern.strip_suffix('*') {
            Some(prefix) => Rule::Prefix(prefix.to_string()),
            None => Rule::Exact(pattern.to_string()),
        }
    }

    /// Check whether this rule admits the given operation name
    pub fn matches(&self, method: &str) -> bool {
        match self {
            Rule::Any => true,
            Rule::Prefix(prefix) => method.starts_with(prefix.as_str()),
            Rule::Exact(name) => name == method,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Any => write!(f, "*"),
            Rule::Prefix(prefix) => write!(f, "{}*", prefix),
            Rule::Exact(name) => write!(f, "{}", name),
        }
    }
}

//! The duplicate-value rule descriptor.
//!
//! A `RuleDescriptor` is built once (from defaults, the config file and CLI
//! flags) and passed by reference into the checker. Nothing here is global.

use enumlint_common::DiagnosticCategory;

use crate::detector::OptInMarker;

/// Default rule identifier.
pub const DEFAULT_RULE_ID: &str = "ENUM001";

/// Diagnostic property carrying the maximum value over all members.
pub const MAX_VALUE_PROPERTY: &str = "MaxValue";

/// Diagnostic property carrying the flagged member's name.
pub const MEMBER_NAME_PROPERTY: &str = "MemberName";

pub const DEFAULT_TITLE: &str = "Enum member values must be unique";

/// `{0}` is the member name.
pub const DEFAULT_MESSAGE_TEMPLATE: &str =
    "Enum member '{0}' has the same value as an earlier member.";

pub const DEFAULT_DESCRIPTION: &str = "Enums marked as unique must not assign the same \
     underlying value to more than one member.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleDescriptor {
    pub id: String,
    pub title: String,
    pub message_template: String,
    pub description: String,
    pub category: String,
    pub severity: DiagnosticCategory,
    pub marker: OptInMarker,
}

impl Default for RuleDescriptor {
    fn default() -> Self {
        RuleDescriptor {
            id: DEFAULT_RULE_ID.to_string(),
            title: DEFAULT_TITLE.to_string(),
            message_template: DEFAULT_MESSAGE_TEMPLATE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            category: "Naming".to_string(),
            severity: DiagnosticCategory::Error,
            marker: OptInMarker::default(),
        }
    }
}

impl RuleDescriptor {
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_severity(mut self, severity: DiagnosticCategory) -> Self {
        self.severity = severity;
        self
    }

    #[must_use]
    pub fn with_marker(mut self, marker: OptInMarker) -> Self {
        self.marker = marker;
        self
    }

    #[must_use]
    pub fn with_message_template(mut self, template: impl Into<String>) -> Self {
        self.message_template = template.into();
        self
    }
}

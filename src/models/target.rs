//! Scan target model: a named thing to be scanned, carrying the
//! identifiers the individual tools consume.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of identifier attached to a target. Each tool adapter consumes
/// only the kinds relevant to it and skips targets without them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    /// Base URL of a running web application.
    Url,
    /// npm package as `name@version` (scoped names supported).
    Npm,
    /// Source repository as `owner/repo`.
    Repository,
    /// Container image reference, e.g. `registry/app:1.2.3`.
    Container,
}

/// One `(kind, value)` identifier pair on a target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetIdentifier {
    pub kind: IdentifierKind,
    pub value: String,
}

/// A thing to be scanned. Immutable for the duration of a scan job;
/// may outlive many jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanTarget {
    pub id: Uuid,
    pub name: String,
    pub identifiers: Vec<TargetIdentifier>,
    pub created_at: DateTime<Utc>,
}

impl ScanTarget {
    /// All identifier values of the given kind, in declaration order.
    pub fn identifiers_of(&self, kind: IdentifierKind) -> Vec<&str> {
        self.identifiers
            .iter()
            .filter(|i| i.kind == kind)
            .map(|i| i.value.as_str())
            .collect()
    }

    /// First identifier value of the given kind, if any.
    pub fn first_identifier(&self, kind: IdentifierKind) -> Option<&str> {
        self.identifiers
            .iter()
            .find(|i| i.kind == kind)
            .map(|i| i.value.as_str())
    }
}

/// Request body for creating a target.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTarget {
    pub name: String,
    #[serde(default)]
    pub identifiers: Vec<TargetIdentifier>,
}

/// Request body for replacing a target's mutable fields.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTarget {
    pub name: Option<String>,
    pub identifiers: Option<Vec<TargetIdentifier>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target_with(identifiers: Vec<TargetIdentifier>) -> ScanTarget {
        ScanTarget {
            id: Uuid::new_v4(),
            name: "storefront".to_string(),
            identifiers,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn identifier_kind_serialization() {
        let json = serde_json::to_string(&IdentifierKind::Repository).unwrap();
        assert_eq!(json, "\"repository\"");
        let kind: IdentifierKind = serde_json::from_str("\"npm\"").unwrap();
        assert_eq!(kind, IdentifierKind::Npm);
    }

    #[test]
    fn identifiers_of_preserves_order() {
        let target = target_with(vec![
            TargetIdentifier {
                kind: IdentifierKind::Npm,
                value: "lodash@4.17.20".to_string(),
            },
            TargetIdentifier {
                kind: IdentifierKind::Url,
                value: "https://shop.example.com".to_string(),
            },
            TargetIdentifier {
                kind: IdentifierKind::Npm,
                value: "express@4.18.0".to_string(),
            },
        ]);
        assert_eq!(
            target.identifiers_of(IdentifierKind::Npm),
            vec!["lodash@4.17.20", "express@4.18.0"]
        );
    }

    #[test]
    fn first_identifier_missing_kind() {
        let target = target_with(vec![]);
        assert!(target.first_identifier(IdentifierKind::Url).is_none());
    }

    #[test]
    fn multiple_identifier_kinds_coexist() {
        let target = target_with(vec![
            TargetIdentifier {
                kind: IdentifierKind::Url,
                value: "https://shop.example.com".to_string(),
            },
            TargetIdentifier {
                kind: IdentifierKind::Container,
                value: "registry.example.com/shop:2.1".to_string(),
            },
        ]);
        assert_eq!(
            target.first_identifier(IdentifierKind::Url),
            Some("https://shop.example.com")
        );
        assert_eq!(
            target.first_identifier(IdentifierKind::Container),
            Some("registry.example.com/shop:2.1")
        );
    }
}

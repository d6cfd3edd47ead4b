use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sanitize::Sanitizer;

/// Lifecycle status of an architecture decision record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdrStatus {
    /// Being drafted, not yet circulated.
    Draft,
    /// Circulated for review.
    Proposed,
    /// Accepted as the current decision.
    Accepted,
    /// Replaced by a later decision.
    Superseded,
    /// No longer applicable.
    Deprecated,
    /// Reviewed and declined.
    Rejected,
}

impl AdrStatus {
    /// Returns the canonical lowercase string persisted by adapters.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Proposed => "proposed",
            Self::Accepted => "accepted",
            Self::Superseded => "superseded",
            Self::Deprecated => "deprecated",
            Self::Rejected => "rejected",
        }
    }
}

impl Default for AdrStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl fmt::Display for AdrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdrStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "proposed" => Ok(Self::Proposed),
            "accepted" => Ok(Self::Accepted),
            "superseded" => Ok(Self::Superseded),
            "deprecated" => Ok(Self::Deprecated),
            "rejected" => Ok(Self::Rejected),
            _ => Err(()),
        }
    }
}

/// An option weighed while making the decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdrOption {
    /// Short option name.
    pub name: String,
    /// What choosing this option would mean.
    pub description: String,
}

/// The chosen option and the reasoning behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdrDecision {
    /// Name of the option that was chosen.
    pub chosen_option: String,
    /// Why it was chosen.
    pub rationale: String,
}

/// External reference attached to an ADR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdrLink {
    /// Relationship of the link to the decision (e.g. `"supersedes"`).
    pub rel: String,
    /// Link target.
    pub href: String,
}

/// Structured ADR payload stored at each revision.
///
/// Free-text fields must pass through the sanitization policy before the
/// payload is persisted; [`Adr::sanitized`] is the single place that
/// applies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adr {
    /// Decision title.
    pub title: String,
    /// Lifecycle status.
    #[serde(default)]
    pub status: AdrStatus,
    /// Problem context the decision addresses.
    pub context: String,
    /// Forces and concerns driving the decision.
    #[serde(default)]
    pub decision_drivers: Vec<String>,
    /// Options that were considered.
    #[serde(default)]
    pub considered_options: Vec<AdrOption>,
    /// The outcome, once decided.
    #[serde(default)]
    pub decision_outcome: Option<AdrDecision>,
    /// Related references.
    #[serde(default)]
    pub links: Vec<AdrLink>,
}

impl Adr {
    /// Returns a copy with every free-text field passed through `policy`.
    #[must_use]
    pub fn sanitized(&self, policy: &dyn Sanitizer) -> Self {
        Self {
            title: policy.sanitize(&self.title),
            status: self.status,
            context: policy.sanitize(&self.context),
            decision_drivers: self
                .decision_drivers
                .iter()
                .map(|driver| policy.sanitize(driver))
                .collect(),
            considered_options: self
                .considered_options
                .iter()
                .map(|option| AdrOption {
                    name: policy.sanitize(&option.name),
                    description: policy.sanitize(&option.description),
                })
                .collect(),
            decision_outcome: self.decision_outcome.as_ref().map(|outcome| AdrDecision {
                chosen_option: policy.sanitize(&outcome.chosen_option),
                rationale: policy.sanitize(&outcome.rationale),
            }),
            links: self
                .links
                .iter()
                .map(|link| AdrLink {
                    rel: policy.sanitize(&link.rel),
                    href: policy.sanitize(&link.href),
                })
                .collect(),
        }
    }

    /// Returns a copy with only the status changed.
    #[must_use]
    pub fn with_status(&self, status: AdrStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

/// ADR identity within a namespace. Revision payloads are stored
/// separately, keyed by revision number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdrRecord {
    /// Counter-assigned identifier.
    pub id: u64,
    /// Owning namespace.
    pub namespace: String,
    /// Creation timestamp in UTC.
    pub created_at: DateTime<Utc>,
    /// Update timestamp in UTC.
    pub updated_at: DateTime<Utc>,
}

impl AdrRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(id: u64, namespace: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            namespace: namespace.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Updates the `updated_at` timestamp to the current time.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// One immutable revision of an ADR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdrRevision {
    /// Revision number, starting at 1.
    pub revision: u32,
    /// The payload written at this revision.
    pub adr: Adr,
}

/// ADR aggregate returned by catalog operations: the record plus one
/// materialized revision (the latest, unless a specific one was asked
/// for).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdrSnapshot {
    /// The ADR descriptor.
    pub record: AdrRecord,
    /// The materialized revision.
    pub revision: AdrRevision,
}

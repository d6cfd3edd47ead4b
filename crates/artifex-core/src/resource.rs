use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The five JSON-payload artifact kinds tracked under semantic versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Pattern,
    Architecture,
    Flow,
    Standard,
    Interface,
}

impl ArtifactKind {
    /// All artifact kinds, in catalog order.
    pub const ALL: [ArtifactKind; 5] = [
        Self::Pattern,
        Self::Architecture,
        Self::Flow,
        Self::Standard,
        Self::Interface,
    ];

    /// Singular kind name used in error messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::Architecture => "architecture",
            Self::Flow => "flow",
            Self::Standard => "standard",
            Self::Interface => "interface",
        }
    }

    /// Plural collection name used by storage adapters.
    #[must_use]
    pub const fn collection(&self) -> &'static str {
        match self {
            Self::Pattern => "patterns",
            Self::Architecture => "architectures",
            Self::Flow => "flows",
            Self::Standard => "standards",
            Self::Interface => "interfaces",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pattern" => Ok(Self::Pattern),
            "architecture" => Ok(Self::Architecture),
            "flow" => Ok(Self::Flow),
            "standard" => Ok(Self::Standard),
            "interface" => Ok(Self::Interface),
            _ => Err(()),
        }
    }
}

/// Resource kinds that own a sequence counter.
///
/// Identifier allocation is scoped per kind: two patterns never share an
/// id, while a pattern and a flow may.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SequenceKind {
    Pattern,
    Architecture,
    Flow,
    Standard,
    Interface,
    Adr,
    UserAccess,
}

impl SequenceKind {
    /// Canonical counter name persisted by storage adapters.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pattern => "patterns",
            Self::Architecture => "architectures",
            Self::Flow => "flows",
            Self::Standard => "standards",
            Self::Interface => "interfaces",
            Self::Adr => "adrs",
            Self::UserAccess => "user-access",
        }
    }
}

impl fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SequenceKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patterns" => Ok(Self::Pattern),
            "architectures" => Ok(Self::Architecture),
            "flows" => Ok(Self::Flow),
            "standards" => Ok(Self::Standard),
            "interfaces" => Ok(Self::Interface),
            "adrs" => Ok(Self::Adr),
            "user-access" => Ok(Self::UserAccess),
            _ => Err(()),
        }
    }
}

impl From<ArtifactKind> for SequenceKind {
    fn from(kind: ArtifactKind) -> Self {
        match kind {
            ArtifactKind::Pattern => Self::Pattern,
            ArtifactKind::Architecture => Self::Architecture,
            ArtifactKind::Flow => Self::Flow,
            ArtifactKind::Standard => Self::Standard,
            ArtifactKind::Interface => Self::Interface,
        }
    }
}

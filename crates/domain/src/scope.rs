//! Scope registry: the permission atoms a third-party client may request.
//!
//! The registry is static reference data. Every scope that appears in a code,
//! grant, or token must resolve here.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use trustline_core::{AppError, AppResult};

/// A named permission atom gating one field group or capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Scope {
    /// Basic profile: name, avatar, bio, handle, link.
    #[serde(rename = "profile:read")]
    ProfileRead,
    /// Private contact channel (email).
    #[serde(rename = "profile:email")]
    ProfileEmail,
    /// Hometown descriptor and coordinates.
    #[serde(rename = "hometown:read")]
    HometownRead,
    /// Bounded list of trust-tier connections.
    #[serde(rename = "connections:read")]
    ConnectionsRead,
    /// Recent public journal entries.
    #[serde(rename = "journal:read")]
    JournalRead,
    /// Degree-of-separation queries against the trust graph.
    #[serde(rename = "connections:degree")]
    ConnectionsDegree,
}

impl Scope {
    /// Returns the stable wire and storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProfileRead => "profile:read",
            Self::ProfileEmail => "profile:email",
            Self::HometownRead => "hometown:read",
            Self::ConnectionsRead => "connections:read",
            Self::JournalRead => "journal:read",
            Self::ConnectionsDegree => "connections:degree",
        }
    }

    /// Returns every registered scope.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Scope] = &[
            Scope::ProfileRead,
            Scope::ProfileEmail,
            Scope::HometownRead,
            Scope::ConnectionsRead,
            Scope::JournalRead,
            Scope::ConnectionsDegree,
        ];

        ALL
    }

    /// Returns the text shown on the consent screen.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::ProfileRead => "Read your name, avatar, bio, handle and profile link",
            Self::ProfileEmail => "Read your email address",
            Self::HometownRead => "Read your hometown and its coordinates",
            Self::ConnectionsRead => "Read the list of people you trust",
            Self::JournalRead => "Read your most recent public journal entries",
            Self::ConnectionsDegree => {
                "See how many hops of trust separate you from another member"
            }
        }
    }

    /// Returns the display grouping of this scope.
    #[must_use]
    pub fn category(&self) -> ScopeCategory {
        match self {
            Self::ProfileRead => ScopeCategory::Profile,
            Self::ProfileEmail => ScopeCategory::Contact,
            Self::HometownRead => ScopeCategory::Location,
            Self::ConnectionsRead | Self::ConnectionsDegree => ScopeCategory::Social,
            Self::JournalRead => ScopeCategory::Content,
        }
    }

    /// Returns the consent-screen descriptor for this scope.
    #[must_use]
    pub fn descriptor(&self) -> ScopeDescriptor {
        ScopeDescriptor {
            name: self.as_str(),
            description: self.description(),
            category: self.category(),
        }
    }
}

impl FromStr for Scope {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|scope| scope.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown scope '{value}'")))
    }
}

/// Display grouping used by consent screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeCategory {
    /// Public profile fields.
    Profile,
    /// Private contact channels.
    Contact,
    /// Location data.
    Location,
    /// Trust graph data.
    Social,
    /// Authored content.
    Content,
}

impl ScopeCategory {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Contact => "contact",
            Self::Location => "location",
            Self::Social => "social",
            Self::Content => "content",
        }
    }
}

/// Human readable description of one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScopeDescriptor {
    /// Wire name of the scope.
    pub name: &'static str,
    /// Consent-screen text.
    pub description: &'static str,
    /// Display grouping.
    pub category: ScopeCategory,
}

/// Ordered, duplicate-free set of scopes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSet(BTreeSet<Scope>);

impl ScopeSet {
    /// Creates an empty scope set.
    #[must_use]
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Parses a space-delimited scope parameter.
    ///
    /// Any unknown atom rejects the whole parameter; an empty parameter is
    /// rejected as well.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let scopes = raw
            .split(' ')
            .filter(|atom| !atom.is_empty())
            .map(Scope::from_str)
            .collect::<AppResult<BTreeSet<_>>>()?;

        if scopes.is_empty() {
            return Err(AppError::Validation(
                "scope parameter must name at least one scope".to_owned(),
            ));
        }

        Ok(Self(scopes))
    }

    /// Rebuilds a scope set from persisted scope names.
    ///
    /// Unknown names mean the registry and the store disagree, which is an
    /// internal fault rather than a caller error.
    pub fn from_storage<I, S>(values: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        values
            .into_iter()
            .map(|value| {
                Scope::from_str(value.as_ref()).map_err(|_| {
                    AppError::Internal(format!(
                        "persisted scope '{}' is not registered",
                        value.as_ref()
                    ))
                })
            })
            .collect::<AppResult<BTreeSet<_>>>()
            .map(Self)
    }

    /// Returns whether the set carries the scope.
    #[must_use]
    pub fn contains(&self, scope: Scope) -> bool {
        self.0.contains(&scope)
    }

    /// Returns the scopes present in both sets.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        Self(self.0.intersection(&other.0).copied().collect())
    }

    /// Returns whether every scope of `self` is also in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates the scopes in registry order.
    pub fn iter(&self) -> impl Iterator<Item = Scope> + '_ {
        self.0.iter().copied()
    }

    /// Returns the persisted representation.
    #[must_use]
    pub fn to_storage(&self) -> Vec<String> {
        self.iter().map(|scope| scope.as_str().to_owned()).collect()
    }

    /// Returns the space-delimited wire representation.
    #[must_use]
    pub fn to_scope_string(&self) -> String {
        self.iter()
            .map(|scope| scope.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Returns consent-screen descriptors in registry order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<ScopeDescriptor> {
        self.iter().map(|scope| scope.descriptor()).collect()
    }
}

impl FromIterator<Scope> for ScopeSet {
    fn from_iter<T: IntoIterator<Item = Scope>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

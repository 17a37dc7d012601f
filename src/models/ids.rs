//! Opaque identifiers and owner scopes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares an opaque string identifier with the usual conversions.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of a catalog asset (photo or video).
    AssetId
);

string_id!(
    /// Identifier of a stored face record.
    FaceId
);

string_id!(
    /// Identifier of a principal whose assets may be searched.
    OwnerId
);

string_id!(
    /// Identifier of a recognized person.
    PersonId
);

/// The set of owners whose assets are eligible for a search.
///
/// Keeps insertion order and drops duplicates, so logs and index queries see
/// a stable list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerScope(Vec<OwnerId>);

impl OwnerScope {
    /// Creates an empty scope.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates a scope containing a single owner.
    #[must_use]
    pub fn single(owner: impl Into<OwnerId>) -> Self {
        Self(vec![owner.into()])
    }

    /// Adds an owner, ignoring duplicates.
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<OwnerId>) -> Self {
        self.insert(owner.into());
        self
    }

    /// Inserts an owner, returning `false` when it was already present.
    pub fn insert(&mut self, owner: OwnerId) -> bool {
        if self.0.contains(&owner) {
            return false;
        }
        self.0.push(owner);
        true
    }

    /// Returns true if the owner is part of the scope.
    #[must_use]
    pub fn contains(&self, owner: &OwnerId) -> bool {
        self.0.contains(owner)
    }

    /// Number of owners in scope.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no owner is in scope.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates owners in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &OwnerId> {
        self.0.iter()
    }
}

impl<T: Into<OwnerId>> FromIterator<T> for OwnerScope {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut scope = Self::new();
        for owner in iter {
            scope.insert(owner.into());
        }
        scope
    }
}

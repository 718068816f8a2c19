//! Polymorphic references to linkable host entities
//!
//! The link tables only know a `(linkable_type, linkable_id)` pair. Hosts describe
//! their linkable entities with a kind enum implementing [`LinkableKind`], and turn
//! references back into entities with a [`LinkableResolver`].

use crate::error::LinksError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// The kinds of entity a host allows inside link groups.
pub trait LinkableKind: Clone + Eq + Hash + fmt::Debug + Send + Sync {
    /// Stable tag persisted in `link_group_items.linkable_type`.
    fn tag(&self) -> &str;

    fn from_tag(tag: &str) -> Option<Self>;
}

/// Identity of a linkable entity: its kind plus its primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkableRef<K> {
    pub kind: K,
    pub id: i64,
}

impl<K: LinkableKind> LinkableRef<K> {
    pub fn new(kind: K, id: i64) -> Self {
        Self { kind, id }
    }

    /// Parse a stored `(linkable_type, linkable_id)` pair.
    pub fn from_parts(tag: &str, id: i64) -> Option<Self> {
        K::from_tag(tag).map(|kind| Self { kind, id })
    }

    pub fn matches(&self, tag: &str, id: i64) -> bool {
        self.id == id && self.kind.tag() == tag
    }
}

impl<K: LinkableKind> fmt::Display for LinkableRef<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.tag(), self.id)
    }
}

/// Anything that can be placed into a link group.
pub trait Linkable {
    type Kind: LinkableKind;

    fn link_ref(&self) -> LinkableRef<Self::Kind>;
}

impl<K: LinkableKind> Linkable for LinkableRef<K> {
    type Kind = K;

    fn link_ref(&self) -> LinkableRef<K> {
        self.clone()
    }
}

impl<T: Linkable + ?Sized> Linkable for &T {
    type Kind = T::Kind;

    fn link_ref(&self) -> LinkableRef<T::Kind> {
        (**self).link_ref()
    }
}

/// Loads concrete host entities for a batch of ids of one kind.
#[async_trait]
pub trait LinkableResolver: Send + Sync {
    type Kind: LinkableKind;
    type Entity: Send;

    async fn resolve(&self, kind: Self::Kind, ids: &[i64]) -> Result<Vec<Self::Entity>, LinksError>;
}

/// Free-form kind for callers that only know the stored tag, e.g. the admin CLI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawKind(String);

impl RawKind {
    pub fn new(tag: &str) -> Self {
        RawKind(tag.to_string())
    }
}

impl LinkableKind for RawKind {
    fn tag(&self) -> &str {
        &self.0
    }

    fn from_tag(tag: &str) -> Option<Self> {
        Some(RawKind::new(tag))
    }
}

//! Fluent lookup of links and link groups
//!
//! ```ignore
//! let get = Get::new(pool).with_properties(resolver);
//! let variants = get.the("variant").await?.links().based_on("screen").of(&product).await?;
//! let series = get.the("series").await?.groups().of(&product).await?;
//! ```

use crate::config::LinksConfig;
use crate::error::LinksError;
use crate::linkable::{Linkable, LinkableKind, LinkableRef, LinkableResolver};
use crate::models::{LinkGroup, LinkGroupItem, LinkType, LinkTypeKey};
use crate::property::{resolve_filter, PropertyFilter, PropertyResolver, TablePropertyResolver};
use sqlx::PgPool;
use std::collections::HashSet;
use std::sync::Arc;

/// Entry point for link queries. Cheap to clone.
#[derive(Clone)]
pub struct Get {
    pool: PgPool,
    properties: Option<Arc<dyn PropertyResolver>>,
}

impl Get {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            properties: None,
        }
    }

    /// Enable `based_on("slug")` filters.
    pub fn with_properties(mut self, resolver: Arc<dyn PropertyResolver>) -> Self {
        self.properties = Some(resolver);
        self
    }

    /// Wire up the table-backed property resolver when `[properties]` is configured.
    pub fn from_config(pool: PgPool, config: &LinksConfig) -> Result<Self, LinksError> {
        let get = Self::new(pool.clone());
        match &config.properties {
            Some(props) => {
                let resolver = TablePropertyResolver::from_config(pool, props)?;
                Ok(get.with_properties(Arc::new(resolver)))
            }
            None => Ok(get),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Resolve the link type by slug or id.
    pub async fn the(&self, key: impl Into<LinkTypeKey>) -> Result<TypeHandle<'_>, LinksError> {
        let key = key.into();
        let link_type = LinkType::find_by_key(&self.pool, &key)
            .await?
            .ok_or_else(|| LinksError::LinkTypeNotFound(key.to_string()))?;
        Ok(TypeHandle {
            get: self,
            link_type,
        })
    }

    /// Shorthand for `the(slug).links()`.
    pub async fn links(&self, slug: &str) -> Result<LinksQuery<'_>, LinksError> {
        Ok(self.the(slug).await?.links())
    }

    /// Shorthand for `the(slug).groups()`.
    pub async fn groups(&self, slug: &str) -> Result<GroupsQuery<'_>, LinksError> {
        Ok(self.the(slug).await?.groups())
    }
}

pub struct TypeHandle<'a> {
    get: &'a Get,
    link_type: LinkType,
}

impl<'a> TypeHandle<'a> {
    pub fn link_type(&self) -> &LinkType {
        &self.link_type
    }

    pub fn links(self) -> LinksQuery<'a> {
        LinksQuery {
            scope: self.into_scope(),
        }
    }

    pub fn groups(self) -> GroupsQuery<'a> {
        GroupsQuery {
            scope: self.into_scope(),
        }
    }

    fn into_scope(self) -> Scope<'a> {
        Scope {
            get: self.get,
            link_type: self.link_type,
            property: None,
        }
    }
}

struct Scope<'a> {
    get: &'a Get,
    link_type: LinkType,
    property: Option<PropertyFilter>,
}

impl Scope<'_> {
    async fn groups_of<L: Linkable>(&self, subject: &L) -> Result<Vec<LinkGroup>, LinksError> {
        let property_id = match &self.property {
            Some(filter) => Some(resolve_filter(filter, self.get.properties.as_deref()).await?),
            None => None,
        };

        let groups =
            LinkGroup::containing(&self.get.pool, self.link_type.id, property_id, subject).await?;

        tracing::debug!(
            link_type = %self.link_type.slug,
            property_id = ?property_id,
            subject = %subject.link_ref(),
            groups = groups.len(),
            "Resolved link groups of subject"
        );

        Ok(groups)
    }
}

/// Query for the entities linked to a subject.
pub struct LinksQuery<'a> {
    scope: Scope<'a>,
}

impl LinksQuery<'_> {
    pub fn link_type(&self) -> &LinkType {
        &self.scope.link_type
    }

    /// Only consider groups of the given property.
    pub fn based_on(mut self, property: impl Into<PropertyFilter>) -> Self {
        self.scope.property = Some(property.into());
        self
    }

    /// References to every other member of the subject's groups.
    pub async fn of<L: Linkable>(
        &self,
        subject: &L,
    ) -> Result<Vec<LinkableRef<L::Kind>>, LinksError> {
        let groups = self.scope.groups_of(subject).await?;
        if groups.is_empty() {
            return Ok(vec![]);
        }

        let group_ids: Vec<i64> = groups.iter().map(|g| g.id).collect();
        let items = LinkGroupItem::of_groups(&self.scope.get.pool, &group_ids).await?;

        Ok(partners_of(&subject.link_ref(), &items))
    }

    /// Like [`of`](Self::of), but loads the linked entities through `resolver`,
    /// one batch per kind.
    pub async fn of_resolved<L, R>(&self, subject: &L, resolver: &R) -> Result<Vec<R::Entity>, LinksError>
    where
        L: Linkable,
        R: LinkableResolver<Kind = L::Kind>,
    {
        let refs = self.of(subject).await?;

        let mut entities = Vec::with_capacity(refs.len());
        for (kind, ids) in batch_by_kind(refs) {
            entities.extend(resolver.resolve(kind, &ids).await?);
        }
        Ok(entities)
    }
}

/// Query for the link groups a subject belongs to.
pub struct GroupsQuery<'a> {
    scope: Scope<'a>,
}

impl GroupsQuery<'_> {
    pub fn link_type(&self) -> &LinkType {
        &self.scope.link_type
    }

    pub fn based_on(mut self, property: impl Into<PropertyFilter>) -> Self {
        self.scope.property = Some(property.into());
        self
    }

    pub async fn of<L: Linkable>(&self, subject: &L) -> Result<Vec<LinkGroup>, LinksError> {
        self.scope.groups_of(subject).await
    }
}

/// Members of the loaded items other than `subject`, deduplicated in first-seen order.
///
/// Items whose tag is not a `K` belong to another kind set and are skipped.
pub fn partners_of<K: LinkableKind>(
    subject: &LinkableRef<K>,
    items: &[LinkGroupItem],
) -> Vec<LinkableRef<K>> {
    let mut seen = HashSet::new();
    let mut partners = Vec::new();

    for item in items {
        if item.points_to(subject) {
            continue;
        }
        match item.linkable::<K>() {
            Some(partner) => {
                if seen.insert(partner.clone()) {
                    partners.push(partner);
                }
            }
            None => {
                tracing::warn!(
                    item_id = item.id,
                    linkable_type = %item.linkable_type,
                    "Skipping link group item of unknown kind"
                );
            }
        }
    }

    partners
}

/// Group refs by kind, keeping kinds and ids in first-seen order.
fn batch_by_kind<K: LinkableKind>(refs: Vec<LinkableRef<K>>) -> Vec<(K, Vec<i64>)> {
    let mut batches: Vec<(K, Vec<i64>)> = Vec::new();
    for r in refs {
        match batches.iter().position(|(kind, _)| *kind == r.kind) {
            Some(i) => batches[i].1.push(r.id),
            None => batches.push((r.kind, vec![r.id])),
        }
    }
    batches
}

// ============================================================================
// TESTS
// ============================================================================

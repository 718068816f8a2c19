//! Removal of links between a base model and other models
//!
//! `EliminateLinks::new(pool, &upsell).between(&shoe).and(&[sock, lace]).await?`
//! drops the socks and laces from every upsell group the shoe is in. Groups that
//! end up empty are kept.

use crate::error::LinksError;
use crate::linkable::{Linkable, LinkableKind, LinkableRef};
use crate::models::{LinkGroup, LinkGroupItem, LinkType};
use sqlx::PgPool;

pub struct EliminateLinks<'a> {
    pool: &'a PgPool,
    link_type: &'a LinkType,
}

impl<'a> EliminateLinks<'a> {
    pub fn new(pool: &'a PgPool, link_type: &'a LinkType) -> Self {
        Self { pool, link_type }
    }

    /// Set the base model whose groups are affected.
    pub fn between<L: Linkable>(self, base: &L) -> EliminateLinksBetween<'a, L::Kind> {
        EliminateLinksBetween {
            pool: self.pool,
            link_type: self.link_type,
            base: base.link_ref(),
        }
    }
}

pub struct EliminateLinksBetween<'a, K> {
    pool: &'a PgPool,
    link_type: &'a LinkType,
    base: LinkableRef<K>,
}

impl<K: LinkableKind> EliminateLinksBetween<'_, K> {
    /// Remove `models` from the base's groups. Returns the number of items deleted.
    pub async fn and<I, L>(&self, models: I) -> Result<u64, LinksError>
    where
        I: IntoIterator<Item = L>,
        L: Linkable<Kind = K>,
    {
        let targets: Vec<LinkableRef<K>> = models.into_iter().map(|m| m.link_ref()).collect();
        if targets.is_empty() {
            return Ok(0);
        }

        let groups = LinkGroup::containing(self.pool, self.link_type.id, None, &self.base).await?;
        let group_ids: Vec<i64> = groups.iter().map(|g| g.id).collect();
        let items = LinkGroupItem::of_groups(self.pool, &group_ids).await?;

        let doomed = items_to_eliminate(&items, &targets);
        let removed = LinkGroupItem::delete_many(self.pool, &doomed).await?;

        if removed > 0 {
            tracing::info!(
                link_type = %self.link_type.slug,
                base = %self.base,
                groups = group_ids.len(),
                removed,
                "Eliminated links"
            );
        }

        Ok(removed)
    }
}

/// Ids of the items that point to any of `targets`.
pub fn items_to_eliminate<K: LinkableKind>(
    items: &[LinkGroupItem],
    targets: &[LinkableRef<K>],
) -> Vec<i64> {
    items
        .iter()
        .filter(|item| targets.iter().any(|target| item.points_to(target)))
        .map(|item| item.id)
        .collect()
}

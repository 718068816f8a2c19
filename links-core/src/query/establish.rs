//! Creation of links between a base model and other models
//!
//! Links are added to the base's existing group of the same type, property and
//! direction; a new group is opened when there is none.

use crate::error::LinksError;
use crate::linkable::{Linkable, LinkableKind, LinkableRef};
use crate::models::{LinkGroup, LinkGroupItem, LinkType, NewLinkGroup};
use crate::property::{resolve_filter, PropertyFilter, PropertyResolver};
use sqlx::PgPool;
use std::collections::HashSet;

pub struct Establish<'a> {
    pool: &'a PgPool,
    link_type: &'a LinkType,
    property: Option<PropertyFilter>,
    properties: Option<&'a dyn PropertyResolver>,
    unidirectional: bool,
}

impl<'a> Establish<'a> {
    pub fn new(pool: &'a PgPool, link_type: &'a LinkType) -> Self {
        Self {
            pool,
            link_type,
            property: None,
            properties: None,
            unidirectional: false,
        }
    }

    pub fn based_on(mut self, property: impl Into<PropertyFilter>) -> Self {
        self.property = Some(property.into());
        self
    }

    /// Needed when `based_on` is given a slug.
    pub fn using_properties(mut self, resolver: &'a dyn PropertyResolver) -> Self {
        self.properties = Some(resolver);
        self
    }

    /// The base becomes the root of the group; the other models are its satellites.
    pub fn unidirectional(mut self) -> Self {
        self.unidirectional = true;
        self
    }

    pub fn between<L: Linkable>(self, base: &L) -> EstablishBetween<'a, L::Kind> {
        EstablishBetween {
            establish: self,
            base: base.link_ref(),
        }
    }
}

pub struct EstablishBetween<'a, K> {
    establish: Establish<'a>,
    base: LinkableRef<K>,
}

impl<K: LinkableKind> EstablishBetween<'_, K> {
    /// Link the base with `models`. Returns the group holding the links.
    pub async fn and<I, L>(&self, models: I) -> Result<LinkGroup, LinksError>
    where
        I: IntoIterator<Item = L>,
        L: Linkable<Kind = K>,
    {
        let e = &self.establish;
        let property_id = match &e.property {
            Some(filter) => Some(resolve_filter(filter, e.properties).await?),
            None => None,
        };

        let mut tx = e.pool.begin().await?;

        let candidates =
            LinkGroup::containing(&mut *tx, e.link_type.id, property_id, &self.base).await?;
        let candidate_ids: Vec<i64> = candidates.iter().map(|g| g.id).collect();
        let items = LinkGroupItem::of_groups(&mut *tx, &candidate_ids).await?;

        let existing = candidates.into_iter().find(|group| {
            group.property_id == property_id
                && if e.unidirectional {
                    group.is_rooted_at(&items, &self.base)
                } else {
                    group.is_omnidirectional()
                }
        });

        let mut group = match existing {
            Some(group) => group,
            None => {
                LinkGroup::create(
                    &mut *tx,
                    NewLinkGroup {
                        link_type_id: e.link_type.id,
                        property_id,
                    },
                )
                .await?
            }
        };

        let base_item = LinkGroupItem::create(&mut *tx, group.id, &self.base).await?;
        if e.unidirectional && group.root_item_id.is_none() {
            group.set_root_item(&mut *tx, Some(&base_item)).await?;
        }

        let models = models.into_iter().map(|model| model.link_ref());
        let added = members_to_add(group.id, &items, &self.base, models);
        for model in &added {
            LinkGroupItem::create(&mut *tx, group.id, model).await?;
        }

        tx.commit().await?;

        tracing::info!(
            link_type = %e.link_type.slug,
            group_id = group.id,
            base = %self.base,
            models = added.len(),
            unidirectional = e.unidirectional,
            "Established links"
        );

        Ok(group)
    }
}

/// Models not yet in group `group_id`, without the base and without repeats.
pub fn members_to_add<K: LinkableKind>(
    group_id: i64,
    items: &[LinkGroupItem],
    base: &LinkableRef<K>,
    models: impl IntoIterator<Item = LinkableRef<K>>,
) -> Vec<LinkableRef<K>> {
    let mut seen = HashSet::from([base.clone()]);
    models
        .into_iter()
        .filter(|model| {
            !items.iter().any(|item| {
                item.link_group_id == group_id && model.matches(&item.linkable_type, item.linkable_id)
            })
        })
        .filter(|model| seen.insert(model.clone()))
        .collect()
}

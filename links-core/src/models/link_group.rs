use super::link_group_item::LinkGroupItem;
use crate::error::LinksError;
use crate::linkable::{Linkable, LinkableKind as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

pub(crate) const COLUMNS: &str =
    "id, link_type_id, property_id, root_item_id, created_at, updated_at";

/// One concrete relationship of a link type.
///
/// A group with a root item is unidirectional (the root links to its satellites);
/// without one every member links to every other member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LinkGroup {
    pub id: i64,
    pub link_type_id: i64,
    pub property_id: Option<i64>,
    pub root_item_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewLinkGroup {
    pub link_type_id: i64,
    pub property_id: Option<i64>,
}

impl LinkGroup {
    pub fn is_unidirectional(&self) -> bool {
        self.root_item_id.is_some()
    }

    pub fn is_omnidirectional(&self) -> bool {
        self.root_item_id.is_none()
    }

    pub async fn create<'e, E>(executor: E, new: NewLinkGroup) -> Result<LinkGroup, LinksError>
    where
        E: PgExecutor<'e>,
    {
        let group: LinkGroup = sqlx::query_as(&format!(
            "INSERT INTO link_groups (link_type_id, property_id) VALUES ($1, $2) RETURNING {COLUMNS}"
        ))
        .bind(new.link_type_id)
        .bind(new.property_id)
        .fetch_one(executor)
        .await?;

        tracing::debug!(
            id = group.id,
            link_type_id = group.link_type_id,
            property_id = ?group.property_id,
            "Created link group"
        );

        Ok(group)
    }

    pub async fn find(pool: &PgPool, id: i64) -> Result<Option<LinkGroup>, LinksError> {
        let row = sqlx::query_as(&format!("SELECT {COLUMNS} FROM link_groups WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    /// Groups of a link type (optionally of one property) that contain `model`.
    pub async fn containing<'e, E, L>(
        executor: E,
        link_type_id: i64,
        property_id: Option<i64>,
        model: &L,
    ) -> Result<Vec<LinkGroup>, LinksError>
    where
        E: PgExecutor<'e>,
        L: Linkable,
    {
        let member = model.link_ref();
        let rows = sqlx::query_as(&format!(
            r#"
            SELECT {COLUMNS}
            FROM link_groups g
            WHERE g.link_type_id = $1
              AND ($2::BIGINT IS NULL OR g.property_id = $2)
              AND EXISTS (
                  SELECT 1
                  FROM link_group_items i
                  WHERE i.link_group_id = g.id
                    AND i.linkable_type = $3
                    AND i.linkable_id = $4
              )
            ORDER BY g.id
            "#
        ))
        .bind(link_type_id)
        .bind(property_id)
        .bind(member.kind.tag())
        .bind(member.id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn items(&self, pool: &PgPool) -> Result<Vec<LinkGroupItem>, LinksError> {
        LinkGroupItem::of_groups(pool, &[self.id]).await
    }

    pub async fn is_empty(&self, pool: &PgPool) -> Result<bool, LinksError> {
        let row: (bool,) = sqlx::query_as(
            "SELECT NOT EXISTS (SELECT 1 FROM link_group_items WHERE link_group_id = $1)",
        )
        .bind(self.id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    pub async fn root_item(&self, pool: &PgPool) -> Result<Option<LinkGroupItem>, LinksError> {
        match self.root_item_id {
            Some(id) => LinkGroupItem::find(pool, id).await,
            None => Ok(None),
        }
    }

    /// Make `item` the root, turning the group unidirectional. `None` clears it.
    pub async fn set_root_item<'e, E>(
        &mut self,
        executor: E,
        item: Option<&LinkGroupItem>,
    ) -> Result<(), LinksError>
    where
        E: PgExecutor<'e>,
    {
        if let Some(item) = item {
            if item.link_group_id != self.id {
                return Err(LinksError::Other(format!(
                    "item {} belongs to link group {}, not {}",
                    item.id, item.link_group_id, self.id
                )));
            }
        }

        let updated: LinkGroup = sqlx::query_as(&format!(
            "UPDATE link_groups SET root_item_id = $1, updated_at = now() WHERE id = $2 RETURNING {COLUMNS}"
        ))
        .bind(item.map(|i| i.id))
        .bind(self.id)
        .fetch_one(executor)
        .await?;

        *self = updated;
        Ok(())
    }

    /// Delete the group; its items go with it.
    pub async fn delete(self, pool: &PgPool) -> Result<(), LinksError> {
        sqlx::query("DELETE FROM link_groups WHERE id = $1")
            .bind(self.id)
            .execute(pool)
            .await?;
        tracing::info!(id = self.id, "Deleted link group");
        Ok(())
    }

    /// Whether `model` is the root of this group, given its loaded items.
    pub fn is_rooted_at<L: Linkable>(
        &self,
        items: &[LinkGroupItem],
        model: &L,
    ) -> bool {
        match self.root_item_id {
            Some(root_id) => items
                .iter()
                .any(|item| item.id == root_id && item.points_to(model)),
            None => false,
        }
    }
}

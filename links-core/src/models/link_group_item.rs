use crate::error::LinksError;
use crate::linkable::{Linkable, LinkableKind, LinkableRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

pub(crate) const COLUMNS: &str =
    "id, link_group_id, linkable_type, linkable_id, created_at, updated_at";

/// One polymorphic member of a link group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LinkGroupItem {
    pub id: i64,
    pub link_group_id: i64,
    pub linkable_type: String,
    pub linkable_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl LinkGroupItem {
    pub fn points_to<L: Linkable>(&self, model: &L) -> bool {
        model.link_ref().matches(&self.linkable_type, self.linkable_id)
    }

    /// The member as a typed reference; `None` if its tag is not a `K`.
    pub fn linkable<K: LinkableKind>(&self) -> Option<LinkableRef<K>> {
        LinkableRef::from_parts(&self.linkable_type, self.linkable_id)
    }

    /// Add `model` to a group. Adding an existing member returns the existing row.
    pub async fn create<'e, E, L>(
        executor: E,
        link_group_id: i64,
        model: &L,
    ) -> Result<LinkGroupItem, LinksError>
    where
        E: PgExecutor<'e>,
        L: Linkable,
    {
        let member = model.link_ref();
        let item: LinkGroupItem = sqlx::query_as(&format!(
            r#"
            INSERT INTO link_group_items (link_group_id, linkable_type, linkable_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (link_group_id, linkable_type, linkable_id)
            DO UPDATE SET linkable_id = EXCLUDED.linkable_id
            RETURNING {COLUMNS}
            "#
        ))
        .bind(link_group_id)
        .bind(member.kind.tag())
        .bind(member.id)
        .fetch_one(executor)
        .await?;

        tracing::debug!(
            link_group_id,
            item_id = item.id,
            member = %member.kind.tag(),
            member_id = member.id,
            "Added link group item"
        );

        Ok(item)
    }

    pub async fn find(pool: &PgPool, id: i64) -> Result<Option<LinkGroupItem>, LinksError> {
        let row = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM link_group_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    /// Items of all the given groups, ordered by group then insertion.
    pub async fn of_groups<'e, E>(
        executor: E,
        group_ids: &[i64],
    ) -> Result<Vec<LinkGroupItem>, LinksError>
    where
        E: PgExecutor<'e>,
    {
        if group_ids.is_empty() {
            return Ok(vec![]);
        }
        let rows = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM link_group_items WHERE link_group_id = ANY($1) ORDER BY link_group_id, id"
        ))
        .bind(group_ids)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// Delete items by id, returning how many rows went away.
    pub async fn delete_many<'e, E>(executor: E, ids: &[i64]) -> Result<u64, LinksError>
    where
        E: PgExecutor<'e>,
    {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM link_group_items WHERE id = ANY($1)")
            .bind(ids)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}

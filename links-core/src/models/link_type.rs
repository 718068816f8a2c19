use crate::error::LinksError;
use crate::slug::{slugify, unique_slug};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

const COLUMNS: &str = "id, name, slug, is_active, created_at, updated_at";

/// A named category of relationship ("series", "variant", "upsell", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LinkType {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewLinkType {
    pub name: String,
    /// Stored verbatim when given; otherwise derived from `name`.
    pub slug: Option<String>,
    /// Defaults to active.
    pub is_active: Option<bool>,
}

impl NewLinkType {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }
}

/// How a link type is addressed: primary key or slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTypeKey {
    Id(i64),
    Slug(String),
    /// A digit-only value that may be either; the slug wins when both exist.
    IdOrSlug(i64, String),
}

impl From<i64> for LinkTypeKey {
    fn from(id: i64) -> Self {
        LinkTypeKey::Id(id)
    }
}

impl From<&str> for LinkTypeKey {
    fn from(slug: &str) -> Self {
        LinkTypeKey::Slug(slug.to_string())
    }
}

impl From<String> for LinkTypeKey {
    fn from(slug: String) -> Self {
        LinkTypeKey::Slug(slug)
    }
}

impl From<&LinkType> for LinkTypeKey {
    fn from(link_type: &LinkType) -> Self {
        LinkTypeKey::Id(link_type.id)
    }
}

impl LinkTypeKey {
    /// Interpret a command-line value. Slugs such as `2015` are all digits, so a
    /// numeric value matches by id or by slug.
    pub fn parse(value: &str) -> Self {
        match value.parse::<i64>() {
            Ok(id) => LinkTypeKey::IdOrSlug(id, value.to_string()),
            Err(_) => LinkTypeKey::Slug(value.to_string()),
        }
    }

    fn matches(&self, link_type: &LinkType) -> bool {
        match self {
            LinkTypeKey::Id(id) => link_type.id == *id,
            LinkTypeKey::Slug(slug) => link_type.slug == *slug,
            LinkTypeKey::IdOrSlug(id, slug) => link_type.id == *id || link_type.slug == *slug,
        }
    }
}

impl std::fmt::Display for LinkTypeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkTypeKey::Id(id) => write!(f, "#{id}"),
            LinkTypeKey::Slug(slug) | LinkTypeKey::IdOrSlug(_, slug) => f.write_str(slug),
        }
    }
}

/// Which inactive link types `choices` should list next to the active ones.
#[derive(Debug, Clone, Default)]
pub enum IncludeInactive {
    #[default]
    None,
    All,
    Only(Vec<LinkTypeKey>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ChoiceKey {
    Id(i64),
    Slug(String),
}

impl LinkType {
    pub async fn create(pool: &PgPool, new: NewLinkType) -> Result<LinkType, LinksError> {
        let slug = match new.slug {
            Some(slug) => slug,
            None => {
                let base = slugify(&new.name);
                let taken = Self::slugs_like(pool, &base).await?;
                unique_slug(&base, &taken)
            }
        };

        let link_type: LinkType = sqlx::query_as(&format!(
            "INSERT INTO link_types (name, slug, is_active) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&slug)
        .bind(new.is_active.unwrap_or(true))
        .fetch_one(pool)
        .await?;

        tracing::info!(
            id = link_type.id,
            slug = %link_type.slug,
            "Created link type"
        );

        Ok(link_type)
    }

    pub async fn find(pool: &PgPool, id: i64) -> Result<Option<LinkType>, LinksError> {
        let row = sqlx::query_as(&format!("SELECT {COLUMNS} FROM link_types WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    /// All link types whose slug equals `slug`.
    pub async fn by_slug(pool: &PgPool, slug: &str) -> Result<Vec<LinkType>, LinksError> {
        let rows = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM link_types WHERE slug = $1 ORDER BY id"
        ))
        .bind(slug)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<LinkType>, LinksError> {
        Ok(Self::by_slug(pool, slug).await?.into_iter().next())
    }

    pub async fn find_by_key(
        pool: &PgPool,
        key: &LinkTypeKey,
    ) -> Result<Option<LinkType>, LinksError> {
        match key {
            LinkTypeKey::Id(id) => Self::find(pool, *id).await,
            LinkTypeKey::Slug(slug) => Self::find_by_slug(pool, slug).await,
            LinkTypeKey::IdOrSlug(id, slug) => match Self::find_by_slug(pool, slug).await? {
                Some(link_type) => Ok(Some(link_type)),
                None => Self::find(pool, *id).await,
            },
        }
    }

    pub async fn all(pool: &PgPool) -> Result<Vec<LinkType>, LinksError> {
        let rows = sqlx::query_as(&format!("SELECT {COLUMNS} FROM link_types ORDER BY id"))
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    /// `(key, name)` pairs for select boxes, in creation order.
    pub async fn choices(
        pool: &PgPool,
        include_inactive: &IncludeInactive,
        use_slug_as_key: bool,
    ) -> Result<Vec<(ChoiceKey, String)>, LinksError> {
        let all = Self::all(pool).await?;
        Ok(build_choices(&all, include_inactive, use_slug_as_key))
    }

    pub async fn set_active(
        pool: &PgPool,
        key: &LinkTypeKey,
        is_active: bool,
    ) -> Result<LinkType, LinksError> {
        let current = Self::find_by_key(pool, key)
            .await?
            .ok_or_else(|| LinksError::LinkTypeNotFound(key.to_string()))?;

        let link_type: LinkType = sqlx::query_as(&format!(
            "UPDATE link_types SET is_active = $1, updated_at = now() WHERE id = $2 RETURNING {COLUMNS}"
        ))
        .bind(is_active)
        .bind(current.id)
        .fetch_one(pool)
        .await?;

        tracing::info!(id = link_type.id, is_active, "Updated link type");
        Ok(link_type)
    }

    async fn slugs_like(pool: &PgPool, base: &str) -> Result<Vec<String>, LinksError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT slug
            FROM link_types
            WHERE slug = $1
               OR (left(slug, length($1) + 1) = $1 || '-')
            "#,
        )
        .bind(base)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(slug,)| slug).collect())
    }
}

/// Filter and key already-loaded link types (expected in id order).
pub fn build_choices(
    types: &[LinkType],
    include_inactive: &IncludeInactive,
    use_slug_as_key: bool,
) -> Vec<(ChoiceKey, String)> {
    types
        .iter()
        .filter(|t| {
            t.is_active
                || match include_inactive {
                    IncludeInactive::None => false,
                    IncludeInactive::All => true,
                    IncludeInactive::Only(keys) => keys.iter().any(|k| k.matches(t)),
                }
        })
        .map(|t| {
            let key = if use_slug_as_key {
                ChoiceKey::Slug(t.slug.clone())
            } else {
                ChoiceKey::Id(t.id)
            };
            (key, t.name.clone())
        })
        .collect()
}

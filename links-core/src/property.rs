//! Property discriminators for link groups
//!
//! A group may carry an opaque `property_id` (e.g. "screen size") that partitions
//! groups of the same link type. Filters accept the raw id or a slug that is
//! resolved through a [`PropertyResolver`].

use crate::config::PropertiesConfig;
use crate::error::LinksError;
use async_trait::async_trait;
use regex::Regex;
use sqlx::PgPool;
use std::sync::OnceLock;

/// A `based_on(...)` argument: either the property id or its slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyFilter {
    Id(i64),
    Slug(String),
}

impl From<i64> for PropertyFilter {
    fn from(id: i64) -> Self {
        PropertyFilter::Id(id)
    }
}

impl From<&str> for PropertyFilter {
    fn from(slug: &str) -> Self {
        PropertyFilter::Slug(slug.to_string())
    }
}

impl From<String> for PropertyFilter {
    fn from(slug: String) -> Self {
        PropertyFilter::Slug(slug)
    }
}

impl PropertyFilter {
    /// Interpret a command-line value: all digits is an id, anything else a slug.
    pub fn parse(value: &str) -> Self {
        match value.parse::<i64>() {
            Ok(id) => PropertyFilter::Id(id),
            Err(_) => PropertyFilter::Slug(value.to_string()),
        }
    }
}

/// Looks up property ids by slug in the host's property model.
#[async_trait]
pub trait PropertyResolver: Send + Sync {
    async fn find_id_by_slug(&self, slug: &str) -> Result<Option<i64>, LinksError>;
}

/// Resolve a filter to the concrete `property_id` to match.
pub async fn resolve_filter(
    filter: &PropertyFilter,
    resolver: Option<&dyn PropertyResolver>,
) -> Result<i64, LinksError> {
    match filter {
        PropertyFilter::Id(id) => Ok(*id),
        PropertyFilter::Slug(slug) => {
            let resolver = resolver.ok_or(LinksError::PropertiesNotConfigured)?;
            resolver
                .find_id_by_slug(slug)
                .await?
                .ok_or_else(|| LinksError::PropertyNotFound(slug.clone()))
        }
    }
}

/// Reads `id` by `slug` from a host table such as `properties`.
#[derive(Debug, Clone)]
pub struct TablePropertyResolver {
    pool: PgPool,
    query: String,
}

impl TablePropertyResolver {
    pub fn new(pool: PgPool, table: &str) -> Result<Self, LinksError> {
        validate_identifier(table)?;
        Ok(Self {
            pool,
            query: format!("SELECT id FROM {table} WHERE slug = $1 ORDER BY id LIMIT 1"),
        })
    }

    pub fn from_config(pool: PgPool, config: &PropertiesConfig) -> Result<Self, LinksError> {
        Self::new(pool, &config.table)
    }
}

#[async_trait]
impl PropertyResolver for TablePropertyResolver {
    async fn find_id_by_slug(&self, slug: &str) -> Result<Option<i64>, LinksError> {
        let row: Option<(i64,)> = sqlx::query_as(&self.query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(id,)| id))
    }
}

fn identifier() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$").expect("static regex")
    })
}

/// Table names are interpolated into SQL, so only plain (optionally schema
/// qualified) identifiers are accepted.
fn validate_identifier(name: &str) -> Result<(), LinksError> {
    if identifier().is_match(name) {
        Ok(())
    } else {
        Err(LinksError::InvalidIdentifier(name.to_string()))
    }
}

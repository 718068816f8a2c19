//! Shared setup for the database integration tests.
//!
//! Tests run against `LINKS_TEST_DATABASE_URL`; each pool gets its own freshly
//! migrated schema so ids start at 1 and tests never see each other's rows.
//! Without a reachable database every test skips.

#![allow(dead_code)]

use async_trait::async_trait;
use links_core::{Linkable, LinkableKind, LinkableRef, LinkableResolver, LinksError};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static SCHEMA_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Bind a migrated test database, or skip the calling test when there is none.
///
/// Expands to `(guard, pool)`; keep the guard bound for the whole test so the
/// schema is dropped at the end of it.
macro_rules! pool_or_skip {
    ($name:literal) => {
        match $crate::common::test_pool().await {
            Some(db) => {
                let pool = db.pool.clone();
                (db, pool)
            }
            None => {
                eprintln!("Skipping {}: DB unavailable", $name);
                return;
            }
        }
    };
}

/// A pool bound to its own schema. Dropping it drops the schema.
pub struct TestDb {
    pub pool: PgPool,
    pub schema: String,
    url: String,
}

impl Drop for TestDb {
    fn drop(&mut self) {
        let url = self.url.clone();
        let schema = self.schema.clone();
        // Runs on its own thread: a runtime cannot be blocked on from inside the test's runtime.
        let dropped = std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(drop_schema(&url, &schema))
        })
        .join();
        if !matches!(dropped, Ok(Ok(()))) {
            eprintln!("Failed to drop test schema {}", self.schema);
        }
    }
}

async fn drop_schema(url: &str, schema: &str) -> std::io::Result<()> {
    let admin = PgPool::connect(url).await.map_err(std::io::Error::other)?;
    let result = sqlx::query(&format!("DROP SCHEMA IF EXISTS {schema} CASCADE"))
        .execute(&admin)
        .await;
    admin.close().await;
    result.map(|_| ()).map_err(std::io::Error::other)
}

/// Whether `schema` currently exists, seen from a fresh connection.
pub async fn schema_exists(schema: &str) -> bool {
    let Ok(url) = std::env::var("LINKS_TEST_DATABASE_URL") else {
        return false;
    };
    let admin = PgPool::connect(&url).await.unwrap();
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM information_schema.schemata WHERE schema_name = $1)",
    )
    .bind(schema)
    .fetch_one(&admin)
    .await
    .unwrap();
    admin.close().await;
    exists
}

/// Create a pool on a fresh schema — returns None if the DB is unavailable
pub async fn test_pool() -> Option<TestDb> {
    let url = std::env::var("LINKS_TEST_DATABASE_URL").ok()?;
    let admin = PgPool::connect(&url).await.ok()?;

    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.subsec_nanos();
    let schema = format!(
        "links_test_{}_{}_{}",
        std::process::id(),
        nanos,
        SCHEMA_COUNTER.fetch_add(1, Ordering::SeqCst)
    );
    sqlx::query(&format!("CREATE SCHEMA {schema}"))
        .execute(&admin)
        .await
        .ok()?;
    admin.close().await;

    // From here on the guard owns the schema, so a failed migration still cleans up.
    let options = PgConnectOptions::from_str(&url)
        .ok()?
        .options([("search_path", schema.as_str())]);
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect_lazy_with(options);
    let db = TestDb { pool, schema, url };

    links_core::db::migrate(&db.pool).await.ok()?;
    Some(db)
}

/// Host-side property model used by `based_on("slug")` tests.
pub async fn create_properties_table(pool: &PgPool) {
    sqlx::query(
        "CREATE TABLE properties (id BIGSERIAL PRIMARY KEY, name TEXT NOT NULL, slug TEXT NOT NULL UNIQUE)",
    )
    .execute(pool)
    .await
    .unwrap();
}

pub async fn create_property(pool: &PgPool, name: &str, slug: &str) -> i64 {
    let row: (i64,) = sqlx::query_as("INSERT INTO properties (name, slug) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(slug)
        .fetch_one(pool)
        .await
        .unwrap();
    row.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShopKind {
    Product,
    Bundle,
}

impl LinkableKind for ShopKind {
    fn tag(&self) -> &str {
        match self {
            ShopKind::Product => "product",
            ShopKind::Bundle => "bundle",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "product" => Some(ShopKind::Product),
            "bundle" => Some(ShopKind::Bundle),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestProduct {
    pub id: i64,
    pub name: String,
}

impl TestProduct {
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

impl Linkable for TestProduct {
    type Kind = ShopKind;

    fn link_ref(&self) -> LinkableRef<ShopKind> {
        LinkableRef::new(ShopKind::Product, self.id)
    }
}

/// Galaxy S22, S22 Plus, S22 Ultra and an unlinked Pixel.
pub fn galaxy_products() -> (TestProduct, TestProduct, TestProduct, TestProduct) {
    (
        TestProduct::new(1, "Galaxy S22"),
        TestProduct::new(2, "Galaxy S22 Plus"),
        TestProduct::new(3, "Galaxy S22 Ultra"),
        TestProduct::new(4, "Pixel 7"),
    )
}

/// Resolves products from an in-memory catalog.
pub struct Catalog(pub Vec<TestProduct>);

#[async_trait]
impl LinkableResolver for Catalog {
    type Kind = ShopKind;
    type Entity = TestProduct;

    async fn resolve(&self, kind: ShopKind, ids: &[i64]) -> Result<Vec<TestProduct>, LinksError> {
        if kind != ShopKind::Product {
            return Ok(vec![]);
        }
        Ok(self
            .0
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }
}

pub fn ids<K: LinkableKind>(refs: &[LinkableRef<K>]) -> Vec<i64> {
    let mut ids: Vec<i64> = refs.iter().map(|r| r.id).collect();
    ids.sort_unstable();
    ids
}

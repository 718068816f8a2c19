//! Integration tests for link types (slugs, lookups, choices)
//!
//! These tests require a live PostgreSQL reachable through
//! `LINKS_TEST_DATABASE_URL` and skip otherwise.

#[macro_use]
mod common;

use common::{schema_exists, test_pool};
use links_core::{ChoiceKey, IncludeInactive, LinkType, LinkTypeKey, LinksError, NewLinkType};

async fn create(pool: &sqlx::PgPool, new: NewLinkType) -> LinkType {
    LinkType::create(pool, new).await.unwrap()
}

// ===========================================================================
// TEST 1: creation autogenerates a slug and defaults to active
// ===========================================================================
#[tokio::test]
async fn test_create_generates_slug_and_is_active() {
    let (_db, pool) = pool_or_skip!("test_create_generates_slug_and_is_active");

    let variant = create(&pool, NewLinkType::named("Product Variant")).await;

    assert_eq!(variant.name, "Product Variant");
    assert_eq!(variant.slug, "product-variant");
    assert!(variant.is_active);
    assert!(variant.updated_at.is_none());
}

// ===========================================================================
// TEST 2: colliding slugs get numeric suffixes
// ===========================================================================
#[tokio::test]
async fn test_autogenerated_slug_is_unique() {
    let (_db, pool) = pool_or_skip!("test_autogenerated_slug_is_unique");

    let first = create(&pool, NewLinkType::named("Cross Sell")).await;
    let second = create(&pool, NewLinkType::named("Cross sell")).await;
    let third = create(&pool, NewLinkType::named("Cross-Sell")).await;

    assert_eq!(first.slug, "cross-sell");
    assert_eq!(second.slug, "cross-sell-2");
    assert_eq!(third.slug, "cross-sell-3");
}

// ===========================================================================
// TEST 3: duplicate names violate the unique constraint
// ===========================================================================
#[tokio::test]
async fn test_name_must_be_unique() {
    let (_db, pool) = pool_or_skip!("test_name_must_be_unique");

    create(&pool, NewLinkType::named("Upsell")).await;
    let err = LinkType::create(&pool, NewLinkType::named("Upsell"))
        .await
        .unwrap_err();

    assert!(
        matches!(&err, LinksError::UniqueViolation { constraint } if constraint == "link_types_name_unique"),
        "unexpected error: {err}"
    );
}

// ===========================================================================
// TEST 4: explicit slugs are kept, duplicates rejected
// ===========================================================================
#[tokio::test]
async fn test_explicit_slug_must_be_unique() {
    let (_db, pool) = pool_or_skip!("test_explicit_slug_must_be_unique");

    let xxx = create(&pool, NewLinkType::named("X X X").slug("xxx")).await;
    assert_eq!(xxx.slug, "xxx");

    let err = LinkType::create(&pool, NewLinkType::named("Triple X").slug("xxx"))
        .await
        .unwrap_err();
    assert!(err.is_unique_violation());
}

// ===========================================================================
// TEST 5: lookups by slug
// ===========================================================================
#[tokio::test]
async fn test_query_and_find_by_slug() {
    let (_db, pool) = pool_or_skip!("test_query_and_find_by_slug");

    create(&pool, NewLinkType::named("Kai").slug("kai")).await;
    create(&pool, NewLinkType::named("Jay").slug("jay")).await;
    let cole = create(&pool, NewLinkType::named("Cole").slug("cole")).await;

    let by_slug = LinkType::by_slug(&pool, "jay").await.unwrap();
    assert_eq!(by_slug.len(), 1);
    assert_eq!(by_slug[0].name, "Jay");

    let found = LinkType::find_by_slug(&pool, "cole").await.unwrap();
    assert_eq!(found, Some(cole.clone()));

    assert!(LinkType::find_by_slug(&pool, "zane").await.unwrap().is_none());
    assert_eq!(LinkType::find(&pool, cole.id).await.unwrap(), Some(cole));
}

// ===========================================================================
// TEST 6: choices — active only, all, and specific inactive entries
// ===========================================================================
#[tokio::test]
async fn test_choices_variants() {
    let (_db, pool) = pool_or_skip!("test_choices_variants");

    create(&pool, NewLinkType::named("Variant")).await;
    create(&pool, NewLinkType::named("Similar")).await;
    create(&pool, NewLinkType::named("X-Sell")).await;
    create(&pool, NewLinkType::named("Black Friday 2012").active(false)).await;
    create(&pool, NewLinkType::named("Black Friday 2013").active(false)).await;

    let active = LinkType::choices(&pool, &IncludeInactive::None, false)
        .await
        .unwrap();
    assert_eq!(
        active,
        vec![
            (ChoiceKey::Id(1), "Variant".to_string()),
            (ChoiceKey::Id(2), "Similar".to_string()),
            (ChoiceKey::Id(3), "X-Sell".to_string()),
        ]
    );

    let all = LinkType::choices(&pool, &IncludeInactive::All, false)
        .await
        .unwrap();
    assert_eq!(all.len(), 5);

    let some = LinkType::choices(
        &pool,
        &IncludeInactive::Only(vec![LinkTypeKey::Id(5)]),
        false,
    )
    .await
    .unwrap();
    assert_eq!(some.last(), Some(&(ChoiceKey::Id(5), "Black Friday 2013".to_string())));
    assert_eq!(some.len(), 4);

    let by_slug = LinkType::choices(
        &pool,
        &IncludeInactive::Only(vec!["black-friday-2012".into()]),
        true,
    )
    .await
    .unwrap();
    assert_eq!(
        by_slug.last(),
        Some(&(ChoiceKey::Slug("black-friday-2012".into()), "Black Friday 2012".to_string()))
    );
}

// ===========================================================================
// TEST 7: activation toggles
// ===========================================================================
#[tokio::test]
async fn test_set_active() {
    let (_db, pool) = pool_or_skip!("test_set_active");

    let upsell = create(&pool, NewLinkType::named("Upsell")).await;

    let inactive = LinkType::set_active(&pool, &"upsell".into(), false).await.unwrap();
    assert!(!inactive.is_active);
    assert!(inactive.updated_at.is_some());

    let active = LinkType::set_active(&pool, &LinkTypeKey::Id(upsell.id), true).await.unwrap();
    assert!(active.is_active);

    let err = LinkType::set_active(&pool, &"nope".into(), true).await.unwrap_err();
    assert!(matches!(err, LinksError::LinkTypeNotFound(_)));
}

// ===========================================================================
// TEST 8: digit-only keys reach numeric slugs, then fall back to ids
// ===========================================================================
#[tokio::test]
async fn test_numeric_key_finds_slug_or_id() {
    let (_db, pool) = pool_or_skip!("test_numeric_key_finds_slug_or_id");

    let upsell = create(&pool, NewLinkType::named("Upsell")).await;
    let season = create(&pool, NewLinkType::named("2015").active(false)).await;
    assert_eq!(season.slug, "2015");

    let found = LinkType::find_by_key(&pool, &LinkTypeKey::parse("2015")).await.unwrap();
    assert_eq!(found, Some(season.clone()));

    let by_id = LinkType::find_by_key(&pool, &LinkTypeKey::parse(&upsell.id.to_string()))
        .await
        .unwrap();
    assert_eq!(by_id, Some(upsell));

    let choices = LinkType::choices(
        &pool,
        &IncludeInactive::Only(vec![LinkTypeKey::parse("2015")]),
        false,
    )
    .await
    .unwrap();
    assert_eq!(choices.last(), Some(&(ChoiceKey::Id(season.id), "2015".to_string())));

    let activated = LinkType::set_active(&pool, &LinkTypeKey::parse("2015"), true).await.unwrap();
    assert_eq!(activated.id, season.id);
    assert!(activated.is_active);
}

// ===========================================================================
// TEST 9: each test schema is dropped with its guard
// ===========================================================================
#[tokio::test]
async fn test_schema_dropped_after_test() {
    let Some(db) = test_pool().await else {
        eprintln!("Skipping test_schema_dropped_after_test: DB unavailable");
        return;
    };
    let schema = db.schema.clone();
    create(&db.pool, NewLinkType::named("Upsell")).await;
    assert!(schema_exists(&schema).await);

    drop(db);
    assert!(!schema_exists(&schema).await);
}

//! links-admin — maintenance CLI for catalog link types and link groups
//!
//! # Subcommands
//! - `migrate`                                 — create/upgrade the link tables
//! - `health`                                  — show database connectivity
//! - `types list|create|choices|activate|deactivate`
//! - `links <type> <kind> <id>`                — what a model is linked to
//! - `link <type> <kind> <id> <kind:id>...`    — link a model to others
//! - `unlink <type> <kind> <id> <kind:id>...`  — remove those links again

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use links_core::{
    db, ChoiceKey, EliminateLinks, Establish, Get, IncludeInactive, LinkType, LinkTypeKey,
    LinkableRef, LinksConfig, NewLinkType, PropertyFilter, RawKind, TablePropertyResolver,
};
use serde_json::json;
use sqlx::PgPool;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "links.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply the embedded link table migrations
    Migrate,

    /// Check the database connection
    Health,

    /// Manage link types
    Types {
        #[command(subcommand)]
        command: TypeCommands,
    },

    /// List what a model is linked to within a link type
    Links {
        /// Link type slug or id
        link_type: String,
        /// Kind tag of the model, e.g. "product"
        kind: String,
        id: i64,

        /// Property id or slug to restrict groups to
        #[arg(long)]
        based_on: Option<String>,

        /// Print the groups instead of the linked models
        #[arg(long)]
        groups: bool,
    },

    /// Link a model with other models
    Link {
        link_type: String,
        kind: String,
        id: i64,

        /// Models to link, as `kind:id`
        #[arg(required = true, value_parser = parse_member)]
        members: Vec<(String, i64)>,

        #[arg(long)]
        based_on: Option<String>,

        /// Make the model the root of the group
        #[arg(long)]
        unidirectional: bool,
    },

    /// Remove links between a model and other models
    Unlink {
        link_type: String,
        kind: String,
        id: i64,

        /// Models to unlink, as `kind:id`
        #[arg(required = true, value_parser = parse_member)]
        members: Vec<(String, i64)>,
    },
}

#[derive(Debug, Subcommand)]
enum TypeCommands {
    /// List link types
    List {
        /// Include inactive link types
        #[arg(long)]
        all: bool,
    },

    /// Create a link type
    Create {
        name: String,

        /// Use this slug instead of deriving one from the name
        #[arg(long)]
        slug: Option<String>,

        #[arg(long)]
        inactive: bool,
    },

    /// Print select-box choices as JSON
    Choices {
        #[arg(long)]
        all: bool,

        /// Ids or slugs of inactive types to include
        #[arg(long, num_args = 1..)]
        include: Vec<String>,

        #[arg(long)]
        slug_keys: bool,
    },

    /// Mark a link type active
    Activate { link_type: String },

    /// Mark a link type inactive
    Deactivate { link_type: String },
}

fn parse_member(value: &str) -> Result<(String, i64), String> {
    let (kind, id) = value
        .rsplit_once(':')
        .ok_or_else(|| format!("expected kind:id, got {value:?}"))?;
    let id = id
        .parse::<i64>()
        .map_err(|e| format!("invalid id in {value:?}: {e}"))?;
    if kind.is_empty() {
        return Err(format!("missing kind in {value:?}"));
    }
    Ok((kind.to_string(), id))
}

fn member_refs(members: &[(String, i64)]) -> Vec<LinkableRef<RawKind>> {
    members
        .iter()
        .map(|(kind, id)| LinkableRef::new(RawKind::new(kind), *id))
        .collect()
}

fn include_inactive(all: bool, include: &[String]) -> IncludeInactive {
    if all {
        IncludeInactive::All
    } else if include.is_empty() {
        IncludeInactive::None
    } else {
        IncludeInactive::Only(include.iter().map(|k| LinkTypeKey::parse(k)).collect())
    }
}

async fn require_type(pool: &PgPool, key: &str) -> Result<LinkType> {
    let key = LinkTypeKey::parse(key);
    LinkType::find_by_key(pool, &key)
        .await?
        .ok_or_else(|| anyhow!("link type {key} not found"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = LinksConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config))?;

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let pool = db::create_pool(&config.database)
        .await
        .context("Failed to connect to database")?;

    match args.command {
        Commands::Migrate => {
            db::migrate(&pool).await?;
            println!("✅ Link tables are up to date");
        }
        Commands::Health => {
            let version = db::health_check(&pool).await?;
            println!("✅ PostgreSQL connected: {}", version);
        }
        Commands::Types { command } => run_types(&pool, command).await?,
        Commands::Links {
            link_type,
            kind,
            id,
            based_on,
            groups,
        } => {
            let get = Get::from_config(pool.clone(), &config)?;
            let subject = LinkableRef::new(RawKind::new(&kind), id);
            let key = LinkTypeKey::parse(&link_type);

            if groups {
                let mut query = get.the(key).await?.groups();
                if let Some(p) = based_on {
                    query = query.based_on(PropertyFilter::parse(&p));
                }
                let groups = query.of(&subject).await?;
                println!("{}", serde_json::to_string_pretty(&groups)?);
            } else {
                let mut query = get.the(key).await?.links();
                if let Some(p) = based_on {
                    query = query.based_on(PropertyFilter::parse(&p));
                }
                let links: Vec<_> = query
                    .of(&subject)
                    .await?
                    .into_iter()
                    .map(|r| r.to_string())
                    .collect();
                println!("{}", serde_json::to_string_pretty(&links)?);
            }
        }
        Commands::Link {
            link_type,
            kind,
            id,
            members,
            based_on,
            unidirectional,
        } => {
            let link_type = require_type(&pool, &link_type).await?;
            let resolver = match &config.properties {
                Some(props) => Some(TablePropertyResolver::from_config(pool.clone(), props)?),
                None => None,
            };

            let mut establish = Establish::new(&pool, &link_type);
            if let Some(p) = based_on {
                establish = establish.based_on(PropertyFilter::parse(&p));
            }
            if let Some(resolver) = &resolver {
                establish = establish.using_properties(resolver);
            }
            if unidirectional {
                establish = establish.unidirectional();
            }

            let base = LinkableRef::new(RawKind::new(&kind), id);
            let group = establish.between(&base).and(member_refs(&members)).await?;
            println!("{}", serde_json::to_string_pretty(&group)?);
        }
        Commands::Unlink {
            link_type,
            kind,
            id,
            members,
        } => {
            let link_type = require_type(&pool, &link_type).await?;
            let base = LinkableRef::new(RawKind::new(&kind), id);
            let removed = EliminateLinks::new(&pool, &link_type)
                .between(&base)
                .and(member_refs(&members))
                .await?;
            println!("{}", json!({ "removed": removed }));
        }
    }

    Ok(())
}

async fn run_types(pool: &PgPool, command: TypeCommands) -> Result<()> {
    match command {
        TypeCommands::List { all } => {
            for t in LinkType::all(pool).await? {
                if all || t.is_active {
                    let state = if t.is_active { "" } else { " (inactive)" };
                    println!("{:>5}  {:<24} {}{}", t.id, t.slug, t.name, state);
                }
            }
        }
        TypeCommands::Create {
            name,
            slug,
            inactive,
        } => {
            let mut new = NewLinkType::named(name).active(!inactive);
            if let Some(slug) = slug {
                new = new.slug(slug);
            }
            let created = LinkType::create(pool, new).await?;
            println!("{}", serde_json::to_string_pretty(&created)?);
        }
        TypeCommands::Choices {
            all,
            include,
            slug_keys,
        } => {
            let choices =
                LinkType::choices(pool, &include_inactive(all, &include), slug_keys).await?;
            let entries: Vec<_> = choices
                .into_iter()
                .map(|(key, name)| match key {
                    ChoiceKey::Id(id) => json!({ "id": id, "name": name }),
                    ChoiceKey::Slug(slug) => json!({ "slug": slug, "name": name }),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        TypeCommands::Activate { link_type } => {
            let t = LinkType::set_active(pool, &LinkTypeKey::parse(&link_type), true).await?;
            tracing::info!(slug = %t.slug, "Link type activated");
        }
        TypeCommands::Deactivate { link_type } => {
            let t = LinkType::set_active(pool, &LinkTypeKey::parse(&link_type), false).await?;
            tracing::info!(slug = %t.slug, "Link type deactivated");
        }
    }
    Ok(())
}

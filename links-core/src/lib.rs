pub mod config;
pub mod db;
pub mod error;
pub mod linkable;
pub mod models;
pub mod property;
pub mod query;
pub mod slug;

pub use config::LinksConfig;
pub use error::LinksError;
pub use linkable::{Linkable, LinkableKind, LinkableRef, LinkableResolver, RawKind};
pub use models::{
    ChoiceKey, IncludeInactive, LinkGroup, LinkGroupItem, LinkType, LinkTypeKey, NewLinkGroup,
    NewLinkType,
};
pub use property::{PropertyFilter, PropertyResolver, TablePropertyResolver};
pub use query::{EliminateLinks, Establish, Get};

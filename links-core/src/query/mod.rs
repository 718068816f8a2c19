pub mod eliminate;
pub mod establish;
pub mod get;

pub use eliminate::EliminateLinks;
pub use establish::Establish;
pub use get::{Get, GroupsQuery, LinksQuery, TypeHandle};

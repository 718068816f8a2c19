pub mod link_group;
pub mod link_group_item;
pub mod link_type;

pub use link_group::{LinkGroup, NewLinkGroup};
pub use link_group_item::LinkGroupItem;
pub use link_type::{ChoiceKey, IncludeInactive, LinkType, LinkTypeKey, NewLinkType};

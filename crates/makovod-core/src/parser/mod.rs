//! HTML parsers for mako.co.il
//!
//! Contains modules for parsing different page types.

pub mod catalog;
pub mod episode;
pub mod metadata;

pub use catalog::{ContentDescriptor, extract_items, guid_from_query};
pub use episode::parse_episode_details;
pub use metadata::parse_show_name;

//! Media file inspection and classification module

pub mod inspector;
pub mod validator;

pub use inspector::{MediaInspector, MetadataExtractor};
pub use validator::classify_media_kind;

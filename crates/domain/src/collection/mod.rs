//! Collection types

mod item;

pub use item::{CollectionItem, DEFAULT_COLLECTION_NAME};

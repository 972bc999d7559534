//! Locale data: loading, flattening and merging per-language documents.
mod flatten;
mod namespace;
mod store;

pub use flatten::{
    FlattenedDocument,
    UnflattenError,
    find_prefix_conflicts,
    flatten_json,
    unflatten,
};
pub use namespace::{
    KeyCollision,
    LocaleEntry,
    LocaleNamespace,
};
pub use store::{
    LoadOutcome,
    LocaleError,
    LocaleStore,
    parse_document,
};

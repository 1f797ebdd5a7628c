mod genres;
mod guide;
mod manifest;
mod marker;
mod metadata;
mod package;

pub use self::genres::{join_genres, normalize_genres, split_genres};
pub use self::guide::GuideReference;
pub use self::manifest::ManifestItem;
pub use self::marker::MetaMarker;
pub use self::metadata::BookMetadata;
pub use self::package::Package;

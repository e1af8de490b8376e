//! Domain logic - the version algebra, independent of any file or manifest

pub mod prerelease;
pub mod version;

pub use prerelease::{BuildMetadata, Identifier, Prerelease};
pub use version::{compare, ChangeType, Version};

mod checksum;
pub mod config;
pub mod manifest;
mod version;

pub use checksum::{Checksum, HashAlgorithm};
pub use manifest::{normalize_name, Entry, Manifest, PkgRequest};
pub use version::{parse_version_requirement, VersionRequirement};

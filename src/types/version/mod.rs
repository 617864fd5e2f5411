mod ord;
mod parse;
mod requirement;
mod test;
mod version;

pub use parse::parse_version;
pub use requirement::{parse_version_requirement, VersionRequirement};
pub use version::{LocalSegment, PkgVersion, PreRelease};

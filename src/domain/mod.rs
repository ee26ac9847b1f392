//! Domain logic - pure version and target rules independent of git or tools

pub mod mode;
pub mod target;
pub mod version;

pub use mode::Mode;
pub use target::{ProjectVersion, ReleaseTarget};
pub use version::{SemVer, UpStep};

pub mod naming;
pub mod parallel;
pub mod resolve;
pub mod template;

pub use crate::domain::model::{PackageBuildRecord, PatchSpec, SoftwareSpec, Toolchain};
pub use crate::domain::ports::SoftwareIdentity;
pub use crate::utils::error::Result;

pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::config::easystack::{parse_easystack, EasyStack};
pub use crate::config::record_file::RecordFormat;
pub use crate::core::resolve::ResolvedRecord;
pub use crate::domain::model::{PackageBuildRecord, PatchSpec, SoftwareSpec, Toolchain};
pub use crate::domain::ports::SoftwareIdentity;
pub use crate::utils::error::{RecordError, Result};

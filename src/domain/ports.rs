use crate::core::naming;
use crate::domain::model::{PackageBuildRecord, SoftwareSpec, Toolchain};

/// Anything that identifies a single easyconfig: a loaded record or one
/// entry of an easystack file.
pub trait SoftwareIdentity {
    fn name(&self) -> &str;
    fn version(&self) -> &str;
    fn toolchain_name(&self) -> &str;
    /// 空字串代表沒有版本（system 工具鏈）
    fn toolchain_version(&self) -> &str;

    fn version_prefix(&self) -> &str {
        ""
    }

    fn version_suffix(&self) -> &str {
        ""
    }

    fn full_ec_version(&self) -> String {
        naming::full_ec_version(
            self.version(),
            self.toolchain_name(),
            self.toolchain_version(),
            self.version_prefix(),
            self.version_suffix(),
        )
    }

    fn ec_filename(&self) -> String {
        naming::ec_filename(self.name(), &self.full_ec_version())
    }
}

impl SoftwareIdentity for PackageBuildRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn toolchain_name(&self) -> &str {
        self.toolchain.name()
    }

    fn toolchain_version(&self) -> &str {
        self.toolchain.version().unwrap_or("")
    }

    fn version_prefix(&self) -> &str {
        self.versionprefix.as_deref().unwrap_or("")
    }

    fn version_suffix(&self) -> &str {
        self.versionsuffix.as_deref().unwrap_or("")
    }
}

impl SoftwareIdentity for SoftwareSpec {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn toolchain_name(&self) -> &str {
        &self.toolchain_name
    }

    fn toolchain_version(&self) -> &str {
        &self.toolchain_version
    }

    fn version_suffix(&self) -> &str {
        &self.versionsuffix
    }
}

impl SoftwareSpec {
    pub fn is_system_toolchain(&self) -> bool {
        Toolchain::is_system_name(&self.toolchain_name)
    }
}

use serde::ser::{SerializeStruct, SerializeTuple};
use serde::{Serialize, Serializer};

/// 建置所用的工具鏈；`System` 代表使用作業系統內建的編譯器
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toolchain {
    System,
    Named { name: String, version: String },
}

impl Toolchain {
    pub const SYSTEM_NAME: &'static str = "system";
    /// 舊版 EasyBuild 對 system 工具鏈的稱呼
    pub const LEGACY_SYSTEM_NAME: &'static str = "dummy";

    pub fn is_system_name(name: &str) -> bool {
        name == Self::SYSTEM_NAME || name == Self::LEGACY_SYSTEM_NAME
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Toolchain::System)
    }

    pub fn name(&self) -> &str {
        match self {
            Toolchain::System => Self::SYSTEM_NAME,
            Toolchain::Named { name, .. } => name,
        }
    }

    pub fn version(&self) -> Option<&str> {
        match self {
            Toolchain::System => None,
            Toolchain::Named { version, .. } => Some(version),
        }
    }
}

impl std::fmt::Display for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Toolchain::System => write!(f, "{}", Self::SYSTEM_NAME),
            Toolchain::Named { name, version } => write!(f, "{}/{}", name, version),
        }
    }
}

impl Serialize for Toolchain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Toolchain::System => serializer.serialize_str(Self::SYSTEM_NAME),
            Toolchain::Named { name, version } => {
                let mut state = serializer.serialize_struct("Toolchain", 2)?;
                state.serialize_field("name", name)?;
                state.serialize_field("version", version)?;
                state.end()
            }
        }
    }
}

/// 一個 patch 檔以及套用的目錄（相對於解壓縮後的原始碼目錄）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchSpec {
    pub filename: String,
    pub target_dir: Option<String>,
}

impl PatchSpec {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            target_dir: None,
        }
    }

    pub fn with_target(filename: impl Into<String>, target_dir: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            target_dir: Some(target_dir.into()),
        }
    }
}

// 沒有目標目錄時寫成字串，否則寫成 [filename, target_dir]
impl Serialize for PatchSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.target_dir {
            None => serializer.serialize_str(&self.filename),
            Some(target_dir) => {
                let mut tuple = serializer.serialize_tuple(2)?;
                tuple.serialize_element(&self.filename)?;
                tuple.serialize_element(target_dir)?;
                tuple.end()
            }
        }
    }
}

/// A single package build record.
///
/// Built once by the loader in [`crate::config::record_file`] and read-only
/// afterwards: every field is private to the crate and exposed through
/// getters only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageBuildRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) easyblock: Option<String>,
    pub(crate) name: String,
    pub(crate) version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) versionprefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) versionsuffix: Option<String>,
    pub(crate) homepage: String,
    pub(crate) description: String,
    pub(crate) source_urls: Vec<String>,
    pub(crate) sources: Vec<String>,
    pub(crate) patches: Vec<PatchSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) maxparallel: Option<u32>,
    pub(crate) moduleclass: String,
    // TOML 要求表格放在最後
    pub(crate) toolchain: Toolchain,
}

impl PackageBuildRecord {
    /// `None` 時由外部框架依名稱決定
    pub fn easyblock(&self) -> Option<&str> {
        self.easyblock.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn versionprefix(&self) -> Option<&str> {
        self.versionprefix.as_deref()
    }

    pub fn versionsuffix(&self) -> Option<&str> {
        self.versionsuffix.as_deref()
    }

    pub fn homepage(&self) -> &str {
        &self.homepage
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    pub fn source_urls(&self) -> &[String] {
        &self.source_urls
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn patches(&self) -> &[PatchSpec] {
        &self.patches
    }

    /// `None` 表示不限制，由外部框架決定並行數
    pub fn maxparallel(&self) -> Option<u32> {
        self.maxparallel
    }

    pub fn moduleclass(&self) -> &str {
        &self.moduleclass
    }
}

/// One software/toolchain/version entry of an easystack file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoftwareSpec {
    pub name: String,
    pub version: String,
    pub versionsuffix: String,
    pub toolchain_name: String,
    pub toolchain_version: String,
}

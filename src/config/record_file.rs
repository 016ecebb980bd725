use crate::core::template;
use crate::domain::model::{PackageBuildRecord, PatchSpec, Toolchain};
use crate::utils::error::{RecordError, Result};
use crate::utils::validation::{self, Validate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

static ENV_VAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

const URL_SCHEMES: &[&str] = &["http", "https", "ftp"];

/// 沒有指定 moduleclass 時使用
pub const DEFAULT_MODULECLASS: &str = "base";

/// EasyBuild 內建的模組分類
pub const KNOWN_MODULECLASSES: &[&str] = &[
    "base", "ai", "bio", "cae", "chem", "compiler", "data", "debugger", "devel", "geo", "ide",
    "lang", "lib", "math", "mpi", "numlib", "perf", "quantum", "phys", "system", "toolchain",
    "tools", "vis",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum RecordFormat {
    Toml,
    Yaml,
    Json,
}

impl RecordFormat {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(RecordFormat::Toml),
            Some("yaml") | Some("yml") => Ok(RecordFormat::Yaml),
            Some("json") => Ok(RecordFormat::Json),
            other => Err(RecordError::InvalidConfigValueError {
                field: "path".to_string(),
                value: path.display().to_string(),
                reason: format!(
                    "Unsupported record file extension: {}. Use .toml, .yaml, .yml or .json",
                    other.unwrap_or("<none>")
                ),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RecordFormat::Toml => "TOML",
            RecordFormat::Yaml => "YAML",
            RecordFormat::Json => "JSON",
        }
    }
}

/// 檔案中的原始形狀；欄位全部可省略，缺少的必填欄位在轉換時才報錯
#[derive(Debug, Deserialize)]
struct RawRecord {
    easyblock: Option<String>,
    name: Option<String>,
    version: Option<String>,
    versionprefix: Option<String>,
    versionsuffix: Option<String>,
    homepage: Option<String>,
    description: Option<String>,
    toolchain: Option<RawToolchain>,
    source_urls: Option<Vec<String>>,
    sources: Option<Vec<String>>,
    patches: Option<Vec<RawPatch>>,
    maxparallel: Option<i64>,
    moduleclass: Option<String>,
    #[serde(flatten)]
    unknown: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawToolchain {
    Sentinel(String),
    Named {
        name: String,
        version: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPatch {
    Plain(String),
    WithTarget(String, String),
}

impl RawToolchain {
    fn into_toolchain(self) -> Result<Toolchain> {
        match self {
            RawToolchain::Sentinel(name) if Toolchain::is_system_name(&name) => {
                Ok(Toolchain::System)
            }
            RawToolchain::Sentinel(name) => Err(RecordError::InvalidConfigValueError {
                field: "toolchain".to_string(),
                value: name,
                reason: "Expected 'system' or a table with 'name' and 'version'".to_string(),
            }),
            RawToolchain::Named { name, .. } if Toolchain::is_system_name(&name) => {
                Ok(Toolchain::System)
            }
            RawToolchain::Named { name, version } => {
                validation::validate_non_empty_string("toolchain.name", &name)?;
                let version = validation::validate_required_field("toolchain.version", &version)?;
                validation::validate_version("toolchain.version", version)?;
                Ok(Toolchain::Named {
                    name,
                    version: version.clone(),
                })
            }
        }
    }
}

impl From<RawPatch> for PatchSpec {
    fn from(raw: RawPatch) -> Self {
        match raw {
            RawPatch::Plain(filename) => PatchSpec::new(filename),
            RawPatch::WithTarget(filename, target_dir) => {
                PatchSpec::with_target(filename, target_dir)
            }
        }
    }
}

impl TryFrom<RawRecord> for PackageBuildRecord {
    type Error = RecordError;

    fn try_from(raw: RawRecord) -> Result<Self> {
        for key in raw.unknown.keys() {
            tracing::warn!("⚠️ Ignoring unknown record parameter '{}'", key);
        }

        // 先檢查識別欄位，錯誤訊息才會指向最重要的缺漏
        let name = validation::validate_required_field("name", &raw.name)?.clone();
        let version = validation::validate_required_field("version", &raw.version)?.clone();
        let toolchain = raw
            .toolchain
            .ok_or_else(|| RecordError::MissingConfigError {
                field: "toolchain".to_string(),
            })?
            .into_toolchain()?;

        let homepage = validation::validate_required_field("homepage", &raw.homepage)?.clone();
        let description =
            validation::validate_required_field("description", &raw.description)?.clone();
        let moduleclass = raw
            .moduleclass
            .unwrap_or_else(|| DEFAULT_MODULECLASS.to_string());

        let maxparallel = match raw.maxparallel {
            Some(value) => {
                validation::validate_positive_number("maxparallel", value, 1)?;
                let value = u32::try_from(value).map_err(|_| {
                    RecordError::InvalidConfigValueError {
                        field: "maxparallel".to_string(),
                        value: value.to_string(),
                        reason: format!("Value must be at most {}", u32::MAX),
                    }
                })?;
                Some(value)
            }
            None => None,
        };

        Ok(PackageBuildRecord {
            easyblock: raw.easyblock,
            name,
            version,
            versionprefix: raw.versionprefix,
            versionsuffix: raw.versionsuffix,
            homepage,
            description,
            source_urls: raw.source_urls.unwrap_or_default(),
            sources: raw.sources.unwrap_or_default(),
            patches: raw
                .patches
                .unwrap_or_default()
                .into_iter()
                .map(PatchSpec::from)
                .collect(),
            maxparallel,
            moduleclass,
            toolchain,
        })
    }
}

impl PackageBuildRecord {
    /// 依副檔名決定格式，從檔案載入並驗證
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let format = RecordFormat::from_path(&path)?;
        tracing::debug!(
            "Loading {} record from {}",
            format.name(),
            path.as_ref().display()
        );
        let content = std::fs::read_to_string(&path).map_err(RecordError::IoError)?;
        Self::from_str_with_format(&content, format)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Self::from_str_with_format(content, RecordFormat::Toml)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Self::from_str_with_format(content, RecordFormat::Yaml)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Self::from_str_with_format(content, RecordFormat::Json)
    }

    pub fn from_str_with_format(content: &str, format: RecordFormat) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = substitute_env_vars(content);

        let parse_error = |message: String| RecordError::ParseError {
            format: format.name().to_string(),
            message,
        };

        let raw: RawRecord = match format {
            RecordFormat::Toml => {
                toml::from_str(&processed_content).map_err(|e| parse_error(e.to_string()))?
            }
            RecordFormat::Yaml => {
                serde_yaml::from_str(&processed_content).map_err(|e| parse_error(e.to_string()))?
            }
            RecordFormat::Json => {
                serde_json::from_str(&processed_content).map_err(|e| parse_error(e.to_string()))?
            }
        };

        let record = PackageBuildRecord::try_from(raw)?;
        record.validate()?;

        tracing::debug!(
            "Loaded record {} {} ({} sources, {} patches)",
            record.name(),
            record.version(),
            record.sources().len(),
            record.patches().len()
        );

        Ok(record)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| serialization_error(RecordFormat::Toml, e))
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| serialization_error(RecordFormat::Yaml, e))
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| serialization_error(RecordFormat::Json, e))
    }

    pub fn to_string_with_format(&self, format: RecordFormat) -> Result<String> {
        match format {
            RecordFormat::Toml => self.to_toml_string(),
            RecordFormat::Yaml => self.to_yaml_string(),
            RecordFormat::Json => self.to_json_string(),
        }
    }

    /// 驗證記錄的合理性
    pub fn validate_record(&self) -> Result<()> {
        validation::validate_non_empty_string("name", &self.name)?;
        validation::validate_version("version", &self.version)?;
        if let Some(easyblock) = &self.easyblock {
            validation::validate_non_empty_string("easyblock", easyblock)?;
        }
        validation::validate_non_empty_string("homepage", &self.homepage)?;
        validation::validate_non_empty_string("description", &self.description)?;
        validation::validate_non_empty_string("moduleclass", &self.moduleclass)?;

        if !KNOWN_MODULECLASSES.contains(&self.moduleclass.as_str()) {
            tracing::warn!(
                "⚠️ Unknown moduleclass '{}' for {}; known classes: {}",
                self.moduleclass,
                self.name,
                KNOWN_MODULECLASSES.join(", ")
            );
        }

        if let Some(maxparallel) = self.maxparallel {
            validation::validate_positive_number("maxparallel", maxparallel, 1)?;
        }

        let patch_files: Vec<&str> = self.patches.iter().map(|p| p.filename.as_str()).collect();
        for (i, patch) in self.patches.iter().enumerate() {
            validation::validate_path(&format!("patches[{}]", i), &patch.filename)?;
            if let Some(target_dir) = &patch.target_dir {
                validation::validate_path(&format!("patches[{}].target_dir", i), target_dir)?;
            }
        }
        validation::validate_file_extensions("patches", &patch_files, &["patch"])?;

        for (i, source) in self.sources.iter().enumerate() {
            validation::validate_path(&format!("sources[{}]", i), source)?;
        }

        // 模板必須能解析，且解析後的網址必須合法
        let resolved = self.resolve()?;
        for (i, url) in resolved.source_urls.iter().enumerate() {
            validation::validate_url(&format!("source_urls[{}]", i), url, URL_SCHEMES)?;
        }

        Ok(())
    }
}

impl Validate for PackageBuildRecord {
    fn validate(&self) -> Result<()> {
        self.validate_record()
    }
}

fn serialization_error(format: RecordFormat, e: impl std::fmt::Display) -> RecordError {
    RecordError::SerializationError {
        format: format.name().to_string(),
        message: e.to_string(),
    }
}

/// 替換環境變數 (例如 ${HOME})，未設定的變數保留原樣
fn substitute_env_vars(content: &str) -> String {
    ENV_VAR_RE
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const GCC_TOML: &str = r#"
easyblock = "EB_GCC"
name = "GCC"
version = "4.9.2"
homepage = "https://gcc.gnu.org/"
description = "The GNU Compiler Collection"
toolchain = "system"
source_urls = [
    "https://ftpmirror.gnu.org/gnu/%(namelower)s/%(namelower)s-%(version)s",
    "https://ftpmirror.gnu.org/gnu/gmp",
    "https://ftpmirror.gnu.org/gnu/mpfr",
    "https://www.multiprecision.org/downloads",
]
sources = [
    "SOURCELOWER_TAR_BZ2",
    "gmp-6.0.0a.tar.bz2",
    "mpfr-3.1.2.tar.gz",
    "mpc-1.0.2.tar.gz",
]
patches = [["mpfr-3.1.2-allpatches-20141204.patch", "../mpfr-3.1.2"]]
maxparallel = 4
moduleclass = "compiler"
"#;

    #[test]
    fn test_parse_basic_toml_record() {
        let record = PackageBuildRecord::from_toml_str(GCC_TOML).unwrap();

        assert_eq!(record.easyblock(), Some("EB_GCC"));
        assert_eq!(record.name(), "GCC");
        assert_eq!(record.version(), "4.9.2");
        assert!(record.toolchain().is_system());
        assert_eq!(record.sources().len(), 4);
        assert_eq!(record.source_urls().len(), 4);
        assert_eq!(
            record.patches(),
            &[PatchSpec::with_target(
                "mpfr-3.1.2-allpatches-20141204.patch",
                "../mpfr-3.1.2"
            )]
        );
        assert_eq!(record.maxparallel(), Some(4));
        assert_eq!(record.moduleclass(), "compiler");
    }

    #[test]
    fn test_missing_identity_fields() {
        for field in ["name", "version", "toolchain"] {
            let content: String = GCC_TOML
                .lines()
                .filter(|line| !line.starts_with(&format!("{} =", field)))
                .collect::<Vec<_>>()
                .join("\n");

            match PackageBuildRecord::from_toml_str(&content) {
                Err(RecordError::MissingConfigError { field: missing }) => {
                    assert_eq!(missing, field)
                }
                other => panic!("expected missing '{}', got {:?}", field, other),
            }
        }
    }

    #[test]
    fn test_optional_easyblock_and_default_moduleclass() {
        let content = GCC_TOML
            .replace("easyblock = \"EB_GCC\"\n", "")
            .replace("moduleclass = \"compiler\"\n", "");
        let record = PackageBuildRecord::from_toml_str(&content).unwrap();
        assert_eq!(record.easyblock(), None);
        assert_eq!(record.moduleclass(), DEFAULT_MODULECLASS);
    }

    #[test]
    fn test_maxparallel_must_be_positive() {
        let zero = GCC_TOML.replace("maxparallel = 4", "maxparallel = 0");
        assert!(matches!(
            PackageBuildRecord::from_toml_str(&zero),
            Err(RecordError::InvalidConfigValueError { ref field, .. }) if field == "maxparallel"
        ));

        let negative = GCC_TOML.replace("maxparallel = 4", "maxparallel = -2");
        assert!(PackageBuildRecord::from_toml_str(&negative).is_err());

        let absent = GCC_TOML.replace("maxparallel = 4\n", "");
        let record = PackageBuildRecord::from_toml_str(&absent).unwrap();
        assert_eq!(record.maxparallel(), None);
    }

    #[test]
    fn test_malformed_version() {
        let content = GCC_TOML.replace("version = \"4.9.2\"", "version = \"4.9 2\"");
        assert!(matches!(
            PackageBuildRecord::from_toml_str(&content),
            Err(RecordError::InvalidConfigValueError { ref field, .. }) if field == "version"
        ));
    }

    #[test]
    fn test_unresolvable_template() {
        let content = GCC_TOML.replace("\"gmp-6.0.0a.tar.bz2\"", "\"gmp-%(gmp_version)s.tar.bz2\"");
        assert!(matches!(
            PackageBuildRecord::from_toml_str(&content),
            Err(RecordError::TemplateError { ref field, .. }) if field == "sources[1]"
        ));
    }

    #[test]
    fn test_wrong_shape_is_parse_error() {
        let content = GCC_TOML.replace("maxparallel = 4", "maxparallel = \"four\"");
        assert!(matches!(
            PackageBuildRecord::from_toml_str(&content),
            Err(RecordError::ParseError { .. })
        ));
    }

    #[test]
    fn test_named_toolchain() {
        let content = GCC_TOML.replace(
            "toolchain = \"system\"",
            "toolchain = { name = \"GCCcore\", version = \"4.9.2\" }",
        );
        let record = PackageBuildRecord::from_toml_str(&content).unwrap();
        assert_eq!(
            record.toolchain(),
            &Toolchain::Named {
                name: "GCCcore".to_string(),
                version: "4.9.2".to_string()
            }
        );

        let legacy = GCC_TOML.replace(
            "toolchain = \"system\"",
            "toolchain = { name = \"dummy\", version = \"dummy\" }",
        );
        assert!(PackageBuildRecord::from_toml_str(&legacy)
            .unwrap()
            .toolchain()
            .is_system());

        let bogus = GCC_TOML.replace("toolchain = \"system\"", "toolchain = \"foss\"");
        assert!(PackageBuildRecord::from_toml_str(&bogus).is_err());
    }

    #[test]
    fn test_patch_extension_required() {
        let content = GCC_TOML.replace(
            "patches = [[\"mpfr-3.1.2-allpatches-20141204.patch\", \"../mpfr-3.1.2\"]]",
            "patches = [\"gcc-fix.diff\"]",
        );
        assert!(PackageBuildRecord::from_toml_str(&content).is_err());
    }

    #[test]
    fn test_bad_source_url() {
        let content = GCC_TOML.replace(
            "\"https://ftpmirror.gnu.org/gnu/gmp\"",
            "\"not a url\"",
        );
        assert!(matches!(
            PackageBuildRecord::from_toml_str(&content),
            Err(RecordError::InvalidConfigValueError { ref field, .. }) if field == "source_urls[1]"
        ));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("EASYCONFIG_TEST_MIRROR", "https://mirror.example.org/gnu");
        let content = GCC_TOML.replace(
            "\"https://ftpmirror.gnu.org/gnu/gmp\"",
            "\"${EASYCONFIG_TEST_MIRROR}/gmp\"",
        );
        let record = PackageBuildRecord::from_toml_str(&content).unwrap();
        assert_eq!(record.source_urls()[1], "https://mirror.example.org/gnu/gmp");
        std::env::remove_var("EASYCONFIG_TEST_MIRROR");
    }

    #[test]
    fn test_unknown_parameters_are_ignored() {
        let content = format!("configopts = \"--enable-languages=c,c++,fortran\"\n{}", GCC_TOML);
        let record = PackageBuildRecord::from_toml_str(&content).unwrap();
        assert_eq!(record.name(), "GCC");
    }

    #[test]
    fn test_toml_round_trip() {
        let record = PackageBuildRecord::from_toml_str(GCC_TOML).unwrap();
        let serialized = record.to_toml_string().unwrap();
        let reloaded = PackageBuildRecord::from_toml_str(&serialized).unwrap();
        assert_eq!(record, reloaded);
    }

    #[test]
    fn test_record_from_file() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        temp_file.write_all(GCC_TOML.as_bytes()).unwrap();

        let record = PackageBuildRecord::from_file(temp_file.path()).unwrap();
        assert_eq!(record.name(), "GCC");
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(RecordFormat::from_path("GCC-4.9.2.eb").is_err());
        assert_eq!(RecordFormat::from_path("gcc.yml").unwrap(), RecordFormat::Yaml);
    }
}

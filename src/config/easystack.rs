//! Easystack files: one YAML document listing many software / toolchain /
//! version combinations to build in one go.
//!
//! ```yaml
//! easybuild_version: 4.0.0
//! robot: true
//! software:
//!   GCC:
//!     toolchains:
//!       system:
//!         versions: [4.9.2, 8.2.0]
//!   R:
//!     toolchains:
//!       foss-2020a:
//!         versions:
//!           4.0.0:
//!           3.6.3:
//!             versionsuffix: '-bare'
//! ```
//!
//! `versions` may also be a whitespace separated string or a single number.
//! Wildcards and labels are rejected.

use crate::domain::model::SoftwareSpec;
use crate::domain::ports::SoftwareIdentity;
use crate::utils::error::{RecordError, Result};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::Path;

const LABEL_KEYS: &[&str] = &["exclude-labels", "include-labels"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EasyStack {
    pub easybuild_version: Option<String>,
    pub robot: bool,
    pub software: Vec<SoftwareSpec>,
}

fn easystack_error(message: impl Into<String>) -> RecordError {
    RecordError::EasyStackError {
        message: message.into(),
    }
}

impl EasyStack {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RecordError::IoError)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let raw: Value = serde_yaml::from_str(content).map_err(|e| RecordError::ParseError {
            format: "YAML".to_string(),
            message: e.to_string(),
        })?;

        let software = raw
            .get("software")
            .ok_or_else(|| easystack_error("Not a valid EasyStack YAML file: no 'software' key found"))?;
        let software = software.as_mapping().ok_or_else(|| {
            easystack_error("Not a valid EasyStack YAML file: 'software' must be a mapping")
        })?;

        let mut easystack = EasyStack {
            easybuild_version: raw
                .get("easybuild_version")
                .filter(|v| !v.is_null())
                .map(value_to_string),
            robot: raw.get("robot").and_then(Value::as_bool).unwrap_or(false),
            software: Vec::new(),
        };

        for (name, entry) in software {
            let name = value_to_string(name);
            let toolchains = entry
                .get("toolchains")
                .and_then(Value::as_mapping)
                .ok_or_else(|| {
                    easystack_error(format!("Toolchains for software '{}' are not defined", name))
                })?;

            for (toolchain, toolchain_entry) in toolchains {
                let toolchain = value_to_string(toolchain);
                let (toolchain_name, toolchain_version) = split_toolchain(&toolchain);

                let versions = toolchain_entry.get("versions").ok_or_else(|| {
                    easystack_error(format!(
                        "An error occurred when interpreting the data for software {}: \
                         toolchain '{}' has no 'versions'",
                        name, toolchain
                    ))
                })?;

                if contains_wildcard(versions) {
                    return Err(easystack_error(format!(
                        "EasyStack specifications of '{}' contain asterisk. \
                         Wildcard feature is not supported yet.",
                        name
                    )));
                }

                for (version, versionsuffix) in parse_versions(&name, versions)? {
                    easystack.software.push(SoftwareSpec {
                        name: name.clone(),
                        version,
                        versionsuffix,
                        toolchain_name: toolchain_name.to_string(),
                        toolchain_version: toolchain_version.to_string(),
                    });
                }
            }
        }

        Ok(easystack)
    }

    /// 依宣告順序列出所有 easyconfig 檔名
    pub fn ec_filenames(&self) -> Vec<String> {
        self.software.iter().map(|sw| sw.ec_filename()).collect()
    }

    /// 套用到所有軟體的選項 (例如 robot)
    pub fn general_options(&self) -> BTreeMap<String, String> {
        let mut options = BTreeMap::new();
        if self.robot {
            options.insert("robot".to_string(), "true".to_string());
        }
        if let Some(version) = &self.easybuild_version {
            options.insert("easybuild_version".to_string(), version.clone());
        }
        options
    }
}

/// Parse an easystack file and return the easyconfigs to install together
/// with the general options.
pub fn parse_easystack<P: AsRef<Path>>(path: P) -> Result<(Vec<String>, BTreeMap<String, String>)> {
    tracing::info!("Building from easystack: '{}'", path.as_ref().display());

    let easystack = EasyStack::from_file(&path)?;
    let ec_filenames = easystack.ec_filenames();
    let general_options = easystack.general_options();

    tracing::debug!(
        "EasyStack parsed. Proceeding to install these easyconfigs: '{}'",
        ec_filenames.join("', '")
    );
    if general_options.is_empty() {
        tracing::debug!("No general options were specified in easystack");
    } else {
        tracing::debug!("General options for installation are: {:?}", general_options);
    }

    Ok((ec_filenames, general_options))
}

// 只切第一個 '-'，例如 "foss-2020a" -> ("foss", "2020a")
fn split_toolchain(toolchain: &str) -> (&str, &str) {
    toolchain.split_once('-').unwrap_or((toolchain, ""))
}

fn parse_versions(name: &str, versions: &Value) -> Result<Vec<(String, String)>> {
    match versions {
        Value::Mapping(map) => parse_version_mapping(name, map),
        Value::Sequence(seq) => Ok(seq
            .iter()
            .map(|v| (value_to_string(v), String::new()))
            .collect()),
        Value::String(s) => Ok(s
            .split_whitespace()
            .map(|v| (v.to_string(), String::new()))
            .collect()),
        Value::Number(n) => Ok(vec![(n.to_string(), String::new())]),
        other => Err(easystack_error(format!(
            "An error occurred when interpreting the data for software {}: \
             unsupported 'versions' value {:?}",
            name, other
        ))),
    }
}

fn parse_version_mapping(name: &str, map: &Mapping) -> Result<Vec<(String, String)>> {
    let mut parsed = Vec::with_capacity(map.len());

    for (version, spec) in map {
        let version = value_to_string(version);
        let versionsuffix = match spec {
            Value::Null => String::new(),
            spec => {
                if LABEL_KEYS.iter().any(|key| spec.get(*key).is_some()) {
                    return Err(easystack_error(format!(
                        "EasyStack specifications of '{}' contain labels. \
                         Labels aren't supported yet.",
                        name
                    )));
                }
                spec.get("versionsuffix")
                    .map(value_to_string)
                    .unwrap_or_default()
            }
        };
        parsed.push((version, versionsuffix));
    }

    Ok(parsed)
}

fn contains_wildcard(value: &Value) -> bool {
    match value {
        Value::String(s) => s.contains('*'),
        Value::Sequence(seq) => seq.iter().any(contains_wildcard),
        Value::Mapping(map) => map
            .iter()
            .any(|(k, v)| contains_wildcard(k) || contains_wildcard(v)),
        Value::Tagged(tagged) => contains_wildcard(&tagged.value),
        _ => false,
    }
}

/// YAML 可能把版本讀成數字，統一轉成字串
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_as_list() {
        let easystack = EasyStack::from_yaml_str(
            r#"
software:
  GCC:
    toolchains:
      system:
        versions: [4.9.2, 8.2.0]
"#,
        )
        .unwrap();

        assert_eq!(
            easystack.ec_filenames(),
            vec!["GCC-4.9.2.eb", "GCC-8.2.0.eb"]
        );
        assert!(easystack.software[0].is_system_toolchain());
        assert!(!easystack.robot);
    }

    #[test]
    fn test_versions_as_mapping_with_suffix() {
        let easystack = EasyStack::from_yaml_str(
            r#"
software:
  R:
    toolchains:
      foss-2020a:
        versions:
          4.0.0:
          3.6.3:
            versionsuffix: '-bare'
"#,
        )
        .unwrap();

        assert_eq!(easystack.software.len(), 2);
        assert_eq!(easystack.software[1].toolchain_name, "foss");
        assert_eq!(easystack.software[1].toolchain_version, "2020a");
        assert_eq!(easystack.software[1].versionsuffix, "-bare");
        assert_eq!(
            easystack.ec_filenames(),
            vec!["R-4.0.0-foss-2020a.eb", "R-3.6.3-foss-2020a-bare.eb"]
        );
    }

    #[test]
    fn test_versions_as_string_and_number() {
        let easystack = EasyStack::from_yaml_str(
            r#"
software:
  binutils:
    toolchains:
      GCCcore-8.2.0:
        versions: "2.31.1 2.32"
  Bison:
    toolchains:
      system:
        versions: 3.3
"#,
        )
        .unwrap();

        assert_eq!(
            easystack.ec_filenames(),
            vec![
                "binutils-2.31.1-GCCcore-8.2.0.eb",
                "binutils-2.32-GCCcore-8.2.0.eb",
                "Bison-3.3.eb"
            ]
        );
    }

    #[test]
    fn test_toolchain_split_keeps_rest() {
        assert_eq!(split_toolchain("GCCcore-8.2.0"), ("GCCcore", "8.2.0"));
        assert_eq!(split_toolchain("intel-2019b-x"), ("intel", "2019b-x"));
        assert_eq!(split_toolchain("system"), ("system", ""));
    }

    #[test]
    fn test_missing_software_key() {
        let err = EasyStack::from_yaml_str("robot: true\n").unwrap_err();
        assert!(err.to_string().contains("no 'software' key found"));
    }

    #[test]
    fn test_missing_toolchains() {
        let err = EasyStack::from_yaml_str(
            r#"
software:
  GCC:
    versions: [4.9.2]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Toolchains for software 'GCC'"));
    }

    #[test]
    fn test_toolchain_without_data() {
        let err = EasyStack::from_yaml_str(
            r#"
software:
  GCC:
    toolchains:
      system:
"#,
        )
        .unwrap_err();
        assert!(matches!(err, RecordError::EasyStackError { .. }));
    }

    #[test]
    fn test_wildcard_rejected() {
        let err = EasyStack::from_yaml_str(
            r#"
software:
  GCC:
    toolchains:
      system:
        versions: ["4.9.*"]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Wildcard"));
    }

    #[test]
    fn test_labels_rejected() {
        let err = EasyStack::from_yaml_str(
            r#"
software:
  R:
    toolchains:
      foss-2020a:
        versions:
          4.0.0:
            exclude-labels: arch:aarch64
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("labels"));
    }

    #[test]
    fn test_general_options() {
        let easystack = EasyStack::from_yaml_str(
            r#"
easybuild_version: 4.0.0
robot: true
software:
  GCC:
    toolchains:
      system:
        versions: [4.9.2]
"#,
        )
        .unwrap();

        let options = easystack.general_options();
        assert_eq!(options.get("robot").map(String::as_str), Some("true"));
        assert_eq!(
            options.get("easybuild_version").map(String::as_str),
            Some("4.0.0")
        );
    }
}

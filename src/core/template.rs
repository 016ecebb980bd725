//! `%(key)s` template resolution for record fields.
//!
//! Templates are filled in from the identity of the record (name, version,
//! toolchain, version prefix/suffix). `%%` produces a literal `%`; any other
//! lone `%` is copied through unchanged so percent-encoded URLs survive.
//!
//! A field value that is exactly the name of a well-known constant, such as
//! `SOURCELOWER_TAR_BZ2` or `GNU_SOURCE`, is first replaced by the template
//! the constant stands for.

use crate::domain::model::Toolchain;
use crate::domain::ports::SoftwareIdentity;
use crate::utils::error::{RecordError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static TEMPLATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"%%|%\(([A-Za-z_][A-Za-z0-9_]*)\)s").expect("template pattern is valid")
});

const CONSTANTS: &[(&str, &str)] = &[
    ("SOURCE_TAR_GZ", "%(name)s-%(version)s.tar.gz"),
    ("SOURCE_TAR_BZ2", "%(name)s-%(version)s.tar.bz2"),
    ("SOURCE_TAR_XZ", "%(name)s-%(version)s.tar.xz"),
    ("SOURCE_TGZ", "%(name)s-%(version)s.tgz"),
    ("SOURCE_TAR", "%(name)s-%(version)s.tar"),
    ("SOURCE_ZIP", "%(name)s-%(version)s.zip"),
    ("SOURCELOWER_TAR_GZ", "%(namelower)s-%(version)s.tar.gz"),
    ("SOURCELOWER_TAR_BZ2", "%(namelower)s-%(version)s.tar.bz2"),
    ("SOURCELOWER_TAR_XZ", "%(namelower)s-%(version)s.tar.xz"),
    ("SOURCELOWER_TGZ", "%(namelower)s-%(version)s.tgz"),
    ("SOURCELOWER_TAR", "%(namelower)s-%(version)s.tar"),
    ("SOURCELOWER_ZIP", "%(namelower)s-%(version)s.zip"),
    ("GNU_SOURCE", "https://ftpmirror.gnu.org/gnu/%(namelower)s"),
    (
        "GNU_SAVANNAH_SOURCE",
        "https://download-mirror.savannah.gnu.org/releases/%(namelower)s",
    ),
    ("SOURCEFORGE_SOURCE", "https://download.sourceforge.net/%(namelower)s"),
    (
        "PYPI_SOURCE",
        "https://pypi.python.org/packages/source/%(nameletter)s/%(name)s",
    ),
];

/// 常數名稱對應的模板；不是常數則回傳 `None`
pub fn expand_constant(entry: &str) -> Option<&'static str> {
    CONSTANTS
        .iter()
        .find(|(constant, _)| *constant == entry)
        .map(|(_, template)| *template)
}

/// The values available to `%(key)s` templates for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateValues {
    values: BTreeMap<&'static str, String>,
}

impl TemplateValues {
    pub fn for_identity<I: SoftwareIdentity + ?Sized>(identity: &I) -> Self {
        let mut values = BTreeMap::new();
        let name = identity.name();
        let version = identity.version();

        values.insert("name", name.to_string());
        values.insert("namelower", name.to_lowercase());
        if let Some(letter) = name.chars().next() {
            values.insert("nameletter", letter.to_string());
            values.insert("nameletterlower", letter.to_lowercase().to_string());
        }

        values.insert("version", version.to_string());
        let mut parts = version.split('.');
        if let Some(major) = parts.next().filter(|p| !p.is_empty()) {
            values.insert("version_major", major.to_string());
            if let Some(minor) = parts.next().filter(|p| !p.is_empty()) {
                values.insert("version_minor", minor.to_string());
                values.insert("version_major_minor", format!("{}.{}", major, minor));
            }
        }

        values.insert("versionprefix", identity.version_prefix().to_string());
        values.insert("versionsuffix", identity.version_suffix().to_string());

        let toolchain_name = identity.toolchain_name();
        if Toolchain::is_system_name(toolchain_name) {
            values.insert("toolchain_name", Toolchain::SYSTEM_NAME.to_string());
        } else {
            values.insert("toolchain_name", toolchain_name.to_string());
            if !identity.toolchain_version().is_empty() {
                values.insert("toolchain_version", identity.toolchain_version().to_string());
            }
        }

        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().copied()
    }
}

/// Resolve every template in `input`.
///
/// `field` only labels the error, e.g. `sources[0]`.
pub fn resolve(field: &str, input: &str, values: &TemplateValues) -> Result<String> {
    let input = expand_constant(input).unwrap_or(input);
    let mut resolved = String::with_capacity(input.len());
    let mut last = 0;

    for caps in TEMPLATE_RE.captures_iter(input) {
        let Some(whole) = caps.get(0) else { continue };
        push_literal(field, &input[last..whole.start()], &mut resolved)?;

        match caps.get(1) {
            None => resolved.push('%'),
            Some(key) => {
                let value =
                    values
                        .get(key.as_str())
                        .ok_or_else(|| RecordError::TemplateError {
                            field: field.to_string(),
                            placeholder: whole.as_str().to_string(),
                        })?;
                resolved.push_str(value);
            }
        }
        last = whole.end();
    }
    push_literal(field, &input[last..], &mut resolved)?;

    Ok(resolved)
}

// 沒被正規表達式吃掉的 `%(` 一定是寫壞的模板
fn push_literal(field: &str, literal: &str, out: &mut String) -> Result<()> {
    if let Some(pos) = literal.find("%(") {
        let fragment: String = literal[pos..].chars().take(24).collect();
        return Err(RecordError::TemplateError {
            field: field.to_string(),
            placeholder: fragment,
        });
    }
    out.push_str(literal);
    Ok(())
}

pub fn resolve_all(field: &str, inputs: &[String], values: &TemplateValues) -> Result<Vec<String>> {
    inputs
        .iter()
        .enumerate()
        .map(|(i, input)| resolve(&format!("{}[{}]", field, i), input, values))
        .collect()
}

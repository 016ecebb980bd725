use crate::core::template::{self, TemplateValues};
use crate::domain::model::{PackageBuildRecord, PatchSpec};
use crate::utils::error::Result;
use serde::Serialize;

/// 套用模板後的記錄內容，順序與宣告時相同
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRecord {
    pub homepage: String,
    pub source_urls: Vec<String>,
    pub sources: Vec<String>,
    pub patches: Vec<PatchSpec>,
}

impl PackageBuildRecord {
    pub fn template_values(&self) -> TemplateValues {
        TemplateValues::for_identity(self)
    }

    /// Apply templates to the homepage, source URLs, sources and patch
    /// filenames. Mirror selection stays with the external fetcher.
    pub fn resolve(&self) -> Result<ResolvedRecord> {
        let values = self.template_values();

        let patches = self
            .patches()
            .iter()
            .enumerate()
            .map(|(i, patch)| {
                Ok(PatchSpec {
                    filename: template::resolve(
                        &format!("patches[{}]", i),
                        &patch.filename,
                        &values,
                    )?,
                    target_dir: patch
                        .target_dir
                        .as_deref()
                        .map(|dir| template::resolve(&format!("patches[{}]", i), dir, &values))
                        .transpose()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let resolved = ResolvedRecord {
            homepage: template::resolve("homepage", self.homepage(), &values)?,
            source_urls: template::resolve_all("source_urls", self.source_urls(), &values)?,
            sources: template::resolve_all("sources", self.sources(), &values)?,
            patches,
        };

        tracing::debug!(
            "Resolved {} sources, {} source URLs and {} patches for {}",
            resolved.sources.len(),
            resolved.source_urls.len(),
            resolved.patches.len(),
            self.name()
        );

        Ok(resolved)
    }
}

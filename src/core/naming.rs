use crate::domain::model::Toolchain;

/// 組出完整的 easyconfig 版本字串
///
/// `<prefix><version>-<toolchain_name>-<toolchain_version><suffix>`, where the
/// toolchain part is left out for the system toolchain and the toolchain
/// version part is left out when it is empty.
pub fn full_ec_version(
    version: &str,
    toolchain_name: &str,
    toolchain_version: &str,
    prefix: &str,
    suffix: &str,
) -> String {
    let mut full = String::with_capacity(
        prefix.len() + version.len() + toolchain_name.len() + toolchain_version.len() + suffix.len() + 2,
    );
    full.push_str(prefix);
    full.push_str(version);

    if !toolchain_name.is_empty() && !Toolchain::is_system_name(toolchain_name) {
        full.push('-');
        full.push_str(toolchain_name);
        if !toolchain_version.is_empty() {
            full.push('-');
            full.push_str(toolchain_version);
        }
    }

    full.push_str(suffix);
    full
}

pub fn ec_filename(name: &str, full_ec_version: &str) -> String {
    format!("{}-{}.eb", name, full_ec_version)
}

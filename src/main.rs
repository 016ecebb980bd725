use clap::Parser;
use easyconfig::utils::error::ErrorSeverity;
use easyconfig::utils::{logger, system, validation::Validate};
use easyconfig::{CliConfig, PackageBuildRecord, RecordError, SoftwareIdentity};

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_log {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("🚀 Starting easyconfig");
    tracing::debug!("CLI config: {:?}", config);

    // 驗證命令列參數
    if let Err(e) = config.validate() {
        fail(&e);
    }

    tracing::info!("📁 Loading record from: {}", config.config);

    let record = match PackageBuildRecord::from_file(&config.config) {
        Ok(record) => record,
        Err(e) => fail(&e),
    };

    tracing::info!("✅ Record loaded and validated successfully");
    tracing::debug!(
        "Available templates: {}",
        record.template_values().keys().collect::<Vec<_>>().join(", ")
    );

    let cpus = config.cpus.unwrap_or_else(system::available_cpus);
    display_record_summary(&record, cpus);

    if config.resolve {
        // 驗證時已經解析過一次，這裡不會失敗
        match record.resolve() {
            Ok(resolved) => {
                println!("🔗 Source URLs:");
                for url in &resolved.source_urls {
                    println!("  {}", url);
                }
                println!("📦 Sources:");
                for source in &resolved.sources {
                    println!("  {}", source);
                }
                println!("🩹 Patches (in application order):");
                for patch in &resolved.patches {
                    match &patch.target_dir {
                        Some(dir) => println!("  {} -> {}", patch.filename, dir),
                        None => println!("  {}", patch.filename),
                    }
                }
                println!();
            }
            Err(e) => fail(&e),
        }
    }

    if let Some(format) = config.emit {
        tracing::debug!("Emitting record as {}", format.name());
        print!("{}", record.to_string_with_format(format)?);
    }

    Ok(())
}

fn display_record_summary(record: &PackageBuildRecord, cpus: usize) {
    println!("📋 Record Summary:");
    println!("  Package: {} v{}", record.name(), record.version());
    println!("  Easyconfig: {}", record.ec_filename());
    println!("  Toolchain: {}", record.toolchain());
    println!("  Easyblock: {}", record.easyblock().unwrap_or("<derived from name>"));
    println!("  Module class: {}", record.moduleclass());
    println!("  Homepage: {}", record.homepage());
    println!(
        "  Sources: {}, Source URLs: {}, Patches: {}",
        record.sources().len(),
        record.source_urls().len(),
        record.patches().len()
    );
    match record.maxparallel() {
        Some(cap) => println!(
            "  Max Parallel: {} (effective {} of {} CPUs)",
            cap,
            record.effective_parallelism(cpus),
            cpus
        ),
        None => println!("  Max Parallel: unlimited ({} CPUs)", cpus),
    }
    println!();
}

fn fail(e: &RecordError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::Medium | ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

use clap::Parser;
use easyconfig::parse_easystack;
use easyconfig::utils::logger;

#[derive(Parser)]
#[command(name = "easystack")]
#[command(about = "List the easyconfigs an easystack file asks to install")]
struct Args {
    /// Path to easystack YAML file
    #[arg(short, long, default_value = "easystack.yaml")]
    file: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    let (ec_filenames, general_options) = match parse_easystack(&args.file) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::error!("❌ Failed to parse easystack '{}': {}", args.file, e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    tracing::info!("✅ {} easyconfigs to install", ec_filenames.len());

    for name in &ec_filenames {
        println!("{}", name);
    }

    if !general_options.is_empty() {
        eprintln!();
        eprintln!("⚙️ General options:");
        for (key, value) in &general_options {
            eprintln!("  {} = {}", key, value);
        }
    }

    Ok(())
}

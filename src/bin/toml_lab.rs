use clap::Parser;
use isolation_lab::app::{report, scenarios};
use isolation_lab::config::toml_config::TomlConfig;
use isolation_lab::domain::ports::ConfigProvider;
use isolation_lab::utils::error::ErrorSeverity;
use isolation_lab::utils::{logger, validation::Validate};
use isolation_lab::{LabEngine, Runtime};

#[derive(Parser)]
#[command(name = "toml-lab")]
#[command(about = "Isolation lab driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "lab-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Print the report as JSON, overriding [monitoring].json
    #[arg(long)]
    json: bool,

    /// Dry run - show which scenarios would run without running them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置
    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    let json = args.json || config.json_logging();
    if json {
        logger::init_json_logger(config.log_level());
    } else {
        logger::init_cli_logger(args.verbose);
    }
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let scenarios = scenarios::build_scenarios(&config)?;
    if !json {
        display_config_summary(&config, &args);
    }

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no scenario will run");
        for scenario in &scenarios {
            println!("  • {}: {}", scenario.name(), scenario.description());
        }
        return Ok(());
    }

    let engine = LabEngine::new(Runtime::new(config.runtime_config()), scenarios);
    let lab_report = match engine.run().await {
        Ok(lab_report) => lab_report,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(exit_code(e.severity()));
        }
    };

    if json {
        println!("{}", report::render_json(&lab_report)?);
    } else {
        print!("{}", report::render_summary(&lab_report));
    }

    if let Err(e) = report::ensure_passed(&lab_report) {
        tracing::error!("❌ {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(exit_code(e.severity()));
    }

    tracing::info!("✅ All isolation scenarios passed");
    Ok(())
}

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Lab: {}", config.lab.name);
    if let Some(description) = &config.lab.description {
        println!("  Description: {}", description);
    }
    let enabled = config.scenarios();
    if enabled.is_empty() {
        println!("  Scenarios: all");
    } else {
        println!("  Scenarios: {}", enabled.join(", "));
    }
    println!("  Concurrent Calls: {}", config.concurrent_calls());
    println!("  Mailbox Capacity: {}", config.runtime.mailbox_capacity);
    println!("  Seed Items: {}", config.repository.items.len());
    println!("  Fail First Fetch: {}", config.fail_fetch());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }
}

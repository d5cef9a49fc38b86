use clap::Parser;
use isolation_lab::app::{report, scenarios};
use isolation_lab::domain::ports::ConfigProvider;
use isolation_lab::utils::error::ErrorSeverity;
use isolation_lab::utils::{logger, validation::Validate};
use isolation_lab::{CliConfig, LabEngine, LabError, Runtime};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json {
        logger::init_json_logger(if config.verbose { Some("debug") } else { None });
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting isolation-lab CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let runtime = Runtime::new(config.runtime_config());
    let scenarios = scenarios::build_scenarios(&config)?;
    let engine = LabEngine::new(runtime, scenarios);

    let outcome = match engine.run().await {
        Ok(lab_report) => {
            if config.json {
                println!("{}", report::render_json(&lab_report)?);
            } else {
                print!("{}", report::render_summary(&lab_report));
            }
            report::ensure_passed(&lab_report)
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => {
            tracing::info!("✅ All isolation scenarios passed");
        }
        Err(e) => exit_with(e),
    }

    Ok(())
}

fn exit_with(e: LabError) {
    tracing::error!(
        "❌ Isolation lab failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,      // 預期中的拒絕
        ErrorSeverity::Medium => 2,   // 可重試
        ErrorSeverity::High => 1,     // 實驗失敗
        ErrorSeverity::Critical => 3, // 系統錯誤
    };

    if exit_code > 0 {
        std::process::exit(exit_code);
    }
}

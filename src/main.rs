use clap::Parser;
use label_etl::utils::{logger, validation::Validate};
use label_etl::{
    CliConfig, Command, EtlEngine, JobConfig, LabelError, LabelPipeline, LocalStorage,
    SortPipeline,
};
use serde::Serialize;

async fn run(config: &CliConfig) -> Result<String, LabelError> {
    let job = match &config.config {
        Some(path) => {
            let job = JobConfig::from_file(path)?;
            job.validate()?;
            tracing::info!("⚙️ Loaded job config from {}", path);
            job
        }
        None => JobConfig::default(),
    };

    let storage = LocalStorage::default();
    match &config.command {
        Command::GenerateLabels { input, output } => {
            let pipeline = LabelPipeline::new(storage, input.as_str(), output.as_str())
                .with_schemas(job.schemas())
                .with_summary_title(job.summary_title());
            let report = EtlEngine::new_with_monitoring(pipeline, config.monitor)
                .run()
                .await?;
            to_json(&report)
        }
        Command::SortLabels {
            spreadsheet,
            document,
            output,
        } => {
            let pipeline = SortPipeline::new(
                storage,
                spreadsheet.as_str(),
                document.as_str(),
                output.as_str(),
            )
            .with_tracking_column(job.tracking_column());
            let report = EtlEngine::new_with_monitoring(pipeline, config.monitor)
                .run()
                .await?;
            to_json(&report)
        }
    }
}

fn to_json<T: Serialize>(report: &T) -> Result<String, LabelError> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting label-etl {}", env!("CARGO_PKG_VERSION"));
    tracing::debug!("CLI config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.severity().exit_code());
    }

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    match run(&config).await {
        Ok(report) => {
            println!("{}", report);
        }
        Err(e) => {
            tracing::error!("❌ Run failed: {} (Severity: {:?})", e, e.severity());
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            std::process::exit(e.severity().exit_code());
        }
    }
}

use clap::Parser;
use proxy_viewer::config::{CliArgs, OutputFormat, ParameterSpec};
use proxy_viewer::utils::error::ErrorSeverity;
use proxy_viewer::utils::{logger, validation::Validate};
use proxy_viewer::{ActionOutcome, ReqwestTransport, ViewController, ViewerConfig, ViewerError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting proxy-viewer");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let mut config = match ViewerConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    if let Some(proxy_base) = &args.proxy_base {
        config.viewer.proxy_base = proxy_base.clone();
        tracing::info!("🔧 Proxy base overridden to: {}", proxy_base);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    if args.list {
        print_actions(&config);
        return Ok(());
    }

    let transport = match ReqwestTransport::new(config.timeout()) {
        Ok(transport) => transport,
        Err(e) => exit_with(&e),
    };
    let controller = match ViewController::new(transport, &config) {
        Ok(controller) => controller,
        Err(e) => exit_with(&e),
    };

    let outcome = controller.submit(&args.action, args.input.as_deref()).await;
    tracing::debug!("Action outcome: {:?}", outcome);

    if let ActionOutcome::Success { total_pages, .. } = outcome {
        if args.page != 1 {
            if let Err(e) = controller.go_to_page(args.page) {
                tracing::warn!("⚠️ Page {} not available ({} pages): {}", args.page, total_pages, e);
            }
        }
    }

    let surface = controller.snapshot();
    match args.format {
        OutputFormat::Html => println!("{}", surface.to_html()),
        OutputFormat::Text => {
            println!("[{}] {}", surface.status.severity.as_str(), surface.status.text);
            println!("{}", surface.table.to_text());
        }
        OutputFormat::Csv => {
            eprintln!("[{}] {}", surface.status.severity.as_str(), surface.status.text);
            match surface.table.to_csv() {
                Ok(csv) => print!("{}", csv),
                Err(e) => exit_with(&e),
            }
        }
        OutputFormat::Json => match surface.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => exit_with(&e),
        },
    }

    let exit_code = match outcome {
        ActionOutcome::Success { .. } | ActionOutcome::Empty | ActionOutcome::HealthOk => 0,
        ActionOutcome::Invalid { field, message } => {
            eprintln!("❌ Invalid {}: {}", field, message);
            1
        }
        ActionOutcome::Failed { .. } => 2, // 請求失敗，可重試
        ActionOutcome::Busy | ActionOutcome::Superseded => 3,
    };
    if exit_code > 0 {
        std::process::exit(exit_code);
    }

    Ok(())
}

fn print_actions(config: &ViewerConfig) {
    println!("health\t(liveness check: GET {})", config.health.path);
    for endpoint in &config.endpoints {
        let parameter = match &endpoint.parameter {
            ParameterSpec::None => String::new(),
            ParameterSpec::Text { field } => format!("<{}>", field),
            ParameterSpec::Choice { field, options } => format!("<{}: {}>", field, options.join("|")),
        };
        println!(
            "{}\t{}\t{}",
            endpoint.name,
            endpoint.label.as_deref().unwrap_or(&endpoint.path),
            parameter
        );
    }
}

fn exit_with(e: &ViewerError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

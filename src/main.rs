use std::fs::{self, File};
use std::process::ExitCode;

use clap::Parser;
use nextread::cli::{self, Args};
use nextread::core::config;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let file_config = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let resolved = config::resolve(&file_config, args.data_dir.as_deref());

    // File logger in the data directory, so output and logs never interleave
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if fs::create_dir_all(&resolved.data_dir).is_ok()
        && let Ok(log_file) = File::options()
            .create(true)
            .append(true)
            .open(resolved.data_dir.join("nextread.log"))
    {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    log::info!(
        "NextRead {} running {}",
        env!("CARGO_PKG_VERSION"),
        args.command.name()
    );

    match cli::run(args.command, resolved).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::warn!("Command failed: {}", e);
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

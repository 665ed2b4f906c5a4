use std::process::ExitCode;

use dep_vendor::Downloader;

mod args;
mod error;

use error::AppError;

fn main() -> ExitCode {
    init_logging();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(&err)
        }
    }
}

fn run() -> Result<(), AppError> {
    let spec = args::parse()?;
    let package = format!("{} {}", spec.package_name, spec.package_version);

    let bar = make_progress_spinner();
    bar.set_message(format!("fetching {package}"));
    let result = Downloader::new(spec).run();
    match &result {
        Ok(()) => bar.finish_with_message(format!("✅ fetched {package}")),
        Err(_) => bar.finish_with_message(format!("❌ failed to fetch {package}")),
    }

    Ok(result?)
}

fn make_progress_spinner() -> indicatif::ProgressBar {
    let pb = indicatif::ProgressBar::new_spinner();
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    pb.set_style(
        indicatif::ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap()
            .tick_strings(&[
                "▹▹▹▹▹",
                "▸▹▹▹▹",
                "▹▸▹▹▹",
                "▹▹▸▹▹",
                "▹▹▹▸▹",
                "▹▹▹▹▸",
                "▪▪▪▪▪",
            ]),
    );
    pb
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
}

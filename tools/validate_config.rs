use std::path::PathBuf;

use api_envelope::api::middleware::FilterOptions;
use clap::Parser;

#[derive(Parser)]
struct Cli {
    /// Filter options file (.toml, .yaml or .yml)
    config: PathBuf,

    /// Print the resolved options as JSON
    #[arg(long)]
    print: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = FilterOptions::from_file(&cli.config)?;

    println!("{}: ok", cli.config.display());
    println!(
        "development: {}, sanitization: {}, rate tracking: {}, metrics: {}, write timeout: {:?}",
        options.is_development,
        options.sanitization_active(),
        options.enable_rate_limit_tracking,
        options.enable_metrics,
        options.write_timeout(),
    );

    let mut statuses: Vec<_> = options.custom_error_messages.keys().copied().collect();
    statuses.sort_unstable();
    for status in statuses {
        println!("custom error {status}: {}", options.custom_error_messages[&status]);
    }

    if cli.print {
        println!("{}", serde_json::to_string_pretty(&options)?);
    }

    Ok(())
}

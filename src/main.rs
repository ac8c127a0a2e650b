use clap::Parser;
use jobfill::cli::commands::{cmd_capture, cmd_fill, cmd_scan};
use jobfill::cli::config::{Cli, Commands, load_config, log_filter};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter(cli.verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref());

    match &cli.command {
        Commands::Scan {
            snapshot,
            timeout_ms,
            min_fields,
            mutations,
        } => {
            cmd_scan(&config, snapshot, *timeout_ms, *min_fields, mutations.as_deref())?;
        }
        Commands::Fill {
            snapshot,
            profile,
            domain_mappings,
            output,
            submit_unknown,
            trace,
        } => {
            cmd_fill(
                &cli,
                &config,
                snapshot,
                profile.as_deref(),
                domain_mappings.as_deref(),
                output.as_deref(),
                *submit_unknown,
                trace.as_deref(),
            )?;
        }
        Commands::Capture { snapshot, submit } => {
            cmd_capture(&cli, &config, snapshot, *submit)?;
        }
    }

    Ok(())
}

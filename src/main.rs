use anyhow::{Context as _, Result};
use clap::Parser;
use photobooth::{Booth, BoothConfig, EXIT_CODE_RESTART};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(name = "photobooth")]
#[command(about = "Photo booth kiosk with a session state machine and background finishing")]
#[command(version)]
#[command(long_about = "A photo booth that walks guests through a session of countdowns and \
shots, assembles the shots into one picture, shows it for review and stores it in the \
background. Restarts itself when a session asks for it.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "photobooth.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without starting the booth")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Skip the welcome screen
    #[arg(long, help = "Start the camera right away instead of showing the welcome screen")]
    run: bool,

    /// Disable the terminal keyboard handler
    #[arg(long, help = "Do not read trigger and session keys from the terminal")]
    no_keyboard: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle special modes that don't require full initialization
    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    let mut config = load_config(&args)?;
    let log_guard = init_logging(&args, &config)?;

    info!("Starting photobooth v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    loop {
        config.validate().context("invalid configuration")?;

        let mut booth = Booth::new(config);
        booth.set_run_now(args.run);
        booth.set_keyboard_enabled(!args.no_keyboard);

        let exit_code = booth.run().await.map_err(|e| {
            error!("Photo booth error during execution: {}", e);
            e
        })?;

        if exit_code != EXIT_CODE_RESTART {
            info!("Photo booth exited with code: {}", exit_code);
            // Flush the log file before the process ends
            drop(log_guard);
            std::process::exit(exit_code);
        }

        info!("Restarting photo booth");
        config = load_config(&args)?;
    }
}

fn load_config(args: &Args) -> Result<BoothConfig> {
    BoothConfig::load_from_file(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config))
}

fn init_logging(args: &Args, config: &BoothConfig) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{
        fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
    };

    // Determine log level based on flags
    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    // Create environment filter
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("photobooth={}", log_level)));

    // Configure format based on options
    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    let mut layers = vec![fmt_layer];

    // Daily rotated log file next to the console output
    let guard = match &config.logging.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory)
                .with_context(|| format!("failed to create log directory {}", directory))?;
            let appender = tracing_appender::rolling::daily(directory, "photobooth.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(writer)
                    .boxed(),
            );
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .init();

    Ok(guard)
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Photobooth Configuration File");
    println!("# This is the default configuration with all available options");
    println!("# Environment overrides use PHOTOBOOTH_<SECTION>__<KEY>, e.g. PHOTOBOOTH_SESSION__NUM_X=3");
    println!();

    let default_config = toml::to_string_pretty(&BoothConfig::default())
        .context("failed to serialize default configuration")?;
    println!("{}", default_config);
    Ok(())
}

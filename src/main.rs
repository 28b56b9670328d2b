use anyhow::Result;
use clap::Parser;
use robomux::{
    App, CameraManager, FaceService, Hardware, InputRouter, KeyboardInput, ModeCoordinator,
    NullFace, RobomuxConfig, SimCameraBackend, SimConversation, SimGame, SimPresentation,
    SimulatedHardware,
};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "robomux")]
#[command(about = "IR-driven mode coordinator for a Raspberry Pi robot car")]
#[command(version)]
#[command(long_about = "Mode coordinator for a camera-equipped robot car. Drives color, face, \
gesture, object and plate tracking, a rock-paper-scissors game, a scripted presentation and a \
voice assistant from an IR remote, guaranteeing that only one mode owns the camera, the motors \
and the face display at a time.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "robomux.toml", help = "Path to TOML configuration file")]
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
    #[arg(long, help = "Validate configuration file and exit without starting the system")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Dry run mode - wire everything up but don't start the loop
    #[arg(long, help = "Perform dry run - construct all components but don't start them")]
    dry_run: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Drive the robot from the keyboard instead of the IR remote
    #[arg(short, long, help = "Enable keyboard input (implies the simulated expansion board)")]
    keyboard: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle special modes that don't require full initialization
    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting robomux v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match RobomuxConfig::load_from_file(&args.config) {
        Ok(config) => {
            info!("Configuration loaded successfully from: {}", args.config);
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if args.validate_config {
        // load_from_file already ran validation; getting here means it passed
        info!("Configuration validation successful");
        println!("✓ Configuration is valid");
        return Ok(());
    }

    // The expansion board: real over I2C when compiled in, simulated on
    // the bench. Keyboard input always drives the simulated board so the
    // whole IR path is exercised.
    let sim_hardware = Arc::new(SimulatedHardware::new());
    let hardware = select_hardware(&args, &config, &sim_hardware)?;

    let camera = Arc::new(CameraManager::new(
        Box::new(SimCameraBackend::new()),
        config.camera.index,
    ));

    let coordinator = ModeCoordinator::new(
        Arc::clone(&camera),
        Arc::clone(&hardware),
        Arc::new(NullFace::new()) as Arc<dyn FaceService>,
        Arc::new(SimConversation),
        Arc::new(SimGame),
        Arc::new(SimPresentation),
        config.assets.clone(),
    );

    let router = InputRouter::new(Arc::clone(&hardware), config.ir.clone());
    let keyboard = args
        .keyboard
        .then(|| KeyboardInput::new(Arc::clone(&sim_hardware), config.ir.clone()));

    let mut app = App::new(coordinator, camera, router, keyboard);

    if args.dry_run {
        info!("Dry run mode - components constructed but not started");
        println!("✓ Dry run completed successfully - all components constructed");
        return Ok(());
    }

    app.start().await.map_err(|e| {
        error!("Failed to start input sources: {}", e);
        e
    })?;

    let exit_code = app.run().await.map_err(|e| {
        error!("System error during execution: {}", e);
        e
    })?;

    info!("robomux exited with code: {}", exit_code);
    std::process::exit(exit_code);
}

fn select_hardware(
    args: &Args,
    config: &RobomuxConfig,
    sim: &Arc<SimulatedHardware>,
) -> Result<Arc<dyn Hardware>> {
    if args.keyboard {
        info!("Keyboard input requested; using the simulated expansion board");
        return Ok(Arc::clone(sim) as Arc<dyn Hardware>);
    }

    #[cfg(all(target_os = "linux", feature = "hardware"))]
    {
        let device = robomux::hardware::I2cHardware::new(&config.hardware)?;
        return Ok(Arc::new(device) as Arc<dyn Hardware>);
    }

    #[cfg(not(all(target_os = "linux", feature = "hardware")))]
    {
        let _ = config;
        info!("Hardware support not compiled in; using the simulated expansion board");
        Ok(Arc::clone(sim) as Arc<dyn Hardware>)
    }
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

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

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("robomux={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
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

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# robomux configuration file");
    println!("# Defaults shown; every key is optional");
    println!();
    println!("{}", RobomuxConfig::default().to_toml()?);
    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use posecoach::config::OverlayConfig;
use posecoach::events::recv_event;
use posecoach::{
    AnalysisClient, ControlCommand, HttpTransport, KeyboardInputHandler, MediaSourceBuilder,
    PoseCatalog, PosecoachConfig, SessionController, SessionSnapshot,
};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(name = "posecoach")]
#[command(about = "Real-time pose coaching against a pose-analysis service")]
#[command(version)]
#[command(long_about = "Samples a camera feed once per tick, sends each frame to a \
pose-analysis HTTP service, and tracks how long the selected pose has been held. \
Feedback from the service is rendered as an overlay on the latest frame.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "posecoach.toml", help = "Path to TOML configuration file")]
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
    #[arg(long, help = "Validate configuration file and exit without starting a session")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// List the pose catalog and exit
    #[arg(long, help = "List selectable poses and their reference images, then exit")]
    list_poses: bool,

    /// Pose to coach
    #[arg(long, value_name = "POSE", help = "Pose to select at startup (overrides session.default_pose)")]
    pose: Option<String>,

    /// Stop the session after this many seconds
    #[arg(long, value_name = "SECS", help = "End the session automatically after SECS seconds")]
    duration: Option<u64>,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Also write logs to a file
    #[arg(long, value_name = "PATH", help = "Append plain-text logs to PATH")]
    log_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config();
        return Ok(());
    }

    let _log_guard = init_logging(&args)?;

    info!("Starting posecoach v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = PosecoachConfig::load_from_file(&args.config).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

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
    config.validate().context("Invalid configuration")?;

    let catalog = PoseCatalog::load_or_builtin(config.catalog.path.as_deref())?;

    if args.list_poses {
        for entry in catalog.entries() {
            println!("{}\t{}", entry.id, entry.reference_image);
        }
        return Ok(());
    }

    let media = MediaSourceBuilder::new()
        .config(config.camera.clone())
        .build()?;
    let transport = HttpTransport::new(&config.analysis)?;
    let client = AnalysisClient::new(Arc::new(transport), &config.analysis);
    let mut controller = SessionController::new(media, client, catalog, &config.session);

    match args.pose.as_deref().or(config.session.default_pose.as_deref()) {
        Some(pose) => controller.select_pose(pose)?,
        None => warn!("No pose selected; frames are not analyzed until one is chosen"),
    }

    let overlay_output = OverlayOutput::new(&config.overlay);
    let mut snapshots = controller.subscribe_snapshots();

    let mut events = controller.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = recv_event(&mut events).await {
            info!("{}: {}", event.title(), event.description());
        }
    });

    controller.start().await.map_err(|e| {
        error!("Failed to start session: {}", e);
        e
    })?;

    let (command_tx, mut command_rx) = mpsc::unbounded_channel();
    let keyboard = if std::io::stdin().is_terminal() {
        let handler = KeyboardInputHandler::new(command_tx.clone());
        handler.start().await?;
        Some(handler)
    } else {
        debug!("stdin is not a terminal; keyboard controls disabled");
        None
    };

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let deadline = async {
        match args.duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            signal = &mut shutdown => {
                info!("Received {}; ending session", signal);
                break;
            }
            _ = &mut deadline => {
                info!("Session duration elapsed");
                break;
            }
            Some(command) = command_rx.recv() => match command {
                ControlCommand::ToggleSession => {
                    if controller.is_active() {
                        if let Some(summary) = controller.stop().await? {
                            println!("{}\r", summary.message());
                        }
                    } else if let Err(e) = controller.start().await {
                        error!("Failed to start session: {}", e);
                    }
                }
                ControlCommand::NextPose => {
                    controller.cycle_pose(false)?;
                }
                ControlCommand::PreviousPose => {
                    controller.cycle_pose(true)?;
                }
                ControlCommand::Quit => {
                    info!("Quit requested");
                    break;
                }
            },
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                report_snapshot(&snapshot);
                overlay_output.write(&snapshot);
            }
        }
    }

    if let Some(keyboard) = &keyboard {
        keyboard.stop().await?;
    }

    if let Some(summary) = controller.stop().await? {
        println!("{}", summary.message());
    }

    info!("posecoach exited");
    Ok(())
}

fn report_snapshot(snapshot: &SessionSnapshot) {
    if !snapshot.is_active() {
        return;
    }
    debug!(
        "elapsed={:.0}s pose={} hold={:.1}s best={:.1}s feedback={}",
        snapshot.elapsed_seconds,
        snapshot.selected_pose_id.as_deref().unwrap_or("-"),
        snapshot.current_hold_seconds,
        snapshot.best_hold_seconds,
        snapshot.feedback_items.len()
    );
}

/// Resolves with the name of the first termination signal received
async fn shutdown_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => "SIGINT",
                    _ = sigterm.recv() => "SIGTERM",
                }
            }
            Err(e) => {
                warn!("Failed to register SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                "SIGINT"
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        "SIGINT"
    }
}

/// Writes the rendered overlay for each applied tick to `overlay.output_path`
struct OverlayOutput {
    #[cfg(feature = "render")]
    target: Option<(posecoach::OverlayRenderer, String)>,
}

impl OverlayOutput {
    #[cfg(feature = "render")]
    fn new(config: &OverlayConfig) -> Self {
        if !config.render {
            return Self { target: None };
        }
        let Some(path) = config.output_path.clone() else {
            warn!("overlay.render is set but overlay.output_path is not; nothing will be written");
            return Self { target: None };
        };

        match posecoach::OverlayRenderer::new(config) {
            Ok(renderer) => Self {
                target: Some((renderer, path)),
            },
            Err(e) => {
                warn!("Overlay rendering disabled: {}", e);
                Self { target: None }
            }
        }
    }

    #[cfg(not(feature = "render"))]
    fn new(config: &OverlayConfig) -> Self {
        if config.render {
            warn!("overlay.render is set but posecoach was built without the 'render' feature");
        }
        Self {}
    }

    #[cfg(feature = "render")]
    fn write(&self, snapshot: &SessionSnapshot) {
        let Some((renderer, path)) = &self.target else {
            return;
        };
        let (Some(overlay), Some(image)) = (&snapshot.overlay, &snapshot.overlay_image) else {
            return;
        };

        match renderer.render(overlay, image) {
            Ok(jpeg) => {
                if let Err(e) = std::fs::write(path, jpeg) {
                    warn!("Failed to write overlay to {}: {}", path, e);
                }
            }
            Err(e) => warn!("Failed to render overlay: {}", e),
        }
    }

    #[cfg(not(feature = "render"))]
    fn write(&self, _snapshot: &SessionSnapshot) {}
}

fn init_logging(args: &Args) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

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
        .unwrap_or_else(|_| EnvFilter::new(format!("posecoach={}", log_level)));

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

    let (file_layer, guard) = match args.log_file.as_deref() {
        Some(log_file) => {
            let path = Path::new(log_file);
            let directory = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid log file path: {}", log_file))?;

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    Ok(guard)
}

/// Print default configuration in TOML format
fn print_default_config() {
    println!("# posecoach configuration file");
    println!("# This is the default configuration with all available options");
    println!();

    let default_config = r#"[camera]
# Media source: "gstreamer" (V4L2 camera, needs the 'camera' feature) or "still"
source = "gstreamer"
# Camera device index (e.g., 0 for /dev/video0)
index = 0
# Camera resolution (width, height)
resolution = [640, 480]
# Frames per second requested from the device
fps = 30
# JPEG file or directory used when source = "still"
# still_image_path = "./frames"

[analysis]
# Pose-analysis service endpoint
endpoint = "http://localhost:5000/analyze_pose"
# Per-request timeout in milliseconds
timeout_ms = 5000
# MIME type of the frame data URL
image_mime = "image/jpeg"

[session]
# Interval between capture+analyze cycles in milliseconds
tick_interval_ms = 1000
# Pose selected at startup (optional)
# default_pose = "Tree Pose"
# Event bus capacity
event_bus_capacity = 64

[catalog]
# TOML file with [[pose]] id/reference_image entries (optional)
# path = "./poses.toml"

[overlay]
# Render the feedback overlay onto the latest frame
render = false
# TrueType font for overlay text
font_path = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"
title_font_size = 16.0
line_font_size = 14.0
# Where the rendered overlay JPEG is written (optional)
# output_path = "./overlay.jpg"
"#;

    println!("{}", default_config);
}

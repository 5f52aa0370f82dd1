use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use agrirobo::camera::{self, CameraBackend};
use agrirobo::{
    ClassifierClient, DetectionPipeline, Direction, PanelConfig, RobotClient, SelectedFile,
    ServoAction, UiState, present,
};

/// Frames dropped after opening the camera so exposure can settle
const WARMUP_FRAMES: usize = 5;

#[derive(Parser)]
#[command(name = "agrirobo")]
#[command(about = "Operator panel for the Agri ROBO robot and leaf disease detector")]
struct Cli {
    /// Robot backend base URL (overrides AGRIROBO_SERVER_URL)
    #[arg(long, global = true, value_name = "URL")]
    server: Option<String>,

    /// Classification request timeout in seconds
    #[arg(long, global = true, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Camera index to use when no rear-facing camera is found
    #[arg(long, global = true, value_name = "INDEX")]
    camera_index: Option<u32>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the operator panel (default)
    Gui,
    /// Classify an image file and print the result
    Classify {
        /// Path to input image file
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
    },
    /// Capture one frame from the camera
    Capture {
        /// Save the captured JPEG here
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Submit the captured frame for classification
        #[arg(long)]
        classify: bool,
    },
    /// List camera devices
    Cameras,
    /// Send a motor command (front, back, left, right, stop)
    Motor { direction: Direction },
    /// Start or stop the fertilizer dispenser servo
    Servo { action: ServoAction },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "agrirobo=debug" } else { "agrirobo=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    // The panel is a single cooperative event loop
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();
    init_tracing(args.verbose);

    let mut config = PanelConfig::from_env();
    if let Some(server) = args.server {
        config.server_url = server;
    }
    if let Some(secs) = args.timeout {
        config.request_timeout = Duration::from_secs(secs);
    }
    if args.camera_index.is_some() {
        config.camera_index = args.camera_index;
    }
    tracing::debug!(?config, "configuration loaded");

    match args.command.unwrap_or(Command::Gui) {
        Command::Gui => run_gui(config),
        Command::Classify { image } => classify_file(&config, image),
        Command::Capture { output, classify } => capture(&config, output, classify),
        Command::Cameras => list_cameras(),
        Command::Motor { direction } => {
            let robot = RobotClient::new(&config)?;
            runtime()?.block_on(robot.drive(direction))?;
            println!("Moving {}", direction.label());
            Ok(ExitCode::SUCCESS)
        }
        Command::Servo { action } => {
            let robot = RobotClient::new(&config)?;
            runtime()?.block_on(robot.servo(action))?;
            println!(
                "Fertilizer dispenser {}",
                if action == ServoAction::Start { "running" } else { "stopped" }
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(feature = "gui")]
fn run_gui(config: PanelConfig) -> anyhow::Result<ExitCode> {
    agrirobo::gui::run(config)?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(not(feature = "gui"))]
fn run_gui(_config: PanelConfig) -> anyhow::Result<ExitCode> {
    anyhow::bail!("this build has no GUI; rebuild with `--features gui` or use a subcommand")
}

fn classify_file(config: &PanelConfig, image: PathBuf) -> anyhow::Result<ExitCode> {
    let file = match SelectedFile::from_path(&image) {
        Ok(file) => file,
        Err(e) => {
            print!("{}", present(&UiState::Failed(e)));
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut pipeline = DetectionPipeline::new(camera::default_backend(), config.camera_request());
    pipeline.select_file(Some(file));
    submit_and_report(config, &mut pipeline)
}

fn capture(config: &PanelConfig, output: Option<PathBuf>, classify: bool) -> anyhow::Result<ExitCode> {
    let mut pipeline = DetectionPipeline::new(camera::default_backend(), config.camera_request());
    pipeline.open_camera();
    if !pipeline.camera_active() {
        print!("{}", present(&pipeline.state()));
        return Ok(ExitCode::FAILURE);
    }
    for _ in 0..WARMUP_FRAMES {
        if pipeline.poll_frame().is_none() {
            break;
        }
    }
    // A failed warm-up frame closes the camera and records the device error
    if !pipeline.camera_active() {
        print!("{}", present(&pipeline.state()));
        return Ok(ExitCode::FAILURE);
    }
    pipeline.capture();

    if let UiState::Failed(_) = pipeline.state() {
        print!("{}", present(&pipeline.state()));
        return Ok(ExitCode::FAILURE);
    }

    if let (Some(path), Some(payload)) = (&output, pipeline.payload()) {
        std::fs::write(path, &payload.data().bytes)?;
        println!("Saved capture to {}", path.display());
    }

    if classify {
        submit_and_report(config, &mut pipeline)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn submit_and_report<B: CameraBackend>(
    config: &PanelConfig,
    pipeline: &mut DetectionPipeline<B>,
) -> anyhow::Result<ExitCode> {
    let client = ClassifierClient::new(config)?;
    if let Some(submission) = pipeline.begin_submit() {
        print!("{}", present(&pipeline.state()));
        let result = runtime()?.block_on(client.classify(Some(&submission.image)));
        pipeline.complete(submission.id, result);
    }

    let state = pipeline.state();
    print!("{}", present(&state));
    Ok(match state {
        UiState::Succeeded(_) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

fn list_cameras() -> anyhow::Result<ExitCode> {
    let cameras = camera::default_backend().list()?;
    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(ExitCode::SUCCESS);
    }
    println!("{:<5} | {:<30} | {}", "Index", "Name", "Description");
    println!("{}", "-".repeat(60));
    for cam in cameras {
        println!("{:<5} | {:<30} | {}", cam.index, cam.name, cam.description);
    }
    Ok(ExitCode::SUCCESS)
}

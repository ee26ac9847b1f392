use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dock_release::cli::{Plan, ReleaseOrchestrator, ReleaseRequest};
use dock_release::git::Git2Repository;
use dock_release::manifest::{Manifest, DEFAULT_MANIFEST};
use dock_release::tools::ProcessToolchain;
use dock_release::ui::{self, TerminalPrompt, DEFAULT_CONFIRM_TIMEOUT};
use dock_release::ReleaseError;

#[derive(clap::Parser)]
#[command(
    name = "dock-release",
    version,
    about = "Build, publish and tag container images from a versioned manifest"
)]
struct Args {
    #[arg(help = "Run mode: snapshot (snap, s) or release (rel, r)")]
    mode: String,

    #[arg(long, help = "Snapshot only: build the image without pushing it")]
    build_only: bool,

    #[arg(long, help = "Snapshot only: push an image built earlier")]
    push_only: bool,

    #[arg(
        short,
        long,
        value_name = "STEP",
        help = "Release only: version component to increment (major, minor, revision)"
    )]
    up_step: Option<String>,

    #[arg(short, long, default_value = DEFAULT_MANIFEST, help = "Manifest file path")]
    manifest: PathBuf,

    #[arg(
        long,
        value_name = "SECS",
        default_value_t = DEFAULT_CONFIRM_TIMEOUT.as_secs(),
        help = "Seconds to wait for release confirmation"
    )]
    confirm_timeout: u64,

    #[arg(long, help = "Show the target and planned steps without running them")]
    dry_run: bool,
}

fn main() {
    init_tracing();
    let args = Args::parse();

    if let Err(err) = run(args) {
        ui::display_error(&format!("{:#}", err));
        let release_error = err.downcast_ref::<ReleaseError>();
        if let Some(ReleaseError::Usage(_)) = release_error {
            eprintln!("\n{}", Args::command().render_usage());
        }
        std::process::exit(release_error.map_or(1, ReleaseError::exit_code));
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run(args: Args) -> Result<()> {
    let request = ReleaseRequest {
        mode: args.mode,
        build_only: args.build_only,
        push_only: args.push_only,
        up_step: args.up_step,
    };
    let plan = request.plan()?;

    let manifest = Manifest::load(&args.manifest)
        .with_context(|| format!("Failed to load manifest {}", args.manifest.display()))?;
    let project_dir = match args.manifest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    if args.dry_run {
        ui::display_target(&plan.target(&manifest)?, plan.next_local_version(&manifest)?);
        ui::display_plan(&plan.steps(&manifest)?);
        return Ok(());
    }

    let tools = ProcessToolchain::new(&project_dir);
    let prompt = TerminalPrompt::new(Duration::from_secs(args.confirm_timeout));
    let orchestrator = ReleaseOrchestrator::new(&manifest, &args.manifest, &tools, &prompt);

    match plan {
        Plan::Snapshot { build, push } => {
            let result = orchestrator.snapshot(build, push)?;
            ui::display_success(&format!("Snapshot {} done", result.target.docker_tag));
        }
        Plan::Release { up_step } => {
            let repo = open_repository(&project_dir)?;
            let result = orchestrator.release(&repo, up_step)?;
            ui::display_success(&format!(
                "Released {} as {}",
                result.target.version, result.target.docker_tag
            ));
        }
    }
    Ok(())
}

fn open_repository(dir: &Path) -> Result<Git2Repository> {
    Git2Repository::discover(dir)
        .with_context(|| format!("Failed to open git repository at {}", dir.display()))
}

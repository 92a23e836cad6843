//! Headless stage viewport
//!
//! Loads a stage, replays an input script through the viewport and saves
//! the edited stage.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use glam::DVec3;
use parking_lot::Mutex;
use sc_core::{BoundingBox, CameraParams, Prim, PrimPath, Selection, Stage, Transform};
use sc_frontend::{EXIT_UNABLE_TO_COMPILE_SHADER, GizmoGpu, Script, Viewport, ViewportSettings};
use sc_renderer::{GizmoRendererError, HeadlessEngine, HeadlessSimulation};

#[derive(Debug, Parser)]
#[command(name = "sc", version, about = "Replay viewport input against a stage")]
struct Args {
    /// Stage file (RON). A demo stage is used when omitted.
    #[arg(long)]
    stage: Option<PathBuf>,

    /// Input script (RON)
    #[arg(long)]
    script: Option<PathBuf>,

    /// Where to save the edited stage
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Viewport settings (RON)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Draw gizmos on the GPU every frame
    #[arg(long)]
    gpu: bool,

    /// Use the light viewport theme
    #[arg(long)]
    light: bool,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,
}

fn main() -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sc_frontend=debug,sc_renderer=info,sc_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let stage = match &args.stage {
        Some(path) => Stage::load(path).with_context(|| format!("Failed to load stage {}", path.display()))?,
        None => demo_stage()?,
    };
    tracing::info!(
        "Stage has {} prims and {} cameras",
        stage.len(),
        stage.camera_paths().len()
    );

    let mut settings = match &args.settings {
        Some(path) => ViewportSettings::load(path)
            .with_context(|| format!("Failed to load settings {}", path.display()))?,
        None => ViewportSettings::default(),
    };
    if args.light {
        settings.renderer.apply_light_theme();
    }

    let stage = Arc::new(Mutex::new(stage));
    let selection = Arc::new(Mutex::new(Selection::new()));
    let mut viewport = Viewport::new(Arc::clone(&stage), selection, Box::new(HeadlessEngine::new()))
        .with_simulation(Box::new(HeadlessSimulation::new()));
    viewport.apply_settings(&settings);
    viewport.frame_camera_on_root_prim();

    let mut gpu = if args.gpu {
        match GizmoGpu::new(&settings.renderer.gizmo) {
            Ok(gpu) => Some(gpu),
            Err(GizmoRendererError::ShaderCompilation(message)) => {
                tracing::error!("Unable to compile the gizmo shader: {}", message);
                std::process::exit(EXIT_UNABLE_TO_COMPILE_SHADER);
            }
            Err(e) => return Err(e).context("Failed to initialize the GPU"),
        }
    } else {
        None
    };

    let mut script = match &args.script {
        Some(path) => Script::load(path).with_context(|| format!("Failed to load script {}", path.display()))?,
        None => Script::default(),
    };
    script.commands.insert(
        0,
        sc_frontend::ScriptCommand::Resize(args.width as f64, args.height as f64),
    );
    let report = script.run(&mut viewport, gpu.as_mut())?;
    if let Some(gpu) = &gpu {
        tracing::info!("Drew gizmos for {} frames", gpu.frames());
    }
    tracing::info!("{} frames, {} renders", report.frames, report.renders);

    if let Some(output) = &args.output {
        stage
            .lock()
            .save(output)
            .with_context(|| format!("Failed to save stage {}", output.display()))?;
    }
    Ok(())
}

/// Cube, camera and instancer under /World
fn demo_stage() -> anyhow::Result<Stage> {
    let path = |s: &str| PrimPath::new(s);
    let mut stage = Stage::new();
    stage.define_prim(path("/World")?, Prim::xform())?;
    stage.define_prim(path("/World/Cube")?, Prim::cube(2.0))?;
    stage.define_prim(
        path("/World/Camera")?,
        Prim::camera(CameraParams::default()).with_transform(Transform::from_translation(DVec3::new(0.0, 2.0, 15.0))),
    )?;
    stage.define_prim(
        path("/World/Instancer")?,
        Prim::point_instancer(
            BoundingBox::from_center_half_extents(DVec3::ZERO, DVec3::splat(0.25)),
            (0..5).map(|i| DVec3::new(-4.0 + 2.0 * i as f64, 0.0, -4.0)).collect(),
        ),
    )?;
    Ok(stage)
}

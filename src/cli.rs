use crate::bridge::LiveBridge;
use crate::config::{BackendKind, EngineConfig, load_config};
use crate::dump::{CommitDump, FrameDump, write_dump};
use crate::index::SpatialIndex;
use crate::scene::Scene;
use crate::scheduler::ManualScheduler;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Parser, Debug)]
#[command(
    name = "lsnap",
    version,
    about = "Resolve snapping, guides and collision displacement for one drag step",
    allow_negative_numbers = true
)]
pub struct Args {
    /// Scene file (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON file (snap/index/bridge overrides)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Id of the dragged element
    #[arg(short = 'e', long = "element")]
    pub element: String,

    /// Proposed left
    #[arg(short = 'x', long = "x")]
    pub x: f64,

    /// Proposed top
    #[arg(short = 'y', long = "y")]
    pub y: f64,

    /// Proposed width. Defaults to the element's committed width.
    #[arg(short = 'w', long = "width")]
    pub width: Option<f64>,

    /// Proposed height. Defaults to the element's committed height.
    #[arg(short = 'H', long = "height")]
    pub height: Option<f64>,

    /// Snap threshold in pixels
    #[arg(short = 't', long = "threshold")]
    pub threshold: Option<f64>,

    /// Snap backend
    #[arg(short = 'b', long = "backend", value_enum)]
    pub backend: Option<BackendArg>,

    /// Print the drag-end commit instead of the in-flight frame
    #[arg(long = "commit")]
    pub commit: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum BackendArg {
    Software,
    Accelerated,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Software => BackendKind::Software,
            BackendArg::Accelerated => BackendKind::Accelerated,
        }
    }
}

pub fn run() -> Result<()> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init();
    let args = Args::parse();
    let config = apply_args(load_config(args.config.as_deref())?, &args);

    let input = read_input(args.input.as_deref())?;
    let scene = Scene::from_json(&input)?;
    let index = SpatialIndex::build(&scene, &config.index);

    let committed = index.bounds(&args.element).ok_or_else(|| {
        anyhow::anyhow!("Element `{}` has no resolved geometry in the scene", args.element)
    })?;
    let width = args.width.unwrap_or(committed.width);
    let height = args.height.unwrap_or(committed.height);

    let scheduler = ManualScheduler::new();
    let bridge = LiveBridge::new(index, config, Rc::new(scheduler.clone()));
    let _subscription = bridge.subscribe(|frame| {
        log::debug!(
            "frame {}: {} guide(s)",
            frame.sequence,
            frame.guides().len()
        );
    });

    bridge.begin_drag(&args.element);
    bridge.update_drag(args.x, args.y, width, height);
    scheduler.run_frame(0.0);

    if args.commit {
        let commit = bridge
            .end_drag()
            .ok_or_else(|| anyhow::anyhow!("Drag ended without a resolved frame"))?;
        write_dump(&CommitDump::from(&commit), args.output.as_deref())
    } else {
        let dump = FrameDump::from_frame(&bridge.frame(), bridge.backend_name());
        write_dump(&dump, args.output.as_deref())
    }
}

fn apply_args(mut config: EngineConfig, args: &Args) -> EngineConfig {
    if let Some(threshold) = args.threshold {
        config.snap.threshold = threshold;
    }
    if let Some(backend) = args.backend {
        config.bridge.backend = backend.into();
    }
    config
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read_to_string(path)?);
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

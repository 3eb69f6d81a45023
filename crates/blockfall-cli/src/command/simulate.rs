use std::path::PathBuf;

use blockfall_engine::{
    GameSession, GameStats, PieceKind, PieceSeed, WellConfig, WellEvent, WellEventType,
};
use serde::Serialize;

use crate::{script::Script, util};

/// Frames to run when neither a script nor a frame count is given (one minute).
const DEFAULT_FRAMES: usize = 3600;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    /// Playfield configuration JSON file; missing fields take their default
    #[arg(long)]
    config: Option<PathBuf>,
    /// Piece seed as 32 hex digits (random if omitted)
    #[arg(long)]
    seed: Option<PieceSeed>,
    /// Input script: one line per frame, tokens like `+left` or `-hard-drop`
    #[arg(long)]
    script: Option<PathBuf>,
    /// Number of frames to run (defaults to the script length)
    #[arg(long)]
    frames: Option<usize>,
    /// Summary output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct SimulationSummary<'a> {
    seed: PieceSeed,
    frames: u64,
    duration_secs: f64,
    game_over: bool,
    held_piece: Option<PieceKind>,
    preview: Vec<PieceKind>,
    stats: &'a GameStats,
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let config: WellConfig = match &arg.config {
        Some(path) => util::read_json_file("config", path)?,
        None => WellConfig::default(),
    };
    let script = match &arg.script {
        Some(path) => Script::read(path)?,
        None => Script::default(),
    };
    let frames = arg.frames.unwrap_or(if arg.script.is_some() {
        script.frame_count()
    } else {
        DEFAULT_FRAMES
    });

    let mut session = match arg.seed {
        Some(seed) => GameSession::with_seed(config, seed),
        None => GameSession::new(config),
    };
    tracing::info!(seed = %session.seed(), frames, "starting simulation");

    session.subscribe(WellEventType::LineClear, |event| {
        if let WellEvent::LineClear { count } = event {
            tracing::info!(count, "lines cleared");
        }
    });

    for frame in 0..frames {
        if session.is_game_over() {
            tracing::info!(frame, "stopping at game over");
            break;
        }
        session.update(script.frame(frame));
    }

    print!("{}", session.well().as_ascii());

    let summary = SimulationSummary {
        seed: session.seed(),
        frames: session.total_frames(),
        duration_secs: session.duration().as_secs_f64(),
        game_over: session.is_game_over(),
        held_piece: session.held_piece(),
        preview: session.preview().collect(),
        stats: session.stats(),
    };
    util::write_json(&summary, arg.output.as_deref())
}

use std::path::PathBuf;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use gridblast_engine::{
    GameSession, GameStats, GeneratorConfig, GeneratorSeed, HighScoreStore, MemoryHighScoreStore,
    PieceGenerator, ShapeCatalog, TRAY_SIZE,
};
use rand::Rng as _;
use serde::Serialize;

use crate::{
    high_score_file::HighScoreFile,
    player::{self, BotKind},
    util,
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct AutoPlayArg {
    /// Number of games to play
    #[arg(long, default_value_t = 10)]
    games: usize,
    /// Stop a game after this many placements
    #[arg(long, default_value_t = 2000)]
    max_turns: usize,
    /// Seed for piece generation (32 hex digits); random if omitted
    #[arg(long)]
    seed: Option<GeneratorSeed>,
    /// Generator configuration file (JSON format); built-in tuning if omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Move selection strategy
    #[arg(long, default_value = "greedy")]
    bot: BotKind,
    /// Continue once per game after game over
    #[arg(long)]
    use_continue: bool,
    /// High score file to read and update
    #[arg(long)]
    high_score_file: Option<PathBuf>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
struct AutoPlayReport {
    /// Timestamp when the run finished (ISO 8601 format)
    played_at: DateTime<Utc>,
    /// Seed of the piece generator; games run back to back on one generator
    seed: GeneratorSeed,
    bot: BotKind,
    high_score: u64,
    games: Vec<GameReport>,
}

#[derive(Debug, Clone, Serialize)]
struct GameReport {
    score: u64,
    drops: usize,
    continues: usize,
    turn_limit_reached: bool,
    stats: GameStats,
}

pub(crate) fn run(arg: &AutoPlayArg) -> anyhow::Result<()> {
    let AutoPlayArg {
        games,
        max_turns,
        seed,
        config,
        bot,
        use_continue,
        high_score_file,
        output,
    } = arg;

    let seed = seed.unwrap_or_else(|| rand::rng().random());
    let catalog = ShapeCatalog::standard()?;
    let config = match config {
        Some(path) => util::read_json_file("generator config", path)?,
        None => GeneratorConfig::for_catalog(&catalog),
    };
    let generator = PieceGenerator::with_seed(catalog, config, seed)
        .context("Invalid generator configuration")?;
    eprintln!("Playing {games} games with seed {seed} ({bot:?} bot)");

    let play = PlayOptions {
        games: *games,
        max_turns: *max_turns,
        bot: *bot,
        use_continue: *use_continue,
    };
    let (game_reports, high_score) = match high_score_file {
        Some(path) => {
            let store = HighScoreFile::load(path)?;
            let session = GameSession::new(generator, store);
            let (reports, mut store) = play_games(session, &play)?;
            store.save()?;
            (reports, store.high_score())
        }
        None => {
            let session = GameSession::new(generator, MemoryHighScoreStore::default());
            let (reports, store) = play_games(session, &play)?;
            (reports, store.high_score())
        }
    };

    let report = AutoPlayReport {
        played_at: Utc::now(),
        seed,
        bot: *bot,
        high_score,
        games: game_reports,
    };
    util::write_json(&report, output.as_deref())
}

#[derive(Debug, Clone, Copy)]
struct PlayOptions {
    games: usize,
    max_turns: usize,
    bot: BotKind,
    use_continue: bool,
}

fn play_games<S>(
    mut session: GameSession<S>,
    options: &PlayOptions,
) -> anyhow::Result<(Vec<GameReport>, S)>
where
    S: HighScoreStore,
{
    let mut reports = Vec::with_capacity(options.games);
    for game in 0..options.games {
        if game > 0 {
            session.restart();
        }
        let report = play_game(&mut session, options)
            .with_context(|| format!("Game #{game} failed"))?;
        eprintln!(
            "Game #{game}: score {}, drops {}, lines {}, field clears {}, best streak {}{}",
            report.score,
            report.drops,
            report.stats.total_cleared_lines(),
            report.stats.field_clears(),
            report.stats.best_streak(),
            if report.turn_limit_reached {
                " (turn limit)"
            } else {
                ""
            },
        );
        reports.push(report);
    }
    eprintln!("High score: {}", session.scorer().high_score());
    Ok((reports, session.into_store()))
}

fn play_game<S>(session: &mut GameSession<S>, options: &PlayOptions) -> anyhow::Result<GameReport>
where
    S: HighScoreStore,
{
    let mut turns = 0;
    while turns < options.max_turns {
        if session.session_state().is_game_over() {
            if options.use_continue && session.continues() == 0 {
                session.continue_game()?;
                continue;
            }
            break;
        }
        let tray = (0..TRAY_SIZE).filter_map(|slot| session.slot_shape(slot).map(|s| (slot, s)));
        let Some(mv) = player::choose_move(options.bot, session.board(), tray) else {
            break;
        };
        session.place(mv.slot, mv.origin)?;
        turns += 1;
    }

    Ok(GameReport {
        score: session.score(),
        drops: session.drop_count(),
        continues: session.continues(),
        turn_limit_reached: turns == options.max_turns,
        stats: session.stats().clone(),
    })
}

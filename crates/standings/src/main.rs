//! Standings CLI
//!
//! Loads a tournament snapshot, applies pairings and results, and prints
//! tie-broken standings.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use standings::{
    Configuration, GameResult, PlayerId, Tournament, TournamentSnapshot, render_table,
    standings_rows,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Swiss and round-robin standings")]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
#[clap(rename_all = "kebab-case")]
enum Command {
    /// Print the standings table
    Standings {
        /// Tournament snapshot (JSON)
        snapshot: PathBuf,
        /// Point schedule and tiebreakers (TOML), replacing the snapshot's
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Round to rank after (defaults to the last one)
        #[arg(short, long)]
        round: Option<u32>,
        /// Emit rows as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Apply pairing-generator output as a round
    ApplyRound {
        snapshot: PathBuf,
        /// Generator output: one "white black" pair of pairing numbers per line
        pairings: PathBuf,
        /// Round to write (defaults to the next one)
        #[arg(short, long)]
        round: Option<u32>,
        /// Starting numbers of players absent this round
        #[arg(long, value_delimiter = ',')]
        absent: Vec<usize>,
        /// Where to save the updated snapshot (defaults to overwriting it)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Enter a result from one player's point of view
    SetResult {
        snapshot: PathBuf,
        #[arg(short, long)]
        round: u32,
        /// Starting number of the player
        #[arg(short, long)]
        player: usize,
        /// 1, =, 0, +, -, h (half bye), f (full bye), z (zero bye), u (pairing bye)
        result: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a snapshot and list every problem found
    Validate { snapshot: PathBuf },
    /// Print the default configuration as TOML
    DefaultConfig,
}

fn load(path: &Path) -> Result<Tournament> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let snapshot: TournamentSnapshot = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let tournament = Tournament::import(snapshot)
        .with_context(|| format!("{} is not a consistent tournament", path.display()))?;
    Ok(tournament)
}

fn save(tournament: &Tournament, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&tournament.snapshot())?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "snapshot saved");
    Ok(())
}

fn load_config(path: &Path) -> Result<Configuration> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Configuration::from_toml_str(&contents)
        .with_context(|| format!("Invalid configuration in {}", path.display()))
}

fn player_by_number(tournament: &Tournament, number: usize) -> Result<PlayerId> {
    number
        .checked_sub(1)
        .and_then(|idx| tournament.players().get(idx))
        .map(|p| p.id)
        .with_context(|| format!("No player with starting number {number}"))
}

fn parse_result(code: &str) -> Result<GameResult> {
    let result = match code.trim().to_ascii_lowercase().as_str() {
        "1" | "w" | "win" => GameResult::Win,
        "=" | "d" | "draw" => GameResult::Draw,
        "0" | "l" | "loss" => GameResult::Loss,
        "+" => GameResult::ForfeitWin,
        "-" => GameResult::ForfeitLoss,
        "h" => GameResult::HalfPointBye,
        "f" => GameResult::FullPointBye,
        "z" => GameResult::ZeroPointBye,
        "u" => GameResult::PairingAllocatedBye,
        "*" => GameResult::Unassigned,
        other => bail!("Unknown result code: {other}"),
    };
    Ok(result)
}

fn show_standings(snapshot: &Path, config: Option<&Path>, round: Option<u32>, json: bool) -> Result<()> {
    let mut tournament = load(snapshot)?;
    if let Some(path) = config {
        tournament.set_configuration(load_config(path)?)?;
        tournament.recalculate();
    }
    let round = round.unwrap_or_else(|| tournament.played_rounds());
    let rows = standings_rows(&tournament, round)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        let title = format!("{} after round {}", tournament.name, round);
        print!("{}", render_table(&title, &rows));
    }
    Ok(())
}

fn apply_round(
    snapshot: &Path,
    pairings: &Path,
    round: Option<u32>,
    absent: &[usize],
    output: Option<&Path>,
) -> Result<()> {
    let mut tournament = load(snapshot)?;
    let round = round.unwrap_or(tournament.played_rounds() + 1);
    for &number in absent {
        let id = player_by_number(&tournament, number)?;
        tournament.set_absent(id, round, true)?;
    }

    let text = fs::read_to_string(pairings)
        .with_context(|| format!("Failed to read {}", pairings.display()))?;
    let pairs = tournament
        .apply_pairing_output(round, &text)
        .with_context(|| format!("Could not apply round {round}"))?;

    println!("=== Round {} ===", round);
    for (board, pair) in pairs.iter().enumerate() {
        let white = tournament.starting_number(pair.white).unwrap_or(0);
        match pair.black.and_then(|b| tournament.starting_number(b)) {
            Some(black) => println!("{:>3}. {:>4} - {:<4}", board + 1, white, black),
            None => println!("{:>3}. {:>4} - bye", board + 1, white),
        }
    }

    save(&tournament, output.unwrap_or(snapshot))
}

fn enter_result(snapshot: &Path, round: u32, player: usize, code: &str, output: Option<&Path>) -> Result<()> {
    let mut tournament = load(snapshot)?;
    let id = player_by_number(&tournament, player)?;
    tournament.set_result(round, id, parse_result(code)?)?;
    save(&tournament, output.unwrap_or(snapshot))
}

fn validate(snapshot: &Path) -> Result<()> {
    let contents = fs::read_to_string(snapshot)
        .with_context(|| format!("Failed to read {}", snapshot.display()))?;
    let parsed: TournamentSnapshot = serde_json::from_str(&contents)?;
    match Tournament::import(parsed) {
        Ok(tournament) => {
            println!(
                "{}: {} players, {} rounds, no problems found",
                tournament.name,
                tournament.players().len(),
                tournament.played_rounds()
            );
            Ok(())
        }
        Err(errors) => {
            for error in &errors.errors {
                eprintln!("  - {error}");
            }
            bail!("{} problem(s) found", errors.errors.len())
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Standings {
            snapshot,
            config,
            round,
            json,
        } => show_standings(&snapshot, config.as_deref(), round, json),
        Command::ApplyRound {
            snapshot,
            pairings,
            round,
            absent,
            output,
        } => apply_round(&snapshot, &pairings, round, &absent, output.as_deref()),
        Command::SetResult {
            snapshot,
            round,
            player,
            result,
            output,
        } => enter_result(&snapshot, round, player, &result, output.as_deref()),
        Command::Validate { snapshot } => validate(&snapshot),
        Command::DefaultConfig => {
            print!("{}", Configuration::default().to_toml_string()?);
            Ok(())
        }
    }
}

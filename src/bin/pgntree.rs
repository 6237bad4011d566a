use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pgntree::{pgn, CozyOracle, Game};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "pgntree", version, about = "Inspect, normalise and round-trip check PGN files")]
struct Args {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Parse every game, re-serialise it and verify the re-parsed tree matches
    Check {
        file: PathBuf,
        /// Worker threads (0 = rayon default)
        #[arg(long, default_value_t = 0)]
        threads: usize,
        /// Print the report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print every game in normalised PGN
    Fmt { file: PathBuf },
    /// Print the main line of one game with the position after each ply
    Mainline {
        file: PathBuf,
        /// Zero-based game index
        #[arg(long, default_value_t = 0)]
        game: usize,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Serialize, Debug)]
struct GameReport {
    index: usize,
    plies: usize,
    nodes: usize,
    ok: bool,
    error: Option<String>,
}

#[derive(Serialize, Debug)]
struct CheckReport {
    file: String,
    games: usize,
    failures: usize,
    reports: Vec<GameReport>,
}

#[derive(Serialize, Debug)]
struct Ply {
    number: u32,
    san: String,
    uci: Option<String>,
    fen: String,
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn check_one(index: usize, text: &str) -> GameReport {
    let oracle = CozyOracle;
    let outcome = pgn::parse(text, &oracle).and_then(|g| {
        let again = pgn::parse(&pgn::write(&g), &oracle)?;
        Ok((g.main_line().len(), g.node_count(), g.structurally_eq(&again)))
    });
    match outcome {
        Ok((plies, nodes, true)) => GameReport { index, plies, nodes, ok: true, error: None },
        Ok((plies, nodes, false)) => GameReport { index, plies, nodes, ok: false, error: Some("round trip changed the tree".into()) },
        Err(e) => GameReport { index, plies: 0, nodes: 0, ok: false, error: Some(e.to_string()) },
    }
}

fn check(file: &Path, threads: usize, json: bool) -> Result<bool> {
    let text = read(file)?;
    let games = pgn::split_games(&text);
    log::info!("checking {} games from {}", games.len(), file.display());

    let pb = ProgressBar::new(games.len() as u64);
    pb.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} games [{elapsed_precise}]")?);
    let run = || -> Vec<GameReport> {
        games
            .par_iter()
            .enumerate()
            .map(|(i, g)| {
                let r = check_one(i, g);
                pb.inc(1);
                r
            })
            .collect()
    };
    let reports = if threads > 0 {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build().context("building thread pool")?;
        pool.install(run)
    } else {
        run()
    };
    pb.finish_and_clear();

    let failures = reports.iter().filter(|r| !r.ok).count();
    let report = CheckReport { file: file.display().to_string(), games: reports.len(), failures, reports };
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for r in report.reports.iter().filter(|r| !r.ok) {
            eprintln!("game {}: {}", r.index, r.error.as_deref().unwrap_or("failed"));
        }
        println!("summary: games={} failures={}", report.games, report.failures);
    }
    Ok(failures == 0)
}

fn load_games(file: &Path) -> Result<Vec<Game>> {
    let text = read(file)?;
    pgn::parse_all(&text, &CozyOracle).with_context(|| format!("parsing {}", file.display()))
}

fn mainline(file: &Path, index: usize, json: bool) -> Result<()> {
    let games = load_games(file)?;
    let game = games.get(index).with_context(|| format!("no game {} (file has {})", index, games.len()))?;
    let plies: Vec<Ply> = game
        .main_line()
        .iter()
        .filter_map(|id| game.node(*id))
        .map(|n| Ply { number: n.move_number, san: n.san.clone(), uci: n.uci.clone(), fen: n.fen.clone() })
        .collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&plies)?);
    } else {
        for p in &plies { println!("{:>3} {:<8} {}", p.number, p.san, p.fen); }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    match args.cmd {
        Cmd::Check { file, threads, json } => {
            if !check(&file, threads, json)? { std::process::exit(1); }
        }
        Cmd::Fmt { file } => {
            let games = load_games(&file)?;
            let out: Vec<String> = games.iter().map(pgn::write).collect();
            print!("{}", out.join("\n"));
        }
        Cmd::Mainline { file, game, json } => mainline(&file, game, json)?,
    }
    Ok(())
}

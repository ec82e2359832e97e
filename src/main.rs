//! Simulateur de micromouse
//!
//! Génère (ou charge) un labyrinthe, y fait explorer la souris puis affiche
//! la carte découverte et les routes calculées.
//!
//! Usage:
//!   micromouse --seed 42 --extra-openings 20
//!   RUST_LOG=micromouse=debug micromouse --maze labyrinth.json --save found.json

use std::path::PathBuf;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_subscriber::filter::{Directive, EnvFilter};

use micromouse::{
    Labyrinth, Mouse, MouseConfig, MouseError, MouseState, Result, SavedMaze, SimulatedBody,
};

/// Exploration d'un labyrinthe simulé
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Fichier de configuration TOML
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Graine du générateur (remplace celle de la configuration)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Murs retirés pour créer des boucles (remplace la configuration)
    #[arg(long)]
    extra_openings: Option<usize>,

    /// Labyrinthe complet au format JSON, au lieu d'en générer un
    #[arg(short, long)]
    maze: Option<PathBuf>,

    /// Sauvegarde la carte découverte en JSON
    #[arg(long)]
    save: Option<PathBuf>,

    /// Sauvegarde la carte découverte au format binaire
    #[arg(long)]
    save_binary: Option<PathBuf>,

    /// Ne cherche pas de routes alternatives
    #[arg(long)]
    no_alternatives: bool,
}

fn main() -> Result<()> {
    let directive: Directive = "micromouse=info"
        .parse()
        .map_err(|e| MouseError::Config(format!("bad log directive: {}", e)))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            MouseConfig::load(path)?
        }
        None => MouseConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.simulator.seed = Some(seed);
    }
    if let Some(extra) = args.extra_openings {
        config.simulator.extra_openings = extra;
    }
    if args.no_alternatives {
        config.search.alternatives = false;
    }

    let labyrinth = match &args.maze {
        Some(path) => {
            info!("Loading labyrinth from {:?}", path);
            Labyrinth::from_maze(SavedMaze::load_json(path)?.to_maze()?)
        }
        None => {
            let extra = config.simulator.extra_openings;
            match config.simulator.seed {
                Some(seed) => {
                    info!(seed, extra, "generating labyrinth");
                    Labyrinth::generate(&mut StdRng::seed_from_u64(seed), extra)
                }
                None => {
                    info!(extra, "generating labyrinth from a random seed");
                    Labyrinth::generate(&mut rand::rng(), extra)
                }
            }
        }
    };

    let mut mouse = Mouse::new(&config);
    let mut body = SimulatedBody::new(labyrinth, mouse.position(), mouse.heading());

    let state = mouse.run(&mut body)?;
    if state == MouseState::Speedrunning {
        warn!("speed run requested but no trajectory controller is attached");
    }

    println!("{}", mouse.snapshot().render_ascii());
    println!(
        "Explored in {} steps ({} moves, {} turns)",
        mouse.steps(),
        body.moves(),
        body.turns()
    );
    for (index, route) in mouse.routes().iter().enumerate() {
        println!(
            "Route {}: {} cells, {} turns",
            index + 1,
            route.len(),
            route.number_of_turns()
        );
    }

    let saved = SavedMaze::from_maze(mouse.maze());
    if let Some(path) = &args.save {
        saved.save_json(path)?;
        info!("Saved map to {:?}", path);
    }
    if let Some(path) = &args.save_binary {
        saved.save_binary(path)?;
        info!("Saved binary map to {:?}", path);
    }

    Ok(())
}

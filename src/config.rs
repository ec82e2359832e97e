//! Chargement de la configuration du micromouse

use std::path::Path;

use serde::Deserialize;

use crate::direction::Direction;
use crate::error::{MouseError, Result};
use crate::maze::{Coord, FINISH_GOAL, MAZE_SIZE, START_GOAL};

/// Configuration complète
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MouseConfig {
    #[serde(default)]
    pub goals: GoalConfig,
    #[serde(default)]
    pub mouse: RunConfig,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

/// Cases de départ et d'arrivée
#[derive(Clone, Debug, Deserialize)]
pub struct GoalConfig {
    /// Cases du centre (défaut: les 4 cases centrales)
    #[serde(default = "default_finish")]
    pub finish: Vec<[usize; 2]>,

    /// Cases de départ (défaut: (0, 0))
    #[serde(default = "default_start")]
    pub start: Vec<[usize; 2]>,
}

/// Paramètres de la course
#[derive(Clone, Debug, Deserialize)]
pub struct RunConfig {
    /// Orientation initiale (défaut: north)
    #[serde(default = "default_heading")]
    pub start_heading: Direction,

    /// Nombre maximal de pas avant abandon (défaut: 4096)
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Passer en course rapide après le calcul des routes (défaut: false)
    #[serde(default)]
    pub speedrun: bool,
}

/// Paramètres de la recherche de routes
#[derive(Clone, Debug, Deserialize)]
pub struct SearchSettings {
    /// Chercher des routes alternatives en murant les passages (défaut: true)
    #[serde(default = "default_alternatives")]
    pub alternatives: bool,
}

/// Paramètres du labyrinthe simulé
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SimulatorConfig {
    /// Graine du générateur, aléatoire si absente
    #[serde(default)]
    pub seed: Option<u64>,

    /// Murs supplémentaires retirés pour créer des boucles (défaut: 0)
    #[serde(default)]
    pub extra_openings: usize,
}

fn default_finish() -> Vec<[usize; 2]> {
    FINISH_GOAL.iter().map(|&(x, y)| [x, y]).collect()
}

fn default_start() -> Vec<[usize; 2]> {
    START_GOAL.iter().map(|&(x, y)| [x, y]).collect()
}

fn default_heading() -> Direction {
    Direction::North
}

fn default_max_steps() -> usize {
    4096
}

fn default_alternatives() -> bool {
    true
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            finish: default_finish(),
            start: default_start(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            start_heading: default_heading(),
            max_steps: default_max_steps(),
            speedrun: false,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            alternatives: default_alternatives(),
        }
    }
}

impl GoalConfig {
    pub fn finish_cells(&self) -> Vec<Coord> {
        self.finish.iter().map(|&[x, y]| (x, y)).collect()
    }

    pub fn start_cells(&self) -> Vec<Coord> {
        self.start.iter().map(|&[x, y]| (x, y)).collect()
    }
}

impl MouseConfig {
    /// Charge la configuration depuis un fichier TOML
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MouseError::Config(format!("Failed to read config file: {}", e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: MouseConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, cells) in [("finish", &self.goals.finish), ("start", &self.goals.start)] {
            if cells.is_empty() {
                return Err(MouseError::Config(format!("{} goal is empty", name)));
            }
            if let Some(cell) = cells.iter().find(|c| c[0] >= MAZE_SIZE || c[1] >= MAZE_SIZE) {
                return Err(MouseError::Config(format!(
                    "{} goal cell {:?} is outside the maze",
                    name, cell
                )));
            }
        }
        if self.mouse.max_steps == 0 {
            return Err(MouseError::Config("max_steps must be positive".to_string()));
        }
        Ok(())
    }
}

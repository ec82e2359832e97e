//! Types d'erreurs du micromouse

use thiserror::Error;

use crate::direction::Direction;

/// Erreur du micromouse.
///
/// `MazeInconsistency` et `InvariantViolation` sont fatales pour la course,
/// `NoRoute` est le résultat vide attendu d'une recherche trop contrainte.
#[derive(Error, Debug)]
pub enum MouseError {
    #[error("Maze inconsistency: {0}")]
    MazeInconsistency(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("No route from {start:?} to goal")]
    NoRoute { start: (usize, usize) },

    #[error("Mouse crashed into a wall at ({x}, {y}) facing {heading:?}")]
    Crashed { x: usize, y: usize, heading: Direction },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MouseError {
    /// Une erreur fatale termine la course, les autres peuvent être ignorées localement.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, MouseError::NoRoute { .. })
    }
}

impl From<toml::de::Error> for MouseError {
    fn from(e: toml::de::Error) -> Self {
        MouseError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MouseError>;

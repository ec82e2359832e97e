//! Cerveau de navigation d'un micromouse.
//!
//! La souris explore un labyrinthe 16 x 16 inconnu case par case, construit
//! sa carte à partir de ses capteurs de murs, remplit le champ de distances
//! vers le centre après chaque observation, puis calcule les meilleures
//! routes une fois le labyrinthe connu.

pub mod cell;
pub mod config;
pub mod direction;
pub mod error;
pub mod maze;
pub mod mouse;
pub mod route;
pub mod search;
pub mod simulator;
pub mod storage;
pub mod telemetry;

pub use cell::Cell;
pub use config::MouseConfig;
pub use direction::{Direction, MouseDirection, Turn};
pub use error::{MouseError, Result};
pub use maze::{Coord, Maze, FINISH_GOAL, MAZE_SIZE, START_GOAL};
pub use mouse::{Mouse, MouseIo, MouseState, WallReading};
pub use route::{Command, Route};
pub use search::{RouteSearch, SearchConfig};
pub use simulator::{Labyrinth, SimulatedBody};
pub use storage::SavedMaze;
pub use telemetry::MazeSnapshot;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::maze::{Coord, MAZE_SIZE};

/// Orientation absolue dans le labyrinthe (Nord = y croissant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    East,
    South,
    West,
}

/// Direction relative à l'orientation de la souris.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseDirection {
    Left,
    Forward,
    Right,
    Backward,
}

/// Quart de tour envoyé à l'actionneur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Turn {
    Left,
    Right,
}

impl MouseDirection {
    /// Ordre de priorité de l'exploration: avant, gauche, droite, arrière.
    pub const PRIORITY: [MouseDirection; 4] = [
        MouseDirection::Forward,
        MouseDirection::Left,
        MouseDirection::Right,
        MouseDirection::Backward,
    ];

    /// Nombre de quarts de tour (sens horaire) depuis l'avant.
    fn offset(self) -> usize {
        match self {
            MouseDirection::Forward => 0,
            MouseDirection::Right => 1,
            MouseDirection::Backward => 2,
            MouseDirection::Left => 3,
        }
    }
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }

    fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }

    /// Tourne à gauche (par ex. North -> West)
    pub fn turn_left(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    /// Tourne à droite (par ex. North -> East)
    pub fn turn_right(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Fait demi tour (par ex. North -> South)
    pub fn opposite(self) -> Self {
        Self::from_index(self.index() + 2)
    }

    /// Applique un quart de tour.
    pub fn turn(self, turn: Turn) -> Self {
        match turn {
            Turn::Left => self.turn_left(),
            Turn::Right => self.turn_right(),
        }
    }

    /// Convertit une direction relative (avant/droite/arrière/gauche)
    /// en direction absolue, en fonction de l'orientation actuelle.
    pub fn from_mouse_direction(heading: Direction, relative: MouseDirection) -> Self {
        Self::from_index(heading.index() + relative.offset())
    }

    /// Vecteur unitaire (dx, dy) de la direction.
    pub fn vector(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
        }
    }

    /// Inverse de `vector`: `None` si le vecteur n'est pas unitaire.
    pub fn from_vector(vector: (i32, i32)) -> Option<Self> {
        match vector {
            (0, 1) => Some(Direction::North),
            (1, 0) => Some(Direction::East),
            (0, -1) => Some(Direction::South),
            (-1, 0) => Some(Direction::West),
            _ => None,
        }
    }

    /// Direction qui mène de `from` à la case adjacente `to`.
    pub fn between(from: Coord, to: Coord) -> Option<Self> {
        let dx = to.0 as i32 - from.0 as i32;
        let dy = to.1 as i32 - from.1 as i32;
        Self::from_vector((dx, dy))
    }

    /// Nouvelle position après un pas dans cette direction, `None` hors de la grille.
    pub fn step(self, (x, y): Coord) -> Option<Coord> {
        let (dx, dy) = self.vector();
        let nx = x.checked_add_signed(dx as isize)?;
        let ny = y.checked_add_signed(dy as isize)?;
        if nx < MAZE_SIZE && ny < MAZE_SIZE {
            Some((nx, ny))
        } else {
            None
        }
    }

    /// Plus courte suite de quarts de tour pour passer à `target`.
    /// Un demi-tour se fait toujours par deux tours à gauche.
    pub fn turns_to(self, target: Direction) -> Vec<Turn> {
        if self != target {
            debug!(from = ?self, to = ?target, "turning");
        }
        match (target.index() + 4 - self.index()) % 4 {
            0 => vec![],
            1 => vec![Turn::Right],
            2 => vec![Turn::Left, Turn::Left],
            _ => vec![Turn::Left],
        }
    }
}

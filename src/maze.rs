//! Carte du labyrinthe: murs connus, cases explorées et champ de distances.

use std::collections::VecDeque;

use tracing::debug;

use crate::cell::Cell;
use crate::direction::Direction;
use crate::error::{MouseError, Result};

/// Taille du labyrinthe (16 x 16 cases).
pub const MAZE_SIZE: usize = 16;

/// Coordonnées (x, y) d'une case, (0, 0) en bas à gauche.
pub type Coord = (usize, usize);

/// Les quatre cases du centre.
pub const FINISH_GOAL: [Coord; 4] = [(7, 7), (7, 8), (8, 7), (8, 8)];

/// La case de départ.
pub const START_GOAL: [Coord; 1] = [(0, 0)];

type Grid<T> = [[T; MAZE_SIZE]; MAZE_SIZE];

/// Carte du labyrinthe, indexée `[x][y]`.
///
/// Les murs ne sont jamais retirés. Chaque mur est écrit des deux côtés
/// par `add_wall`, il n'existe pas d'accès en écriture à une seule cellule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maze {
    cells: Grid<Cell>,
    explored: Grid<bool>,
    flood: Grid<Option<u16>>,
}

impl Default for Maze {
    fn default() -> Self {
        Self::new()
    }
}

impl Maze {
    /// Crée une carte vide: seuls les murs du bord sont connus.
    pub fn new() -> Self {
        let mut maze = Self {
            cells: [[Cell::default(); MAZE_SIZE]; MAZE_SIZE],
            explored: [[false; MAZE_SIZE]; MAZE_SIZE],
            flood: [[None; MAZE_SIZE]; MAZE_SIZE],
        };

        for i in 0..MAZE_SIZE {
            maze.add_wall(i, 0, Direction::South);
            maze.add_wall(i, MAZE_SIZE - 1, Direction::North);
            maze.add_wall(0, i, Direction::West);
            maze.add_wall(MAZE_SIZE - 1, i, Direction::East);
        }

        maze.explored[0][0] = true;
        maze
    }

    /// Reconstruit une carte à partir de grilles sauvegardées.
    ///
    /// Vérifie les murs du bord et la symétrie de chaque mur intérieur.
    pub(crate) fn from_grids(cells: Grid<Cell>, explored: Grid<bool>) -> Result<Self> {
        let maze = Self {
            cells,
            explored,
            flood: [[None; MAZE_SIZE]; MAZE_SIZE],
        };

        for x in 0..MAZE_SIZE {
            for y in 0..MAZE_SIZE {
                for direction in Direction::ALL {
                    let here = maze.cells[x][y].has_wall(direction);
                    match direction.step((x, y)) {
                        Some((nx, ny)) => {
                            if here != maze.cells[nx][ny].has_wall(direction.opposite()) {
                                return Err(MouseError::MazeInconsistency(format!(
                                    "wall {:?} of ({}, {}) does not match its neighbour",
                                    direction, x, y
                                )));
                            }
                        }
                        None if !here => {
                            return Err(MouseError::MazeInconsistency(format!(
                                "missing boundary wall {:?} at ({}, {})",
                                direction, x, y
                            )));
                        }
                        None => {}
                    }
                }
            }
        }

        Ok(maze)
    }

    pub(crate) fn cell_grid(&self) -> &Grid<Cell> {
        &self.cells
    }

    pub(crate) fn explored_grid(&self) -> &Grid<bool> {
        &self.explored
    }

    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.cells[x][y]
    }

    pub fn has_wall(&self, x: usize, y: usize, direction: Direction) -> bool {
        self.cells[x][y].has_wall(direction)
    }

    /// Distance connue jusqu'au but, `None` si la case n'a pas été atteinte.
    pub fn distance(&self, x: usize, y: usize) -> Option<u16> {
        self.flood[x][y]
    }

    pub fn set_explored(&mut self, x: usize, y: usize) {
        self.explored[x][y] = true;
    }

    pub fn is_explored(&self, x: usize, y: usize) -> bool {
        self.explored[x][y]
    }

    /// Ajoute un mur sur la case et, si elle existe, sur le côté opposé de la voisine.
    pub fn add_wall(&mut self, x: usize, y: usize, direction: Direction) {
        self.cells[x][y] = self.cells[x][y].with_wall(direction);

        if let Some((nx, ny)) = direction.step((x, y)) {
            self.cells[nx][ny] = self.cells[nx][ny].with_wall(direction.opposite());
        }
    }

    /// Mure les quatre côtés d'une case.
    pub fn wall_off(&mut self, x: usize, y: usize) {
        for direction in Direction::ALL {
            self.add_wall(x, y, direction);
        }
    }

    /// Vrai si toutes les voisines dans la grille sont explorées.
    pub fn neighbours_explored(&self, (x, y): Coord) -> bool {
        Direction::ALL
            .into_iter()
            .filter_map(|d| d.step((x, y)))
            .all(|(nx, ny)| self.explored[nx][ny])
    }

    /// Remplissage en largeur depuis toutes les cases du but.
    ///
    /// Retourne le nombre de cases atteintes. Les cases non atteintes restent à `None`.
    pub fn flood(&mut self, goal: &[Coord]) -> usize {
        self.flood = [[None; MAZE_SIZE]; MAZE_SIZE];

        let mut search = VecDeque::with_capacity(MAZE_SIZE * MAZE_SIZE);
        for &(x, y) in goal {
            if x >= MAZE_SIZE || y >= MAZE_SIZE || self.flood[x][y].is_some() {
                continue;
            }
            self.flood[x][y] = Some(0);
            search.push_back((x, y));
        }

        let mut reached = search.len();
        while let Some((x, y)) = search.pop_front() {
            let distance = self.flood[x][y].unwrap_or_default();

            for direction in self.cells[x][y].clear_directions() {
                let Some((nx, ny)) = direction.step((x, y)) else {
                    continue;
                };
                if self.flood[nx][ny].is_some() {
                    continue;
                }
                self.flood[nx][ny] = Some(distance + 1);
                search.push_back((nx, ny));
                reached += 1;
            }
        }

        reached
    }

    /// Recalcule les distances vers le but.
    ///
    /// Toute case qui n'est pas entièrement murée doit être atteinte,
    /// sinon la carte est incohérente.
    pub fn recalculate(&mut self, goal: &[Coord]) -> Result<()> {
        let reached = self.flood(goal);
        debug!(reached, "recalculated flood fill");

        for x in 0..MAZE_SIZE {
            for y in 0..MAZE_SIZE {
                if self.flood[x][y].is_none() && !self.cells[x][y].is_walled() {
                    return Err(MouseError::MazeInconsistency(format!(
                        "flood fill did not reach ({}, {})",
                        x, y
                    )));
                }
            }
        }

        Ok(())
    }

    /// Isole les cases inconnues avant le calcul des routes.
    ///
    /// Une case non explorée dont une voisine n'est pas explorée est murée
    /// des quatre côtés. Si toutes ses voisines sont explorées elle reste
    /// ouverte. Toutes les cases sont ensuite marquées explorées.
    pub fn block_unexplored(&mut self) {
        let before = self.explored;
        let mut blocked = 0;

        for x in 0..MAZE_SIZE {
            for y in 0..MAZE_SIZE {
                if before[x][y] {
                    continue;
                }

                let surrounded = Direction::ALL
                    .into_iter()
                    .filter_map(|d| d.step((x, y)))
                    .all(|(nx, ny)| before[nx][ny]);
                if !surrounded {
                    self.wall_off(x, y);
                    blocked += 1;
                }

                self.explored[x][y] = true;
            }
        }

        debug!(blocked, "blocked unexplored cells");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_maze_has_boundary_walls() {
        let maze = Maze::new();
        assert!(maze.has_wall(0, 0, Direction::South));
        assert!(maze.has_wall(0, 0, Direction::West));
        assert!(!maze.has_wall(0, 0, Direction::North));
        assert!(maze.has_wall(15, 15, Direction::North));
        assert!(maze.has_wall(15, 15, Direction::East));
        assert!(maze.is_explored(0, 0));
        assert!(!maze.is_explored(1, 0));
    }

    #[test]
    fn add_wall_is_symmetric() {
        for x in 0..MAZE_SIZE {
            for y in 0..MAZE_SIZE {
                for direction in Direction::ALL {
                    let mut maze = Maze::new();
                    maze.add_wall(x, y, direction);
                    assert!(maze.has_wall(x, y, direction));
                    if let Some((nx, ny)) = direction.step((x, y)) {
                        assert!(maze.has_wall(nx, ny, direction.opposite()));
                    }
                }
            }
        }
    }

    #[test]
    fn empty_maze_flood_is_manhattan() {
        let mut maze = Maze::new();
        maze.recalculate(&FINISH_GOAL).unwrap();

        assert_eq!(maze.distance(0, 0), Some(14));
        assert_eq!(maze.distance(15, 15), Some(14));
        assert_eq!(maze.distance(7, 8), Some(0));
        for x in 0..MAZE_SIZE {
            for y in 0..MAZE_SIZE {
                let dx = if x <= 7 { 7 - x } else { x - 8 };
                let dy = if y <= 7 { 7 - y } else { y - 8 };
                assert_eq!(maze.distance(x, y), Some((dx + dy) as u16));
            }
        }
    }

    #[test]
    fn recalculate_is_idempotent() {
        let mut maze = Maze::new();
        maze.add_wall(3, 3, Direction::North);
        maze.add_wall(3, 3, Direction::East);
        maze.add_wall(6, 7, Direction::East);

        maze.recalculate(&FINISH_GOAL).unwrap();
        let first = maze.clone();
        maze.recalculate(&FINISH_GOAL).unwrap();
        assert_eq!(first, maze);
    }

    #[test]
    fn enclosed_region_is_inconsistent() {
        let mut maze = Maze::new();
        // Enclos de 2 cases autour de (3, 3) et (4, 3)
        maze.add_wall(3, 3, Direction::North);
        maze.add_wall(3, 3, Direction::South);
        maze.add_wall(3, 3, Direction::West);
        maze.add_wall(4, 3, Direction::North);
        maze.add_wall(4, 3, Direction::South);
        maze.add_wall(4, 3, Direction::East);

        let err = maze.recalculate(&FINISH_GOAL).unwrap_err();
        assert!(matches!(err, MouseError::MazeInconsistency(_)));
        assert!(err.is_fatal());
        assert_eq!(maze.distance(3, 3), None);
    }

    #[test]
    fn walled_cells_may_stay_unreached() {
        let mut maze = Maze::new();
        maze.wall_off(5, 5);
        maze.recalculate(&FINISH_GOAL).unwrap();
        assert_eq!(maze.distance(5, 5), None);
        assert_eq!(maze.flood(&FINISH_GOAL), MAZE_SIZE * MAZE_SIZE - 1);
    }

    #[test]
    fn block_unexplored_closes_frontier() {
        let mut maze = Maze::new();
        for x in 0..MAZE_SIZE {
            for y in 0..MAZE_SIZE {
                if (x, y) != (4, 4) && (x, y) != (10, 10) && (x, y) != (10, 11) {
                    maze.set_explored(x, y);
                }
            }
        }

        maze.block_unexplored();

        // Entourée de cases explorées: reste ouverte
        assert!(maze.cell(4, 4).clear_directions().len() == 4);
        // Voisines inconnues l'une de l'autre: murées
        assert!(maze.cell(10, 10).is_walled());
        assert!(maze.cell(10, 11).is_walled());
        assert!(maze.has_wall(9, 10, Direction::East));
        assert!(maze.is_explored(10, 10));
        assert!(maze.is_explored(4, 4));
    }

    #[test]
    fn from_grids_rejects_one_sided_walls() {
        let maze = Maze::new();
        let mut cells = *maze.cell_grid();
        cells[2][2] = cells[2][2].with_wall(Direction::East);
        let err = Maze::from_grids(cells, *maze.explored_grid()).unwrap_err();
        assert!(matches!(err, MouseError::MazeInconsistency(_)));
    }
}

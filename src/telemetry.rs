/*!
 * # Instantané d'affichage du labyrinthe
 *
 * Ce module fournit une vue en lecture seule de la carte après chaque calcul:
 * - les murs de chaque case,
 * - la distance connue au but (ou inconnue),
 * - l'état exploré,
 * - la meilleure route connue, mise en évidence,
 * - le chemin sans boucle parcouru depuis le départ.
 *
 * L'instantané est sérialisable en JSON et peut être dessiné en ASCII.
 */

use serde::Serialize;

use crate::maze::{Coord, Maze, MAZE_SIZE};
use crate::route::Route;

/// Vue d'une case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellView {
    pub x: usize,
    pub y: usize,
    /// Murs N, E, S, O
    pub walls: [bool; 4],
    pub distance: Option<u16>,
    pub explored: bool,
}

/// Instantané complet de la carte.
#[derive(Debug, Clone, Serialize)]
pub struct MazeSnapshot {
    /// Cases, indexées `x * MAZE_SIZE + y`
    pub cells: Vec<CellView>,
    pub mouse: Option<Coord>,
    pub route: Option<Route>,
    /// Cases parcourues depuis le départ, boucles retirées
    pub trail: Vec<Coord>,
}

impl MazeSnapshot {
    pub fn capture(maze: &Maze, mouse: Option<Coord>, route: Option<Route>) -> Self {
        let mut cells = Vec::with_capacity(MAZE_SIZE * MAZE_SIZE);
        for x in 0..MAZE_SIZE {
            for y in 0..MAZE_SIZE {
                cells.push(CellView {
                    x,
                    y,
                    walls: maze.cell(x, y).walls(),
                    distance: maze.distance(x, y),
                    explored: maze.is_explored(x, y),
                });
            }
        }
        Self {
            cells,
            mouse,
            route,
            trail: Vec::new(),
        }
    }

    pub fn with_trail(mut self, trail: &[Coord]) -> Self {
        self.trail = trail.to_vec();
        self
    }

    pub fn cell(&self, x: usize, y: usize) -> &CellView {
        &self.cells[x * MAZE_SIZE + y]
    }

    fn on_route(&self, coord: Coord) -> bool {
        self.route
            .as_ref()
            .is_some_and(|route| route.points().contains(&coord))
    }

    /// Dessine la carte en ASCII, Nord en haut.
    ///
    /// Chaque case affiche sa distance (`X` si inconnue), `M` pour la souris,
    /// `*` devant la distance pour une case de la route.
    pub fn render_ascii(&self) -> String {
        let mut out = String::new();

        for y in (0..MAZE_SIZE).rev() {
            // Murs nord de la rangée
            for x in 0..MAZE_SIZE {
                out.push('+');
                if self.cell(x, y).walls[0] {
                    out.push_str("---");
                } else {
                    out.push_str("   ");
                }
            }
            out.push_str("+\n");

            for x in 0..MAZE_SIZE {
                let view = self.cell(x, y);
                out.push(if view.walls[3] { '|' } else { ' ' });

                let label = match view.distance {
                    Some(d) => (d % 100).to_string(),
                    None => "X".to_string(),
                };
                if self.mouse == Some((x, y)) {
                    out.push_str(&format!("M{:>2}", label));
                } else if self.on_route((x, y)) {
                    out.push_str(&format!("*{:>2}", label));
                } else if view.explored {
                    out.push_str(&format!("{:>3}", label));
                } else {
                    out.push_str(&format!("{:>2}.", label));
                }
            }
            let last = self.cell(MAZE_SIZE - 1, y);
            out.push(if last.walls[1] { '|' } else { ' ' });
            out.push('\n');
        }

        for x in 0..MAZE_SIZE {
            out.push('+');
            if self.cell(x, 0).walls[2] {
                out.push_str("---");
            } else {
                out.push_str("   ");
            }
        }
        out.push_str("+\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::Direction;
    use crate::maze::FINISH_GOAL;

    #[test]
    fn captures_every_cell() {
        let mut maze = Maze::new();
        maze.add_wall(2, 3, Direction::East);
        maze.recalculate(&FINISH_GOAL).unwrap();

        let snapshot = MazeSnapshot::capture(&maze, Some((0, 0)), None);
        assert_eq!(snapshot.cells.len(), MAZE_SIZE * MAZE_SIZE);
        assert_eq!(snapshot.cell(0, 0).distance, Some(14));
        assert!(snapshot.cell(0, 0).explored);
        assert!(!snapshot.cell(1, 0).explored);
        assert_eq!(snapshot.cell(2, 3).walls, [false, true, false, false]);
        assert_eq!(snapshot.cell(3, 3).walls, [false, false, false, true]);
        assert!(snapshot.trail.is_empty());
    }

    #[test]
    fn renders_grid() {
        let mut maze = Maze::new();
        maze.recalculate(&FINISH_GOAL).unwrap();
        let route = Route::from_points(vec![(0, 0), (0, 1)]).unwrap();
        let text = MazeSnapshot::capture(&maze, Some((0, 0)), Some(route)).render_ascii();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), MAZE_SIZE * 2 + 1);
        assert_eq!(lines[0], "+---".repeat(MAZE_SIZE) + "+");
        // Dernière rangée de cases: y = 0, souris en (0, 0)
        assert!(lines[MAZE_SIZE * 2 - 1].starts_with("|M14"));
        assert!(lines[MAZE_SIZE * 2 - 3].starts_with("|*13"));
    }

    #[test]
    fn serializes_to_json() {
        let mut maze = Maze::new();
        maze.recalculate(&FINISH_GOAL).unwrap();
        let snapshot = MazeSnapshot::capture(&maze, None, None);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["cells"][0]["distance"], 14);
        assert_eq!(json["cells"][0]["walls"][2], true);
        assert!(json["route"].is_null());

        let json = serde_json::to_value(snapshot.with_trail(&[(0, 0), (0, 1)])).unwrap();
        assert_eq!(json["trail"][1][1], 1);
    }
}

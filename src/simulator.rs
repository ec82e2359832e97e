//! Labyrinthe simulé et corps de souris simulé.
//!
//! Remplace le robot réel pour les essais: le `Labyrinth` connaît tous les
//! murs, le `SimulatedBody` répond aux capteurs et refuse de traverser un mur.

use std::collections::HashSet;

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use tracing::debug;

use crate::direction::{Direction, MouseDirection, Turn};
use crate::error::{MouseError, Result};
use crate::maze::{Coord, Maze, FINISH_GOAL, MAZE_SIZE};
use crate::mouse::{MouseIo, WallReading};

type Edge = (Coord, Coord);

fn edge(a: Coord, b: Coord) -> Edge {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Labyrinthe dont tous les murs sont connus.
#[derive(Debug, Clone)]
pub struct Labyrinth {
    truth: Maze,
}

impl Labyrinth {
    pub fn from_maze(truth: Maze) -> Self {
        Self { truth }
    }

    /// Labyrinthe sans autre mur que le bord.
    pub fn open() -> Self {
        Self::from_maze(Maze::new())
    }

    pub fn maze(&self) -> &Maze {
        &self.truth
    }

    pub fn has_wall(&self, (x, y): Coord, direction: Direction) -> bool {
        self.truth.has_wall(x, y, direction)
    }

    /// Génère un labyrinthe parfait (backtracker récursif) avec un carré
    /// central 2 x 2 à une seule entrée.
    ///
    /// `extra_openings` murs intérieurs supplémentaires sont retirés pour
    /// créer des boucles, sans toucher au centre.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, extra_openings: usize) -> Self {
        let center: HashSet<Coord> = FINISH_GOAL.iter().copied().collect();
        let mut visited: HashSet<Coord> = center.clone();
        let mut passages: HashSet<Edge> = HashSet::new();

        let mut stack = vec![(0, 0)];
        visited.insert((0, 0));
        while let Some(&current) = stack.last() {
            let unvisited: Vec<Coord> = Direction::ALL
                .into_iter()
                .filter_map(|d| d.step(current))
                .filter(|c| !visited.contains(c))
                .collect();

            match unvisited.choose(rng) {
                Some(&next) => {
                    passages.insert(edge(current, next));
                    visited.insert(next);
                    stack.push(next);
                }
                None => {
                    stack.pop();
                }
            }
        }

        // Intérieur du centre ouvert, une seule entrée depuis l'extérieur
        let mut entrances = Vec::new();
        for &cell in &FINISH_GOAL {
            for direction in Direction::ALL {
                let Some(neighbour) = direction.step(cell) else {
                    continue;
                };
                if center.contains(&neighbour) {
                    passages.insert(edge(cell, neighbour));
                } else {
                    entrances.push(edge(cell, neighbour));
                }
            }
        }
        if let Some(&entrance) = entrances.choose(rng) {
            passages.insert(entrance);
        }

        let mut walls: Vec<Edge> = Vec::new();
        for x in 0..MAZE_SIZE {
            for y in 0..MAZE_SIZE {
                for direction in [Direction::North, Direction::East] {
                    if let Some(neighbour) = direction.step((x, y)) {
                        let e = edge((x, y), neighbour);
                        if !passages.contains(&e) {
                            walls.push(e);
                        }
                    }
                }
            }
        }

        let mut candidates: Vec<Edge> = walls
            .iter()
            .copied()
            .filter(|(a, b)| !center.contains(a) && !center.contains(b))
            .collect();
        candidates.shuffle(rng);
        let removed: HashSet<Edge> = candidates.into_iter().take(extra_openings).collect();

        let mut truth = Maze::new();
        for &(a, b) in walls.iter().filter(|e| !removed.contains(*e)) {
            if let Some(direction) = Direction::between(a, b) {
                truth.add_wall(a.0, a.1, direction);
            }
        }
        for x in 0..MAZE_SIZE {
            for y in 0..MAZE_SIZE {
                truth.set_explored(x, y);
            }
        }

        debug!(walls = walls.len(), extra = removed.len(), "generated labyrinth");
        Self { truth }
    }
}

/// Corps de souris simulé dans un `Labyrinth`.
#[derive(Debug, Clone)]
pub struct SimulatedBody {
    labyrinth: Labyrinth,
    position: Coord,
    heading: Direction,
    turns: usize,
    moves: usize,
}

impl SimulatedBody {
    pub fn new(labyrinth: Labyrinth, position: Coord, heading: Direction) -> Self {
        Self {
            labyrinth,
            position,
            heading,
            turns: 0,
            moves: 0,
        }
    }

    pub fn labyrinth(&self) -> &Labyrinth {
        &self.labyrinth
    }

    pub fn position(&self) -> Coord {
        self.position
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn turns(&self) -> usize {
        self.turns
    }

    pub fn moves(&self) -> usize {
        self.moves
    }

    fn wall(&self, relative: MouseDirection) -> bool {
        let direction = Direction::from_mouse_direction(self.heading, relative);
        self.labyrinth.has_wall(self.position, direction)
    }
}

impl MouseIo for SimulatedBody {
    fn sense_walls(&mut self) -> Result<WallReading> {
        Ok(WallReading {
            left: self.wall(MouseDirection::Left),
            front: self.wall(MouseDirection::Forward),
            right: self.wall(MouseDirection::Right),
        })
    }

    fn turn(&mut self, turn: Turn) -> Result<()> {
        self.heading = self.heading.turn(turn);
        self.turns += 1;
        Ok(())
    }

    fn move_forward(&mut self) -> Result<()> {
        let (x, y) = self.position;
        let crashed = MouseError::Crashed {
            x,
            y,
            heading: self.heading,
        };
        if self.labyrinth.has_wall(self.position, self.heading) {
            return Err(crashed);
        }
        self.position = self.heading.step(self.position).ok_or(crashed)?;
        self.moves += 1;
        Ok(())
    }
}

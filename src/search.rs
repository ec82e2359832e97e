//! Recherche des meilleures routes une fois le labyrinthe exploré.
//!
//! La recherche descend le champ de distances en profondeur, puis (en option)
//! rejoue la recherche sur des copies du labyrinthe où un passage déjà emprunté
//! est muré, pour faire apparaître des routes vraiment différentes.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::direction::{Direction, MouseDirection};
use crate::error::{MouseError, Result};
use crate::maze::{Coord, Maze, FINISH_GOAL, START_GOAL};
use crate::route::Route;

/// Paramètres d'une recherche de routes.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Case de départ
    pub start: Coord,
    /// Orientation de la souris au départ
    pub heading: Direction,
    /// Cases à atteindre
    pub goal: Vec<Coord>,
    /// Rejouer la recherche en murant chaque passage des routes trouvées
    pub alternatives: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            start: START_GOAL[0],
            heading: Direction::North,
            goal: FINISH_GOAL.to_vec(),
            alternatives: true,
        }
    }
}

/// Moteur de recherche de routes.
#[derive(Debug, Clone)]
pub struct RouteSearch {
    config: SearchConfig,
}

impl RouteSearch {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    /// Calcule l'ensemble dédupliqué des routes descendantes du départ vers le but.
    ///
    /// `maze` est modifié: les cases inconnues sont isolées et les distances
    /// recalculées vers le but.
    pub fn best_routes(&self, maze: &mut Maze) -> Result<Vec<Route>> {
        let routes = self.downhill_routes(maze)?;
        if !self.config.alternatives {
            return Ok(routes);
        }

        let mut found = routes.clone();
        for route in &routes {
            for (&(x, y), &direction) in route.points().iter().zip(route.signature()) {
                let mut hypothetical = maze.clone();
                hypothetical.add_wall(x, y, direction);

                match self.downhill_routes(&mut hypothetical) {
                    Ok(others) => found.extend(others),
                    Err(e) if e.is_fatal() => {
                        warn!(x, y, ?direction, error = %e, "dropping speculative branch");
                    }
                    Err(_) => {
                        debug!(x, y, ?direction, "no route without this passage");
                    }
                }
            }
        }

        let before = found.len();
        let routes = dedup(found);
        info!(before, after = routes.len(), "deduplicated routes");
        Ok(routes)
    }

    /// Une passe de recherche en profondeur, sans alternatives.
    fn downhill_routes(&self, maze: &mut Maze) -> Result<Vec<Route>> {
        maze.block_unexplored();
        maze.flood(&self.config.goal);

        let mut routes = Vec::new();
        let mut stack = vec![(self.config.heading, Route::new(self.config.start))];

        while let Some((heading, route)) = stack.pop() {
            let (x, y) = route.end();
            if self.config.goal.contains(&(x, y)) {
                routes.push(route);
                continue;
            }

            let Some(here) = maze.distance(x, y) else {
                continue;
            };

            // Seul le premier voisin descendant est suivi: les autres routes
            // viennent des passes où un passage est muré.
            let cell = maze.cell(x, y);
            let mut next = None;
            for relative in MouseDirection::PRIORITY {
                let candidate = Direction::from_mouse_direction(heading, relative);
                if !cell.is_clear(candidate) {
                    continue;
                }
                let Some((nx, ny)) = candidate.step((x, y)) else {
                    continue;
                };

                if !maze.is_explored(nx, ny) {
                    if !maze.neighbours_explored((nx, ny)) {
                        continue;
                    }
                    maze.set_explored(nx, ny);
                }

                if maze.distance(nx, ny).map(|d| d + 1) == Some(here) {
                    next = Some(candidate);
                    break;
                }
            }

            let Some(direction) = next else {
                continue;
            };
            let mut route = route;
            route.push(direction)?;
            stack.push((direction, route));
        }

        if routes.is_empty() {
            return Err(MouseError::NoRoute {
                start: self.config.start,
            });
        }
        Ok(routes)
    }
}

/// Retire les routes de même signature en gardant la première rencontrée.
fn dedup(routes: Vec<Route>) -> Vec<Route> {
    let mut seen = HashSet::new();
    routes
        .into_iter()
        .filter(|route| seen.insert(route.clone()))
        .collect()
}

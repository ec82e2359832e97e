use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::direction::{Direction, Turn};
use crate::error::{MouseError, Result};
use crate::maze::Coord;

/// Commande élémentaire pour suivre une route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Command {
    Turn(Turn),
    Forward,
}

/// Suite de cases adjacentes, de la case de départ jusqu'au but.
///
/// Deux routes sont égales si elles ont la même suite de directions
/// (leur signature), même si elles ne partent pas de la même case.
#[derive(Debug, Clone, Serialize)]
pub struct Route {
    points: Vec<Coord>,
    steps: Vec<Direction>,
}

impl Route {
    /// Route réduite à la case de départ.
    pub fn new(start: Coord) -> Self {
        Self {
            points: vec![start],
            steps: Vec::new(),
        }
    }

    /// Construit une route à partir de cases successives, qui doivent être adjacentes.
    pub fn from_points(points: Vec<Coord>) -> Result<Self> {
        let Some(&start) = points.first() else {
            return Err(MouseError::InvariantViolation("empty route".to_string()));
        };

        let mut route = Route::new(start);
        for pair in points.windows(2) {
            let direction = Direction::between(pair[0], pair[1]).ok_or_else(|| {
                MouseError::InvariantViolation(format!(
                    "route points {:?} and {:?} are not adjacent",
                    pair[0], pair[1]
                ))
            })?;
            route.points.push(pair[1]);
            route.steps.push(direction);
        }
        Ok(route)
    }

    /// Ajoute la case voisine dans `direction`.
    pub fn push(&mut self, direction: Direction) -> Result<()> {
        let next = direction.step(self.end()).ok_or_else(|| {
            MouseError::MazeInconsistency(format!(
                "route leaves the maze at {:?} going {:?}",
                self.end(),
                direction
            ))
        })?;
        self.points.push(next);
        self.steps.push(direction);
        Ok(())
    }

    pub fn points(&self) -> &[Coord] {
        &self.points
    }

    pub fn start(&self) -> Coord {
        self.points[0]
    }

    pub fn end(&self) -> Coord {
        self.points[self.points.len() - 1]
    }

    /// Nombre de cases de la route (départ inclus).
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Toujours faux: une route contient au moins sa case de départ.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Signature canonique: les directions entre cases successives.
    pub fn signature(&self) -> &[Direction] {
        &self.steps
    }

    pub fn number_of_turns(&self) -> usize {
        self.steps.windows(2).filter(|w| w[0] != w[1]).count()
    }

    /// Commandes à envoyer pour suivre la route en partant avec l'orientation `heading`.
    pub fn commands(&self, heading: Direction) -> Vec<Command> {
        let mut commands = Vec::new();
        let mut current = heading;
        for &step in &self.steps {
            commands.extend(current.turns_to(step).into_iter().map(Command::Turn));
            commands.push(Command::Forward);
            current = step;
        }
        commands
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.steps == other.steps
    }
}

impl Eq for Route {}

impl Hash for Route {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.steps.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use Direction::*;

    #[test]
    fn counts_turns() {
        let route = Route::from_points(vec![(0, 0), (0, 1), (0, 2), (1, 2), (1, 3)]).unwrap();
        assert_eq!(route.signature(), &[North, North, East, North]);
        assert_eq!(route.number_of_turns(), 2);
        assert_eq!(route.len(), 5);
        assert_eq!(route.end(), (1, 3));

        let straight = Route::from_points((0..16).map(|y| (0, y)).collect()).unwrap();
        assert_eq!(straight.number_of_turns(), 0);
    }

    #[test]
    fn same_signature_collapses() {
        let a = Route::from_points(vec![(0, 0), (0, 1), (1, 1)]).unwrap();
        let b = Route::from_points(vec![(3, 4), (3, 5), (4, 5)]).unwrap();
        let c = Route::from_points(vec![(0, 0), (1, 0), (1, 1)]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<Route> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn rejects_gaps_and_empty() {
        assert!(matches!(
            Route::from_points(vec![(0, 0), (0, 2)]),
            Err(MouseError::InvariantViolation(_))
        ));
        assert!(matches!(
            Route::from_points(vec![(0, 0), (0, 0)]),
            Err(MouseError::InvariantViolation(_))
        ));
        assert!(Route::from_points(vec![]).is_err());
    }

    #[test]
    fn push_stays_in_grid() {
        let mut route = Route::new((0, 0));
        route.push(North).unwrap();
        assert_eq!(route.points(), &[(0, 0), (0, 1)]);
        assert!(matches!(route.push(West), Err(MouseError::MazeInconsistency(_))));
        assert_eq!(route.len(), 2);
    }

    #[test]
    fn expands_into_commands() {
        let route = Route::from_points(vec![(0, 0), (0, 1), (1, 1), (1, 0)]).unwrap();
        assert_eq!(
            route.commands(North),
            vec![
                Command::Forward,
                Command::Turn(Turn::Right),
                Command::Forward,
                Command::Turn(Turn::Right),
                Command::Forward,
            ]
        );
        assert_eq!(
            Route::from_points(vec![(0, 1), (0, 0)]).unwrap().commands(North),
            vec![
                Command::Turn(Turn::Left),
                Command::Turn(Turn::Left),
                Command::Forward
            ]
        );
    }
}

//! Politique d'exploration de la souris (machine à états).

use serde::Serialize;
use tracing::{debug, info};

use crate::config::MouseConfig;
use crate::direction::{Direction, MouseDirection, Turn};
use crate::error::{MouseError, Result};
use crate::maze::{Coord, Maze};
use crate::route::Route;
use crate::search::{RouteSearch, SearchConfig};
use crate::storage::SavedMaze;
use crate::telemetry::MazeSnapshot;

/// Murs vus par les capteurs, relativement à l'orientation de la souris.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallReading {
    pub left: bool,
    pub front: bool,
    pub right: bool,
}

/// Accès au corps de la souris (capteurs et moteurs).
///
/// Chaque appel doit être terminé avant le suivant: la souris ne met à jour
/// sa position et son orientation qu'après le retour de `turn` et `move_forward`.
pub trait MouseIo {
    fn sense_walls(&mut self) -> Result<WallReading>;
    fn turn(&mut self, turn: Turn) -> Result<()>;
    fn move_forward(&mut self) -> Result<()>;
}

/// État du cycle de vie de la souris.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MouseState {
    Exploring,
    Returning,
    AligningAtStart,
    CalculatingRoute,
    Speedrunning,
    Speedreturning,
    Finished,
}

/// La souris: sa carte, sa position, son orientation et son état.
#[derive(Debug, Clone)]
pub struct Mouse {
    maze: Maze,
    x: usize,
    y: usize,
    heading: Direction,
    state: MouseState,
    finish: Vec<Coord>,
    start: Vec<Coord>,
    alternatives: bool,
    speedrun: bool,
    max_steps: usize,
    /// Chemin sans boucle depuis le départ
    trail: Vec<Coord>,
    routes: Vec<Route>,
    steps: usize,
}

impl Default for Mouse {
    fn default() -> Self {
        Self::new(&MouseConfig::default())
    }
}

impl Mouse {
    /// Souris posée sur la première case de départ, carte vierge.
    pub fn new(config: &MouseConfig) -> Self {
        let start = config.goals.start_cells();
        let (x, y) = start.first().copied().unwrap_or((0, 0));
        Self {
            maze: Maze::new(),
            x,
            y,
            heading: config.mouse.start_heading,
            state: MouseState::Exploring,
            finish: config.goals.finish_cells(),
            start,
            alternatives: config.search.alternatives,
            speedrun: config.mouse.speedrun,
            max_steps: config.mouse.max_steps,
            trail: vec![(x, y)],
            routes: Vec::new(),
            steps: 0,
        }
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn position(&self) -> Coord {
        (self.x, self.y)
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn state(&self) -> MouseState {
        self.state
    }

    /// Routes calculées à l'état `CalculatingRoute`.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Nombre de pas effectués depuis le départ.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Remplace la carte par une carte sauvegardée et passe directement au calcul des routes.
    pub fn load_maze(&mut self, saved: &SavedMaze) -> Result<()> {
        let mut maze = saved.to_maze()?;
        maze.recalculate(&self.finish)?;
        self.maze = maze;
        self.transition(MouseState::CalculatingRoute);
        Ok(())
    }

    fn transition(&mut self, next: MouseState) {
        info!(from = ?self.state, to = ?next, x = self.x, y = self.y, "state transition");
        self.state = next;
    }

    /// Un pas de la machine à états.
    pub fn step<B: MouseIo>(&mut self, body: &mut B) -> Result<MouseState> {
        match self.state {
            MouseState::Exploring => {
                if self.finish.contains(&(self.x, self.y)) {
                    debug!(x = self.x, y = self.y, "already in goal");
                    self.maze.set_explored(self.x, self.y);
                    self.transition(MouseState::Returning);
                } else if self.exploring_move(body, false)? {
                    self.mark_out_center()?;
                    self.transition(MouseState::Returning);
                }
            }
            MouseState::Returning => {
                if self.exploring_move(body, true)? {
                    self.transition(MouseState::AligningAtStart);
                }
            }
            MouseState::AligningAtStart => {
                let clear = self.maze.cell(self.x, self.y).clear_directions();
                let direction = clear.first().copied().ok_or_else(|| {
                    MouseError::MazeInconsistency(format!(
                        "start cell ({}, {}) is walled in",
                        self.x, self.y
                    ))
                })?;
                self.turn_mouse(body, direction)?;
                self.transition(MouseState::CalculatingRoute);
            }
            MouseState::CalculatingRoute => {
                self.routes = self.calculate_routes()?;
                if self.speedrun {
                    self.transition(MouseState::Speedrunning);
                } else {
                    self.transition(MouseState::Finished);
                }
            }
            // Course rapide: la main est au contrôleur de trajectoire.
            MouseState::Speedrunning | MouseState::Speedreturning | MouseState::Finished => {}
        }
        Ok(self.state)
    }

    /// Fait avancer la machine jusqu'à l'état final ou la course rapide.
    pub fn run<B: MouseIo>(&mut self, body: &mut B) -> Result<MouseState> {
        let mut iterations = 0;
        while !matches!(self.state, MouseState::Finished | MouseState::Speedrunning) {
            if iterations >= self.max_steps {
                return Err(MouseError::InvariantViolation(format!(
                    "run did not finish within {} steps",
                    self.max_steps
                )));
            }
            self.step(body)?;
            iterations += 1;
        }
        info!(steps = self.steps, routes = self.routes.len(), "run finished");
        Ok(self.state)
    }

    /// Le contrôleur externe signale la fin d'une course rapide.
    pub fn complete_speedrun(&mut self) -> Result<MouseState> {
        match self.state {
            MouseState::Speedrunning => self.transition(MouseState::Speedreturning),
            MouseState::Speedreturning => self.transition(MouseState::Finished),
            other => {
                return Err(MouseError::InvariantViolation(format!(
                    "no speed run in progress (state {:?})",
                    other
                )))
            }
        }
        Ok(self.state)
    }

    /// Un pas d'exploration vers le but. Retourne vrai quand le but est atteint.
    ///
    /// À l'aller on s'arrête devant le centre, sans y entrer; au retour on
    /// s'arrête une fois sur une case de départ.
    fn exploring_move<B: MouseIo>(&mut self, body: &mut B, returning: bool) -> Result<bool> {
        if returning && self.start.contains(&(self.x, self.y)) {
            debug!(x = self.x, y = self.y, "entered start");
            return Ok(true);
        }

        self.add_mouse_walls(body)?;
        self.maze.set_explored(self.x, self.y);

        let goal = if returning { &self.start } else { &self.finish };
        self.maze.recalculate(goal)?;

        let best = self.find_best_direction()?;
        if !returning {
            if let Some(next) = best.step((self.x, self.y)) {
                if self.finish.contains(&next) {
                    debug!(x = next.0, y = next.1, "can enter goal");
                    return Ok(true);
                }
            }
        }

        self.turn_mouse(body, best)?;
        self.move_forward(body)?;
        Ok(false)
    }

    fn add_mouse_walls<B: MouseIo>(&mut self, body: &mut B) -> Result<()> {
        let reading = body.sense_walls()?;
        debug!(
            x = self.x,
            y = self.y,
            heading = ?self.heading,
            left = reading.left,
            front = reading.front,
            right = reading.right,
            "sensors"
        );

        let sensed = [
            (reading.left, MouseDirection::Left),
            (reading.front, MouseDirection::Forward),
            (reading.right, MouseDirection::Right),
        ];
        for (wall, relative) in sensed {
            if wall {
                let direction = Direction::from_mouse_direction(self.heading, relative);
                self.maze.add_wall(self.x, self.y, direction);
            }
        }
        Ok(())
    }

    /// Choisit la prochaine direction.
    ///
    /// Les directions libres sont essayées dans l'ordre avant, gauche, droite,
    /// arrière; une direction ne remplace la meilleure que si sa distance est
    /// strictement plus petite.
    pub fn find_best_direction(&self) -> Result<Direction> {
        let cell = self.maze.cell(self.x, self.y);
        let mut first = None;
        let mut best: Option<(Direction, u16)> = None;

        for relative in MouseDirection::PRIORITY {
            let direction = Direction::from_mouse_direction(self.heading, relative);
            if !cell.is_clear(direction) {
                continue;
            }
            let (nx, ny) = direction.step((self.x, self.y)).ok_or_else(|| {
                MouseError::MazeInconsistency(format!(
                    "clear direction {:?} at ({}, {}) leaves the maze",
                    direction, self.x, self.y
                ))
            })?;

            first.get_or_insert(direction);
            let Some(distance) = self.maze.distance(nx, ny) else {
                continue;
            };
            if best.map_or(true, |(_, value)| distance < value) {
                best = Some((direction, distance));
            }
        }

        let chosen = best.map(|(d, _)| d).or(first).ok_or_else(|| {
            MouseError::MazeInconsistency(format!(
                "no clear direction at ({}, {})",
                self.x, self.y
            ))
        })?;
        debug!(direction = ?chosen, "best direction");
        Ok(chosen)
    }

    fn turn_mouse<B: MouseIo>(&mut self, body: &mut B, direction: Direction) -> Result<()> {
        for turn in self.heading.turns_to(direction) {
            body.turn(turn)?;
            self.heading = self.heading.turn(turn);
        }
        Ok(())
    }

    fn move_forward<B: MouseIo>(&mut self, body: &mut B) -> Result<()> {
        body.move_forward()?;

        let (x, y) = self.heading.step((self.x, self.y)).ok_or_else(|| {
            MouseError::MazeInconsistency(format!(
                "moved out of the maze from ({}, {})",
                self.x, self.y
            ))
        })?;
        self.x = x;
        self.y = y;
        self.steps += 1;

        // Revenir sur une case du chemin efface la boucle parcourue depuis
        match self.trail.iter().position(|&p| p == (x, y)) {
            Some(index) => self.trail.truncate(index + 1),
            None => self.trail.push((x, y)),
        }
        Ok(())
    }

    /// Déduit les murs du carré central à la première entrée.
    ///
    /// Le centre est un carré 2 x 2 avec une seule entrée: les cases non entrées
    /// reçoivent leurs deux murs extérieurs, la case d'entrée son mur extérieur
    /// restant.
    fn mark_out_center(&mut self) -> Result<()> {
        let direction = self.find_best_direction()?;
        let entered = direction.step((self.x, self.y)).ok_or_else(|| {
            MouseError::InvariantViolation("center entrance is outside the maze".to_string())
        })?;

        let Some(corner) = center_corner(&self.finish) else {
            debug!("finish is not a 2x2 block, no center inference");
            self.maze.set_explored(entered.0, entered.1);
            return Ok(());
        };
        if !self.finish.contains(&entered) {
            return Err(MouseError::InvariantViolation(format!(
                "center entered at {:?} which is not a finish cell",
                entered
            )));
        }

        for &(x, y) in &self.finish {
            if (x, y) != entered {
                let (vertical, horizontal) = outer_sides(corner, (x, y));
                self.maze.add_wall(x, y, vertical);
                self.maze.add_wall(x, y, horizontal);
            }
        }

        let (vertical, horizontal) = outer_sides(corner, entered);
        let entrance = direction.opposite();
        let candidates: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|&d| d != entrance)
            .filter(|&d| d != vertical.opposite() && d != horizontal.opposite())
            .collect();

        let [wall] = candidates[..] else {
            return Err(MouseError::InvariantViolation(format!(
                "center cell {:?} entered going {:?} leaves {} candidate walls",
                entered,
                direction,
                candidates.len()
            )));
        };
        self.maze.add_wall(entered.0, entered.1, wall);

        for &(x, y) in &self.finish {
            self.maze.set_explored(x, y);
        }
        info!(x = entered.0, y = entered.1, ?entrance, "marked out center");
        Ok(())
    }

    /// Meilleure route connue depuis la position actuelle, en descendant les distances.
    pub fn best_known_route(&self) -> Route {
        let mut route = Route::new((self.x, self.y));
        let mut heading = self.heading;
        let Some(mut current) = self.maze.distance(self.x, self.y) else {
            return route;
        };

        while current > 0 {
            let here = route.end();
            let cell = self.maze.cell(here.0, here.1);
            let next = MouseDirection::PRIORITY
                .into_iter()
                .map(|relative| Direction::from_mouse_direction(heading, relative))
                .filter(|&d| cell.is_clear(d))
                .find(|&d| {
                    d.step(here)
                        .and_then(|(nx, ny)| self.maze.distance(nx, ny))
                        .is_some_and(|distance| distance + 1 == current)
                });

            let Some(direction) = next else {
                break;
            };
            if route.push(direction).is_err() {
                break;
            }
            heading = direction;
            current -= 1;
        }
        route
    }

    fn calculate_routes(&self) -> Result<Vec<Route>> {
        let search = RouteSearch::new(SearchConfig {
            start: (self.x, self.y),
            heading: self.heading,
            goal: self.finish.clone(),
            alternatives: self.alternatives,
        });
        let mut planning = self.maze.clone();
        let routes = search.best_routes(&mut planning)?;

        for route in &routes {
            debug!(
                length = route.len(),
                turns = route.number_of_turns(),
                "candidate route"
            );
        }
        info!(count = routes.len(), "calculated routes");
        Ok(routes)
    }

    /// Instantané pour l'affichage, avec le chemin sans boucle depuis le départ.
    pub fn snapshot(&self) -> MazeSnapshot {
        MazeSnapshot::capture(
            &self.maze,
            Some((self.x, self.y)),
            Some(self.best_known_route()),
        )
        .with_trail(&self.trail)
    }
}

/// Coin bas-gauche du but s'il forme un carré 2 x 2.
fn center_corner(goal: &[Coord]) -> Option<Coord> {
    let min_x = goal.iter().map(|c| c.0).min()?;
    let min_y = goal.iter().map(|c| c.1).min()?;
    let block = [
        (min_x, min_y),
        (min_x, min_y + 1),
        (min_x + 1, min_y),
        (min_x + 1, min_y + 1),
    ];
    if goal.len() == 4 && block.iter().all(|c| goal.contains(c)) {
        Some((min_x, min_y))
    } else {
        None
    }
}

/// Côtés extérieurs (vertical, horizontal) d'une case du carré central.
fn outer_sides(corner: Coord, (x, y): Coord) -> (Direction, Direction) {
    let vertical = if x == corner.0 {
        Direction::West
    } else {
        Direction::East
    };
    let horizontal = if y == corner.1 {
        Direction::South
    } else {
        Direction::North
    };
    (vertical, horizontal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::{FINISH_GOAL, MAZE_SIZE};

    /// Corps qui ne voit jamais de mur et enregistre les commandes reçues.
    #[derive(Default)]
    struct OpenBody {
        turns: Vec<Turn>,
        moves: usize,
    }

    impl MouseIo for OpenBody {
        fn sense_walls(&mut self) -> Result<WallReading> {
            Ok(WallReading::default())
        }

        fn turn(&mut self, turn: Turn) -> Result<()> {
            self.turns.push(turn);
            Ok(())
        }

        fn move_forward(&mut self) -> Result<()> {
            self.moves += 1;
            Ok(())
        }
    }

    fn mouse_at(x: usize, y: usize, heading: Direction) -> Mouse {
        let mut mouse = Mouse::default();
        mouse.x = x;
        mouse.y = y;
        mouse.heading = heading;
        mouse
    }

    #[test]
    fn prefers_forward_on_ties() {
        let mut mouse = mouse_at(0, 0, Direction::North);
        mouse.maze.recalculate(&FINISH_GOAL).unwrap();
        // Nord et Est sont à 13: l'avant gagne
        assert_eq!(mouse.find_best_direction().unwrap(), Direction::North);

        let mut mouse = mouse_at(0, 0, Direction::East);
        mouse.maze.recalculate(&FINISH_GOAL).unwrap();
        assert_eq!(mouse.find_best_direction().unwrap(), Direction::East);
    }

    #[test]
    fn strictly_smaller_distance_wins() {
        let mut mouse = mouse_at(3, 3, Direction::South);
        mouse.maze.recalculate(&FINISH_GOAL).unwrap();
        // Au sud la distance augmente, au nord et à l'est elle diminue: la gauche (est) gagne
        assert_eq!(mouse.find_best_direction().unwrap(), Direction::East);
    }

    #[test]
    fn walled_in_mouse_is_inconsistent() {
        let mut mouse = mouse_at(4, 4, Direction::North);
        mouse.maze.wall_off(4, 4);
        let err = mouse.find_best_direction().unwrap_err();
        assert!(matches!(err, MouseError::MazeInconsistency(_)));
    }

    #[test]
    fn explores_empty_maze_to_center() {
        let mut mouse = Mouse::default();
        let mut body = OpenBody::default();

        let mut iterations = 0;
        while mouse.state() == MouseState::Exploring {
            mouse.step(&mut body).unwrap();
            iterations += 1;
            assert!(iterations <= MAZE_SIZE * MAZE_SIZE);
        }

        assert_eq!(mouse.state(), MouseState::Returning);
        // 13 pas jusqu'à une case voisine du centre, arrêt avant d'entrer
        assert_eq!(body.moves, 13);
        assert_eq!(mouse.steps(), 13);
        assert_eq!(mouse.maze().distance(mouse.x, mouse.y), Some(1));
        assert_eq!(mouse.snapshot().trail.len(), 14);
        for &(x, y) in &FINISH_GOAL {
            assert!(mouse.maze().is_explored(x, y));
        }
    }

    #[test]
    fn center_inference_leaves_one_entrance() {
        // Devant (7, 7) en venant de l'ouest
        let mut mouse = mouse_at(6, 7, Direction::East);
        mouse.maze.recalculate(&FINISH_GOAL).unwrap();
        mouse.mark_out_center().unwrap();

        let maze = mouse.maze();
        assert!(maze.has_wall(7, 7, Direction::South));
        assert!(!maze.has_wall(7, 7, Direction::West));
        assert!(maze.has_wall(7, 8, Direction::West));
        assert!(maze.has_wall(7, 8, Direction::North));
        assert!(maze.has_wall(8, 7, Direction::East));
        assert!(maze.has_wall(8, 7, Direction::South));
        assert!(maze.has_wall(8, 8, Direction::East));
        assert!(maze.has_wall(8, 8, Direction::North));
        // Les murs intérieurs du carré restent ouverts
        assert!(!maze.has_wall(7, 7, Direction::North));
        assert!(!maze.has_wall(7, 7, Direction::East));
    }

    #[test]
    fn center_inference_from_inside_is_a_violation() {
        // Entrer en (7, 7) par le nord: le côté d'entrée est un côté intérieur
        let mut mouse = mouse_at(7, 8, Direction::South);
        mouse.maze.add_wall(7, 8, Direction::West);
        mouse.maze.add_wall(7, 8, Direction::East);
        mouse.maze.recalculate(&FINISH_GOAL).unwrap();
        mouse.maze.flood(&[(7, 7)]);

        let err = mouse.mark_out_center().unwrap_err();
        assert!(matches!(err, MouseError::InvariantViolation(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn returning_stops_on_start() {
        let mut mouse = mouse_at(0, 0, Direction::South);
        mouse.state = MouseState::Returning;
        let mut body = OpenBody::default();

        assert_eq!(mouse.step(&mut body).unwrap(), MouseState::AligningAtStart);
        assert_eq!(body.moves, 0);

        assert_eq!(mouse.step(&mut body).unwrap(), MouseState::CalculatingRoute);
        // Première direction libre en (0, 0): le nord, par deux tours à gauche
        assert_eq!(mouse.heading(), Direction::North);
        assert_eq!(body.turns, vec![Turn::Left, Turn::Left]);
    }

    #[test]
    fn best_known_route_descends_to_goal() {
        let mut mouse = Mouse::default();
        mouse.maze.recalculate(&FINISH_GOAL).unwrap();
        let route = mouse.best_known_route();

        assert_eq!(route.len(), 15);
        assert!(FINISH_GOAL.contains(&route.end()));
        // Tout droit vers le nord puis à droite
        assert_eq!(route.points()[7], (0, 7));
        assert_eq!(route.number_of_turns(), 1);
    }

    #[test]
    fn speedrun_is_handed_back_by_the_controller() {
        let mut mouse = Mouse::default();
        assert!(mouse.complete_speedrun().is_err());

        mouse.state = MouseState::Speedrunning;
        assert_eq!(mouse.complete_speedrun().unwrap(), MouseState::Speedreturning);
        assert_eq!(mouse.complete_speedrun().unwrap(), MouseState::Finished);
    }

    #[test]
    fn starting_in_goal_does_not_move() {
        let config = MouseConfig::parse("[goals]\nfinish = [[0, 0]]\n").unwrap();
        let mut mouse = Mouse::new(&config);
        let mut body = OpenBody::default();

        assert_eq!(mouse.step(&mut body).unwrap(), MouseState::Returning);
        assert_eq!(mouse.run(&mut body).unwrap(), MouseState::Finished);
        assert_eq!(body.moves, 0);
        assert!(body.turns.is_empty());
        assert_eq!(mouse.routes().len(), 1);
        assert_eq!(mouse.routes()[0].len(), 1);
    }

    #[test]
    fn trail_forgets_loops() {
        let mut mouse = Mouse::default();
        let mut body = OpenBody::default();
        for direction in [Direction::North, Direction::East, Direction::South, Direction::West] {
            mouse.turn_mouse(&mut body, direction).unwrap();
            mouse.move_forward(&mut body).unwrap();
        }

        // Retour sur (0, 0) après un tour de carré
        assert_eq!(mouse.position(), (0, 0));
        assert_eq!(mouse.steps(), 4);
        assert_eq!(mouse.snapshot().trail, vec![(0, 0)]);
    }

    #[test]
    fn center_corner_requires_square() {
        assert_eq!(center_corner(&FINISH_GOAL), Some((7, 7)));
        assert_eq!(center_corner(&[(0, 15)]), None);
        assert_eq!(center_corner(&[(1, 1), (1, 2), (2, 1), (3, 3)]), None);
    }
}

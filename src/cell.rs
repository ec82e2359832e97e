use crate::direction::Direction;

/// Représente une cellule du labyrinthe.
///
/// Les murs connus sont stockés sur 4 bits (bit à 1 = mur présent):
/// Nord = bit 3, Ouest = bit 2, Est = bit 1, Sud = bit 0.
/// Une cellule ne connaît pas ses voisines: la symétrie des murs est
/// garantie par `Maze::add_wall`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Cell(u8);

impl Cell {
    /// Cellule entourée de quatre murs.
    pub const WALLED: Cell = Cell(0b1111);

    /// Crée une cellule à partir d'un masque brut, `None` si le masque dépasse 4 bits.
    pub fn from_mask(mask: u8) -> Option<Self> {
        if mask <= Self::WALLED.0 {
            Some(Cell(mask))
        } else {
            None
        }
    }

    pub fn mask(self) -> u8 {
        self.0
    }

    fn bit(direction: Direction) -> u8 {
        match direction {
            Direction::North => 1 << 3,
            Direction::West => 1 << 2,
            Direction::East => 1 << 1,
            Direction::South => 1,
        }
    }

    /// Retourne la cellule avec un mur de plus.
    pub(crate) fn with_wall(self, direction: Direction) -> Self {
        Cell(self.0 | Self::bit(direction))
    }

    pub fn has_wall(self, direction: Direction) -> bool {
        self.0 & Self::bit(direction) != 0
    }

    pub fn is_clear(self, direction: Direction) -> bool {
        !self.has_wall(direction)
    }

    pub fn is_walled(self) -> bool {
        self == Self::WALLED
    }

    /// Directions sans mur connu, dans l'ordre N, E, S, O.
    pub fn clear_directions(self) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|&d| self.is_clear(d))
            .collect()
    }

    /// Les quatre murs, dans l'ordre N, E, S, O.
    pub fn walls(self) -> [bool; 4] {
        Direction::ALL.map(|d| self.has_wall(d))
    }
}

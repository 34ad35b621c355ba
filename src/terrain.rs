use core::fmt;
use serde::{Deserialize, Serialize};

/// Terrain classification of a single tile. The discriminants are the numeric codes used by
/// layouts built with [Layout::from_codes](crate::layout::Layout::from_codes).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    Enemy = 0,
    Knight = 1,
    #[default]
    Grass = 2,
    Stone = 3,
    Tree = 4,
    Impassable = 5,
    Fence = 6,
    Spawn = 7,
    Block = 8,
}

impl Terrain {
    pub const ALL: [Terrain; 9] = [
        Terrain::Enemy,
        Terrain::Knight,
        Terrain::Grass,
        Terrain::Stone,
        Terrain::Tree,
        Terrain::Impassable,
        Terrain::Fence,
        Terrain::Spawn,
        Terrain::Block,
    ];

    pub fn from_code(code: u8) -> Option<Terrain> {
        Terrain::ALL.get(code as usize).copied()
    }
    pub fn code(self) -> u8 {
        self as u8
    }
    /// Symbol used by the plain-text map format.
    pub fn symbol(self) -> char {
        match self {
            Terrain::Enemy => 'E',
            Terrain::Knight => 'K',
            Terrain::Grass => '.',
            Terrain::Stone => 's',
            Terrain::Tree => 'T',
            Terrain::Impassable => '#',
            Terrain::Fence => 'F',
            Terrain::Spawn => 'P',
            Terrain::Block => 'B',
        }
    }
    pub fn from_symbol(symbol: char) -> Option<Terrain> {
        Terrain::ALL.into_iter().find(|t| t.symbol() == symbol)
    }
    /// Whether a player-controlled entity is stopped when walking into this terrain. This never
    /// affects pathfinding edges, which only see the cost multiplier.
    pub fn blocks_movement(self) -> bool {
        matches!(self, Terrain::Impassable | Terrain::Fence | Terrain::Block)
    }
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

//! Character positions on a map.

use serde::{Deserialize, Serialize};

/// A character's location in the world: named map plus tile coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub map: String,
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(map: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            map: map.into(),
            x,
            y,
        }
    }

    /// Manhattan distance to another position on the same map.
    ///
    /// Returns `None` when the positions are on different maps - callers use
    /// this to exclude cross-map recipients from area broadcasts.
    pub fn distance(&self, other: &Position) -> Option<i64> {
        if self.map != other.map {
            return None;
        }
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        Some(dx.abs() + dy.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_on_same_map_is_manhattan() {
        let a = Position::new("town", 0, 0);
        let b = Position::new("town", 3, -4);
        assert_eq!(a.distance(&b), Some(7));
    }

    #[test]
    fn distance_across_maps_is_none() {
        let a = Position::new("town", 0, 0);
        let b = Position::new("forest", 0, 0);
        assert_eq!(a.distance(&b), None);
    }
}

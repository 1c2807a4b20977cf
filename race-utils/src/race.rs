//! Views derived from a [`Store`]: standings and track positions.

use crate::{Store, TOTAL_UNITS};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Standing {
    pub name: String,
    pub completed: usize,
}

impl Standing {
    pub fn fraction(&self) -> f64 {
        self.completed as f64 / TOTAL_UNITS as f64
    }
}

/// Players sorted by completed units, most first. Ties go to the name that
/// sorts first.
pub fn leaderboard(store: &Store) -> Vec<Standing> {
    let mut rows: Vec<Standing> = store
        .iter()
        .map(|(name, player)| Standing {
            name: name.to_string(),
            completed: player.completed_count(),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.completed
            .cmp(&a.completed)
            .then_with(|| a.name.cmp(&b.name))
    });
    rows
}

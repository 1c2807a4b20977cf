pub mod api;
pub mod race;
pub mod syllabus;

use std::collections::BTreeMap;

pub use syllabus::{SUBJECTS, Subject, TOTAL_UNITS};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("Player not found: {0}")]
    NotFound(String),
}

/// One racer's completion vector. Index `i` is unit `i` of the flattened
/// syllabus (see [`syllabus::locate_unit`]).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Player {
    pub units: [bool; TOTAL_UNITS],
}

impl Player {
    pub fn new() -> Self {
        Self {
            units: [false; TOTAL_UNITS],
        }
    }

    pub fn completed_count(&self) -> usize {
        self.units.iter().filter(|done| **done).count()
    }

    /// How far along the track this player is, in `[0, 1]`.
    pub fn race_position(&self) -> f64 {
        self.completed_count() as f64 / TOTAL_UNITS as f64
    }

    pub fn is_finished(&self) -> bool {
        self.completed_count() == TOTAL_UNITS
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of [`Store::create_player`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateOutcome {
    pub exists: bool,
    pub player: Player,
}

/// Every player's progress, keyed by display name.
///
/// Keys are ordered so the JSON document, the track, and the "first player"
/// fallback are all deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Store {
    players: BTreeMap<String, Player>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Player> {
        self.players.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.players.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.players.keys().map(String::as_str)
    }

    pub fn first_name(&self) -> Option<&str> {
        self.names().next()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Player)> {
        self.players
            .iter()
            .map(|(name, player)| (name.as_str(), player))
    }

    /// Inserts an all-false player unless `name` is already taken, in which
    /// case the store is left untouched.
    pub fn create_player(&mut self, name: &str) -> Result<CreateOutcome, ProgressError> {
        validate_name(name)?;
        if let Some(player) = self.players.get(name) {
            return Ok(CreateOutcome {
                exists: true,
                player: player.clone(),
            });
        }
        let player = Player::new();
        self.players.insert(name.to_string(), player.clone());
        Ok(CreateOutcome {
            exists: false,
            player,
        })
    }

    /// Sets one unit and returns the player's new completed count.
    pub fn set_unit(
        &mut self,
        name: &str,
        index: usize,
        value: bool,
    ) -> Result<usize, ProgressError> {
        validate_name(name)?;
        validate_index(index)?;
        let player = self
            .players
            .get_mut(name)
            .ok_or_else(|| ProgressError::NotFound(name.to_string()))?;
        player.units[index] = value;
        Ok(player.completed_count())
    }

    /// Overwrites (or creates) a player's whole vector.
    pub fn replace_player(
        &mut self,
        name: &str,
        units: [bool; TOTAL_UNITS],
    ) -> Result<(), ProgressError> {
        validate_name(name)?;
        self.players.insert(name.to_string(), Player { units });
        Ok(())
    }
}

impl FromIterator<(String, Player)> for Store {
    fn from_iter<I: IntoIterator<Item = (String, Player)>>(iter: I) -> Self {
        Self {
            players: iter.into_iter().collect(),
        }
    }
}

pub fn validate_name(name: &str) -> Result<(), ProgressError> {
    if name.is_empty() {
        return Err(ProgressError::InvalidInput(
            "Valid player name required.".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_index(index: usize) -> Result<(), ProgressError> {
    if index >= TOTAL_UNITS {
        return Err(ProgressError::InvalidInput(format!(
            "Unit index {index} out of range 0..{TOTAL_UNITS}."
        )));
    }
    Ok(())
}

/// JSON truthiness: `false`, `null`, `0` and `""` are false, anything else
/// (including `"false"`, `[]` and `{}`) is true.
pub fn truthy(value: &serde_json::Value) -> bool {
    use serde_json::Value;

    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

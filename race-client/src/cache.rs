use race_utils::{
    Player, Store, TOTAL_UNITS,
    api::{ToggleUnitRequest, UpdatePlayerRequest},
};

use crate::ClientError;

/// The client's copy of the store plus which player this client is looking
/// at. Replaced wholesale on every poll; local edits are applied on top
/// until then.
#[derive(Clone, Debug, Default)]
pub struct LocalCache {
    store: Store,
    selected: Option<String>,
}

impl LocalCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_player(&self) -> Option<(&str, &Player)> {
        let name = self.selected.as_deref()?;
        self.store.get(name).map(|player| (name, player))
    }

    pub fn select(&mut self, name: &str) {
        self.selected = Some(name.to_string());
    }

    /// Overwrites the cache with fresh server state. A selection that is no
    /// longer present falls back to the first player.
    pub fn replace(&mut self, store: Store) {
        self.store = store;
        let still_present = self
            .selected
            .as_deref()
            .is_some_and(|name| self.store.contains(name));
        if !still_present {
            self.selected = self.store.first_name().map(str::to_string);
        }
    }

    /// Applies a unit change to the selected player and returns the request
    /// that tells the server about it.
    pub fn toggle(&mut self, index: usize, value: bool) -> Result<ToggleUnitRequest, ClientError> {
        let player = self.selected.clone().ok_or(ClientError::NoPlayerSelected)?;
        self.store.set_unit(&player, index, value)?;
        Ok(ToggleUnitRequest {
            player,
            index,
            value,
        })
    }

    /// Current value of a unit for the selected player.
    pub fn unit(&self, index: usize) -> Option<bool> {
        self.selected_player()
            .and_then(|(_, player)| player.units.get(index).copied())
    }

    /// Clears every unit of the selected player.
    pub fn reset(&mut self) -> Result<UpdatePlayerRequest, ClientError> {
        let player = self.selected.clone().ok_or(ClientError::NoPlayerSelected)?;
        let units = [false; TOTAL_UNITS];
        self.store.replace_player(&player, units)?;
        Ok(UpdatePlayerRequest { player, units })
    }
}

//! Detail popup sub-state.

use serde::Serialize;

use rosetta_core::{ProviderId, ResultSet};

/// Which provider card is open for detail viewing.
///
/// `show_popup` implies `selected_card` names a provider in the current
/// result set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PopupState {
    selected_card: Option<ProviderId>,
    show_popup: bool,
}

impl PopupState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the popup for `id`. Returns `false` (and changes nothing) when
    /// `id` has no entry in `results`.
    pub fn select(&mut self, id: &ProviderId, results: Option<&ResultSet>) -> bool {
        if !results.is_some_and(|r| r.contains(id)) {
            return false;
        }
        self.selected_card = Some(id.clone());
        self.show_popup = true;
        true
    }

    /// Hide the popup. The last selection is kept.
    pub fn close(&mut self) {
        self.show_popup = false;
    }

    pub fn reset(&mut self) {
        self.selected_card = None;
        self.show_popup = false;
    }

    #[must_use]
    pub fn selected_card(&self) -> Option<&ProviderId> {
        self.selected_card.as_ref()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.show_popup
    }
}

//! Provider selection set.

use crate::provider::ProviderId;

/// Effect of a [`SelectionSet::toggle`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Selected,
    Deselected,
    /// The id is not an available provider; nothing changed.
    Ignored,
}

/// Selected providers, kept in the order the user picked them.
///
/// That order is also the dispatch order of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ordered: Vec<ProviderId>,
}

impl SelectionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` at the end if absent, remove it if present.
    ///
    /// Ids outside `available` are ignored.
    pub fn toggle(&mut self, id: &ProviderId, available: &[ProviderId]) -> Toggle {
        if !available.contains(id) {
            return Toggle::Ignored;
        }
        if let Some(pos) = self.ordered.iter().position(|p| p == id) {
            self.ordered.remove(pos);
            Toggle::Deselected
        } else {
            self.ordered.push(id.clone());
            Toggle::Selected
        }
    }

    #[must_use]
    pub fn contains(&self, id: &ProviderId) -> bool {
        self.ordered.contains(id)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[ProviderId] {
        &self.ordered
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn clear(&mut self) {
        self.ordered.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn available() -> Vec<ProviderId> {
        ["openai", "anthropic", "google"]
            .into_iter()
            .map(ProviderId::from)
            .collect()
    }

    #[test]
    fn toggle_preserves_pick_order() {
        let avail = available();
        let mut sel = SelectionSet::new();
        sel.toggle(&ProviderId::from("google"), &avail);
        sel.toggle(&ProviderId::from("openai"), &avail);
        assert_eq!(
            sel.as_slice(),
            &[ProviderId::from("google"), ProviderId::from("openai")]
        );
    }

    #[test]
    fn toggle_twice_is_identity() {
        let avail = available();
        let mut sel = SelectionSet::new();
        sel.toggle(&ProviderId::from("openai"), &avail);
        sel.toggle(&ProviderId::from("google"), &avail);
        let before = sel.clone();

        assert_eq!(sel.toggle(&ProviderId::from("anthropic"), &avail), Toggle::Selected);
        assert_eq!(sel.toggle(&ProviderId::from("anthropic"), &avail), Toggle::Deselected);
        assert_eq!(sel, before);
    }

    #[test]
    fn unknown_provider_ignored() {
        let avail = available();
        let mut sel = SelectionSet::new();
        assert_eq!(sel.toggle(&ProviderId::from("meta"), &avail), Toggle::Ignored);
        assert!(sel.is_empty());
    }

    #[test]
    fn clear_empties() {
        let avail = available();
        let mut sel = SelectionSet::new();
        sel.toggle(&ProviderId::from("openai"), &avail);
        sel.clear();
        assert_eq!(sel.len(), 0);
        assert!(!sel.contains(&ProviderId::from("openai")));
    }
}

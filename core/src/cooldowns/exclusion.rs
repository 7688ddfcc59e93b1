use std::collections::HashSet;
use std::sync::Arc;

use crate::events::{AbilityId, Event};

type Predicate = Arc<dyn Fn(&Event) -> bool + Send + Sync>;

/// Veto for events that must never be attributed to a cooldown window.
///
/// An event is excluded when its ability is listed, or when the optional
/// predicate returns true.
#[derive(Clone, Default)]
pub struct ExclusionRule {
    abilities: HashSet<AbilityId>,
    predicate: Option<Predicate>,
}

impl std::fmt::Debug for ExclusionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExclusionRule")
            .field("abilities", &self.abilities)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

impl ExclusionRule {
    /// Exclude nothing
    pub fn none() -> Self {
        Self::default()
    }

    pub fn abilities(ids: impl IntoIterator<Item = AbilityId>) -> Self {
        Self {
            abilities: ids.into_iter().collect(),
            predicate: None,
        }
    }

    pub fn with_predicate(
        mut self,
        predicate: impl Fn(&Event) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn excludes(&self, event: &Event) -> bool {
        event
            .ability_id
            .is_some_and(|id| self.abilities.contains(&id))
            || self.predicate.as_ref().is_some_and(|p| p(event))
    }
}

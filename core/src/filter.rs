//! Event filter predicates
//!
//! Scopes a subscription to exactly the events a module cares about. Every
//! criterion that is set must match (AND); unset criteria match anything.
//!
//! - relation: the event's flags share at least one bit with the mask
//! - abilities: the event's ability ID is in the whitelist
//! - kinds: the event's kind is one of the listed kinds
//! - source: the event's source actor is the given actor

use std::collections::HashSet;

use crate::events::{AbilityId, ActorId, Event, EventKind, RelationFlags};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    relation: Option<RelationFlags>,
    abilities: Option<HashSet<AbilityId>>,
    kinds: Option<Vec<EventKind>>,
    source: Option<ActorId>,
}

impl EventFilter {
    /// A filter that matches every event
    pub fn any() -> Self {
        Self::default()
    }

    /// Shorthand for `EventFilter::any().kind(kind)`
    pub fn of_kind(kind: EventKind) -> Self {
        Self::any().kind(kind)
    }

    /// Match events whose relation flags intersect `mask`.
    /// Repeated calls widen the mask.
    pub fn relation(mut self, mask: RelationFlags) -> Self {
        self.relation = Some(self.relation.unwrap_or_default() | mask);
        self
    }

    /// Events caused by the analyzed player or their pets
    pub fn by_player_or_pet(self) -> Self {
        self.relation(RelationFlags::BY_PLAYER | RelationFlags::BY_PLAYER_PET)
    }

    /// Restrict to a single ability
    pub fn ability(self, ability_id: AbilityId) -> Self {
        self.abilities([ability_id])
    }

    /// Restrict to a whitelist of abilities. Repeated calls extend the list.
    pub fn abilities(mut self, ids: impl IntoIterator<Item = AbilityId>) -> Self {
        self.abilities.get_or_insert_with(HashSet::new).extend(ids);
        self
    }

    /// Restrict to one event kind. Repeated calls accept any of the kinds.
    pub fn kind(mut self, kind: EventKind) -> Self {
        let kinds = self.kinds.get_or_insert_with(Vec::new);
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
        self
    }

    /// Restrict to events from one actor
    pub fn source(mut self, actor: ActorId) -> Self {
        self.source = Some(actor);
        self
    }

    pub fn matches(&self, event: &Event) -> bool {
        if let Some(mask) = self.relation
            && !mask.intersects(event.relation)
        {
            return false;
        }

        if let Some(abilities) = &self.abilities
            && !event.ability_id.is_some_and(|id| abilities.contains(&id))
        {
            return false;
        }

        if let Some(kinds) = &self.kinds
            && !kinds.contains(&event.kind)
        {
            return false;
        }

        if let Some(source) = self.source
            && event.source_id != source
        {
            return false;
        }

        true
    }
}

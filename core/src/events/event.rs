use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::EventError;

pub type ActorId = i64;
pub type AbilityId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Cast,
    Damage,
    Heal,
    Absorb,
    /// Resource gained
    Energize,
    BuffApply,
    BuffRemove,
    BuffStackChange,
    Death,
}

impl EventKind {
    /// Kinds that mutate combatant buff state
    pub fn is_buff(&self) -> bool {
        matches!(
            self,
            EventKind::BuffApply | EventKind::BuffRemove | EventKind::BuffStackChange
        )
    }
}

bitflags! {
    /// How an event's actors relate to the analyzed player.
    ///
    /// `BY_*` flags describe the source, `TO_*` flags the target. Filters match
    /// when their mask shares at least one bit with the event's flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct RelationFlags: u16 {
        const BY_PLAYER = 1 << 0;
        const BY_PLAYER_PET = 1 << 1;
        const BY_ALLY = 1 << 2;
        const BY_ENEMY = 1 << 3;
        const TO_PLAYER = 1 << 4;
        const TO_PLAYER_PET = 1 << 5;
        const TO_ALLY = 1 << 6;
        const TO_ENEMY = 1 << 7;
    }
}

/// One timestamped occurrence in the combat log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Milliseconds since log start
    pub timestamp: i64,
    pub kind: EventKind,
    pub source_id: ActorId,
    pub target_id: ActorId,
    /// Owner of the source actor, for pets and summons
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<ActorId>,
    #[serde(default)]
    pub relation: RelationFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ability_id: Option<AbilityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overheal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absorbed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_cost: Option<f64>,
    /// Stack count carried by buff events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacks: Option<u32>,
    /// Inserted by a normalizer rather than read from the log
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,
}

impl Event {
    pub fn new(timestamp: i64, kind: EventKind, source_id: ActorId, target_id: ActorId) -> Self {
        Self {
            timestamp,
            kind,
            source_id,
            target_id,
            owner_id: None,
            relation: RelationFlags::empty(),
            ability_id: None,
            amount: None,
            overheal: None,
            absorbed: None,
            resource_cost: None,
            stacks: None,
            synthetic: false,
        }
    }

    pub fn cast(timestamp: i64, source_id: ActorId, ability_id: AbilityId) -> Self {
        Self::new(timestamp, EventKind::Cast, source_id, source_id).with_ability(ability_id)
    }

    pub fn damage(
        timestamp: i64,
        source_id: ActorId,
        target_id: ActorId,
        ability_id: AbilityId,
        amount: f64,
    ) -> Self {
        Self::new(timestamp, EventKind::Damage, source_id, target_id)
            .with_ability(ability_id)
            .with_amount(amount)
    }

    pub fn heal(
        timestamp: i64,
        source_id: ActorId,
        target_id: ActorId,
        ability_id: AbilityId,
        amount: f64,
    ) -> Self {
        Self::new(timestamp, EventKind::Heal, source_id, target_id)
            .with_ability(ability_id)
            .with_amount(amount)
    }

    /// Buff applied to `target_id` by itself
    pub fn buff_apply(timestamp: i64, target_id: ActorId, ability_id: AbilityId) -> Self {
        Self::new(timestamp, EventKind::BuffApply, target_id, target_id).with_ability(ability_id)
    }

    pub fn buff_remove(timestamp: i64, target_id: ActorId, ability_id: AbilityId) -> Self {
        Self::new(timestamp, EventKind::BuffRemove, target_id, target_id).with_ability(ability_id)
    }

    pub fn buff_stacks(
        timestamp: i64,
        target_id: ActorId,
        ability_id: AbilityId,
        stacks: u32,
    ) -> Self {
        Self::new(timestamp, EventKind::BuffStackChange, target_id, target_id)
            .with_ability(ability_id)
            .with_stacks(stacks)
    }

    pub fn with_ability(mut self, ability_id: AbilityId) -> Self {
        self.ability_id = Some(ability_id);
        self
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_overheal(mut self, overheal: f64) -> Self {
        self.overheal = Some(overheal);
        self
    }

    pub fn with_absorbed(mut self, absorbed: f64) -> Self {
        self.absorbed = Some(absorbed);
        self
    }

    pub fn with_resource_cost(mut self, cost: f64) -> Self {
        self.resource_cost = Some(cost);
        self
    }

    pub fn with_stacks(mut self, stacks: u32) -> Self {
        self.stacks = Some(stacks);
        self
    }

    pub fn with_relation(mut self, relation: RelationFlags) -> Self {
        self.relation = relation;
        self
    }

    pub fn with_owner(mut self, owner_id: ActorId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    /// Stack count this buff event leaves behind
    pub fn resulting_stacks(&self) -> u32 {
        match self.kind {
            EventKind::BuffApply => self.stacks.unwrap_or(1).max(1),
            EventKind::BuffStackChange => self.stacks.unwrap_or(0),
            _ => 0,
        }
    }

    /// Check that the event carries every field its kind needs.
    pub fn validate(&self) -> Result<(), EventError> {
        if self.timestamp < 0 {
            return Err(EventError::NegativeTimestamp {
                timestamp: self.timestamp,
            });
        }

        let missing = |field| EventError::MissingField {
            timestamp: self.timestamp,
            kind: self.kind,
            field,
        };

        match self.kind {
            EventKind::Cast | EventKind::BuffApply | EventKind::BuffRemove => {
                self.ability_id.ok_or_else(|| missing("ability_id"))?;
            }
            EventKind::BuffStackChange => {
                self.ability_id.ok_or_else(|| missing("ability_id"))?;
                self.stacks.ok_or_else(|| missing("stacks"))?;
            }
            EventKind::Damage | EventKind::Heal | EventKind::Absorb | EventKind::Energize => {
                self.amount.ok_or_else(|| missing("amount"))?;
            }
            EventKind::Death => {}
        }

        let numeric = [
            ("amount", self.amount),
            ("overheal", self.overheal),
            ("absorbed", self.absorbed),
            ("resource_cost", self.resource_cost),
        ];
        if let Some((field, _)) = numeric
            .iter()
            .find(|(_, value)| value.is_some_and(|v| !v.is_finite()))
        {
            return Err(EventError::NonFinite {
                timestamp: self.timestamp,
                kind: self.kind,
                field: *field,
            });
        }

        Ok(())
    }
}

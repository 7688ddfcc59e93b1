use crate::events::{Event, EventKind};

use super::{NormalizeError, Normalizer};

/// Moves each cast ahead of earlier same-timestamp events of the same
/// ability and source.
///
/// Logs sometimes record the damage of an instant ability before its cast.
/// Cooldown windows open on the cast, so the damage would otherwise miss the
/// window it belongs to. Order is otherwise preserved.
#[derive(Debug, Clone, Copy, Default)]
pub struct CastOrder;

impl CastOrder {
    pub const NAME: &'static str = "cast_order";
}

impl Normalizer for CastOrder {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn normalize(&self, events: Vec<Event>) -> Result<Vec<Event>, NormalizeError> {
        let mut out: Vec<Event> = Vec::with_capacity(events.len());
        // Start of the current same-timestamp run in `out`
        let mut group_start = 0;

        for event in events {
            if out.last().is_some_and(|last| last.timestamp != event.timestamp) {
                group_start = out.len();
            }

            if event.kind == EventKind::Cast
                && let Some(position) = out[group_start..].iter().position(|e| {
                    e.kind != EventKind::Cast
                        && e.ability_id == event.ability_id
                        && e.source_id == event.source_id
                })
            {
                out.insert(group_start + position, event);
            } else {
                out.push(event);
            }
        }

        Ok(out)
    }
}

use std::collections::HashMap;

use crate::consumable::Consumable;
use crate::ids::ModelId;
use crate::reference::ConsumableModel;

/// Read-only selection of consumables that need attention.
///
/// Always evaluated against the data passed in; nothing is cached.
pub struct AttentionQuery;

impl AttentionQuery {
    pub fn needs_attention(consumable: &Consumable, model: &ConsumableModel) -> bool {
        consumable.needs_attention(model)
    }

    /// Keep the consumables needing attention, preserving input order.
    /// Consumables whose model is unknown are skipped.
    pub fn select(
        consumables: impl IntoIterator<Item = Consumable>,
        models: &HashMap<ModelId, ConsumableModel>,
        limit: Option<usize>,
    ) -> Vec<Consumable> {
        consumables
            .into_iter()
            .filter(|c| {
                models
                    .get(&c.model)
                    .is_some_and(|m| Self::needs_attention(c, m))
            })
            .take(limit.unwrap_or(usize::MAX))
            .collect()
    }
}

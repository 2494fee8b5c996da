//! Aggregate views over consumables and the ledger.
//!
//! All functions are pure over the slices they are given; callers load
//! fresh data for every report.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::consumable::{Condition, Consumable, ConsumableKind, ConsumableStatus};
use crate::ids::{ConsumableId, ModelId};
use crate::operation::{Operation, OperationType};
use crate::reference::{ConsumableModel, Location};

pub const DEFAULT_REFILL_WINDOW_DAYS: i64 = 30;
pub const MAX_REFILL_WINDOW_DAYS: i64 = 36_500;
pub const TOP_REFILLED_LIMIT: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_consumables: usize,
    pub total_cartridges: usize,
    pub total_drums: usize,
    pub cartridges_in_stock: usize,
    pub drums_in_stock: usize,
    pub cartridges_installed: usize,
    pub drums_installed: usize,
    pub at_service: usize,
    pub needs_repair: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: ConsumableStatus,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelStats {
    pub model: ModelId,
    pub name: String,
    pub total: usize,
    pub in_stock: usize,
    pub installed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelCount {
    pub model: ModelId,
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationStock {
    pub location: Location,
    pub total_in_stock: usize,
    pub by_model: Vec<ModelCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelRefills {
    pub model_name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefillReport {
    pub since: DateTime<Utc>,
    pub recent_refills: Vec<ModelRefills>,
    pub top_refilled: Vec<Consumable>,
}

pub struct Reports;

impl Reports {
    pub fn dashboard(consumables: &[Consumable]) -> DashboardStats {
        let mut stats = DashboardStats::default();
        for c in consumables {
            stats.total_consumables += 1;
            let (total, in_stock, installed) = match c.kind {
                ConsumableKind::Cartridge => (
                    &mut stats.total_cartridges,
                    &mut stats.cartridges_in_stock,
                    &mut stats.cartridges_installed,
                ),
                ConsumableKind::Drum => (
                    &mut stats.total_drums,
                    &mut stats.drums_in_stock,
                    &mut stats.drums_installed,
                ),
            };
            *total += 1;
            match c.status {
                ConsumableStatus::InStock => *in_stock += 1,
                ConsumableStatus::Installed => *installed += 1,
                ConsumableStatus::AtService => stats.at_service += 1,
                _ => {}
            }
            if c.condition == Condition::NeedsRepair {
                stats.needs_repair += 1;
            }
        }
        stats
    }

    /// Count per status, only statuses that occur, in declaration order.
    pub fn status_breakdown(consumables: &[Consumable]) -> Vec<StatusCount> {
        ConsumableStatus::ALL
            .into_iter()
            .map(|status| StatusCount {
                status,
                count: consumables.iter().filter(|c| c.status == status).count(),
            })
            .filter(|s| s.count > 0)
            .collect()
    }

    pub fn model_stats(consumables: &[Consumable], models: &[ConsumableModel]) -> Vec<ModelStats> {
        models
            .iter()
            .map(|m| {
                let of_model = consumables.iter().filter(|c| c.model == m.id);
                let mut stats = ModelStats {
                    model: m.id,
                    name: m.to_string(),
                    total: 0,
                    in_stock: 0,
                    installed: 0,
                };
                for c in of_model {
                    stats.total += 1;
                    match c.status {
                        ConsumableStatus::InStock => stats.in_stock += 1,
                        ConsumableStatus::Installed => stats.installed += 1,
                        _ => {}
                    }
                }
                stats
            })
            .collect()
    }

    /// In-stock counts for every active location, broken down by model.
    /// Models with nothing in stock at a location are omitted.
    pub fn stock_by_location(
        consumables: &[Consumable],
        locations: &[Location],
        models: &[ConsumableModel],
    ) -> Vec<LocationStock> {
        locations
            .iter()
            .filter(|l| l.is_active)
            .map(|location| {
                let in_stock: Vec<_> = consumables
                    .iter()
                    .filter(|c| {
                        c.current_location == location.id && c.status == ConsumableStatus::InStock
                    })
                    .collect();
                let by_model = models
                    .iter()
                    .map(|m| ModelCount {
                        model: m.id,
                        name: m.to_string(),
                        count: in_stock.iter().filter(|c| c.model == m.id).count(),
                    })
                    .filter(|mc| mc.count > 0)
                    .collect();
                LocationStock {
                    location: location.clone(),
                    total_in_stock: in_stock.len(),
                    by_model,
                }
            })
            .collect()
    }

    /// Refills received in the last `days` days grouped by model name, and
    /// the most refilled consumables overall. A window reaching past the
    /// representable range counts every refill.
    pub fn refill_report(
        operations: &[Operation],
        consumables: &[Consumable],
        models: &[ConsumableModel],
        now: DateTime<Utc>,
        days: i64,
    ) -> RefillReport {
        let since = Duration::try_days(days)
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let model_of: HashMap<ConsumableId, ModelId> =
            consumables.iter().map(|c| (c.id, c.model)).collect();
        let model_names: HashMap<ModelId, &str> =
            models.iter().map(|m| (m.id, m.name.as_str())).collect();

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for op in operations.iter().filter(|op| {
            op.operation_type == OperationType::ReceiveService && op.timestamp >= since
        }) {
            let name = model_of
                .get(&op.consumable)
                .and_then(|m| model_names.get(m))
                .copied()
                .unwrap_or("unknown");
            *counts.entry(name).or_default() += 1;
        }

        let mut recent_refills: Vec<_> = counts
            .into_iter()
            .map(|(name, count)| ModelRefills {
                model_name: name.to_string(),
                count,
            })
            .collect();
        recent_refills.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.model_name.cmp(&b.model_name))
        });

        let mut top_refilled: Vec<_> = consumables
            .iter()
            .filter(|c| c.refill_count > 0)
            .cloned()
            .collect();
        top_refilled.sort_by(|a, b| b.refill_count.cmp(&a.refill_count));
        top_refilled.truncate(TOP_REFILLED_LIMIT);

        RefillReport {
            since,
            recent_refills,
            top_refilled,
        }
    }

    /// Consumables that reached their model's refill ceiling.
    pub fn over_refilled(
        consumables: &[Consumable],
        models: &HashMap<ModelId, ConsumableModel>,
    ) -> Vec<Consumable> {
        consumables
            .iter()
            .filter(|c| {
                models
                    .get(&c.model)
                    .is_some_and(|m| c.refill_count >= m.max_refills)
            })
            .cloned()
            .collect()
    }
}

use crate::model::{FairnessCounters, MemberId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Seuil au-delà duquel un candidat est jugé trop chargé.
///
/// Le même seuil s'applique aux gardes et aux week-ends. Avec `Minimum`, seul
/// le membre le moins chargé passe la passe stricte : le contrôle des week-ends
/// tranche rarement et la passe de repli les répartit au seul compte des gardes.
/// `AveragePlusOne` laisse plusieurs candidats au contrôle des week-ends et les
/// équilibre mieux, au prix d'un écart de gardes un peu plus large.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FairnessThreshold {
    #[default]
    Minimum,
    MinimumPlusOne,
    AveragePlusOne,
    Maximum,
}

impl FairnessThreshold {
    pub fn limit(&self, counts: &BTreeMap<MemberId, u32>) -> u32 {
        match self {
            FairnessThreshold::Minimum => min(counts),
            FairnessThreshold::MinimumPlusOne => min(counts) + 1,
            FairnessThreshold::AveragePlusOne => average(counts) + 1,
            FairnessThreshold::Maximum => counts.values().copied().max().unwrap_or(0),
        }
    }

    pub fn is_over(&self, count: u32, counts: &BTreeMap<MemberId, u32>) -> bool {
        count > self.limit(counts)
    }
}

/// Minimum des compteurs (0 sur une table vide).
pub fn min(counts: &BTreeMap<MemberId, u32>) -> u32 {
    counts.values().copied().min().unwrap_or(0)
}

fn average(counts: &BTreeMap<MemberId, u32>) -> u32 {
    if counts.is_empty() {
        return 0;
    }
    counts.values().sum::<u32>() / counts.len() as u32
}

/// Compteurs de gardes d'un rôle, possédés par le moteur.
#[derive(Debug, Clone, Default)]
pub struct FairnessTracker {
    counters: FairnessCounters,
}

impl FairnessTracker {
    pub fn new<I: IntoIterator<Item = MemberId>>(members: I) -> Self {
        let mut counters = FairnessCounters::default();
        for id in members {
            counters.shift_count.insert(id.clone(), 0);
            counters.weekend_shift_count.insert(id, 0);
        }
        Self { counters }
    }

    pub fn increment(&mut self, id: &MemberId, weekend: bool) {
        *self.counters.shift_count.entry(id.clone()).or_insert(0) += 1;
        let weekends = self
            .counters
            .weekend_shift_count
            .entry(id.clone())
            .or_insert(0);
        if weekend {
            *weekends += 1;
        }
    }

    pub fn shift_count(&self, id: &MemberId) -> u32 {
        self.counters.shift_count.get(id).copied().unwrap_or(0)
    }

    pub fn weekend_count(&self, id: &MemberId) -> u32 {
        self.counters.weekend_shift_count.get(id).copied().unwrap_or(0)
    }

    pub fn shift_counts(&self) -> &BTreeMap<MemberId, u32> {
        &self.counters.shift_count
    }

    pub fn weekend_counts(&self) -> &BTreeMap<MemberId, u32> {
        &self.counters.weekend_shift_count
    }

    pub fn snapshot(&self) -> FairnessCounters {
        self.counters.clone()
    }
}

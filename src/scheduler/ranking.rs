use super::fairness::FairnessTracker;
use crate::model::Member;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

/// Stratégie d'ordonnancement des candidats pour un jour donné.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RankStrategy {
    /// `K / (M - indisponibilités)` : les membres les moins disponibles d'abord.
    AvailabilityWeighted,
    /// Disponibilité pondérée moins une pénalité par garde déjà tenue (plancher 1).
    #[default]
    AvailabilityAndLoad,
    /// Le moins de gardes d'abord.
    LoadOnly,
    /// Comme `AvailabilityWeighted` mais sur les indisponibilités à venir.
    RemainingAvailability,
    /// Nombre brut d'indisponibilités.
    Simple,
}

impl RankStrategy {
    pub const ALL: [RankStrategy; 5] = [
        RankStrategy::AvailabilityWeighted,
        RankStrategy::AvailabilityAndLoad,
        RankStrategy::LoadOnly,
        RankStrategy::RemainingAvailability,
        RankStrategy::Simple,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RankStrategy::AvailabilityWeighted => "availability-weighted",
            RankStrategy::AvailabilityAndLoad => "availability-and-load",
            RankStrategy::LoadOnly => "load-only",
            RankStrategy::RemainingAvailability => "remaining-availability",
            RankStrategy::Simple => "simple",
        }
    }
}

impl fmt::Display for RankStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RankStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RankStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| format!("unknown strategy: {s}"))
    }
}

/// Constantes de pondération (K, M, pénalité de charge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    pub numerator: i64,
    pub ceiling: i64,
    pub load_penalty: i64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            numerator: 400,
            ceiling: 40,
            load_penalty: 10,
        }
    }
}

impl RankingWeights {
    fn weighted(&self, unavailable: usize) -> i64 {
        let unavailable = i64::try_from(unavailable).unwrap_or(i64::MAX);
        let denominator = self.ceiling.saturating_sub(unavailable).max(1);
        self.numerator / denominator
    }
}

/// Priorité d'un membre ; plus grand = servi plus tôt.
pub fn priority(
    member: &Member,
    counters: &FairnessTracker,
    date: NaiveDate,
    strategy: RankStrategy,
    weights: &RankingWeights,
) -> i64 {
    let shifts = i64::from(counters.shift_count(&member.id));
    match strategy {
        RankStrategy::AvailabilityWeighted => weights.weighted(member.unavailable.len()),
        RankStrategy::AvailabilityAndLoad => {
            (weights.weighted(member.unavailable.len()) - weights.load_penalty * shifts).max(1)
        }
        RankStrategy::LoadOnly => -shifts,
        RankStrategy::RemainingAvailability => {
            weights.weighted(member.unavailable.range(date..).count())
        }
        RankStrategy::Simple => i64::try_from(member.unavailable.len()).unwrap_or(i64::MAX),
    }
}

/// Ordre total des membres, priorité décroissante, égalités dans l'ordre d'entrée.
pub fn rank<'a>(
    members: &'a [Member],
    counters: &FairnessTracker,
    date: NaiveDate,
    strategy: RankStrategy,
    weights: &RankingWeights,
) -> Vec<&'a Member> {
    let mut ranked: Vec<(i64, &Member)> = members
        .iter()
        .map(|m| (priority(m, counters, date, strategy, weights), m))
        .collect();
    // tri stable
    ranked.sort_by_key(|(p, _)| Reverse(*p));
    ranked.into_iter().map(|(_, m)| m).collect()
}

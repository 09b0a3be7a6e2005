use super::fairness::FairnessThreshold;
use super::ranking::{RankStrategy, RankingWeights};
use crate::directory::ResolveError;
use crate::model::{AssignedIdentity, MemberId, Role};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Options du moteur d'affectation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Stratégie de la passe stricte.
    pub strategy: RankStrategy,
    /// Stratégie de la passe de repli.
    pub fallback_strategy: RankStrategy,
    pub weights: RankingWeights,
    pub fairness: FairnessThreshold,
    /// Membres exclus du rôle secondaire, en plus du drapeau `newcomer`.
    pub newcomers: BTreeSet<MemberId>,
    /// Heure de relève (UTC) utilisée pour les exports horodatés.
    pub handoff: NaiveTime,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            strategy: RankStrategy::AvailabilityAndLoad,
            fallback_strategy: RankStrategy::LoadOnly,
            weights: RankingWeights::default(),
            fairness: FairnessThreshold::Minimum,
            newcomers: BTreeSet::new(),
            handoff: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl EngineOptions {
    pub fn validate(&self) -> Result<(), SchedError> {
        if self.weights.numerator <= 0 {
            return Err(SchedError::InvalidOptions("weights.numerator must be > 0"));
        }
        if self.weights.ceiling <= 0 {
            return Err(SchedError::InvalidOptions("weights.ceiling must be > 0"));
        }
        if self.weights.load_penalty < 0 {
            return Err(SchedError::InvalidOptions("weights.load_penalty must be >= 0"));
        }
        Ok(())
    }
}

/// Dernières identités affectées avant la fenêtre (reprise d'une rotation).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastAssigned {
    #[serde(default)]
    pub primary: Option<AssignedIdentity>,
    #[serde(default)]
    pub secondary: Option<AssignedIdentity>,
}

impl LastAssigned {
    pub fn for_role(&self, role: Role) -> Option<&AssignedIdentity> {
        match role {
            Role::Primary => self.primary.as_ref(),
            Role::Secondary => self.secondary.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    Unavailable,
    NewcomerAsSecondary,
    DoubleAssignment,
    ConsecutiveRepeat,
    Uncovered,
}

#[derive(Debug, Clone)]
pub struct Conflict {
    pub date: NaiveDate,
    pub role: Option<Role>,
    pub member: Option<MemberId>,
    pub kind: ConflictKind,
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("invalid window: end {end} is before start {start}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },
    #[error("duplicate member id: {0}")]
    DuplicateMember(String),
    #[error("roster has no members")]
    EmptyRoster,
    #[error("invalid options: {0}")]
    InvalidOptions(&'static str),
    #[error("unresolvable identity: {0}")]
    UnresolvableIdentity(#[from] ResolveError),
    #[error("no eligible candidate for {role} on {date}")]
    NoEligibleCandidate { date: NaiveDate, role: Role },
    #[error("same identity for primary and secondary on {date}")]
    DuplicateAssignment { date: NaiveDate },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SchedError {
    /// Date fautive pour les erreurs fatales du moteur.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            SchedError::NoEligibleCandidate { date, .. }
            | SchedError::DuplicateAssignment { date } => Some(*date),
            _ => None,
        }
    }
}

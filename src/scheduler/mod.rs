mod assignment;
mod conflicts;
pub mod fairness;
pub mod ranking;
pub mod selector;
mod types;
mod util;
pub mod window;

pub use conflicts::detect_conflicts;
pub use fairness::{FairnessThreshold, FairnessTracker};
pub use ranking::{rank, RankStrategy, RankingWeights};
pub use selector::RotatingSelector;
pub use types::{Conflict, ConflictKind, EngineOptions, LastAssigned, SchedError};
pub use window::{BlockSpan, RosterWindow};

use crate::directory::IdentityResolver;
use crate::model::{MemberId, Role, RosterInput, RosterPlan, ShiftBlock};
use std::collections::BTreeSet;

/// Moteur d'affectation : possède les compteurs et les pistes en construction.
pub struct AssignmentEngine<'r> {
    input: RosterInput,
    options: EngineOptions,
    resolver: &'r dyn IdentityResolver,
    history: LastAssigned,
    primary: FairnessTracker,
    secondary: FairnessTracker,
    primary_blocks: Vec<ShiftBlock>,
    secondary_blocks: Vec<ShiftBlock>,
}

impl<'r> AssignmentEngine<'r> {
    /// Valide l'entrée et prépare un moteur avec les options par défaut.
    pub fn new(input: RosterInput, resolver: &'r dyn IdentityResolver) -> Result<Self, SchedError> {
        if input.window.end < input.window.start {
            return Err(SchedError::InvalidWindow {
                start: input.window.start,
                end: input.window.end,
            });
        }
        if input.members.is_empty() {
            return Err(SchedError::EmptyRoster);
        }
        input.check_unique_ids().map_err(SchedError::DuplicateMember)?;

        Ok(Self {
            input,
            options: EngineOptions::default(),
            resolver,
            history: LastAssigned::default(),
            primary: FairnessTracker::default(),
            secondary: FairnessTracker::default(),
            primary_blocks: Vec::new(),
            secondary_blocks: Vec::new(),
        })
    }

    pub fn with_options(mut self, options: EngineOptions) -> Result<Self, SchedError> {
        options.validate()?;
        self.options = options;
        Ok(self)
    }

    /// Ajoute des nouveaux arrivants, jamais affectés en secondaire.
    pub fn with_newcomers<I: IntoIterator<Item = MemberId>>(mut self, ids: I) -> Self {
        self.options.newcomers.extend(ids);
        self
    }

    /// Amorce l'anti-répétition avec la fin d'une rotation précédente.
    pub fn with_history(mut self, history: LastAssigned) -> Self {
        self.history = history;
        self
    }

    pub fn input(&self) -> &RosterInput {
        &self.input
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Identifiants exclus du rôle secondaire.
    pub fn newcomers(&self) -> BTreeSet<MemberId> {
        self.input
            .members
            .iter()
            .filter(|m| m.newcomer || self.options.newcomers.contains(&m.id))
            .map(|m| m.id.clone())
            .collect()
    }

    pub fn tracker(&self, role: Role) -> &FairnessTracker {
        match role {
            Role::Primary => &self.primary,
            Role::Secondary => &self.secondary,
        }
    }

    /// Blocs déjà validés ; après un échec, à usage de diagnostic seulement.
    pub fn partial(&self, role: Role) -> &[ShiftBlock] {
        match role {
            Role::Primary => &self.primary_blocks,
            Role::Secondary => &self.secondary_blocks,
        }
    }

    /// Construit le planning complet ; tout ou rien.
    pub fn run(&mut self) -> Result<RosterPlan, SchedError> {
        assignment::run(self)
    }
}

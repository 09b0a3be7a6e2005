#![forbid(unsafe_code)]
//! Garde : génération de gardes primaire/secondaire à partir d'un sondage de disponibilités.
//!
//! - Un bloc par jour ; samedi + dimanche forment un seul bloc.
//! - Classement des candidats par stratégie, sélection circulaire avec exclusions.
//! - Équilibrage par compteurs de gardes, passe stricte puis passe de repli.
//! - Aucune E/S dans le moteur ; import/export et rendu en dehors.

pub mod config;
pub mod directory;
pub mod display;
pub mod io;
pub mod model;
pub mod scheduler;
pub mod storage;

pub use config::load_options_from_file;
pub use directory::{Directory, IdentityResolver, ResolveError, SelfIdentity};
pub use display::{MonthCalendar, PlanRenderer, TextSummary};
pub use model::{
    AssignedIdentity, FairnessCounters, FairnessReport, Member, MemberId, Role, RosterInput,
    RosterPlan, ShiftBlock, UnavailabilityStats, Window,
};
pub use scheduler::{
    detect_conflicts, AssignmentEngine, Conflict, ConflictKind, EngineOptions, FairnessThreshold,
    LastAssigned, RankStrategy, RankingWeights, SchedError,
};
pub use storage::{JsonStorage, Storage};

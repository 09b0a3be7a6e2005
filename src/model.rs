use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identifiant fort pour Member (adresse e-mail du sondage en pratique)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Membre de l'équipe d'astreinte
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub unavailable: BTreeSet<NaiveDate>,
    #[serde(default)]
    pub newcomer: bool,
}

impl Member {
    pub fn new<S: AsRef<str>>(id: S) -> Self {
        Self {
            id: MemberId::new(id),
            unavailable: BTreeSet::new(),
            newcomer: false,
        }
    }

    pub fn with_unavailable<I: IntoIterator<Item = NaiveDate>>(mut self, dates: I) -> Self {
        self.unavailable.extend(dates);
        self
    }

    pub fn as_newcomer(mut self) -> Self {
        self.newcomer = true;
        self
    }

    pub fn is_available(&self, date: NaiveDate) -> bool {
        !self.unavailable.contains(&date)
    }
}

/// Fenêtre de planification, bornes incluses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, String> {
        if end < start {
            return Err("window end must not be before start".to_string());
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Nombre de jours couverts.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }
}

/// Entrée du moteur : fenêtre + membres (ordre significatif).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterInput {
    pub window: Window,
    pub members: Vec<Member>,
}

impl RosterInput {
    /// Crée une entrée en validant l'unicité des identifiants.
    pub fn new(window: Window, members: Vec<Member>) -> Result<Self, String> {
        let input = Self { window, members };
        input.check_unique_ids()?;
        Ok(input)
    }

    pub(crate) fn check_unique_ids(&self) -> Result<(), String> {
        let mut seen = BTreeSet::new();
        for m in &self.members {
            if !seen.insert(&m.id) {
                return Err(m.id.as_str().to_string());
            }
        }
        Ok(())
    }

    pub fn find_member<'a>(&'a self, id: &MemberId) -> Option<&'a Member> {
        self.members.iter().find(|m| &m.id == id)
    }

    /// Décompte des indisponibilités en semaine / le week-end, par membre.
    pub fn unavailability_stats(&self) -> UnavailabilityStats {
        let mut stats = UnavailabilityStats::default();
        for m in &self.members {
            let weekend = m.unavailable.iter().filter(|d| is_weekend_day(**d)).count() as u32;
            let total = m.unavailable.len() as u32;
            stats.weekdays.insert(m.id.clone(), total - weekend);
            stats.weekends.insert(m.id.clone(), weekend);
        }
        stats
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailabilityStats {
    pub weekdays: BTreeMap<MemberId, u32>,
    pub weekends: BTreeMap<MemberId, u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Primary,
    Secondary,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Primary => f.write_str("primary"),
            Role::Secondary => f.write_str("secondary"),
        }
    }
}

/// Identité externe d'un membre (format utilisateur PagerDuty).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignedIdentity {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
}

impl fmt::Display for AssignedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            f.write_str(&self.email)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// Bloc de garde : [start, end) pour un rôle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftBlock {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub role: Role,
    pub member: MemberId,
    pub identity: AssignedIdentity,
}

impl ShiftBlock {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d < self.end)
    }

    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Jours où le membre doit être disponible (dimanche compris pour un samedi).
    pub fn required_days(&self) -> impl Iterator<Item = NaiveDate> {
        required_days(self.start, self.end)
    }

    /// Un bloc de week-end commence un samedi.
    pub fn is_weekend(&self) -> bool {
        self.start.weekday() == Weekday::Sat
    }
}

/// Compteurs d'équité pour un rôle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FairnessCounters {
    pub shift_count: BTreeMap<MemberId, u32>,
    pub weekend_shift_count: BTreeMap<MemberId, u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FairnessReport {
    pub primary: FairnessCounters,
    pub secondary: FairnessCounters,
}

impl FairnessReport {
    pub fn for_role(&self, role: Role) -> &FairnessCounters {
        match role {
            Role::Primary => &self.primary,
            Role::Secondary => &self.secondary,
        }
    }
}

/// Affectation d'un jour calendaire (vue dépliée des blocs).
#[derive(Debug, Clone, Copy)]
pub struct DailyAssignment<'a> {
    pub date: NaiveDate,
    pub primary: &'a ShiftBlock,
    pub secondary: &'a ShiftBlock,
}

/// Planning complet produit par le moteur
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterPlan {
    pub window: Window,
    pub primary: Vec<ShiftBlock>,
    pub secondary: Vec<ShiftBlock>,
    #[serde(default)]
    pub fairness: FairnessReport,
}

impl RosterPlan {
    pub fn track(&self, role: Role) -> &[ShiftBlock] {
        match role {
            Role::Primary => &self.primary,
            Role::Secondary => &self.secondary,
        }
    }

    pub fn block_at(&self, role: Role, date: NaiveDate) -> Option<&ShiftBlock> {
        self.track(role).iter().find(|b| b.covers(date))
    }

    /// Déplie les blocs jour par jour ; les jours sans couverture complète sont ignorés.
    pub fn daily(&self) -> Vec<DailyAssignment<'_>> {
        self.window
            .days()
            .filter_map(|date| {
                Some(DailyAssignment {
                    date,
                    primary: self.block_at(Role::Primary, date)?,
                    secondary: self.block_at(Role::Secondary, date)?,
                })
            })
            .collect()
    }
}

pub(crate) fn is_weekend_day(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Jours de [start, end), plus le dimanche d'un samedi même s'il sort de la fenêtre.
pub(crate) fn required_days(
    start: NaiveDate,
    end: NaiveDate,
) -> impl Iterator<Item = NaiveDate> {
    let sunday = next_day(start);
    let extra = (start.weekday() == Weekday::Sat && end <= sunday).then_some(sunday);
    start.iter_days().take_while(move |d| *d < end).chain(extra)
}

pub(crate) fn next_day(date: NaiveDate) -> NaiveDate {
    date + Duration::days(1)
}

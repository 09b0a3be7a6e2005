use crate::model::{next_day, required_days, Window};
use chrono::{Datelike, NaiveDate, Weekday};

/// Intervalle [start, end) couvert par une seule sélection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl BlockSpan {
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d < end)
    }

    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Jours contrôlés pour la disponibilité ; un samedi seul engage aussi le dimanche.
    pub fn required_days(&self) -> impl Iterator<Item = NaiveDate> {
        required_days(self.start, self.end)
    }

    /// Seul un bloc qui commence un samedi compte comme week-end.
    pub fn is_weekend(&self) -> bool {
        self.start.weekday() == Weekday::Sat
    }
}

/// Parcourt la fenêtre jour par jour ; samedi + dimanche forment un seul bloc.
#[derive(Debug, Clone)]
pub struct RosterWindow {
    window: Window,
    cursor: Option<NaiveDate>,
}

impl RosterWindow {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            cursor: Some(window.start),
        }
    }
}

impl Iterator for RosterWindow {
    type Item = BlockSpan;

    fn next(&mut self) -> Option<BlockSpan> {
        let start = self.cursor.filter(|d| *d <= self.window.end)?;
        let following = next_day(start);
        let end = if start.weekday() == Weekday::Sat && self.window.contains(following) {
            next_day(following)
        } else {
            following
        };
        self.cursor = Some(end);
        Some(BlockSpan { start, end })
    }
}

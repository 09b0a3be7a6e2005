use crate::model::{AssignedIdentity, Role, RosterPlan};
use chrono::{Datelike, Months, NaiveDate};
use std::collections::BTreeSet;

const NAME_WIDTH: usize = 10;
const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Permet de customiser le rendu texte d'un planning.
pub trait PlanRenderer {
    fn render(&self, plan: &RosterPlan) -> String;
}

/// Une ligne par jour (`primaire | secondaire`), puis les compteurs par membre.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextSummary;

impl PlanRenderer for TextSummary {
    fn render(&self, plan: &RosterPlan) -> String {
        let mut out = String::new();
        for day in plan.daily() {
            let weekday = day.date.format("%A").to_string();
            out.push_str(&format!(
                "- {weekday:<10} {date}: {primary} | {secondary}\n",
                date = day.date,
                primary = day.primary.identity,
                secondary = day.secondary.identity,
            ));
        }

        let primary = &plan.fairness.primary.shift_count;
        let secondary = &plan.fairness.secondary.shift_count;
        let ids: BTreeSet<_> = primary.keys().chain(secondary.keys()).collect();
        for id in ids {
            out.push_str(&format!(
                "* {id}: {} | {}\n",
                primary.get(id).copied().unwrap_or(0),
                secondary.get(id).copied().unwrap_or(0),
            ));
        }
        out
    }
}

/// Grille mensuelle pour un rôle, prénom tronqué à 10 caractères.
#[derive(Debug, Clone, Copy)]
pub struct MonthCalendar {
    pub role: Role,
}

impl MonthCalendar {
    pub fn new(role: Role) -> Self {
        Self { role }
    }

    fn render_month(&self, out: &mut String, plan: &RosterPlan, first: NaiveDate) {
        out.push_str(&format!("{} {}\n", first.format("%B"), first.year()));
        let header: Vec<String> = WEEKDAYS
            .iter()
            .map(|d| format!("{d:<width$}", width = NAME_WIDTH + 3))
            .collect();
        out.push_str(header.join(" ").trim_end());
        out.push('\n');

        let offset = first.weekday().num_days_from_monday() as usize;
        let mut cells = vec![" ".repeat(NAME_WIDTH + 3); offset];
        for date in first.iter_days().take_while(|d| d.month() == first.month()) {
            let name = plan
                .block_at(self.role, date)
                .map(|b| first_name(&b.identity))
                .unwrap_or_default();
            cells.push(format!("{:>2} {name:<width$}", date.day(), width = NAME_WIDTH));
        }

        for week in cells.chunks(7) {
            out.push_str(week.join(" ").trim_end());
            out.push('\n');
        }
        out.push('\n');
    }
}

impl PlanRenderer for MonthCalendar {
    fn render(&self, plan: &RosterPlan) -> String {
        let mut out = String::new();
        let mut month = plan.window.start.with_day(1);
        while let Some(first) = month.filter(|m| *m <= plan.window.end) {
            self.render_month(&mut out, plan, first);
            month = first.checked_add_months(Months::new(1));
        }
        out
    }
}

fn first_name(identity: &AssignedIdentity) -> String {
    let raw = if identity.name.is_empty() {
        identity.email.as_str()
    } else {
        identity.name.as_str()
    };
    raw.split([' ', '.', '@'])
        .next()
        .unwrap_or(raw)
        .chars()
        .take(NAME_WIDTH)
        .collect()
}

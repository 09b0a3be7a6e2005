use super::{util, Conflict, ConflictKind};
use crate::model::{MemberId, Role, RosterInput, RosterPlan, ShiftBlock};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Vérifie un planning a posteriori contre l'entrée qui l'a produit.
pub fn detect_conflicts(
    input: &RosterInput,
    plan: &RosterPlan,
    newcomers: &BTreeSet<MemberId>,
) -> Vec<Conflict> {
    let mut out = Vec::new();

    for date in input.window.days() {
        for role in [Role::Primary, Role::Secondary] {
            if util::member_at(plan, role, date).is_none() {
                out.push(Conflict {
                    date,
                    role: Some(role),
                    member: None,
                    kind: ConflictKind::Uncovered,
                });
            }
        }
    }

    for role in [Role::Primary, Role::Secondary] {
        let track = plan.track(role);
        for block in track {
            if let Some(member) = input.find_member(&block.member) {
                if let Some(day) = util::first_blackout(member, block.required_days()) {
                    out.push(conflict(day, role, block, ConflictKind::Unavailable));
                }
                if role == Role::Secondary && (member.newcomer || newcomers.contains(&member.id)) {
                    out.push(conflict(block.start, role, block, ConflictKind::NewcomerAsSecondary));
                }
            }
        }

        for pair in track.windows(2) {
            if let [a, b] = pair {
                if a.end == b.start && a.identity == b.identity {
                    out.push(conflict(b.start, role, b, ConflictKind::ConsecutiveRepeat));
                }
            }
        }
    }

    for day in plan.daily() {
        if day.primary.identity == day.secondary.identity {
            out.push(Conflict {
                date: day.date,
                role: None,
                member: Some(day.primary.member.clone()),
                kind: ConflictKind::DoubleAssignment,
            });
        }
    }

    out
}

fn conflict(date: NaiveDate, role: Role, block: &ShiftBlock, kind: ConflictKind) -> Conflict {
    Conflict {
        date,
        role: Some(role),
        member: Some(block.member.clone()),
        kind,
    }
}

use super::{
    ranking, util, AssignmentEngine, BlockSpan, FairnessTracker, LastAssigned, RankStrategy,
    RosterWindow, RotatingSelector, SchedError,
};
use crate::model::{
    AssignedIdentity, FairnessReport, Member, MemberId, Role, RosterPlan, ShiftBlock,
};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info, warn};

/// Jeu de contrôles actifs pendant une passe de sélection.
#[derive(Debug, Clone, Copy)]
struct Pass {
    label: &'static str,
    strategy: RankStrategy,
    fairness: bool,
    // anti-répétition sur les deux rôles du bloc précédent, sinon sur le même rôle
    cross_role_repeat: bool,
}

impl Pass {
    fn strict(strategy: RankStrategy) -> Self {
        Self {
            label: "strict",
            strategy,
            fairness: true,
            cross_role_repeat: true,
        }
    }

    fn relaxed(strategy: RankStrategy) -> Self {
        Self {
            label: "relaxed",
            strategy,
            fairness: false,
            cross_role_repeat: false,
        }
    }
}

#[derive(Debug, Clone)]
struct Pick {
    member: MemberId,
    identity: AssignedIdentity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Unavailable(NaiveDate),
    TooManyShifts,
    TooManyWeekends,
    Unresolvable,
    RepeatsPrevious,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Unavailable(day) => write!(f, "not available on {day}"),
            Rejection::TooManyShifts => f.write_str("shift count too high"),
            Rejection::TooManyWeekends => f.write_str("too many week-ends"),
            Rejection::Unresolvable => f.write_str("identity not found"),
            Rejection::RepeatsPrevious => f.write_str("already on the previous block"),
        }
    }
}

/// Requête de sélection pour un rôle sur un bloc.
struct Request<'a> {
    span: BlockSpan,
    role: Role,
    exclude: &'a BTreeSet<MemberId>,
    last: &'a LastAssigned,
}

pub(super) fn run(engine: &mut AssignmentEngine<'_>) -> Result<RosterPlan, SchedError> {
    let newcomers = engine.newcomers();
    engine.reset(&newcomers);

    let no_exclusion = BTreeSet::new();
    let mut last = engine.history.clone();

    for span in RosterWindow::new(engine.input.window) {
        let primary = engine.select(&Request {
            span,
            role: Role::Primary,
            exclude: &no_exclusion,
            last: &last,
        })?;

        let mut exclude = newcomers.clone();
        exclude.insert(primary.member.clone());
        let mut secondary = engine.select(&Request {
            span,
            role: Role::Secondary,
            exclude: &exclude,
            last: &last,
        })?;

        if secondary.identity == primary.identity {
            warn!(
                date = %span.start,
                identity = %primary.identity,
                "primary and secondary resolve to the same identity, reselecting secondary"
            );
            exclude.insert(secondary.member.clone());
            let pass = Pass::relaxed(engine.options.fallback_strategy);
            let request = Request {
                span,
                role: Role::Secondary,
                exclude: &exclude,
                last: &last,
            };
            secondary = engine
                .attempt(&request, &pass)
                .filter(|pick| pick.identity != primary.identity)
                .ok_or(SchedError::DuplicateAssignment { date: span.start })?;
        }

        last = LastAssigned {
            primary: Some(primary.identity.clone()),
            secondary: Some(secondary.identity.clone()),
        };
        engine.commit(span, primary, secondary);
    }

    Ok(RosterPlan {
        window: engine.input.window,
        primary: engine.primary_blocks.clone(),
        secondary: engine.secondary_blocks.clone(),
        fairness: FairnessReport {
            primary: engine.primary.snapshot(),
            secondary: engine.secondary.snapshot(),
        },
    })
}

impl AssignmentEngine<'_> {
    fn reset(&mut self, newcomers: &BTreeSet<MemberId>) {
        let members = &self.input.members;
        self.primary = FairnessTracker::new(members.iter().map(|m| m.id.clone()));
        self.secondary = FairnessTracker::new(
            members
                .iter()
                .filter(|m| !newcomers.contains(&m.id))
                .map(|m| m.id.clone()),
        );
        self.primary_blocks.clear();
        self.secondary_blocks.clear();
    }

    /// Passe stricte, puis passe de repli, puis échec.
    fn select(&self, request: &Request<'_>) -> Result<Pick, SchedError> {
        let passes = [
            Pass::strict(self.options.strategy),
            Pass::relaxed(self.options.fallback_strategy),
        ];
        passes
            .iter()
            .find_map(|pass| {
                let pick = self.attempt(request, pass);
                if pick.is_none() {
                    warn!(
                        date = %request.span.start,
                        role = %request.role,
                        pass = pass.label,
                        "no candidate found"
                    );
                }
                pick
            })
            .ok_or(SchedError::NoEligibleCandidate {
                date: request.span.start,
                role: request.role,
            })
    }

    fn attempt(&self, request: &Request<'_>, pass: &Pass) -> Option<Pick> {
        let order = ranking::rank(
            &self.input.members,
            self.tracker(request.role),
            request.span.start,
            pass.strategy,
            &self.options.weights,
        );
        let mut selector = RotatingSelector::new(order);
        let attempts = selector.size(request.exclude);

        (0..attempts).find_map(|_| {
            let member = selector.next(request.exclude)?;
            match self.check(member, request, pass) {
                Ok(identity) => {
                    debug!(
                        date = %request.span.start,
                        role = %request.role,
                        member = %member.id,
                        pass = pass.label,
                        "selected"
                    );
                    Some(Pick {
                        member: member.id.clone(),
                        identity,
                    })
                }
                Err(reason) => {
                    debug!(
                        date = %request.span.start,
                        role = %request.role,
                        member = %member.id,
                        pass = pass.label,
                        %reason,
                        "candidate rejected"
                    );
                    None
                }
            }
        })
    }

    fn check(
        &self,
        member: &Member,
        request: &Request<'_>,
        pass: &Pass,
    ) -> Result<AssignedIdentity, Rejection> {
        if let Some(day) = util::first_blackout(member, request.span.required_days()) {
            return Err(Rejection::Unavailable(day));
        }

        if pass.fairness {
            let tracker = self.tracker(request.role);
            let policy = self.options.fairness;
            if policy.is_over(tracker.shift_count(&member.id), tracker.shift_counts()) {
                return Err(Rejection::TooManyShifts);
            }
            if request.span.is_weekend()
                && policy.is_over(tracker.weekend_count(&member.id), tracker.weekend_counts())
            {
                return Err(Rejection::TooManyWeekends);
            }
        }

        let identity = match self.resolver.resolve(member) {
            Ok(identity) => identity,
            Err(err) => {
                warn!(member = %member.id, error = %SchedError::from(err), "skipping candidate");
                return Err(Rejection::Unresolvable);
            }
        };

        let previous = if pass.cross_role_repeat {
            [request.last.primary.as_ref(), request.last.secondary.as_ref()]
        } else {
            [request.last.for_role(request.role), None]
        };
        if previous.into_iter().flatten().any(|p| *p == identity) {
            return Err(Rejection::RepeatsPrevious);
        }

        Ok(identity)
    }

    fn commit(&mut self, span: BlockSpan, primary: Pick, secondary: Pick) {
        let weekend = span.is_weekend();
        self.primary.increment(&primary.member, weekend);
        self.secondary.increment(&secondary.member, weekend);

        info!(
            start = %span.start,
            end = %span.end,
            primary = %primary.identity,
            secondary = %secondary.identity,
            "block committed"
        );

        self.primary_blocks.push(block(span, Role::Primary, primary));
        self.secondary_blocks.push(block(span, Role::Secondary, secondary));
    }
}

fn block(span: BlockSpan, role: Role, pick: Pick) -> ShiftBlock {
    ShiftBlock {
        start: span.start,
        end: span.end,
        role,
        member: pick.member,
        identity: pick.identity,
    }
}

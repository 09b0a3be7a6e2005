use crate::model::{Member, MemberId, RosterPlan, Role};
use chrono::NaiveDate;

/// Premier jour de `days` où le membre est indisponible.
pub(super) fn first_blackout<I>(member: &Member, days: I) -> Option<NaiveDate>
where
    I: IntoIterator<Item = NaiveDate>,
{
    days.into_iter().find(|d| !member.is_available(*d))
}

pub(super) fn member_at(plan: &RosterPlan, role: Role, date: NaiveDate) -> Option<&MemberId> {
    plan.block_at(role, date).map(|b| &b.member)
}

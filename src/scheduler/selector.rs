use crate::model::{Member, MemberId};
use std::collections::BTreeSet;

/// Curseur circulaire sur l'ordre du jour.
#[derive(Debug, Clone)]
pub struct RotatingSelector<'a> {
    members: Vec<&'a Member>,
    cursor: usize,
}

impl<'a> RotatingSelector<'a> {
    pub fn new(members: Vec<&'a Member>) -> Self {
        Self { members, cursor: 0 }
    }

    /// Prochain membre hors `exclude`, au plus un tour complet.
    pub fn next(&mut self, exclude: &BTreeSet<MemberId>) -> Option<&'a Member> {
        let total = self.members.len();
        (0..total).find_map(|_| {
            let member = self.members[self.cursor];
            self.cursor = (self.cursor + 1) % total;
            (!exclude.contains(&member.id)).then_some(member)
        })
    }

    pub fn size(&self, exclude: &BTreeSet<MemberId>) -> usize {
        self.members
            .iter()
            .filter(|m| !exclude.contains(&m.id))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

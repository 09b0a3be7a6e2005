use crate::model::{AssignedIdentity, Member};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("unknown user {0}")]
    NotFound(String),
}

/// Résout un membre vers son identité externe.
pub trait IdentityResolver {
    fn resolve(&self, member: &Member) -> Result<AssignedIdentity, ResolveError>;
}

/// Identité déduite de l'identifiant seul (nom = partie locale de l'adresse).
#[derive(Debug, Default, Clone, Copy)]
pub struct SelfIdentity;

impl IdentityResolver for SelfIdentity {
    fn resolve(&self, member: &Member) -> Result<AssignedIdentity, ResolveError> {
        let raw = member.id.as_str();
        let name = raw.split_once('@').map_or(raw, |(local, _)| local);
        Ok(AssignedIdentity {
            name: name.to_string(),
            email: raw.to_string(),
            ..AssignedIdentity::default()
        })
    }
}

/// Annuaire d'utilisateurs (export JSON `{"users": [...]}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Directory {
    #[serde(default)]
    pub users: Vec<AssignedIdentity>,
}

impl Directory {
    pub fn new(users: Vec<AssignedIdentity>) -> Self {
        Self { users }
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let directory: Directory = serde_json::from_slice(&data)
            .with_context(|| format!("parsing directory {}", path.display()))?;
        Ok(directory)
    }

    pub fn find_by_email<'a>(&'a self, email: &str) -> Option<&'a AssignedIdentity> {
        self.users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
    }
}

impl IdentityResolver for Directory {
    fn resolve(&self, member: &Member) -> Result<AssignedIdentity, ResolveError> {
        self.find_by_email(member.id.as_str())
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(member.id.as_str().to_string()))
    }
}

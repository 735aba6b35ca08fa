use crate::error::ResolveError;
use crate::model::Identity;
use crate::providers::Tracker;

/// Turns an assignee display name into an account id via the tracker's user search.
///
/// Nothing is cached: every call goes to the tracker. When several accounts match,
/// the first one in the tracker's ranking wins and a warning is logged; colliding
/// display names can therefore assign the wrong person.
pub struct IdentityResolver<'a> {
    tracker: &'a dyn Tracker,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(tracker: &'a dyn Tracker) -> Self {
        Self { tracker }
    }

    pub async fn resolve(&self, display_name: &str) -> Result<Identity, ResolveError> {
        let name = display_name.trim();
        let candidates = self
            .tracker
            .find_users(name)
            .await
            .map_err(|source| ResolveError::Lookup {
                name: name.to_string(),
                source,
            })?;

        if candidates.len() > 1 {
            tracing::warn!(
                assignee = name,
                candidates = candidates.len(),
                "ambiguous assignee, using first match"
            );
        }

        let first = candidates
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::NotFound(name.to_string()))?;

        Ok(Identity {
            display_name: first.display_name.unwrap_or_else(|| name.to_string()),
            account_id: first.account_id,
        })
    }
}

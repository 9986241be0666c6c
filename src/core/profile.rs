use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

use super::types::{ClientProfile, SmartAsset};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("client profile {0} not found")]
    NotFound(String),

    #[error("smart asset {0} already exists on this profile")]
    Conflict(String),

    #[error("client profile id must not be empty")]
    MissingId,

    #[error("profile store lock poisoned")]
    Poisoned,
}

pub trait ClientProfileRepository: Send + Sync {
    fn get(&self, id: &str) -> Result<ClientProfile, RepositoryError>;
    fn save(&self, profile: &ClientProfile) -> Result<(), RepositoryError>;
    fn delete(&self, id: &str) -> Result<(), RepositoryError>;
    fn list(&self) -> Result<Vec<ClientProfile>, RepositoryError>;
}

#[derive(Debug, Default)]
pub struct InMemoryProfileRepository {
    profiles: RwLock<HashMap<String, ClientProfile>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientProfileRepository for InMemoryProfileRepository {
    fn get(&self, id: &str) -> Result<ClientProfile, RepositoryError> {
        let profiles = self.profiles.read().map_err(|_| RepositoryError::Poisoned)?;
        profiles
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    fn save(&self, profile: &ClientProfile) -> Result<(), RepositoryError> {
        if profile.id.is_empty() {
            return Err(RepositoryError::MissingId);
        }
        let mut profiles = self.profiles.write().map_err(|_| RepositoryError::Poisoned)?;
        profiles.insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let mut profiles = self.profiles.write().map_err(|_| RepositoryError::Poisoned)?;
        profiles
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    fn list(&self) -> Result<Vec<ClientProfile>, RepositoryError> {
        let profiles = self.profiles.read().map_err(|_| RepositoryError::Poisoned)?;
        let mut all: Vec<ClientProfile> = profiles.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }
}

impl ClientProfile {
    // An empty id is replaced by the next free `sa-<n>` id.
    pub fn add_smart_asset(&mut self, mut asset: SmartAsset) -> Result<String, RepositoryError> {
        if asset.id.is_empty() {
            asset.id = self.next_smart_asset_id();
        } else if self.smart_assets.iter().any(|a| a.id == asset.id) {
            return Err(RepositoryError::Conflict(asset.id));
        }
        let id = asset.id.clone();
        self.smart_assets.push(asset);
        Ok(id)
    }

    pub fn remove_smart_asset(&mut self, id: &str) -> bool {
        let before = self.smart_assets.len();
        self.smart_assets.retain(|a| a.id != id);
        self.smart_assets.len() != before
    }

    fn next_smart_asset_id(&self) -> String {
        let mut n = self.smart_assets.len() + 1;
        loop {
            let candidate = format!("sa-{n}");
            if !self.smart_assets.iter().any(|a| a.id == candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str) -> ClientProfile {
        ClientProfile {
            id: id.to_string(),
            name: format!("Client {id}"),
            ..ClientProfile::default()
        }
    }

    fn asset(id: &str) -> SmartAsset {
        SmartAsset {
            id: id.to_string(),
            name: "Endowment".to_string(),
            start_age: 55,
            initial_value: 500_000.0,
            growth_rate_pct: 3.5,
            dividend_rate_pct: 2.0,
            dividend_start_age: 60,
        }
    }

    #[test]
    fn save_then_get_returns_the_stored_profile() {
        let repo = InMemoryProfileRepository::new();
        repo.save(&profile("c2")).expect("save");
        repo.save(&profile("c1")).expect("save");
        assert_eq!(repo.get("c1").expect("present"), profile("c1"));
        let ids: Vec<String> = repo.list().expect("list").into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["c1".to_string(), "c2".to_string()]);
    }

    #[test]
    fn missing_profile_is_not_found() {
        let repo = InMemoryProfileRepository::new();
        assert_eq!(
            repo.get("nope"),
            Err(RepositoryError::NotFound("nope".to_string()))
        );
        assert!(repo.delete("nope").is_err());
    }

    #[test]
    fn profile_without_id_is_rejected() {
        let repo = InMemoryProfileRepository::new();
        assert_eq!(repo.save(&profile("")), Err(RepositoryError::MissingId));
    }

    #[test]
    fn smart_assets_get_ids_and_are_deleted_by_id() {
        let mut p = profile("c1");
        let first = p.add_smart_asset(asset("")).expect("add");
        let second = p.add_smart_asset(asset("")).expect("add");
        assert_eq!(first, "sa-1");
        assert_eq!(second, "sa-2");
        assert_eq!(
            p.add_smart_asset(asset("sa-1")),
            Err(RepositoryError::Conflict("sa-1".to_string()))
        );

        assert!(p.remove_smart_asset("sa-1"));
        assert!(!p.remove_smart_asset("sa-1"));
        let third = p.add_smart_asset(asset("")).expect("add");
        assert_eq!(third, "sa-3");
        assert_eq!(p.smart_assets.len(), 2);
    }
}

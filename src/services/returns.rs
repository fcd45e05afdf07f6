// src/services/returns.rs
use crate::models::{UserReturns, FLOOR_YEAR};
use crate::services::storage::BlobStore;
use log::{error, info, warn};
use std::collections::BTreeMap;

pub const STORAGE_KEY: &str = "annual_yield_user_returns";

/// The user's year -> return state, written through to the blob store after
/// every mutation. Persistence failures are logged; memory stays authoritative.
///
/// The persisted copy is read at startup but held aside: the live state starts
/// empty and only `restore_saved` brings the saved years in. The first write
/// overwrites the persisted copy and discards the held snapshot.
pub struct ReturnStore {
    returns: UserReturns,
    saved: Option<UserReturns>,
    backend: Box<dyn BlobStore>,
    current_year: i32,
}

impl ReturnStore {
    /// Reads whatever was persisted into the held snapshot. Corrupt blobs and
    /// out-of-range or non-finite entries are dropped.
    pub fn load(backend: Box<dyn BlobStore>, current_year: i32) -> Self {
        let saved = match backend.get(STORAGE_KEY) {
            Ok(Some(blob)) => match serde_json::from_str::<BTreeMap<i32, f64>>(&blob) {
                Ok(saved) => saved
                    .into_iter()
                    .filter(|(year, value)| {
                        (FLOOR_YEAR..=current_year).contains(year) && value.is_finite()
                    })
                    .collect(),
                Err(e) => {
                    warn!("Ignoring unreadable saved returns: {}", e);
                    UserReturns::new()
                }
            },
            Ok(None) => UserReturns::new(),
            Err(e) => {
                error!("Failed to read saved returns: {}", e);
                UserReturns::new()
            }
        };

        info!("Loaded {} saved annual returns", saved.len());
        ReturnStore {
            returns: UserReturns::new(),
            saved: Some(saved).filter(|s| !s.is_empty()),
            backend,
            current_year,
        }
    }

    pub fn returns(&self) -> &UserReturns {
        &self.returns
    }

    /// Saved years not yet brought into the live state.
    pub fn saved(&self) -> Option<&UserReturns> {
        self.saved.as_ref()
    }

    /// Moves the held snapshot into the live state. Once anything has been
    /// written, the persisted copy already equals the live state and this is a no-op.
    pub fn restore_saved(&mut self) {
        match self.saved.take() {
            Some(saved) => {
                info!("Restored {} saved annual returns", saved.len());
                self.returns = saved;
            }
            None => info!("No saved returns beyond the live state"),
        }
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    pub fn backend(&self) -> &dyn BlobStore {
        self.backend.as_ref()
    }

    /// Upserts a finite value, otherwise removes the year.
    pub fn set_return(&mut self, year: i32, value: Option<f64>) {
        match value {
            Some(v) if v.is_finite() => {
                self.returns.insert(year, v);
            }
            _ => {
                self.returns.remove(&year);
            }
        }
        self.persist();
    }

    /// Replaces the whole state; nothing from the previous state survives.
    pub fn bulk_replace(&mut self, new_returns: UserReturns) {
        self.returns.clear();
        self.returns.extend(new_returns.into_iter().filter(|(_, v)| v.is_finite()));
        info!("Replaced user returns with {} years", self.returns.len());
        self.persist();
    }

    /// Empties the state and erases the persisted copy. Confirmation is the caller's job.
    pub fn clear(&mut self) {
        self.returns.clear();
        self.saved = None;
        if let Err(e) = self.backend.remove(STORAGE_KEY) {
            error!("Failed to erase saved returns: {}", e);
        }
        info!("Cleared user returns");
    }

    fn persist(&mut self) {
        self.saved = None;
        let blob = match serde_json::to_string(&self.returns) {
            Ok(blob) => blob,
            Err(e) => {
                error!("Failed to encode user returns: {}", e);
                return;
            }
        };
        if let Err(e) = self.backend.set(STORAGE_KEY, &blob) {
            error!("Failed to persist user returns: {}", e);
        }
    }
}

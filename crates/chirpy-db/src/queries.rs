use chirpy_types::models::{Chirp, SortOrder, User};
use tracing::debug;

use crate::Database;
use crate::error::{Result, StoreError};

impl Database {
    // -- Chirps --

    /// Insert a chirp for an existing author. The id comes from the
    /// high-water mark, never from the collection size.
    pub fn create_chirp(&self, body: &str, author_id: u64) -> Result<Chirp> {
        self.with_snapshot_mut(|snap| {
            if !snap.users.contains_key(&author_id) {
                return Err(StoreError::user_not_found(author_id));
            }

            let chirp = Chirp {
                id: snap.next_chirp_id(),
                body: body.to_string(),
                author_id,
            };
            snap.chirps.insert(chirp.id, chirp.clone());
            debug!("Created chirp {} for user {}", chirp.id, author_id);
            Ok(chirp)
        })
    }

    pub fn list_chirps(&self, author_id: Option<u64>, order: SortOrder) -> Result<Vec<Chirp>> {
        self.with_snapshot(|snap| {
            // BTreeMap iteration is already ascending by id.
            let mut chirps: Vec<Chirp> = snap
                .chirps
                .values()
                .filter(|c| author_id.is_none_or(|a| c.author_id == a))
                .cloned()
                .collect();

            if order == SortOrder::Desc {
                chirps.reverse();
            }
            Ok(chirps)
        })
    }

    pub fn get_chirp(&self, id: u64) -> Result<Chirp> {
        self.with_snapshot(|snap| {
            snap.chirps
                .get(&id)
                .cloned()
                .ok_or_else(|| StoreError::chirp_not_found(id))
        })
    }

    /// Remove a chirp if `requester_id` is its author. Otherwise the chirp is
    /// left untouched and nothing is written.
    pub fn delete_chirp(&self, id: u64, requester_id: u64) -> Result<()> {
        self.with_snapshot_mut(|snap| {
            let chirp = snap
                .chirps
                .get(&id)
                .ok_or_else(|| StoreError::chirp_not_found(id))?;

            if chirp.author_id != requester_id {
                return Err(StoreError::Forbidden {
                    chirp_id: id,
                    requester: requester_id,
                });
            }

            snap.chirps.remove(&id);
            debug!("Deleted chirp {} for user {}", id, requester_id);
            Ok(())
        })
    }

    // -- Users --

    pub fn create_user(&self, email: &str, password_hash: &str) -> Result<User> {
        self.with_snapshot_mut(|snap| {
            if snap.email_taken(email, None) {
                return Err(StoreError::DuplicateEmail);
            }

            let user = User {
                id: snap.next_user_id(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                refresh_token: String::new(),
                upgraded: false,
            };
            snap.users.insert(user.id, user.clone());
            debug!("Created user {}", user.id);
            Ok(user)
        })
    }

    pub fn get_user(&self, id: u64) -> Result<User> {
        self.with_snapshot(|snap| {
            snap.users
                .get(&id)
                .cloned()
                .ok_or_else(|| StoreError::user_not_found(id))
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.with_snapshot(|snap| Ok(snap.user_by_email(email).cloned()))
    }

    pub fn get_user_by_refresh_token(&self, token: &str) -> Result<Option<User>> {
        self.with_snapshot(|snap| Ok(snap.user_by_refresh_token(token).cloned()))
    }

    /// Apply `mutator` to one user and persist. Rejects an email change that
    /// collides with another account.
    pub fn update_user<F>(&self, id: u64, mutator: F) -> Result<User>
    where
        F: FnOnce(&mut User),
    {
        self.with_snapshot_mut(|snap| {
            let mut user = snap
                .users
                .get(&id)
                .cloned()
                .ok_or_else(|| StoreError::user_not_found(id))?;

            mutator(&mut user);

            if snap.email_taken(&user.email, Some(id)) {
                return Err(StoreError::DuplicateEmail);
            }

            snap.users.insert(id, user.clone());
            Ok(user)
        })
    }

    /// Clear whichever user currently holds `token`. Returns the affected
    /// user id, or `None` if no user holds it.
    pub fn clear_refresh_token(&self, token: &str) -> Result<Option<u64>> {
        self.with_snapshot_mut(|snap| {
            let holder = snap
                .users
                .values_mut()
                .find(|u| u.has_refresh_token(token));

            Ok(holder.map(|user| {
                user.refresh_token.clear();
                user.id
            }))
        })
    }
}

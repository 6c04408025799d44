use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use super::identity::next_identity;
use super::snapshot::Snapshot;
use super::Store;
use crate::error::{Result, StoreError};

/// A stored user account.
///
/// The password hash never leaves the crate: it has no public accessor and
/// `Debug` prints it redacted. Hand [`PublicUser`] to anything outside.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub email: String,
    #[serde(rename = "password")]
    pub(crate) password_hash: String,
}

impl User {
    pub(crate) fn new(id: u64, email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            password_hash: password_hash.into(),
        }
    }

    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            email: self.email.clone(),
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// The externally visible projection of a [`User`].
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct PublicUser {
    pub id: u64,
    pub email: String,
}

impl PublicUser {
    /// The id rendered as a token subject.
    pub fn subject(&self) -> String {
        self.id.to_string()
    }
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        user.to_public()
    }
}

/// Typed view over the user collection of a [`Store`].
///
/// Obtained with [`Store::users`].
pub struct Users<'a> {
    store: &'a Store,
}

impl<'a> Users<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Registers a new account.
    ///
    /// An email already taken is rejected under the shared lock before any
    /// hashing. The password is then hashed with no lock held. The final
    /// email check and the insert share one exclusive section, so two
    /// concurrent calls with the same email cannot both succeed.
    pub fn create(&self, email: &str, password: &str) -> Result<PublicUser> {
        if email_owner(&self.store.load_snapshot()?, email).is_some() {
            return Err(StoreError::DuplicateEmail(email.to_string()));
        }
        let password_hash = self.store.credentials.hash(password)?;

        let user = self.store.mutate(|snapshot| {
            if email_owner(snapshot, email).is_some() {
                return Err(StoreError::DuplicateEmail(email.to_string()));
            }
            let id = next_identity(&mut snapshot.sequences.users, &snapshot.users)?;
            let user = User::new(id, email, password_hash);
            let public = user.to_public();
            snapshot.users.insert(id, user);
            Ok(public)
        })?;
        info!(id = user.id, "user created");
        Ok(user)
    }

    /// Looks up a user by exact (case-sensitive) email.
    pub fn find_by_email(&self, email: &str) -> Result<User> {
        let mut snapshot = self.store.load_snapshot()?;
        let id = email_owner(&snapshot, email).ok_or_else(|| StoreError::user_not_found(email))?;
        snapshot
            .users
            .remove(&id)
            .ok_or_else(|| StoreError::user_not_found(email))
    }

    /// Looks up one user by id and returns its public view.
    pub fn get(&self, id: u64) -> Result<PublicUser> {
        let snapshot = self.store.load_snapshot()?;
        snapshot
            .users
            .get(&id)
            .map(User::to_public)
            .ok_or_else(|| StoreError::user_not_found(id))
    }

    /// All users as public views, in unspecified order.
    pub fn list(&self) -> Result<Vec<PublicUser>> {
        let snapshot = self.store.load_snapshot()?;
        Ok(snapshot.users.values().map(User::to_public).collect())
    }

    /// Checks an email/password pair.
    ///
    /// Unknown email gives [`StoreError::NotFound`], a wrong password gives
    /// [`StoreError::InvalidCredentials`]. Use
    /// [`StoreError::is_authentication_failure`] to report both alike.
    /// The hash is verified after the read lock is released.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<PublicUser> {
        let user = self.find_by_email(email)?;
        if !self.store.credentials.verify(password, &user.password_hash) {
            debug!(id = user.id, "password mismatch");
            return Err(StoreError::InvalidCredentials);
        }
        Ok(user.to_public())
    }

    /// Replaces the email and password of an existing user.
    ///
    /// Fails with [`StoreError::NotFound`] for an unknown id and with
    /// [`StoreError::DuplicateEmail`] if a different user already holds
    /// `email`.
    pub fn update(&self, id: u64, email: &str, password: &str) -> Result<PublicUser> {
        let password_hash = self.store.credentials.hash(password)?;

        let user = self.store.mutate(|snapshot| {
            if !snapshot.users.contains_key(&id) {
                return Err(StoreError::user_not_found(id));
            }
            if email_owner(snapshot, email).is_some_and(|owner| owner != id) {
                return Err(StoreError::DuplicateEmail(email.to_string()));
            }
            let user = snapshot
                .users
                .get_mut(&id)
                .ok_or_else(|| StoreError::user_not_found(id))?;
            user.email = email.to_string();
            user.password_hash = password_hash;
            Ok(user.to_public())
        })?;
        info!(id = user.id, "user updated");
        Ok(user)
    }
}

/// Id of the user holding `email`, if any.
fn email_owner(snapshot: &Snapshot, email: &str) -> Option<u64> {
    snapshot
        .users
        .values()
        .find(|u| u.email == email)
        .map(|u| u.id)
}

// Local-only sign-in stand-in. Nothing here talks to a server; it validates
// form input and keeps the session slice of the profile store current.
use tracing::{info, warn};

use crate::models::Session;
use crate::profile_store::ProfileStore;
use crate::{Error, Result};

pub const MIN_PASSWORD_LEN: usize = 6;

pub struct SessionManager {
    store: ProfileStore,
    current: Option<Session>,
}

impl SessionManager {
    pub fn load(store: ProfileStore) -> Self {
        let current = store.session().unwrap_or_else(|e| {
            warn!("Could not read session: {}", e);
            None
        });
        Self { store, current }
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.as_ref().is_some_and(|s| s.authenticated)
    }

    /// Keeps a display name saved by an earlier sign-up on this device
    pub fn sign_in(&mut self, email: &str, password: &str) -> Result<&Session> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(Error::Validation("Please fill in all fields".into()));
        }

        let display_name = self
            .store
            .session()
            .ok()
            .flatten()
            .map(|s| s.display_name)
            .unwrap_or_default();

        self.start(Session {
            authenticated: true,
            display_name,
            email: email.to_string(),
        })
    }

    pub fn sign_up(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<&Session> {
        let (name, email) = (name.trim(), email.trim());
        if name.is_empty() || email.is_empty() || password.is_empty() || confirm_password.is_empty()
        {
            return Err(Error::Validation("Please fill in all fields".into()));
        }
        check_new_password(password, confirm_password)?;

        self.start(Session {
            authenticated: true,
            display_name: name.to_string(),
            email: email.to_string(),
        })
    }

    /// Clears the session only; interests and history stay on the device
    pub fn logout(&mut self) {
        if let Err(e) = self.store.clear_session() {
            warn!("Failed to clear stored session: {}", e);
        }
        self.current = None;
        info!("Signed out");
    }

    pub fn update_display_name(&mut self, name: &str) -> Result<()> {
        let session = self.current.as_mut().ok_or(Error::NotAuthenticated)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Name cannot be empty".into()));
        }

        session.display_name = name.to_string();
        if let Err(e) = self.store.set_session(session) {
            warn!("Failed to persist display name: {}", e);
        }
        Ok(())
    }

    /// Validates the form; the password itself is never stored
    pub fn change_password(&self, new_password: &str, confirm_password: &str) -> Result<()> {
        if !self.is_authenticated() {
            return Err(Error::NotAuthenticated);
        }
        check_new_password(new_password, confirm_password)
    }

    fn start(&mut self, session: Session) -> Result<&Session> {
        if let Err(e) = self.store.set_session(&session) {
            warn!("Failed to persist session: {}", e);
        }
        info!("Signed in as {}", session.email);
        Ok(self.current.insert(session))
    }
}

fn check_new_password(password: &str, confirm_password: &str) -> Result<()> {
    if password != confirm_password {
        return Err(Error::Validation("Passwords do not match".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

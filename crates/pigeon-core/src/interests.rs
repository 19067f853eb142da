use tracing::{info, warn};

use crate::models::Category;
use crate::profile_store::ProfileStore;
use crate::{Error, Result};

/// Interests offered during onboarding
pub const AVAILABLE_INTERESTS: [&str; 12] = [
    "Technology",
    "Business",
    "Sports",
    "Entertainment",
    "Health",
    "Science",
    "Politics",
    "World News",
    "Finance",
    "Lifestyle",
    "Travel",
    "Food",
];

/// Where the user is in personalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileState {
    /// Nothing saved yet
    NewUser,
    /// Picking interests; nothing is persisted until `save`
    Onboarding { draft: Vec<String> },
    /// Interests saved and driving the feed
    Personalized { interests: Vec<String> },
}

/// Owns the selected-interest set and derives the personalized category
pub struct InterestProfileManager {
    store: ProfileStore,
    persisted: Vec<String>,
    state: ProfileState,
}

impl InterestProfileManager {
    pub fn load(store: ProfileStore) -> Self {
        let persisted = match store.interests() {
            Ok(Some(list)) => normalize(&list),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Could not read saved interests: {}", e);
                Vec::new()
            }
        };

        let state = if persisted.is_empty() {
            ProfileState::NewUser
        } else {
            ProfileState::Personalized {
                interests: persisted.clone(),
            }
        };

        Self {
            store,
            persisted,
            state,
        }
    }

    pub fn state(&self) -> &ProfileState {
        &self.state
    }

    pub fn persisted(&self) -> &[String] {
        &self.persisted
    }

    pub fn draft(&self) -> Option<&[String]> {
        match &self.state {
            ProfileState::Onboarding { draft } => Some(draft),
            _ => None,
        }
    }

    /// Enter onboarding. Coming from `Personalized` ("edit interests") the
    /// draft starts as the saved set; the saved set itself is untouched.
    pub fn begin_onboarding(&mut self) {
        if let ProfileState::Onboarding { .. } = self.state {
            return;
        }
        self.state = ProfileState::Onboarding {
            draft: self.persisted.clone(),
        };
    }

    /// Leave onboarding without saving
    pub fn cancel_onboarding(&mut self) {
        self.state = if self.persisted.is_empty() {
            ProfileState::NewUser
        } else {
            ProfileState::Personalized {
                interests: self.persisted.clone(),
            }
        };
    }

    /// Add `name` to the draft if absent, remove it if present. Returns
    /// whether it is selected afterwards. Starts onboarding if needed.
    pub fn toggle_interest(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }

        self.begin_onboarding();
        let ProfileState::Onboarding { draft } = &mut self.state else {
            return false;
        };

        if let Some(pos) = draft.iter().position(|i| i == name) {
            draft.remove(pos);
            false
        } else {
            draft.push(name.to_string());
            true
        }
    }

    /// Save the current draft
    pub fn save_draft(&mut self) -> Result<Category> {
        let draft = self.draft().map(<[String]>::to_vec).unwrap_or_default();
        self.save(&draft)
    }

    /// Replace the saved interests with `draft` and leave onboarding.
    ///
    /// An empty selection is rejected and changes nothing. Returns the
    /// category the personalized feed should show.
    pub fn save(&mut self, draft: &[String]) -> Result<Category> {
        let interests = normalize(draft);
        if interests.is_empty() {
            return Err(Error::Validation(
                "Please select at least one interest".into(),
            ));
        }

        if let Err(e) = self.store.set_interests(&interests) {
            warn!("Failed to persist interests: {}", e);
        }
        info!("Saved {} interests", interests.len());

        self.persisted = interests.clone();
        self.state = ProfileState::Personalized { interests };
        Ok(self.feed_category())
    }

    /// Category for the personalized feed, from the first saved interest
    pub fn feed_category(&self) -> Category {
        derive_category(&self.persisted)
    }
}

/// First interest, case-folded onto the category vocabulary. Interests that
/// aren't categories ("World News", "Food") fall back to `General`.
pub fn derive_category(interests: &[String]) -> Category {
    interests
        .first()
        .and_then(|first| first.parse().ok())
        .unwrap_or(Category::General)
}

/// Trimmed, non-blank, first occurrence wins
fn normalize(interests: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(interests.len());
    for name in interests {
        let name = name.trim();
        if !name.is_empty() && !out.iter().any(|n| n == name) {
            out.push(name.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pigeon_store::MemoryStore;
    use std::sync::Arc;

    fn manager() -> (ProfileStore, InterestProfileManager) {
        let store = ProfileStore::new(Arc::new(MemoryStore::new()));
        let manager = InterestProfileManager::load(store.clone());
        (store, manager)
    }

    #[test]
    fn test_new_user_without_saved_interests() {
        let (_, manager) = manager();
        assert_eq!(manager.state(), &ProfileState::NewUser);
        assert_eq!(manager.feed_category(), Category::General);
    }

    #[test]
    fn test_toggle_is_symmetric_difference() {
        let (store, mut manager) = manager();

        assert!(manager.toggle_interest("Sports"));
        assert!(manager.toggle_interest("Health"));
        assert!(!manager.toggle_interest("Sports"));

        assert_eq!(manager.draft(), Some(&["Health".to_string()][..]));
        // Drafts are not persisted
        assert_eq!(store.interests().unwrap(), None);
    }

    #[test]
    fn test_empty_save_changes_nothing() {
        let (store, mut manager) = manager();
        manager.save(&["Science".to_string()]).unwrap();

        manager.begin_onboarding();
        manager.toggle_interest("Science");
        let result = manager.save_draft();

        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(store.interests().unwrap(), Some(vec!["Science".to_string()]));
        assert_eq!(manager.persisted(), &["Science".to_string()]);
        assert!(manager.draft().is_some());
    }

    #[test]
    fn test_save_replaces_and_derives_category() {
        let (store, mut manager) = manager();
        manager.save(&["Science".to_string(), "Food".to_string()]).unwrap();

        let category = manager
            .save(&["Technology".to_string(), "Technology".to_string(), "Travel".to_string()])
            .unwrap();

        assert_eq!(category, Category::Technology);
        assert_eq!(
            store.interests().unwrap(),
            Some(vec!["Technology".to_string(), "Travel".to_string()])
        );
        assert!(matches!(manager.state(), ProfileState::Personalized { .. }));
    }

    #[test]
    fn test_edit_interests_starts_from_saved_set() {
        let (_, mut manager) = manager();
        manager.save(&["Business".to_string()]).unwrap();

        manager.begin_onboarding();
        assert_eq!(manager.draft(), Some(&["Business".to_string()][..]));
        assert_eq!(manager.persisted(), &["Business".to_string()]);

        manager.cancel_onboarding();
        assert_eq!(
            manager.state(),
            &ProfileState::Personalized {
                interests: vec!["Business".to_string()]
            }
        );
    }

    #[test]
    fn test_unmapped_first_interest_falls_back_to_general() {
        assert_eq!(derive_category(&["World News".to_string()]), Category::General);
        assert_eq!(derive_category(&["politics".to_string()]), Category::Politics);
        assert_eq!(derive_category(&[]), Category::General);
    }

    #[test]
    fn test_reload_is_personalized() {
        let (store, mut manager) = manager();
        manager.save(&["Health".to_string()]).unwrap();

        let reloaded = InterestProfileManager::load(store);
        assert_eq!(reloaded.feed_category(), Category::Health);
        assert!(matches!(reloaded.state(), ProfileState::Personalized { .. }));
    }
}

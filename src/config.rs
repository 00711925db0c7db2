//! Planning domains loaded from YAML.
//!
//! ```yaml
//! planner:
//!   max_expansions: 1024
//! actions:
//!   - name: open_door
//!     cost: 1.0
//!     preconditions: { door: closed }
//!     effects: { door: open }
//! goals:
//!   - name: get_inside
//!     desired_state: { door: open }
//!     completion: Reset
//! ```
//!
//! Values follow YAML scalars (`true`, `3`, `1.5`, `room1`), vectors are
//! written as `{x, y, z}` and object references as `{object: N}`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{error::LoadError, Action, ActionLibrary, Constructor, Goal};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// States the planner may expand before giving up on a goal.
    pub max_expansions: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_expansions: 4096,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Reset and start the root again on the tick after it ends.
    pub restart_on_end: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Domain {
    pub planner: PlannerConfig,
    pub tree: TreeConfig,
    pub actions: Vec<Action>,
    pub goals: Vec<Goal>,
}

impl Domain {
    pub fn from_yaml(yaml: &str) -> Result<Self, LoadError> {
        let domain: Domain = serde_yaml::from_str(yaml)?;
        domain.validate()?;
        Ok(domain)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    fn validate(&self) -> Result<(), LoadError> {
        for (i, action) in self.actions.iter().enumerate() {
            if !action.cost.is_finite() || action.cost < 0. {
                return Err(LoadError::InvalidAction {
                    name: action.name.clone(),
                    reason: format!("cost {} is not a non-negative number", action.cost),
                });
            }
            if self.actions[..i].iter().any(|a| a.name == action.name) {
                return Err(LoadError::InvalidAction {
                    name: action.name.clone(),
                    reason: "defined more than once".to_owned(),
                });
            }
        }
        Ok(())
    }

    pub fn goal(&self, name: &str) -> Result<&Goal, LoadError> {
        self.goals
            .iter()
            .find(|goal| goal.name == name)
            .ok_or_else(|| LoadError::UnknownGoal(name.to_owned()))
    }

    /// Builds an action library, attaching a task to each named action.
    pub fn action_library(
        &self,
        tasks: impl IntoIterator<Item = (String, Constructor)>,
    ) -> Result<ActionLibrary, LoadError> {
        let mut library = ActionLibrary::new();
        for action in &self.actions {
            library.register(action.clone(), None);
        }
        for (name, constructor) in tasks {
            if library.action(&name).is_none() {
                return Err(LoadError::UnknownAction(name));
            }
            library.register_task(name, constructor);
        }
        Ok(library)
    }
}

//! Saved-scenario history.
//!
//! Every `spend run --save` prepends its scenario to one JSON file, newest
//! first, and marks it as the last result. `spend show --last` / `--id N`
//! reopen entries and `spend history` lists them.
//!
//! Ids are assigned once and never reused, even after entries are cleared.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::io::Scenario;

/// History file used when `--history` / `SPEND_HISTORY` is not given.
pub const DEFAULT_HISTORY_FILE: &str = "spend_history.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedScenario {
    pub id: u64,
    pub scenario: Scenario,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct History {
    /// Id of the most recently saved scenario.
    pub last_id: Option<u64>,
    pub next_id: u64,
    /// Newest first.
    pub scenarios: Vec<SavedScenario>,
}

impl History {
    /// Prepend a scenario and make it the last result. Returns its id.
    pub fn push(&mut self, scenario: Scenario) -> u64 {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.scenarios.insert(0, SavedScenario { id, scenario });
        self.last_id = Some(id);
        id
    }

    pub fn get(&self, id: u64) -> Option<&SavedScenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    /// The last saved result, falling back to the newest entry when the
    /// recorded id is gone.
    pub fn last(&self) -> Option<&SavedScenario> {
        self.last_id
            .and_then(|id| self.get(id))
            .or_else(|| self.scenarios.first())
    }

    /// Drop every entry. `next_id` is kept so old ids stay unique.
    pub fn clear(&mut self) {
        self.scenarios.clear();
        self.last_id = None;
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

/// Load the history file. A missing file is an empty history.
pub fn load_history(path: &Path) -> Result<History, AppError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(History::default()),
        Err(e) => {
            return Err(AppError::new(
                2,
                format!("Failed to open history '{}': {e}", path.display()),
            ));
        }
    };
    serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid history file '{}': {e}", path.display())))
}

pub fn save_history(path: &Path, history: &History) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create history '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, history)
        .map_err(|e| AppError::new(2, format!("Failed to write history: {e}")))?;
    Ok(())
}

/// Load, prepend `scenario`, save. Returns the new id.
pub fn append_to_history(path: &Path, scenario: Scenario) -> Result<u64, AppError> {
    let mut history = load_history(path)?;
    let id = history.push(scenario);
    save_history(path, &history)?;
    tracing::info!(path = %path.display(), id, entries = history.len(), "scenario saved to history");
    Ok(id)
}

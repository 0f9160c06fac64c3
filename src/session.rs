//! Per-panel chat session state.
//!
//! Tracks loaded objects, per-object atom counts, the camera view
//! vector, and a ring-buffered command history, and renders all of it
//! into the deterministic context block the translator injects into
//! its prompt. One session per chat panel, mutated only from the
//! single turn-processing path.

use std::collections::VecDeque;

use indexmap::IndexMap;

use crate::host::HostCapability;

/// Commands kept in history before the oldest entries are evicted.
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// How many history entries the context prompt shows.
const CONTEXT_HISTORY_WINDOW: usize = 5;

/// One executed command and its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub command: String,
    pub success: bool,
    pub output: String,
}

/// Bounded in-memory model of the host state plus command history.
#[derive(Debug)]
pub struct ChatSession {
    objects: Vec<String>,
    object_atom_counts: IndexMap<String, u32>,
    view_state: Option<Vec<f64>>,
    history: VecDeque<HistoryEntry>,
    max_history: usize,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self::with_max_history(DEFAULT_MAX_HISTORY)
    }

    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            objects: Vec::new(),
            object_atom_counts: IndexMap::new(),
            view_state: None,
            history: VecDeque::new(),
            max_history,
        }
    }

    // ── Host refresh ─────────────────────────────────────────────

    /// Refresh the object snapshot and view vector from the host.
    ///
    /// The three sub-fetches are independently fault-tolerant: a
    /// failed fetch falls back to empty / zero / absent instead of
    /// aborting the refresh, so a flaky host never kills a turn.
    pub fn update_from_host(&mut self, host: &dyn HostCapability) {
        self.objects = fetch_objects(host.get_names());
        self.object_atom_counts = fetch_atom_counts(host);
        self.view_state = host.get_view().ok();
    }

    // ── History ──────────────────────────────────────────────────

    /// Append a command outcome, evicting the oldest entries past the
    /// history bound.
    pub fn record_command(
        &mut self,
        command: impl Into<String>,
        success: bool,
        output: impl Into<String>,
    ) {
        self.history.push_back(HistoryEntry {
            command: command.into(),
            success,
            output: output.into(),
        });
        while self.history.len() > self.max_history {
            self.history.pop_front();
        }
    }

    /// The last `count` command strings, oldest of the window first.
    pub fn recent_commands(&self, count: usize) -> Vec<String> {
        let skip = self.history.len().saturating_sub(count);
        self.history
            .iter()
            .skip(skip)
            .map(|entry| entry.command.clone())
            .collect()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn has_objects(&self) -> bool {
        !self.objects.is_empty()
    }

    pub fn objects(&self) -> &[String] {
        &self.objects
    }

    pub fn atom_count(&self, object: &str) -> u32 {
        self.object_atom_counts.get(object).copied().unwrap_or(0)
    }

    pub fn view_state(&self) -> Option<&[f64]> {
        self.view_state.as_deref()
    }

    // ── Context prompt ───────────────────────────────────────────

    /// Render the current state as the context block for the LLM.
    ///
    /// Pure read: one line per loaded object (atom count suffixed only
    /// when non-zero), then the last five history entries with ✓/✗
    /// markers. Returns the `"No objects loaded"` sentinel when both
    /// the object list and the history are empty.
    pub fn context_prompt(&self) -> String {
        let mut lines: Vec<String> = Vec::new();

        if !self.objects.is_empty() {
            lines.push("Loaded objects:".to_string());
            for obj in &self.objects {
                let count = self.atom_count(obj);
                if count > 0 {
                    lines.push(format!("  - {obj}: {count} atoms"));
                } else {
                    lines.push(format!("  - {obj}"));
                }
            }
        }

        if !self.history.is_empty() {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push("Recent commands:".to_string());
            let skip = self.history.len().saturating_sub(CONTEXT_HISTORY_WINDOW);
            for entry in self.history.iter().skip(skip) {
                let status = if entry.success { '✓' } else { '✗' };
                lines.push(format!("  {status} {}", entry.command));
            }
        }

        if lines.is_empty() {
            "No objects loaded".to_string()
        } else {
            lines.join("\n")
        }
    }
}

// ── Fault-tolerant sub-fetches ───────────────────────────────────

/// Flatten the host's name listing into the object list; any failure
/// or empty listing yields no objects.
fn fetch_objects(names: Result<Vec<Vec<String>>, String>) -> Vec<String> {
    match names {
        Ok(groups) => groups.into_iter().next().unwrap_or_default(),
        Err(_) => Vec::new(),
    }
}

/// Rebuild the atom-count map from scratch. A per-object count failure
/// records 0 for that object; a failed object listing leaves the map
/// empty. Rebuilding (rather than patching) drops stale entries for
/// objects removed since the last refresh.
fn fetch_atom_counts(host: &dyn HostCapability) -> IndexMap<String, u32> {
    let mut counts = IndexMap::new();
    if let Ok(objects) = host.get_object_list() {
        for obj in objects {
            let count = host.count_atoms(&obj).unwrap_or(0);
            counts.insert(obj, count);
        }
    }
    counts
}

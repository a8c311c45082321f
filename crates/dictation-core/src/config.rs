//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Tunables for a [`CommandEditor`](crate::CommandEditor).
///
/// Missing fields take their default values when deserializing, so hosts can keep partial
/// configuration files:
///
/// ```rust
/// use dictation_core::EditorConfig;
///
/// let config: EditorConfig = serde_json::from_str(r#"{ "undo_capacity": 50 }"#).unwrap();
/// assert_eq!(config.undo_capacity, 50);
/// assert_eq!(config.max_command_prefix, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// How many earlier literal utterances a command may absorb.
    pub max_command_prefix: usize,
    /// How many characters left of the cursor are read for glue, capitalization and
    /// `deleteLeftWord`.
    pub max_deletable_context: usize,
    /// Maximum number of undo entries. The oldest entry is dropped when full.
    pub undo_capacity: usize,
    /// Maximum number of remembered forward operations. The oldest is dropped when full.
    pub op_capacity: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_command_prefix: 3,
            max_deletable_context: 100,
            undo_capacity: 1000,
            op_capacity: 100,
        }
    }
}

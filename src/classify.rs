//! Script format classification.

use std::path::Path;

use crate::types::EngineKind;

/// Map a script path to the engine that runs it.
///
/// Only the text after the final `.` of the whole path counts, compared
/// case-sensitively: `.js` selects JavaScript, anything else (or no dot)
/// is a command script.
pub fn classify(path: impl AsRef<Path>) -> EngineKind {
    let path = path.as_ref().to_string_lossy();
    match path.rsplit_once('.') {
        Some((_, "js")) => EngineKind::JavaScript,
        _ => EngineKind::CommandScript,
    }
}

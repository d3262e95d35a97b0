//! Non-fatal translation diagnostics.

use std::fmt;
use std::path::PathBuf;

/// A warning raised during translation.
///
/// Diagnostics never abort translation, but the generated C++ is likely to
/// fail to compile when one is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A group derives from an external template with no known interface,
    /// so no overrides were declared.
    MissingBaseInterface {
        /// Data group name.
        group: String,
        /// Template name.
        template: String,
    },
    /// A base-class header exists but could not be read.
    UnreadableBaseHeader {
        /// Template name.
        template: String,
        /// Header path.
        path: PathBuf,
        /// IO error text.
        message: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingBaseInterface { group, template } => write!(
                f,
                "no interface known for base class '{template}' of '{group}'; overrides were not declared"
            ),
            Self::UnreadableBaseHeader {
                template,
                path,
                message,
            } => write!(
                f,
                "header for base class '{template}' at {} could not be read: {message}",
                path.display()
            ),
        }
    }
}

//! Where tokenizer and model artifacts come from.

use std::fmt;
use std::path::PathBuf;

/// Origin of a tokenizer or model.
///
/// `Local` points at a directory of bundled artifacts; `Hub` names a
/// repository on the Hugging Face Hub (e.g. `distilbert-base-uncased`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    Local(PathBuf),
    Hub(String),
}

impl ModelSource {
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "local:{}", path.display()),
            Self::Hub(repo) => write!(f, "hub:{repo}"),
        }
    }
}

//! Document records stored per vector-store entry

use serde::{Deserialize, Serialize};

/// Characters of trimmed content that take part in the dedup signature
pub const SIGNATURE_CONTENT_CHARS: usize = 80;

/// One indexed chunk. Missing fields in the mapping file load as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub rubric: String,
}

/// Dedup key: trimmed url plus the first 80 characters of trimmed content.
///
/// Two chunks sharing a url and an 80-character prefix collapse into one even
/// if they differ further on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub url: String,
    pub prefix: String,
}

impl Document {
    pub fn new(content: &str, url: &str, title: &str, rubric: &str) -> Self {
        Self {
            content: content.to_string(),
            url: url.to_string(),
            title: title.to_string(),
            rubric: rubric.to_string(),
        }
    }

    pub fn signature(&self) -> Signature {
        Signature {
            url: self.url.trim().to_string(),
            prefix: self
                .content
                .trim()
                .chars()
                .take(SIGNATURE_CONTENT_CHARS)
                .collect(),
        }
    }
}

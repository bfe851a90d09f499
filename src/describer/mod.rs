mod gemini;
pub mod upload;

use crate::error::AnalysisError;
use async_trait::async_trait;
use std::path::Path;

pub use gemini::GeminiDescriber;

/// One answer from the AI capability. `suggested_name_raw` is unsanitized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    pub description: String,
    pub suggested_name_raw: String,
}

/// Produces a content description and a file name suggestion for an image.
///
/// Implementations are shared between concurrently running analyses and
/// must not keep per-call mutable state.
#[async_trait]
pub trait Describer: Send + Sync {
    /// Returns the name of this capability, for logging
    fn name(&self) -> &str;

    async fn describe(&self, path: &Path) -> Result<Description, AnalysisError>;
}

/// Splits a free-text answer into description and suggestion.
///
/// Both markers must be present, the name marker after the description
/// marker. Otherwise the whole text becomes the description and
/// `fallback_stem` the suggestion.
pub fn split_response(
    text: &str,
    description_marker: &str,
    name_marker: &str,
    fallback_stem: &str,
) -> Description {
    if let Some((_, desc_end)) = find_ignore_case(text, description_marker) {
        let rest = &text[desc_end..];
        if let Some((name_start, name_end)) = find_ignore_case(rest, name_marker) {
            return Description {
                description: rest[..name_start].trim().to_string(),
                suggested_name_raw: rest[name_end..].trim().to_string(),
            };
        }
    }

    log::debug!("Response markers not found, using whole text as description");
    Description {
        description: text.to_string(),
        suggested_name_raw: fallback_stem.to_string(),
    }
}

/// Byte range of the first case-insensitive occurrence of `needle`.
fn find_ignore_case(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    if needle.is_empty() {
        return None;
    }

    haystack.char_indices().find_map(|(start, _)| {
        let mut rest = haystack[start..].char_indices();
        let mut end = start;
        for expected in needle.chars() {
            let (offset, c) = rest.next()?;
            if !c.to_lowercase().eq(expected.to_lowercase()) {
                return None;
            }
            end = start + offset + c.len_utf8();
        }
        Some((start, end))
    })
}

use crate::error::RenameError;
use crate::mover::FileMover;
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhotoId(Uuid);

impl PhotoId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PhotoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoState {
    Intake,
    Analyzing,
    Suggested,
    Error,
    Renamed,
}

/// Description and sanitized stem always travel together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub description: String,
    pub stem: String,
}

/// One user-supplied image tracked from intake to rename.
#[derive(Debug, Clone)]
pub struct PhotoItem {
    id: PhotoId,
    source_path: PathBuf,
    original_name: String,
    state: PhotoState,
    suggestion: Option<Suggestion>,
    last_error: Option<String>,
}

impl PhotoItem {
    pub fn new(source_path: PathBuf) -> Self {
        let original_name = source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            id: PhotoId::new(),
            source_path,
            original_name,
            state: PhotoState::Intake,
            suggestion: None,
            last_error: None,
        }
    }

    pub fn id(&self) -> PhotoId {
        self.id
    }

    /// Current on-disk location; updated after a successful rename.
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn state(&self) -> PhotoState {
        self.state
    }

    pub fn description(&self) -> Option<&str> {
        self.suggestion.as_ref().map(|s| s.description.as_str())
    }

    pub fn suggested_name(&self) -> Option<&str> {
        self.suggestion.as_ref().map(|s| s.stem.as_str())
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Moves the item into `Analyzing`, dropping any previous result.
    /// Returns `false` (and changes nothing) while already analyzing or
    /// once renamed.
    pub fn begin_analysis(&mut self) -> bool {
        match self.state {
            PhotoState::Analyzing | PhotoState::Renamed => false,
            PhotoState::Intake | PhotoState::Suggested | PhotoState::Error => {
                self.suggestion = None;
                self.last_error = None;
                self.state = PhotoState::Analyzing;
                true
            }
        }
    }

    /// Applies a successful analysis. Ignored unless analyzing.
    pub fn complete_analysis(&mut self, suggestion: Suggestion) -> bool {
        if self.state != PhotoState::Analyzing {
            return false;
        }
        self.suggestion = Some(suggestion);
        self.last_error = None;
        self.state = PhotoState::Suggested;
        true
    }

    /// Applies a failed analysis. Ignored unless analyzing.
    pub fn fail_analysis(&mut self, error: String) -> bool {
        if self.state != PhotoState::Analyzing {
            return false;
        }
        self.suggestion = None;
        self.last_error = Some(error);
        self.state = PhotoState::Error;
        true
    }

    /// Renames the file to its suggested stem.
    ///
    /// Returns `Ok(None)` without touching the disk unless the item is
    /// `Suggested`. A failed rename keeps the suggestion and records the
    /// error.
    pub fn rename(&mut self, max_probes: usize) -> Result<Option<PathBuf>, RenameError> {
        if self.state != PhotoState::Suggested {
            return Ok(None);
        }
        let Some(suggestion) = &self.suggestion else {
            return Ok(None);
        };

        match FileMover::rename_to_stem(&self.source_path, &suggestion.stem, max_probes) {
            Ok(destination) => {
                self.source_path = destination.clone();
                self.last_error = None;
                self.state = PhotoState::Renamed;
                Ok(Some(destination))
            }
            Err(e) => {
                self.last_error = Some(format!("Rename failed: {}", e));
                Err(e)
            }
        }
    }
}

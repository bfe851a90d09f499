use crate::error::RenameError;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Default cap on `_n` suffix probes before giving up on a stem.
pub const DEFAULT_MAX_PROBES: usize = 10_000;

pub struct FileMover;

impl FileMover {
    /// Renames `source` to `{stem}.{ext}` inside its own directory, keeping
    /// the original extension and never replacing an existing entry.
    ///
    /// The destination is claimed with a hard link, so a name taken between
    /// the free-name check and the move is skipped rather than overwritten.
    /// On failure the file stays where it was.
    pub fn rename_to_stem(
        source: &Path,
        stem: &str,
        max_probes: usize,
    ) -> Result<PathBuf, RenameError> {
        let parent = Self::parent_of(source)?;
        let extension = source.extension();

        for suffix in std::iter::once(None).chain((1..=max_probes).map(Some)) {
            let candidate = parent.join(Self::file_name(stem, suffix, extension));
            if Self::is_occupied(&candidate) {
                continue;
            }

            log::info!("Renaming {:?} -> {:?}", source, candidate);

            match Self::claim(source, &candidate) {
                Ok(()) => {
                    if suffix.is_some() {
                        log::warn!(
                            "File conflict detected, used new name: {:?}",
                            candidate.file_name()
                        );
                    }
                    log::info!("Successfully renamed file to {:?}", candidate);
                    return Ok(candidate);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    log::debug!("{:?} appeared before the move, trying next name", candidate);
                }
                Err(e) => {
                    return Err(RenameError::Io {
                        path: source.to_path_buf(),
                        source: e,
                    })
                }
            }
        }

        Err(RenameError::CollisionLimit {
            stem: stem.to_string(),
            limit: max_probes,
        })
    }

    /// Picks the first free name among `stem.ext`, `stem_1.ext`, `stem_2.ext`, ...
    pub fn resolve_target(
        source: &Path,
        stem: &str,
        max_probes: usize,
    ) -> Result<PathBuf, RenameError> {
        let parent = Self::parent_of(source)?;
        let extension = source.extension();

        std::iter::once(None)
            .chain((1..=max_probes).map(Some))
            .map(|suffix| parent.join(Self::file_name(stem, suffix, extension)))
            .find(|candidate| !Self::is_occupied(candidate))
            .ok_or_else(|| RenameError::CollisionLimit {
                stem: stem.to_string(),
                limit: max_probes,
            })
    }

    /// Moves `source` to `destination` only if nothing exists there.
    fn claim(source: &Path, destination: &Path) -> std::io::Result<()> {
        match fs::hard_link(source, destination) {
            Ok(()) => {
                if let Err(e) = fs::remove_file(source) {
                    // Leave the original in place
                    let _ = fs::remove_file(destination);
                    return Err(e);
                }
                Ok(())
            }
            Err(e) if matches!(e.kind(), ErrorKind::AlreadyExists | ErrorKind::NotFound) => Err(e),
            Err(e) => {
                // Filesystems without hard links (FAT, some network mounts)
                log::debug!("Hard link failed ({}), falling back to rename", e);
                if Self::is_occupied(destination) {
                    return Err(ErrorKind::AlreadyExists.into());
                }
                fs::rename(source, destination)
            }
        }
    }

    /// True for any directory entry, including dangling symlinks.
    fn is_occupied(path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn parent_of(source: &Path) -> Result<&Path, RenameError> {
        source
            .parent()
            .ok_or_else(|| RenameError::InvalidPath(source.to_path_buf()))
    }

    fn file_name(stem: &str, suffix: Option<usize>, extension: Option<&OsStr>) -> OsString {
        let mut name = OsString::from(match suffix {
            Some(n) => format!("{}_{}", stem, n),
            None => stem.to_string(),
        });
        if let Some(extension) = extension {
            name.push(".");
            name.push(extension);
        }
        name
    }
}

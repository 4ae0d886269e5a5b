// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! C3 — walk a directory of device nodes and keep the highest-scoring one.

use std::path::Path;

use log::info;

use crate::error::DeviceError;

use super::probe::{outscores, probe_device, ProbedDevice};

/// Walks every entry in `root` (default `/dev/input`), probing each one and
/// keeping the single highest-scoring multi-touch candidate. A failure to
/// open the directory itself is fatal; per-entry probe failures are not.
pub fn select_device(root: &Path) -> Result<Option<ProbedDevice>, DeviceError> {
    let entries = std::fs::read_dir(root).map_err(|source| DeviceError::ScanFailed {
        root: root.to_path_buf(),
        source,
    })?;

    let mut best: Option<ProbedDevice> = None;

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(candidate) = probe_device(&path) else {
            continue;
        };

        match &best {
            Some(incumbent) if !outscores(candidate.score, incumbent.score) => {
                info!(
                    "{} was outscored by {} ({} >= {})",
                    candidate.path.display(),
                    incumbent.path.display(),
                    incumbent.score,
                    candidate.score
                );
            }
            Some(incumbent) => {
                info!(
                    "{} was outscored by {} ({} >= {})",
                    incumbent.path.display(),
                    candidate.path.display(),
                    candidate.score,
                    incumbent.score
                );
                best = Some(candidate);
            }
            None => {
                best = Some(candidate);
            }
        }
    }

    Ok(best)
}

/// Probes exactly one explicit path (the `-d` flag). A mismatch here is
/// fatal to the caller, unlike a mismatch during the directory walk.
pub fn select_explicit(path: &Path) -> Result<ProbedDevice, DeviceError> {
    probe_device(path).ok_or_else(|| DeviceError::NotSupported {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scanning_an_empty_directory_yields_no_candidate() {
        let dir = std::env::temp_dir().join("minitouchd-select-test-empty");
        std::fs::create_dir_all(&dir).unwrap();
        let result = select_device(&dir).unwrap();
        assert!(result.is_none());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn scanning_a_missing_directory_is_fatal() {
        let result = select_device(Path::new("/nonexistent/minitouchd-select-test"));
        assert!(result.is_err());
    }
}

//! Output path selection.
//!
//! Clips are named `recording-<N>.mp4` with `N >= 1`. The next number is
//! one past the highest existing one, so gaps left by deletions are
//! preserved and no file is ever overwritten.

use std::path::{Path, PathBuf};

use pushclip_common::error::PushclipResult;

/// Parse `recording-<N>.mp4` into `N`.
pub fn parse_recording_number(name: &str) -> Option<u32> {
    name.strip_prefix("recording-")?
        .strip_suffix(".mp4")?
        .parse()
        .ok()
}

/// The next free recording path in a project directory.
pub fn next_recording_path(project_dir: &Path) -> PushclipResult<PathBuf> {
    let mut max = 0u32;
    if project_dir.exists() {
        for dirent in std::fs::read_dir(project_dir)? {
            let dirent = dirent?;
            if let Some(n) = dirent
                .file_name()
                .to_str()
                .and_then(parse_recording_number)
            {
                max = max.max(n);
            }
        }
    }
    Ok(project_dir.join(format!("recording-{}.mp4", max + 1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_directory_starts_at_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = next_recording_path(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "recording-1.mp4");
    }

    #[test]
    fn gaps_are_preserved() {
        let dir = tempfile::tempdir().unwrap();
        for n in [1, 2, 4] {
            std::fs::write(dir.path().join(format!("recording-{n}.mp4")), b"x").unwrap();
        }
        let path = next_recording_path(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "recording-5.mp4");
    }

    #[test]
    fn unrelated_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("my-clip.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("recording-x.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("recording-7.mov"), b"x").unwrap();
        std::fs::write(dir.path().join("recording-3.mp4"), b"x").unwrap();
        let path = next_recording_path(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "recording-4.mp4");
    }

    #[test]
    fn missing_directory_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = next_recording_path(&dir.path().join("ghost")).unwrap();
        assert_eq!(path.file_name().unwrap(), "recording-1.mp4");
    }

    #[test]
    fn parse_accepts_padded_numbers() {
        assert_eq!(parse_recording_number("recording-007.mp4"), Some(7));
        assert_eq!(parse_recording_number("recording-12.mp4"), Some(12));
        assert_eq!(parse_recording_number("recording-.mp4"), None);
        assert_eq!(parse_recording_number("clip-1.mp4"), None);
    }
}

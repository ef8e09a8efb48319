//! Optional win/lose overlay art: plain-text banners loaded from disk.
//!
//! Art is decoration only. Any load failure is logged and the banner is skipped.

use std::path::Path;
use thiserror::Error;

/// Longest banner kept; anything taller would push the overlay text off small terminals.
pub const MAX_ART_LINES: usize = 12;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("art file is empty: {0}")]
    Empty(String),
}

/// Banners drawn above the win/lose message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayArt {
    pub win: Option<Vec<String>>,
    pub lose: Option<Vec<String>>,
}

impl OverlayArt {
    /// Load whichever banners were given. Never fails.
    pub fn load(win: Option<&Path>, lose: Option<&Path>) -> Self {
        Self {
            win: win.and_then(|p| load_or_warn(p, "win")),
            lose: lose.and_then(|p| load_or_warn(p, "lose")),
        }
    }

    /// Banner for the finished game, if one loaded.
    pub fn for_outcome(&self, win: bool) -> Option<&[String]> {
        if win {
            self.win.as_deref()
        } else {
            self.lose.as_deref()
        }
    }
}

fn load_or_warn(path: &Path, which: &str) -> Option<Vec<String>> {
    match load_art(path) {
        Ok(lines) => {
            tracing::debug!(path = %path.display(), lines = lines.len(), "loaded {which} art");
            Some(lines)
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "skipping {which} art");
            None
        }
    }
}

/// Read a banner: trailing whitespace and blank edge lines are dropped, height is capped.
pub fn load_art(path: &Path) -> Result<Vec<String>, AssetError> {
    let text = std::fs::read_to_string(path)?;
    let mut lines: Vec<String> = text
        .lines()
        .map(|l| l.trim_end().to_string())
        .skip_while(String::is_empty)
        .collect();
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    if lines.is_empty() {
        return Err(AssetError::Empty(path.display().to_string()));
    }
    lines.truncate(MAX_ART_LINES);
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("stackertui-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_art_trims_blank_edges() {
        let path = temp_file("win.txt", "\n\n  \\o/  \n   |\n  / \\\n\n");
        let lines = load_art(&path).unwrap();
        assert_eq!(lines, vec!["  \\o/", "   |", "  / \\"]);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_load_art_caps_height() {
        let body = "x\n".repeat(MAX_ART_LINES + 5);
        let path = temp_file("tall.txt", &body);
        assert_eq!(load_art(&path).unwrap().len(), MAX_ART_LINES);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_empty_art_is_an_error() {
        let path = temp_file("empty.txt", "\n   \n");
        assert!(matches!(load_art(&path), Err(AssetError::Empty(_))));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_missing_art_is_skipped() {
        let missing = std::env::temp_dir().join("stackertui-definitely-missing.txt");
        let good = temp_file("lose.txt", "GAME\nOVER\n");
        let art = OverlayArt::load(Some(missing.as_path()), Some(good.as_path()));
        assert_eq!(art.win, None);
        assert_eq!(art.for_outcome(true), None);
        assert_eq!(
            art.for_outcome(false),
            Some(&["GAME".to_string(), "OVER".to_string()][..])
        );
        std::fs::remove_file(good).unwrap();
    }
}

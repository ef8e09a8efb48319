//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const STACK_RED: Color = Color::Rgb(0xFF, 0x33, 0x33);
const GRID_GREY: Color = Color::Rgb(0x33, 0x33, 0x33);
const BLACK: Color = Color::Rgb(0x00, 0x00, 0x00);
const WHITE: Color = Color::Rgb(0xFF, 0xFF, 0xFF);

/// Colours for the field, blocks and overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Placed blocks.
    pub stack: Color,
    /// The sweeping block.
    pub active: Color,
    /// Grid marks and borders.
    pub grid: Color,
    /// Field background.
    pub bg: Color,
    /// Overlay and sidebar text.
    pub text: Color,
    /// Titles and labels.
    pub title: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

impl Theme {
    /// Red blocks on black with a dark grid.
    pub fn classic() -> Self {
        Self {
            stack: STACK_RED,
            active: STACK_RED,
            grid: GRID_GREY,
            bg: BLACK,
            text: WHITE,
            title: STACK_RED,
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to the classic theme if path is None or the file is missing.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Like `load`, but an unreadable file is logged and the palette's default is used.
    pub fn load_or_default(path: Option<&Path>, palette: crate::Palette) -> Self {
        Self::load(path, palette).unwrap_or_else(|err| {
            tracing::warn!(%err, "theme not loaded, using defaults");
            Self::default_for_palette(palette)
        })
    }

    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::classic();
        t.apply_palette(palette);
        t
    }

    /// Override block colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.stack = Color::Rgb(0xFF, 0xFF, 0x00);
                self.active = Color::Rgb(0x00, 0xFF, 0xFF);
                self.grid = Color::Rgb(0x80, 0x80, 0x80);
            }
            crate::Palette::Colorblind => {
                // blue / orange pair reads under the common deficiencies
                self.stack = Color::Rgb(0x00, 0x77, 0xBB);
                self.active = Color::Rgb(0xEE, 0x77, 0x33);
            }
        }
    }

    /// Own keys first, then the closest btop keys so stock btop themes work unchanged.
    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let defaults = Self::classic();
        let stack = get("stack")
            .or_else(|| get("cpu_end"))
            .unwrap_or(defaults.stack);
        Self {
            stack,
            active: get("active").or_else(|| get("hi_fg")).unwrap_or(stack),
            grid: get("grid").or_else(|| get("div_line")).unwrap_or(defaults.grid),
            bg: get("bg").or_else(|| get("main_bg")).unwrap_or(defaults.bg),
            text: get("text").or_else(|| get("main_fg")).unwrap_or(defaults.text),
            title: get("title").unwrap_or(defaults.title),
        }
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'').to_string();
            if !value.is_empty() {
                map.insert(key.to_string(), value);
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    if !s.is_ascii() {
        return Err(ThemeError::InvalidHex(s.to_string()));
    }
    let channel = |part: &str| {
        u8::from_str_radix(part, 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))
    };
    let (r, g, b) = match s.len() {
        6 => (channel(&s[0..2])?, channel(&s[2..4])?, channel(&s[4..6])?),
        3 => (
            channel(&s[0..1])? * 17,
            channel(&s[1..2])? * 17,
            channel(&s[2..3])? * 17,
        ),
        _ => return Err(ThemeError::InvalidHex(s.to_string())),
    };
    Ok(Color::Rgb(r, g, b))
}

//! Fonts, script runs and text measurement.

use std::path::Path;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};

use super::target::{FontWeight, TextStyle};
use crate::config::FontConfig;
use crate::error::ConfigError;

const ELLIPSIS: char = '\u{2026}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Latin,
    Devanagari,
}

fn is_devanagari(c: char) -> bool {
    matches!(c, '\u{0900}'..='\u{097F}' | '\u{A8E0}'..='\u{A8FF}')
}

fn is_neutral(c: char) -> bool {
    c.is_whitespace() || c.is_ascii_punctuation()
}

/// Splits text into runs of one script. Spaces and ASCII punctuation stay
/// with the run they follow.
pub fn script_runs(text: &str) -> Vec<(Script, &str)> {
    let mut runs = Vec::new();
    let mut current: Option<(Script, usize)> = None;

    for (idx, c) in text.char_indices() {
        if is_neutral(c) {
            continue;
        }
        let script = if is_devanagari(c) {
            Script::Devanagari
        } else {
            Script::Latin
        };
        match current {
            Some((s, _)) if s == script => {}
            Some((s, start)) => {
                runs.push((s, &text[start..idx]));
                current = Some((script, idx));
            }
            None => current = Some((script, 0)),
        }
    }

    match current {
        Some((s, start)) => runs.push((s, &text[start..])),
        None if !text.is_empty() => runs.push((Script::Latin, text)),
        None => {}
    }
    runs
}

pub trait TextMetrics {
    /// Advance width of `text` in card units.
    fn text_width(&self, text: &str, style: &TextStyle) -> f32;
}

/// Fixed-ratio estimate used when no font is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxMetrics;

fn approx_width(text: &str, style: &TextStyle) -> f32 {
    let ratio = match style.weight {
        FontWeight::Regular => 0.55,
        FontWeight::Bold => 0.6,
    };
    text.chars().count() as f32 * style.size * ratio
}

impl TextMetrics for ApproxMetrics {
    fn text_width(&self, text: &str, style: &TextStyle) -> f32 {
        approx_width(text, style)
    }
}

/// Loaded card fonts, one per script.
#[derive(Clone, Default)]
pub struct FontSet {
    pub latin: Option<FontArc>,
    pub devanagari: Option<FontArc>,
}

impl std::fmt::Debug for FontSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSet")
            .field("latin", &self.latin.is_some())
            .field("devanagari", &self.devanagari.is_some())
            .finish()
    }
}

pub fn load_font(path: &Path) -> Result<FontArc, ConfigError> {
    let bytes = std::fs::read(path).map_err(|e| ConfigError::Font {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    FontArc::try_from_vec(bytes).map_err(|e| ConfigError::Font {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// DejaVu Sans, used for Latin text when no font is configured. It has no
/// Devanagari glyphs.
const BUNDLED_LATIN: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

pub fn bundled_latin_font() -> Option<FontArc> {
    match FontArc::try_from_slice(BUNDLED_LATIN) {
        Ok(font) => Some(font),
        Err(e) => {
            tracing::warn!(error = %e, "Bundled card font unreadable");
            None
        }
    }
}

impl FontSet {
    /// Loads the configured fonts. Latin text falls back to the bundled
    /// font; Devanagari text is only drawn with a configured font.
    pub fn load(config: &FontConfig) -> Self {
        let load = |path: &Option<String>, script: &str| -> Option<FontArc> {
            let path = path.as_deref()?;
            match load_font(Path::new(path)) {
                Ok(font) => Some(font),
                Err(e) => {
                    tracing::warn!(script, error = %e, "Card font unavailable");
                    None
                }
            }
        };

        let devanagari = load(&config.devanagari, "devanagari");
        if devanagari.is_none() {
            tracing::warn!("No Devanagari card font configured, Hindi text will be left out");
        }

        Self {
            latin: load(&config.latin, "latin").or_else(bundled_latin_font),
            devanagari,
        }
    }

    pub fn font_for(&self, script: Script) -> Option<&FontArc> {
        match script {
            Script::Latin => self.latin.as_ref(),
            Script::Devanagari => self.devanagari.as_ref(),
        }
    }
}

/// Pixel scale that makes `size` the em size, as CSS font sizes are.
pub fn px_scale(font: &FontArc, size: f32) -> PxScale {
    font.pt_to_px_scale(size).unwrap_or(PxScale::from(size))
}

pub fn font_text_width(font: &FontArc, text: &str, size: f32) -> f32 {
    let scaled = font.as_scaled(px_scale(font, size));
    let mut width = 0.0;
    let mut previous = None;
    for c in text.chars() {
        let glyph = scaled.glyph_id(c);
        if let Some(prev) = previous {
            width += scaled.kern(prev, glyph);
        }
        width += scaled.h_advance(glyph);
        previous = Some(glyph);
    }
    width
}

impl TextMetrics for FontSet {
    fn text_width(&self, text: &str, style: &TextStyle) -> f32 {
        script_runs(text)
            .into_iter()
            .map(|(script, run)| match self.font_for(script) {
                Some(font) => font_text_width(font, run, style.size),
                None => approx_width(run, style),
            })
            .sum()
    }
}

/// Cuts `text` so it fits in `max_width`, ending with an ellipsis when
/// anything was removed.
pub fn truncate_to_width(
    metrics: &dyn TextMetrics,
    text: &str,
    style: &TextStyle,
    max_width: f32,
) -> String {
    if metrics.text_width(text, style) <= max_width {
        return text.to_string();
    }

    let chars: Vec<char> = text.chars().collect();
    let mut keep = chars.len();
    while keep > 0 {
        keep -= 1;
        let candidate: String = chars[..keep]
            .iter()
            .collect::<String>()
            .trim_end()
            .chars()
            .chain(std::iter::once(ELLIPSIS))
            .collect();
        if metrics.text_width(&candidate, style) <= max_width {
            return candidate;
        }
    }
    ELLIPSIS.to_string()
}

/// Greedy word wrap. Words wider than a whole line are broken between
/// characters.
pub fn wrap_text(
    metrics: &dyn TextMetrics,
    text: &str,
    style: &TextStyle,
    max_width: f32,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", line, word)
        };
        if metrics.text_width(&candidate, style) <= max_width {
            line = candidate;
            continue;
        }

        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }

        if metrics.text_width(word, style) <= max_width {
            line = word.to_string();
        } else {
            for c in word.chars() {
                let mut next = line.clone();
                next.push(c);
                if !line.is_empty() && metrics.text_width(&next, style) > max_width {
                    lines.push(std::mem::take(&mut line));
                    line.push(c);
                } else {
                    line = next;
                }
            }
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

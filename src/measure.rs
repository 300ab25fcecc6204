use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use unicode_width::UnicodeWidthStr;

/// CSS-like font description handed to a [`TextMeasure`].
///
/// Serialized as the `"12px sans-serif"` shorthand; the `{size, family}`
/// object form is accepted on input too.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub size: f64,
    pub family: String,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            size: 12.0,
            family: "sans-serif".to_string(),
        }
    }
}

impl fmt::Display for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px {}", self.size, self.family)
    }
}

impl Font {
    pub fn new(size: f64, family: impl Into<String>) -> Self {
        Self {
            size,
            family: family.into(),
        }
    }

    /// Parse the `"<size>px <family>"` shorthand.
    pub fn parse(s: &str) -> Option<Self> {
        let (size, family) = s.trim().split_once(char::is_whitespace)?;
        let size: f64 = size.strip_suffix("px")?.parse().ok()?;
        let family = family.trim().trim_end_matches(',').trim();
        if family.is_empty() || !size.is_finite() || size <= 0.0 {
            return None;
        }
        Some(Self::new(size, family))
    }
}

impl Serialize for Font {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Font {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawFont {
            Shorthand(String),
            Parts { size: f64, family: String },
        }

        match RawFont::deserialize(deserializer)? {
            RawFont::Shorthand(s) => Font::parse(&s)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid font shorthand {s:?}"))),
            RawFont::Parts { size, family } => Ok(Font::new(size, family)),
        }
    }
}

/// Rendered-width capability for label strings.
///
/// `None` means measurement is unavailable; callers fall back to their
/// minimum width.
pub trait TextMeasure {
    fn measure(&self, text: &str, font: &Font) -> Option<f64>;
}

impl<F> TextMeasure for F
where
    F: Fn(&str, &Font) -> Option<f64>,
{
    fn measure(&self, text: &str, font: &Font) -> Option<f64> {
        self(text, font)
    }
}

/// Headless approximation: every display column is a fixed fraction of
/// the font size wide.
#[derive(Debug, Clone)]
pub struct TextMetrics {
    /// Column width as a multiple of the font size
    pub char_width_em: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self { char_width_em: 0.6 }
    }
}

impl TextMetrics {
    pub fn text_width(&self, text: &str, font: &Font) -> f64 {
        let width = UnicodeWidthStr::width(text);
        width as f64 * font.size * self.char_width_em
    }
}

impl TextMeasure for TextMetrics {
    fn measure(&self, text: &str, font: &Font) -> Option<f64> {
        Some(self.text_width(text, font))
    }
}

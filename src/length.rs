use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

static PIXELS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)([+-]?(?:\d+\.?\d*|\.\d+)(?:e[+-]?\d+)?)(?:px)?$").unwrap()
});
static PERCENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)([+-]?(?:\d+\.?\d*|\.\d+)(?:e[+-]?\d+)?)%$").unwrap());

/// A persisted style length, parsed once at the input boundary so the
/// geometry code only ever sees pixels.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub enum Length {
    Pixels(f64),
    #[default]
    Auto,
    Percent(f64),
    /// Token references (`var(--x)`), `calc()`, relative units and other
    /// values the engine cannot place. The original text is kept for
    /// diagnostics.
    Unresolved(String),
}

impl Length {
    pub fn parse(raw: &str) -> Self {
        let value = raw.trim();
        if value.eq_ignore_ascii_case("auto") {
            return Length::Auto;
        }
        if let Some(caps) = PIXELS_RE.captures(value) {
            if let Some(px) = parse_finite(&caps[1]) {
                return Length::Pixels(px);
            }
        }
        if let Some(caps) = PERCENT_RE.captures(value) {
            if let Some(pct) = parse_finite(&caps[1]) {
                return Length::Percent(pct);
            }
        }
        Length::Unresolved(raw.to_string())
    }

    pub fn from_number(value: f64) -> Self {
        if value.is_finite() {
            Length::Pixels(value)
        } else {
            Length::Unresolved(value.to_string())
        }
    }

    /// Pixel value of this length. Percentages need the container extent on
    /// the same axis; without it they stay unresolved.
    pub fn resolve(&self, basis: Option<f64>) -> Option<f64> {
        match self {
            Length::Pixels(px) => Some(*px),
            Length::Percent(pct) => basis
                .filter(|b| b.is_finite())
                .map(|b| b * pct / 100.0),
            Length::Auto | Length::Unresolved(_) => None,
        }
    }
}

fn parse_finite(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

impl<'de> Deserialize<'de> for Length {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
            Null(()),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Length::from_number(value),
            Raw::Text(text) => Length::parse(&text),
            Raw::Null(()) => Length::Auto,
        })
    }
}

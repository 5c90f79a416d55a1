//! Stream selection according to the user's quality and format preference

use crate::extractor::models::{FormatClass, QualityClass, StreamDescriptor};
use crate::utils::error::SelectionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, instrument};

/// Desired quality: a ranking extreme or one exact class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum QualityPreference {
    #[default]
    Best,
    Worst,
    Exactly(QualityClass),
}

impl FromStr for QualityPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "best" | "max" => Ok(QualityPreference::Best),
            "worst" | "min" => Ok(QualityPreference::Worst),
            "unknown" => Ok(QualityPreference::Exactly(QualityClass::Unknown)),
            other => match QualityClass::from_token(other) {
                QualityClass::Unknown => Err(format!("unknown quality '{}'", s)),
                class => Ok(QualityPreference::Exactly(class)),
            },
        }
    }
}

impl TryFrom<String> for QualityPreference {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<QualityPreference> for String {
    fn from(value: QualityPreference) -> Self {
        value.to_string()
    }
}

impl fmt::Display for QualityPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityPreference::Best => f.write_str("best"),
            QualityPreference::Worst => f.write_str("worst"),
            QualityPreference::Exactly(class) => fmt::Display::fmt(class, f),
        }
    }
}

/// Desired container, or any
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FormatPreference {
    #[default]
    Any,
    Exactly(FormatClass),
}

impl FromStr for FormatPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("any") {
            return Ok(FormatPreference::Any);
        }
        s.parse().map(FormatPreference::Exactly)
    }
}

impl TryFrom<String> for FormatPreference {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FormatPreference> for String {
    fn from(value: FormatPreference) -> Self {
        value.to_string()
    }
}

impl fmt::Display for FormatPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatPreference::Any => f.write_str("any"),
            FormatPreference::Exactly(class) => fmt::Display::fmt(class, f),
        }
    }
}

impl FormatPreference {
    fn accepts(&self, format: FormatClass) -> bool {
        match self {
            FormatPreference::Any => true,
            FormatPreference::Exactly(wanted) => *wanted == format,
        }
    }
}

/// Selection preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Preference {
    #[serde(default)]
    pub quality: QualityPreference,
    #[serde(default)]
    pub format: FormatPreference,
}

impl Preference {
    pub fn new(quality: QualityPreference, format: FormatPreference) -> Self {
        Self { quality, format }
    }

    fn no_match(&self) -> SelectionError {
        SelectionError::NoMatchingStream {
            quality: self.quality.to_string(),
            format: self.format.to_string(),
        }
    }
}

/// Pick exactly one stream from `streams`.
///
/// Among equally ranked candidates the one listed first wins.
#[instrument(skip(streams), fields(streams = streams.len()))]
pub fn select_stream<'a>(
    streams: &'a [StreamDescriptor],
    pref: &Preference,
) -> Result<&'a StreamDescriptor, SelectionError> {
    if streams.is_empty() {
        return Err(SelectionError::EmptyStreamList);
    }

    let candidates: Vec<&StreamDescriptor> = streams
        .iter()
        .filter(|s| pref.format.accepts(s.format()))
        .collect();
    debug!("{} streams match format '{}'", candidates.len(), pref.format);

    let selected = match pref.quality {
        QualityPreference::Exactly(wanted) => {
            candidates.into_iter().find(|s| s.quality() == wanted)
        }
        // `Iterator::max_by_key` keeps the last maximum, so fold by hand to
        // keep the first one
        QualityPreference::Best => candidates
            .into_iter()
            .fold(None, |best: Option<&StreamDescriptor>, s| match best {
                Some(b) if b.quality() >= s.quality() => Some(b),
                _ => Some(s),
            }),
        QualityPreference::Worst => candidates.into_iter().min_by_key(|s| s.quality()),
    };

    let stream = selected.ok_or_else(|| pref.no_match())?;
    debug!("Selected stream: {}", stream);
    Ok(stream)
}

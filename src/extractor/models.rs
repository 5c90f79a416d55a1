//! Data structures for decoded stream information

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse resolution tier advertised by a stream.
///
/// Variants are declared from worst to best so the derived `Ord` is the
/// ranking used by the selector: `Unknown < Small < ... < Highres`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityClass {
    Unknown,
    Small,
    Medium,
    Large,
    Hd720,
    Hd1080,
    Highres,
}

impl QualityClass {
    /// Classify a raw `quality` token. Unmapped tokens are `Unknown`.
    pub fn from_token(token: &str) -> Self {
        match token {
            "highres" => QualityClass::Highres,
            "hd1080" => QualityClass::Hd1080,
            "hd720" => QualityClass::Hd720,
            "large" => QualityClass::Large,
            "medium" => QualityClass::Medium,
            "small" => QualityClass::Small,
            _ => QualityClass::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityClass::Highres => "highres",
            QualityClass::Hd1080 => "hd1080",
            QualityClass::Hd720 => "hd720",
            QualityClass::Large => "large",
            QualityClass::Medium => "medium",
            QualityClass::Small => "small",
            QualityClass::Unknown => "unknown",
        }
    }
}

impl fmt::Display for QualityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Container family of a stream, inferred from its MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatClass {
    Mp4,
    Webm,
    Flv,
    #[serde(rename = "3gp")]
    ThreeGp,
    Unknown,
}

impl FormatClass {
    /// Classify a MIME-like `type` value such as `video/mp4; codecs="avc1"`.
    ///
    /// Only the media type before the first `;` is inspected, so codec
    /// parameters can never cause a false match.
    pub fn from_mime(mime: &str) -> Self {
        let media_type = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if media_type.contains("mp4") {
            FormatClass::Mp4
        } else if media_type.contains("webm") {
            FormatClass::Webm
        } else if media_type.contains("flv") {
            FormatClass::Flv
        } else if media_type.contains("3gp") {
            FormatClass::ThreeGp
        } else {
            FormatClass::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FormatClass::Mp4 => "mp4",
            FormatClass::Webm => "webm",
            FormatClass::Flv => "flv",
            FormatClass::ThreeGp => "3gp",
            FormatClass::Unknown => "unknown",
        }
    }

    /// File extension used when naming the output
    pub fn extension(&self) -> &'static str {
        match self {
            FormatClass::Unknown => "bin",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for FormatClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mp4" => Ok(FormatClass::Mp4),
            "webm" => Ok(FormatClass::Webm),
            "flv" => Ok(FormatClass::Flv),
            "3gp" | "3gpp" => Ok(FormatClass::ThreeGp),
            "unknown" => Ok(FormatClass::Unknown),
            other => Err(format!("unknown format '{}'", other)),
        }
    }
}

/// One downloadable rendition of a video.
///
/// Raw fields are kept verbatim; `quality()` and `format()` classify them on
/// demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub quality: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub url: String,
    #[serde(default)]
    pub signature: String,
    pub title: String,
    pub author: String,
}

/// Decoded streams in the order the server listed them
pub type StreamList = Vec<StreamDescriptor>;

impl StreamDescriptor {
    pub fn quality(&self) -> QualityClass {
        QualityClass::from_token(&self.quality)
    }

    pub fn format(&self) -> FormatClass {
        FormatClass::from_mime(&self.mime_type)
    }

    pub fn extension(&self) -> &'static str {
        self.format().extension()
    }

    /// Media URL with the signature attached as a `signature` query parameter.
    ///
    /// Returns the raw URL unchanged when no signature is needed or when the
    /// URL cannot be parsed.
    pub fn signed_url(&self) -> String {
        if self.signature.is_empty() {
            return self.url.clone();
        }
        match Url::parse(&self.url) {
            Ok(mut url) => {
                url.query_pairs_mut()
                    .append_pair("signature", &self.signature);
                url.to_string()
            }
            Err(_) => self.url.clone(),
        }
    }
}

impl fmt::Display for StreamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "quality '{}' ({}), format '{}' ({})",
            self.quality,
            self.quality(),
            self.mime_type,
            self.format()
        )
    }
}

//! Decoder for the `get_video_info` answer
//!
//! The answer is a URL-encoded query string. One of its fields,
//! `url_encoded_fmt_stream_map`, is itself a comma-separated list of
//! URL-encoded query strings, one per stream. The outer layer is decoded
//! all-or-nothing; the inner layer is decoded best-effort, stream by stream.

use crate::extractor::models::{FormatClass, QualityClass, StreamDescriptor, StreamList};
use crate::utils::error::DecodeError;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, instrument};
use url::form_urlencoded;

/// Field holding the nested stream list
pub const STREAM_MAP_FIELD: &str = "url_encoded_fmt_stream_map";

const ANSWER_FIELDS: [&str; 4] = ["status", STREAM_MAP_FIELD, "title", "author"];
const STREAM_FIELDS: [&str; 3] = ["quality", "type", "url"];

/// Field name to values, as found in a query string
pub type RawAnswer = HashMap<String, Vec<String>>;

/// Why a single stream entry was left out of the result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Unparseable(String),
    MissingField(&'static str),
    EmptyField(&'static str),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unparseable(e) => write!(f, "unparseable entry: {}", e),
            SkipReason::MissingField(field) => write!(f, "field '{}' is missing", field),
            SkipReason::EmptyField(field) => write!(f, "field '{}' is empty", field),
        }
    }
}

/// Parse a URL-encoded query string.
///
/// Pairs are separated by `&`; a pair without `=` has an empty value.
/// Rejects `;` separators, malformed `%` escapes and non UTF-8 payloads.
pub fn parse_query(raw: &str) -> Result<RawAnswer, String> {
    for pair in raw.split('&').filter(|pair| !pair.is_empty()) {
        if pair.contains(';') {
            return Err(format!("invalid semicolon separator in '{}'", pair));
        }
        check_escapes(pair)?;
    }

    let mut answer = RawAnswer::new();
    for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
        answer.entry(key.into_owned()).or_default().push(value.into_owned());
    }
    Ok(answer)
}

// `form_urlencoded` is lenient: it passes bad escapes through and replaces
// invalid UTF-8, so both are caught here first
fn check_escapes(pair: &str) -> Result<(), String> {
    let bytes = pair.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .map_or(false, |hex| hex.iter().all(|b| b.is_ascii_hexdigit()));
            if !valid {
                return Err(format!("invalid URL escape in '{}'", pair));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    let decoded = urlencoding::decode_binary(bytes);
    std::str::from_utf8(&decoded)
        .map(|_| ())
        .map_err(|e| format!("invalid UTF-8 in '{}': {}", pair, e))
}

/// Return the first of `fields` absent from `source`, if any
pub fn ensure_fields<'a>(source: &RawAnswer, fields: &[&'a str]) -> Option<&'a str> {
    fields.iter().copied().find(|field| !source.contains_key(*field))
}

fn first<'a>(source: &'a RawAnswer, field: &str) -> Option<&'a str> {
    source
        .get(field)
        .and_then(|values| values.first())
        .map(String::as_str)
}

fn file_safe(value: &str) -> String {
    value.replace('/', "_")
}

/// Decode a raw `get_video_info` answer into the streams it advertises.
///
/// An empty list is a valid result: every stream entry may have been
/// skipped. Reporting that is left to the selector.
#[instrument(skip(response), fields(bytes = response.len()))]
pub fn decode_video_info(response: &str) -> Result<StreamList, DecodeError> {
    let answer = parse_query(response).map_err(DecodeError::MalformedResponse)?;

    if let Some(missing) = ensure_fields(&answer, &ANSWER_FIELDS) {
        return Err(DecodeError::MissingField(missing.to_string()));
    }

    let status = first(&answer, "status").unwrap_or_default();
    if status == "fail" {
        let reason = first(&answer, "reason").unwrap_or("no reason given");
        return Err(DecodeError::UpstreamRejected(reason.to_string()));
    }
    if status != "ok" {
        return Err(DecodeError::UnexpectedStatus(status.to_string()));
    }

    debug!("Server answered with a success code");

    let title = file_safe(first(&answer, "title").unwrap_or_default());
    let author = file_safe(first(&answer, "author").unwrap_or_default());
    let stream_map = first(&answer, STREAM_MAP_FIELD).unwrap_or_default();

    let entries: Vec<&str> = stream_map.split(',').collect();
    debug!("Found {} streams in answer", entries.len());

    let mut streams = StreamList::with_capacity(entries.len());
    for (position, entry) in entries.into_iter().enumerate() {
        match decode_stream(entry, &title, &author) {
            Ok(stream) => {
                debug!("Stream found: {}", stream);
                streams.push(stream);
            }
            Err(reason) => debug!("Skipping stream {}: {}", position, reason),
        }
    }

    debug!("Successfully decoded {} streams", streams.len());
    Ok(streams)
}

fn decode_stream(entry: &str, title: &str, author: &str) -> Result<StreamDescriptor, SkipReason> {
    let fields = parse_query(entry).map_err(SkipReason::Unparseable)?;

    if let Some(missing) = ensure_fields(&fields, &STREAM_FIELDS) {
        return Err(SkipReason::MissingField(missing));
    }
    if let Some(empty) = STREAM_FIELDS
        .iter()
        .copied()
        .find(|field| first(&fields, field).map_or(true, str::is_empty))
    {
        return Err(SkipReason::EmptyField(empty));
    }

    // `sig` is the older name; `signature` wins when both are present
    let signature = first(&fields, "signature")
        .or_else(|| first(&fields, "sig"))
        .unwrap_or_default();

    let stream = StreamDescriptor {
        quality: first(&fields, "quality").unwrap_or_default().to_string(),
        mime_type: first(&fields, "type").unwrap_or_default().to_string(),
        url: first(&fields, "url").unwrap_or_default().to_string(),
        signature: signature.to_string(),
        title: title.to_string(),
        author: author.to_string(),
    };

    if stream.quality() == QualityClass::Unknown {
        debug!("Found unknown quality '{}'", stream.quality);
    }
    if stream.format() == FormatClass::Unknown {
        debug!("Found unknown format '{}'", stream.mime_type);
    }

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(stream_map: &str, extra: &str) -> String {
        format!(
            "status=ok&{}={}&title=Foo&author=Bar{}",
            STREAM_MAP_FIELD,
            urlencoding::encode(stream_map),
            extra
        )
    }

    #[test]
    fn test_parse_query_basic() {
        let parsed = parse_query("a=1&b=two+words&c=%2Fslash&a=2&flag").unwrap();
        assert_eq!(parsed["a"], vec!["1", "2"]);
        assert_eq!(parsed["b"], vec!["two words"]);
        assert_eq!(parsed["c"], vec!["/slash"]);
        assert_eq!(parsed["flag"], vec![""]);

        let parsed = parse_query("&x=1&&y=a%3Db&").unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["y"], vec!["a=b"]);
    }

    #[test]
    fn test_parse_query_rejects_bad_input() {
        assert!(parse_query("a=%zz").is_err());
        assert!(parse_query("a=%4").is_err());
        assert!(parse_query("a=1;b=2").is_err());
        assert!(parse_query("a=%ff%fe").is_err());
    }

    #[test]
    fn test_ensure_fields() {
        let parsed = parse_query("status=ok&title=x").unwrap();
        assert_eq!(ensure_fields(&parsed, &["status", "title"]), None);
        assert_eq!(ensure_fields(&parsed, &["status", "author", "url"]), Some("author"));
    }

    #[test]
    fn test_decode_two_streams() {
        let raw = answer(
            "quality=hd720&type=video%2Fmp4&url=http%3A%2F%2Fx%2Fa&sig=s1,\
             quality=hd1080&type=video%2Fwebm&url=http%3A%2F%2Fx%2Fb&signature=s2",
            "",
        );
        let streams = decode_video_info(&raw).unwrap();
        assert_eq!(streams.len(), 2);

        assert_eq!(streams[0].quality(), QualityClass::Hd720);
        assert_eq!(streams[0].format(), FormatClass::Mp4);
        assert_eq!(streams[0].url, "http://x/a");
        assert_eq!(streams[0].signature, "s1");

        assert_eq!(streams[1].quality(), QualityClass::Hd1080);
        assert_eq!(streams[1].format(), FormatClass::Webm);
        assert_eq!(streams[1].url, "http://x/b");
        assert_eq!(streams[1].signature, "s2");

        assert!(streams.iter().all(|s| s.title == "Foo" && s.author == "Bar"));
    }

    #[test]
    fn test_signature_overrides_sig() {
        let raw = answer("quality=small&type=video%2F3gpp&url=u&signature=B&sig=A", "");
        let streams = decode_video_info(&raw).unwrap();
        assert_eq!(streams[0].signature, "B");
    }

    #[test]
    fn test_missing_signature_is_empty() {
        let raw = answer("quality=small&type=video%2F3gpp&url=u", "");
        let streams = decode_video_info(&raw).unwrap();
        assert_eq!(streams[0].signature, "");
    }

    #[test]
    fn test_skips_incomplete_and_malformed_streams() {
        let raw = answer(
            "quality=hd720&type=video%2Fmp4,\
             quality=medium&type=video%2Fwebm&url=http%3A%2F%2Fx%2Fm,\
             quality=%zz&type=t&url=u",
            "",
        );
        let streams = decode_video_info(&raw).unwrap();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].quality, "medium");
    }

    #[test]
    fn test_skips_streams_with_empty_required_values() {
        let raw = answer(
            "quality=&type=video%2Fmp4&url=u,\
             quality=small&type=&url=u,\
             quality=small&type=video%2Fmp4&url=,\
             quality=large&type=video%2Fwebm&url=v",
            "",
        );
        let streams = decode_video_info(&raw).unwrap();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].url, "v");
        assert!(streams.iter().all(|s| !s.quality.is_empty() && !s.mime_type.is_empty()));
    }

    #[test]
    fn test_empty_field_skip_reason() {
        let fields = parse_query("quality=&type=video%2Fmp4&url=u").unwrap();
        assert_eq!(ensure_fields(&fields, &STREAM_FIELDS), None);
        assert_eq!(
            decode_stream("quality=&type=video%2Fmp4&url=u", "Foo", "Bar"),
            Err(SkipReason::EmptyField("quality"))
        );
    }

    #[test]
    fn test_all_streams_skipped_is_not_an_error() {
        let raw = answer("type=video%2Fmp4,quality=small", "");
        assert_eq!(decode_video_info(&raw).unwrap(), Vec::new());
    }

    #[test]
    fn test_title_and_author_are_file_safe() {
        let raw = format!(
            "status=ok&{}={}&title=AC%2FDC+Live&author=a%2Fb%2Fc",
            STREAM_MAP_FIELD,
            urlencoding::encode("quality=small&type=video%2Fmp4&url=u")
        );
        let streams = decode_video_info(&raw).unwrap();
        assert_eq!(streams[0].title, "AC_DC Live");
        assert_eq!(streams[0].author, "a_b_c");
    }

    #[test]
    fn test_missing_top_level_field() {
        let raw = format!("status=ok&{}=x&title=Foo", STREAM_MAP_FIELD);
        assert_eq!(
            decode_video_info(&raw),
            Err(DecodeError::MissingField("author".to_string()))
        );
        assert_eq!(
            decode_video_info("title=Foo&author=Bar"),
            Err(DecodeError::MissingField("status".to_string()))
        );
    }

    #[test]
    fn test_fail_status() {
        let raw = format!(
            "status=fail&{}=&title=Foo&author=Bar&reason=Video+unavailable",
            STREAM_MAP_FIELD
        );
        assert_eq!(
            decode_video_info(&raw),
            Err(DecodeError::UpstreamRejected("Video unavailable".to_string()))
        );

        let raw = format!("status=fail&{}=&title=Foo&author=Bar", STREAM_MAP_FIELD);
        assert_eq!(
            decode_video_info(&raw),
            Err(DecodeError::UpstreamRejected("no reason given".to_string()))
        );
    }

    #[test]
    fn test_unexpected_status() {
        let raw = format!("status=pending&{}=&title=Foo&author=Bar", STREAM_MAP_FIELD);
        assert_eq!(
            decode_video_info(&raw),
            Err(DecodeError::UnexpectedStatus("pending".to_string()))
        );
    }

    #[test]
    fn test_malformed_top_level() {
        assert!(matches!(
            decode_video_info("status=ok&title=%G1"),
            Err(DecodeError::MalformedResponse(_))
        ));
    }
}

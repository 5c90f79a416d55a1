//! Video id detection from user input

use crate::utils::error::TubeloaderError;

/// Path prefixes that are directly followed by the video id
const ID_PATH_MARKERS: [&str; 4] = ["youtu.be/", "/embed/", "/v/", "/shorts/"];

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_id(rest: &str) -> Option<&str> {
    let end = rest.find(|c: char| !is_id_char(c)).unwrap_or(rest.len());
    let id = &rest[..end];
    (!id.is_empty()).then_some(id)
}

/// Find the video id in a watch URL, a short URL, an embed URL or a bare id.
pub fn find_video_id(input: &str) -> Result<String, TubeloaderError> {
    let input = input.trim();

    // Bare id
    if !input.is_empty() && input.chars().all(is_id_char) {
        return Ok(input.to_string());
    }

    // watch?v=<id>, anywhere in the query
    if let Some((_, query)) = input.split_once('?') {
        let query = query.split('#').next().unwrap_or_default();
        for pair in query.split('&') {
            if let Some(value) = pair.strip_prefix("v=") {
                if let Some(id) = take_id(value) {
                    return Ok(id.to_string());
                }
            }
        }
    }

    for marker in ID_PATH_MARKERS {
        if let Some(pos) = input.find(marker) {
            if let Some(id) = take_id(&input[pos + marker.len()..]) {
                return Ok(id.to_string());
            }
        }
    }

    Err(TubeloaderError::InvalidVideoId(input.to_string()))
}

//! Output file naming from destination templates

use crate::extractor::StreamDescriptor;
use std::path::PathBuf;

const MAX_COMPONENT_LEN: usize = 200;

/// Expand a destination template for the selected stream.
///
/// Recognised placeholders: `%title%`, `%author%`, `%format%` (file
/// extension), `%quality%` and `%id%`. Substituted values are sanitized so they
/// can never introduce a path separator; the rest of the template is kept as
/// typed by the user. The template is scanned once, so placeholder text inside
/// a substituted value is left alone.
pub fn expand_destination(template: &str, stream: &StreamDescriptor, video_id: &str) -> PathBuf {
    let mut expanded = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('%') {
        expanded.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let substituted = after.find('%').and_then(|end| {
            placeholder_value(&after[..end], stream, video_id).map(|value| (end, value))
        });
        match substituted {
            Some((end, value)) => {
                expanded.push_str(&value);
                rest = &after[end + 1..];
            }
            None => {
                expanded.push('%');
                rest = after;
            }
        }
    }
    expanded.push_str(rest);

    PathBuf::from(expanded)
}

fn placeholder_value(name: &str, stream: &StreamDescriptor, video_id: &str) -> Option<String> {
    match name {
        "title" => Some(sanitize_filename(&stream.title)),
        "author" => Some(sanitize_filename(&stream.author)),
        "format" => Some(stream.extension().to_string()),
        "quality" => Some(sanitize_filename(&stream.quality)),
        "id" => Some(sanitize_filename(video_id)),
        _ => None,
    }
}

/// Make a single path component safe on Windows/macOS/Linux filesystems
pub fn sanitize_filename(name: &str) -> String {
    let invalid_chars = ['/', '\\', ':', '*', '?', '"', '<', '>', '|', '\0'];

    // Remove path traversal sequences
    let mut sanitized = name.replace("..", "");

    sanitized = sanitized
        .chars()
        .map(|c| if invalid_chars.contains(&c) || c.is_control() { '_' } else { c })
        .collect();

    // Leading dots would hide the file, trailing dots and spaces break Windows
    sanitized = sanitized.trim().trim_start_matches('.').to_string();
    sanitized = sanitized.trim_end_matches('.').trim_end().to_string();

    while sanitized.contains("__") {
        sanitized = sanitized.replace("__", "_");
    }

    if sanitized.is_empty() {
        return "unnamed".to_string();
    }

    if sanitized.len() > MAX_COMPONENT_LEN {
        let mut end = MAX_COMPONENT_LEN;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized.truncate(end);
    }

    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream() -> StreamDescriptor {
        StreamDescriptor {
            quality: "hd720".to_string(),
            mime_type: "video/webm; codecs=\"vp8.0, vorbis\"".to_string(),
            url: "http://x/a".to_string(),
            signature: String::new(),
            title: "AC_DC: Live?".to_string(),
            author: "Some Channel".to_string(),
        }
    }

    #[test]
    fn test_default_template() {
        let path = expand_destination("./%title%.%format%", &stream(), "abc");
        assert_eq!(path, PathBuf::from("./AC_DC_ Live_.webm"));
    }

    #[test]
    fn test_all_placeholders() {
        let path = expand_destination("out/%author%/%id%-%quality%.%format%", &stream(), "abc");
        assert_eq!(path, PathBuf::from("out/Some Channel/abc-hd720.webm"));
    }

    #[test]
    fn test_placeholders_inside_values_are_not_expanded() {
        let mut s = stream();
        s.title = "My %author% clip".to_string();
        s.author = "Chan".to_string();
        s.mime_type = "video/mp4".to_string();

        let path = expand_destination("%title%.%format%", &s, "abc");
        assert_eq!(path, PathBuf::from("My %author% clip.mp4"));

        s.author = "%id%".to_string();
        let path = expand_destination("%author%-%id%", &s, "abc");
        assert_eq!(path, PathBuf::from("%id%-abc"));
    }

    #[test]
    fn test_unrecognised_percent_text_is_kept() {
        let path = expand_destination("100% %name% %%title%", &stream(), "abc");
        assert_eq!(path, PathBuf::from("100% %name% %AC_DC_ Live_"));
    }

    #[test]
    fn test_template_without_placeholders() {
        let path = expand_destination("video.bin", &stream(), "abc");
        assert_eq!(path, PathBuf::from("video.bin"));
    }

    #[test]
    fn test_sanitize_filename_path_traversal() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "_etc_passwd");
        assert!(!sanitize_filename("a/../b").contains(".."));
    }

    #[test]
    fn test_sanitize_filename_hidden_and_trailing() {
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename("name. "), "name");
    }

    #[test]
    fn test_sanitize_filename_empty() {
        assert_eq!(sanitize_filename(""), "unnamed");
        assert_eq!(sanitize_filename("..."), "unnamed");
    }

    #[test]
    fn test_sanitize_filename_length_is_char_safe() {
        let long_name = "é".repeat(150);
        let result = sanitize_filename(&long_name);
        assert!(result.len() <= MAX_COMPONENT_LEN);
        assert!(result.chars().all(|c| c == 'é'));
    }
}

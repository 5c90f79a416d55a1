//! Property checks for the decoder and the stream selector

use proptest::prelude::*;
use tubeloader::selector::{FormatPreference, Preference, QualityPreference};
use tubeloader::{decode_video_info, select_stream, QualityClass, StreamDescriptor};

const QUALITIES: [&str; 8] = [
    "highres", "hd1080", "hd720", "large", "medium", "small", "tiny", "720p",
];
const MIMES: [&str; 5] = [
    "video/mp4; codecs=\"avc1.64001F, mp4a.40.2\"",
    "video/webm",
    "video/x-flv",
    "video/3gpp",
    "audio/ogg",
];
const STREAM_FIELDS: [&str; 3] = ["quality", "type", "url"];

#[derive(Debug, Clone)]
struct Entry {
    quality: &'static str,
    mime: &'static str,
    /// Index into the required fields to leave out
    dropped: Option<usize>,
}

fn entry() -> impl Strategy<Value = Entry> {
    (
        prop::sample::select(QUALITIES.to_vec()),
        prop::sample::select(MIMES.to_vec()),
        prop::option::of(0..STREAM_FIELDS.len()),
    )
        .prop_map(|(quality, mime, dropped)| Entry {
            quality,
            mime,
            dropped,
        })
}

fn encode_entry(position: usize, entry: &Entry) -> String {
    let url = format!("http://media.example/{}", position);
    let values = [entry.quality, entry.mime, url.as_str()];
    STREAM_FIELDS
        .iter()
        .zip(values)
        .enumerate()
        .filter(|(i, _)| entry.dropped != Some(*i))
        .map(|(_, (field, value))| format!("{}={}", field, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn encode_answer(entries: &[Entry]) -> String {
    let stream_map = entries
        .iter()
        .enumerate()
        .map(|(position, entry)| encode_entry(position, entry))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "status=ok&title=T&author=A&url_encoded_fmt_stream_map={}",
        urlencoding::encode(&stream_map)
    )
}

fn descriptor(position: usize, quality: &str) -> StreamDescriptor {
    StreamDescriptor {
        quality: quality.to_string(),
        mime_type: "video/mp4".to_string(),
        url: format!("http://media.example/{}", position),
        signature: String::new(),
        title: "T".to_string(),
        author: "A".to_string(),
    }
}

proptest! {
    #[test]
    fn complete_entries_decode_in_order(entries in prop::collection::vec(entry(), 1..12)) {
        let complete: Vec<Entry> = entries
            .into_iter()
            .map(|e| Entry { dropped: None, ..e })
            .collect();

        let streams = decode_video_info(&encode_answer(&complete)).unwrap();

        prop_assert_eq!(streams.len(), complete.len());
        for (position, (stream, entry)) in streams.iter().zip(&complete).enumerate() {
            prop_assert_eq!(&stream.url, &format!("http://media.example/{}", position));
            prop_assert_eq!(stream.quality.as_str(), entry.quality);
            prop_assert_eq!(stream.mime_type.as_str(), entry.mime);
        }
    }

    #[test]
    fn incomplete_entries_are_skipped(entries in prop::collection::vec(entry(), 1..12)) {
        let streams = decode_video_info(&encode_answer(&entries)).unwrap();

        let kept: Vec<String> = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.dropped.is_none())
            .map(|(position, _)| format!("http://media.example/{}", position))
            .collect();
        let urls: Vec<String> = streams.iter().map(|s| s.url.clone()).collect();
        prop_assert_eq!(urls, kept);
    }

    #[test]
    fn best_picks_first_of_highest_rank(
        qualities in prop::collection::vec(prop::sample::select(QUALITIES.to_vec()), 1..16)
    ) {
        let streams: Vec<StreamDescriptor> = qualities
            .iter()
            .enumerate()
            .map(|(position, q)| descriptor(position, q))
            .collect();
        let pref = Preference::new(QualityPreference::Best, FormatPreference::Any);

        let selected = select_stream(&streams, &pref).unwrap();

        let top = qualities.iter().map(|q| QualityClass::from_token(q)).max().unwrap();
        let first_top = streams.iter().find(|s| s.quality() == top).unwrap();
        prop_assert_eq!(selected, first_top);

        // selecting again yields the same stream
        prop_assert_eq!(select_stream(&streams, &pref).unwrap(), selected);
    }

    #[test]
    fn worst_picks_first_of_lowest_rank(
        qualities in prop::collection::vec(prop::sample::select(QUALITIES.to_vec()), 1..16)
    ) {
        let streams: Vec<StreamDescriptor> = qualities
            .iter()
            .enumerate()
            .map(|(position, q)| descriptor(position, q))
            .collect();
        let pref = Preference::new(QualityPreference::Worst, FormatPreference::Any);

        let selected = select_stream(&streams, &pref).unwrap();

        let bottom = qualities.iter().map(|q| QualityClass::from_token(q)).min().unwrap();
        let first_bottom = streams.iter().find(|s| s.quality() == bottom).unwrap();
        prop_assert_eq!(selected, first_bottom);
    }

    #[test]
    fn garbage_never_panics(input in ".{0,200}") {
        let _ = decode_video_info(&input);
    }
}

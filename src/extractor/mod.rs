pub mod decoder;
pub mod models;
pub mod traits;
pub mod video_id;
pub mod youtube;

pub use decoder::{decode_video_info, ensure_fields, parse_query, RawAnswer};
pub use models::{FormatClass, QualityClass, StreamDescriptor, StreamList};
pub use traits::InfoFetcher;
pub use video_id::find_video_id;
pub use youtube::YoutubeInfoFetcher;

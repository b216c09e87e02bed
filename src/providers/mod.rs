//! External collaborators.
//!
//! # Data Flow
//! ```text
//! /api/video, /api/search, /api/comments, /api/fvideo
//!     → metadata.rs (MetadataProvider, paging and dedup)
//!     → innertube/ (youtubei v1 client)
//!
//! /api/ytdlp
//!     → manifest.rs (MediaManifestProvider, stream selection)
//!     → ytdlp.rs (extractor subprocess)
//!
//! /api/suggest → suggest.rs
//! /api/stream/{id} → video_info.rs
//! ```

pub mod error;
pub mod innertube;
pub mod manifest;
pub mod metadata;
pub mod suggest;
pub mod video_info;
pub mod ytdlp;

pub use error::ProviderError;
pub use innertube::InnertubeClient;
pub use manifest::{summarize, MediaFormat, MediaManifest, MediaManifestProvider, StreamSummary};
pub use metadata::{
    search_page, video_response, CommentPage, CommentSort, MetadataProvider, Paging, SearchBatch,
    SearchPage, VideoInfo,
};
pub use suggest::SuggestClient;
pub use video_info::{StreamInfo, VideoInfoClient};
pub use ytdlp::YtDlp;

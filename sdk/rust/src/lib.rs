//! Client for the media gateway HTTP API.

mod client;

pub use client::{
    ApiFailure, CommentPage, FormatChoice, GatewayClient, Result, SearchPage, SeparateTracks,
    StreamSummary,
};

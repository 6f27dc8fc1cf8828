pub mod client;
pub mod models;
pub mod sse;

pub use client::{ApiError, ScrapeClient};
pub use models::{
    ProgressEvent, ScrapeRequest, StartScrapeResponse, TaskId, TaskResultResponse, TaskStatus,
};
pub use sse::{EventStream, HttpProgressTransport, ProgressTransport, SseFrameDecoder, TransportError};

//! Buffer-queue streaming

pub mod stream_queue;

pub use stream_queue::{DrainStatus, Fill, FillRequest, PollReport, StreamStats, StreamingQueue};

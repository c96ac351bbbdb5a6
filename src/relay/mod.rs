//! Streaming response relay.
//!
//! Client for an already-running agent service: posts one message to its
//! `/run_sse` endpoint and re-emits the text fragments of the SSE reply as
//! they arrive. The produced stream is finite, single-consumption, and ends
//! when the HTTP body ends; cancellation is dropping the stream.

pub mod client;
pub mod sse;

pub use client::{FragmentStream, RelayClient, RelayConfig};
pub use sse::{LineDecoder, MessageChunk, parse_event_line};

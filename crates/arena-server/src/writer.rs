//! Outbound writer loop.
//!
//! The transport owns the socket and hands in any `Sink<String>` of text
//! frames. The loop is the only consumer of a client's outbound queue.

use std::fmt::Display;
use std::sync::Arc;

use arena_core::Event;
use futures::{Sink, SinkExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Drain `rx` into `sink`, one JSON text frame per event.
///
/// Runs until the queue closes (the directory dropped the client) or the sink
/// fails (the peer went away). Events that fail to serialize are skipped.
/// Returns the number of frames written.
pub async fn pump_outbound<S>(mut rx: mpsc::Receiver<Arc<Event>>, mut sink: S) -> usize
where
    S: Sink<String> + Unpin,
    S::Error: Display,
{
    let mut written = 0usize;
    while let Some(event) = rx.recv().await {
        let frame = match serde_json::to_string(event.as_ref()) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(event = %event.name, error = %e, "failed to serialize event");
                continue;
            }
        };
        if let Err(e) = sink.send(frame).await {
            debug!(event = %event.name, error = %e, "outbound sink closed");
            return written;
        }
        written += 1;
    }
    let _ = sink.close().await;
    written
}

//! PTY Streams
//!
//! Async-friendly handles for PTY I/O: the output side is a tokio channel fed
//! by the reader thread, the input side a std channel drained by the writer
//! thread.

use crate::error::{Error, Result};
use std::sync::mpsc::Sender as StdSender;
use tokio::sync::mpsc::UnboundedReceiver;

/// PTY I/O streams wrapper
pub struct PtyStreams {
    /// Receiver for output bytes from the PTY (stdout/stderr)
    output_rx: UnboundedReceiver<Vec<u8>>,
    /// Sender for input bytes to the PTY (stdin)
    input_tx: StdSender<Vec<u8>>,
}

impl PtyStreams {
    /// Create new PTY streams from channels
    pub fn from_channels(
        output_rx: UnboundedReceiver<Vec<u8>>,
        input_tx: StdSender<Vec<u8>>,
    ) -> Self {
        Self {
            output_rx,
            input_tx,
        }
    }

    /// Split into the output receiver and a cloneable input handle
    pub fn split(self) -> (UnboundedReceiver<Vec<u8>>, PtyInput) {
        (
            self.output_rx,
            PtyInput {
                input_tx: self.input_tx,
            },
        )
    }
}

/// Write half of a PTY
#[derive(Clone)]
pub struct PtyInput {
    input_tx: StdSender<Vec<u8>>,
}

impl PtyInput {
    /// Queue bytes for the PTY stdin
    pub fn send(&self, data: &[u8]) -> Result<()> {
        self.input_tx
            .send(data.to_vec())
            .map_err(|e| Error::PtyInputSendFailed {
                reason: e.to_string(),
            })
    }
}

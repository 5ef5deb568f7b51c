//! Output Surfaces
//!
//! Embedded terminal output is streamed to a caller-supplied
//! [`OutputSurface`]. [`ScrollbackSurface`] is an in-memory implementation
//! that strips escape sequences and keeps a bounded, auto-scrolling history
//! of plain-text lines for the UI to render.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::EmbeddedConfig;

/// Receives raw output bytes of an embedded execution
pub trait OutputSurface: Send + Sync {
    fn write_output(&self, data: &[u8]);
}

/// Opens one surface per embedded execution
pub trait SurfaceFactory: Send + Sync {
    fn open(&self, title: &str) -> Arc<dyn OutputSurface>;
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Plain-text line history fed by the escape sequence parser
struct LineBuffer {
    lines: VecDeque<String>,
    current: String,
    pending_cr: bool,
    max_lines: usize,
    scroll_on_output: bool,
    /// Lines scrolled up from the bottom; 0 follows output
    scroll_offset: usize,
}

impl LineBuffer {
    fn new(max_lines: usize, scroll_on_output: bool) -> Self {
        Self {
            lines: VecDeque::new(),
            current: String::new(),
            pending_cr: false,
            max_lines: max_lines.max(1),
            scroll_on_output,
            scroll_offset: 0,
        }
    }

    fn push_line(&mut self) {
        let line = std::mem::take(&mut self.current);
        self.lines.push_back(line);
        if self.lines.len() > self.max_lines {
            self.lines.pop_front();
        }

        if self.scroll_on_output {
            self.scroll_offset = 0;
        } else if self.scroll_offset > 0 {
            // Keep the viewport anchored while the user is scrolled back
            self.scroll_offset = (self.scroll_offset + 1).min(self.lines.len());
        }
    }
}

impl vte::Perform for LineBuffer {
    fn print(&mut self, c: char) {
        if self.pending_cr {
            // Carriage return without newline: the line is being redrawn
            self.current.clear();
            self.pending_cr = false;
        }
        self.current.push(c);
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            b'\n' => {
                self.pending_cr = false;
                self.push_line();
            }
            b'\r' => self.pending_cr = true,
            b'\t' => self.current.push('\t'),
            0x08 => {
                self.current.pop();
            }
            _ => {}
        }
    }
}

struct ScrollbackState {
    parser: vte::Parser,
    buffer: LineBuffer,
    bytes_received: u64,
}

/// In-memory terminal surface with bounded scrollback
pub struct ScrollbackSurface {
    title: String,
    state: Mutex<ScrollbackState>,
}

impl ScrollbackSurface {
    /// Create a surface retaining at most `max_lines` lines
    pub fn new(title: impl Into<String>, max_lines: usize, scroll_on_output: bool) -> Self {
        Self {
            title: title.into(),
            state: Mutex::new(ScrollbackState {
                parser: vte::Parser::new(),
                buffer: LineBuffer::new(max_lines, scroll_on_output),
                bytes_received: 0,
            }),
        }
    }

    /// Window title, `Running: <action title>`
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Completed lines, oldest first
    pub fn lines(&self) -> Vec<String> {
        lock_or_recover(&self.state).buffer.lines.iter().cloned().collect()
    }

    /// All text including the unterminated last line
    pub fn text(&self) -> String {
        let state = lock_or_recover(&self.state);
        let mut text = state
            .buffer
            .lines
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        if !state.buffer.current.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&state.buffer.current);
        }
        text
    }

    pub fn line_count(&self) -> usize {
        lock_or_recover(&self.state).buffer.lines.len()
    }

    pub fn bytes_received(&self) -> u64 {
        lock_or_recover(&self.state).bytes_received
    }

    /// The `rows` lines currently in view
    pub fn visible(&self, rows: usize) -> Vec<String> {
        let state = lock_or_recover(&self.state);
        let lines = &state.buffer.lines;
        let end = lines.len().saturating_sub(state.buffer.scroll_offset);
        let start = end.saturating_sub(rows);
        lines.range(start..end).cloned().collect()
    }

    pub fn scroll_up(&self, lines: usize) {
        let mut state = lock_or_recover(&self.state);
        let max = state.buffer.lines.len();
        state.buffer.scroll_offset = (state.buffer.scroll_offset + lines).min(max);
    }

    pub fn scroll_down(&self, lines: usize) {
        let mut state = lock_or_recover(&self.state);
        state.buffer.scroll_offset = state.buffer.scroll_offset.saturating_sub(lines);
    }

    pub fn scroll_to_bottom(&self) {
        lock_or_recover(&self.state).buffer.scroll_offset = 0;
    }

    pub fn scroll_offset(&self) -> usize {
        lock_or_recover(&self.state).buffer.scroll_offset
    }

    /// Whether the view is following new output
    pub fn is_at_bottom(&self) -> bool {
        self.scroll_offset() == 0
    }
}

impl OutputSurface for ScrollbackSurface {
    fn write_output(&self, data: &[u8]) {
        let mut guard = lock_or_recover(&self.state);
        let state = &mut *guard;
        state.bytes_received += data.len() as u64;
        state.parser.advance(&mut state.buffer, data);
    }
}

/// Factory producing [`ScrollbackSurface`]s and keeping them reachable
pub struct ScrollbackFactory {
    max_lines: usize,
    scroll_on_output: bool,
    opened: Mutex<Vec<Arc<ScrollbackSurface>>>,
}

impl ScrollbackFactory {
    pub fn new(max_lines: usize, scroll_on_output: bool) -> Self {
        Self {
            max_lines,
            scroll_on_output,
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn from_config(config: &EmbeddedConfig) -> Self {
        Self::new(config.scrollback_lines, config.scroll_on_output)
    }

    /// Every surface opened so far, oldest first
    pub fn surfaces(&self) -> Vec<Arc<ScrollbackSurface>> {
        lock_or_recover(&self.opened).clone()
    }

    /// The most recently opened surface
    pub fn latest(&self) -> Option<Arc<ScrollbackSurface>> {
        lock_or_recover(&self.opened).last().cloned()
    }

    /// Forget surfaces whose views were closed
    pub fn release(&self, surface: &Arc<ScrollbackSurface>) {
        lock_or_recover(&self.opened).retain(|open| !Arc::ptr_eq(open, surface));
    }
}

impl SurfaceFactory for ScrollbackFactory {
    fn open(&self, title: &str) -> Arc<dyn OutputSurface> {
        let surface = Arc::new(ScrollbackSurface::new(
            format!("Running: {}", title),
            self.max_lines,
            self.scroll_on_output,
        ));
        lock_or_recover(&self.opened).push(Arc::clone(&surface));
        surface
    }
}

/// Forwards PTY output to a surface until the PTY closes
pub struct OutputPump;

impl OutputPump {
    /// Start pumping `output_rx` into `surface` on the tokio runtime
    pub fn start(
        label: String,
        mut output_rx: UnboundedReceiver<Vec<u8>>,
        surface: Arc<dyn OutputSurface>,
    ) -> PumpHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            debug!("Started output pump for {}", label);
            let mut attached = true;

            loop {
                tokio::select! {
                    _ = &mut stop_rx, if attached => {
                        debug!("Output view closed for {}, draining without display", label);
                        attached = false;
                    }
                    output = output_rx.recv() => {
                        match output {
                            Some(data) if attached && !data.is_empty() => {
                                surface.write_output(&data);
                            }
                            // Keep draining after detach so the child never blocks on a full PTY
                            Some(_) => {}
                            None => {
                                debug!("PTY output closed for {}", label);
                                break;
                            }
                        }
                    }
                }
            }
        });

        PumpHandle {
            stop_tx: Some(stop_tx),
            task,
        }
    }
}

/// Handle for detaching a running output pump
pub struct PumpHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PumpHandle {
    /// Stop forwarding output to the surface
    pub fn detach(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
    }

    pub fn is_detached(&self) -> bool {
        self.stop_tx.is_none()
    }

    /// Whether the PTY output has closed
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

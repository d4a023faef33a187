use bytes::Bytes;

/// A control item the receiver pushed without a preceding request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsolicitedItem {
    pub control_code: u16,
    pub body: Bytes,
}

/// Lifecycle of the background reader task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Reading frames.
    Running,
    /// Stopped by disconnect or shutdown.
    Stopped,
    /// The receiver closed the stream.
    Closed,
    /// A read error tore down the connection.
    Failed,
}

impl ListenerState {
    pub fn as_str(self) -> &'static str {
        match self {
            ListenerState::Running => "running",
            ListenerState::Stopped => "stopped",
            ListenerState::Closed => "closed",
            ListenerState::Failed => "failed",
        }
    }
}

/// Health of the reader task, published after every frame and error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerStatus {
    pub state: ListenerState,
    pub frames_received: u64,
    pub unsolicited_dispatched: u64,
    /// Frames of a message type the control channel does not act on.
    pub ignored_frames: u64,
    pub read_errors: u64,
    pub last_error: Option<String>,
}

impl ListenerStatus {
    pub(crate) fn running() -> Self {
        Self {
            state: ListenerState::Running,
            frames_received: 0,
            unsolicited_dispatched: 0,
            ignored_frames: 0,
            read_errors: 0,
            last_error: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == ListenerState::Running
    }
}

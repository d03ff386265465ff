/// Events that arrive from the transport thread.
/// These get merged into the main event loop alongside keyboard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Connection established
    Opened,

    /// One text frame from the runner
    Message(String),

    /// Connection gone, either closed by the runner or failed
    Closed { reason: Option<String> },
}

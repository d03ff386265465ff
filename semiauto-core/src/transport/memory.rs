use super::provider::Transport;

/// In-process transport that records what the session sends. Used for
/// transcript replay and tests.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    pub opened: bool,
    pub closed: bool,
    pub sent: Vec<String>,
    pub fail_sends: bool,
}

impl Transport for MemoryTransport {
    fn open(&mut self) -> anyhow::Result<()> {
        self.opened = true;
        Ok(())
    }

    fn send(&mut self, payload: String) -> anyhow::Result<()> {
        if self.fail_sends || self.closed {
            anyhow::bail!("transport is not writable");
        }
        self.sent.push(payload);
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

pub trait Transport {
    /// Start connecting. Completion is reported asynchronously as
    /// `TransportEvent::Opened` or `TransportEvent::Closed`.
    fn open(&mut self) -> anyhow::Result<()>;
    fn send(&mut self, payload: String) -> anyhow::Result<()>;
    fn close(&mut self);
}

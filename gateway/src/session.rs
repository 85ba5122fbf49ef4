/// The state of a gateway session, shared between the receive loop and the
/// heartbeat worker under the shard's lock.
#[derive(Debug, Default)]
pub struct Session {
    /// The session ID assigned by the READY dispatch, if any.
    pub id: Option<String>,
    /// The last dispatch sequence number that was received.
    pub seq: Option<u64>,
    /// Whether the last heartbeat has been acknowledged.
    pub received_ack: bool,
    /// Set when the caller asks for a permanent disconnect.
    pub should_disconnect: bool,
    /// Bumped on every connect; fences stale heartbeat workers.
    pub generation: u64,
}

impl Session {
    /// Whether a resume may be attempted instead of a fresh identify.
    pub fn resumable(&self) -> bool {
        self.id.is_some()
    }

    /// Forgets the session so the next connect identifies from scratch.
    pub fn reset(&mut self) {
        self.id = None;
        self.seq = None;
    }
}

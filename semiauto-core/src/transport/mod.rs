pub mod memory;
pub mod provider;
pub mod ws;

pub use memory::MemoryTransport;
pub use provider::Transport;
pub use ws::WebSocketTransport;

use serde::{Deserialize, Serialize};

/// How replies reach the runner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyPath {
    /// Replies share the connection that carries the test stream.
    #[default]
    Persistent,
    /// Each reply opens its own connection, sends once and closes it.
    PerAnswer,
}

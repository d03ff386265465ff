pub mod config;
pub mod dialog;
pub mod event;
pub mod keyboard;
pub mod keys;
pub mod protocol;
pub mod session;
pub mod test_list;
pub mod transport;

// Re-export commonly used types at crate root
pub use config::Config;
pub use dialog::{Dialog, DialogKind};
pub use event::TransportEvent;
pub use keyboard::KeyEvent;
pub use keys::KeyDispatcher;
pub use protocol::{Inbound, Outbound, ProtocolError};
pub use session::{ConnectionState, KeyInput, Notification, Session};
pub use test_list::{Outcome, TestDescriptor, TestId, TestListView, Verdict};
pub use transport::{MemoryTransport, ReplyPath, Transport, WebSocketTransport};

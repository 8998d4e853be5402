//! Classic protocol networking: TCP listener, per-client handler and the
//! level chunk stream.

pub mod chunk_stream;
pub mod connection;
pub mod listener;
pub mod protocol;

/// Strings the server identifies itself with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    pub motd: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: "Classic Server".into(),
            motd: "Welcome!".into(),
        }
    }
}

pub mod client;
pub mod history;
#[cfg(test)]
pub mod memory;
pub mod packet;
pub mod session;
pub mod submitter;
pub mod transport;

pub use client::ChatClient;
pub use session::Session;
pub use submitter::FormSubmitter;
pub use transport::WebSocketSource;

pub mod handlers;
pub mod server;
pub mod writer;

pub use server::{AdminServer, AppState};
pub use writer::{spawn as spawn_writer, WriterHandle};

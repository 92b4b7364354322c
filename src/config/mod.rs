pub mod types;
pub mod loader;
pub mod server;
pub mod view;

pub use types::*;
pub use loader::*;
pub use server::*;
pub use view::*;

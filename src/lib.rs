pub mod cli;
pub mod config;
pub mod error;
pub mod locate;
pub mod model;
pub mod store;

pub use config::Config;
pub use error::StoreError;
pub use locate::{ConversationLocation, RootProvider, RootRegistry, Variant};
pub use model::{Message, Role, SourceKind};
pub use store::ConversationStore;

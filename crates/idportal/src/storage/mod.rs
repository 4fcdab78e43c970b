pub mod filesystem;

pub use filesystem::{DocumentStore, StoredDocument};

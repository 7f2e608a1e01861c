//! Embedded migrator, re-exported from the `migrations` workspace member so
//! the server binary and the integration tests run the same schema.

pub use migrations::Migrator;

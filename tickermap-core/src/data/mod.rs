//! Collaborators: provider traits and their file/HTTP adapters

pub mod artifact;
pub mod eodhd;
pub mod http;
pub mod notify;
pub mod provider;
pub mod reference;
pub mod secrets;
pub mod store;
pub mod universe;

pub use artifact::{ArtifactError, ArtifactStore, LocalArtifactStore};
pub use eodhd::EodhdClient;
pub use http::{HttpBody, HttpFetcher};
pub use notify::{LogNotifier, Notifier, NotifyError, SlackNotifier};
pub use provider::{
    AttributeLookup, EodhdProvider, Fundamentals, LookupProgress, MappingBuilder, MappingStore,
    ProviderError, StoreError, TracingProgress, UniverseSource,
};
pub use reference::{CsvMappingBuilder, ReferenceTable};
pub use secrets::{EnvSecrets, SecretError, SecretSource};
pub use store::CsvMappingStore;
pub use universe::{FileUniverseSource, HttpUniverseSource};

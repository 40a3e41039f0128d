mod config;
mod error;
mod record;
mod rotation;

mod catalog;
mod youtube;

mod table;
mod store;
mod engine;

mod progress;
mod util;

pub use crate::config::HarvestOptions;
pub use crate::error::{HarvestError, RemoteError};
pub use crate::record::{ChannelRecord, ChannelStats, SearchPage};
pub use crate::rotation::CredentialRotator;

// Remote boundary and the bundled YouTube Data API client.
pub use crate::catalog::CatalogClient;
pub use crate::youtube::{parse_channel_stats, parse_search_page, YouTubeCatalog, DEFAULT_API_BASE, MAX_PAGE_SIZE};

// Persistence: raw table file and the dedupe-aware store on top of it.
pub use crate::table::{TableFile, HEADER};
pub use crate::store::ResultStore;

pub use crate::engine::{CollectionEngine, EngineState, RunSummary, StopReason};

pub use crate::util::init_tracing_once;

// tabledash - Dashboard and CRUD proxy for a remote tabular-data API

pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod profile;
pub mod proxy;
pub mod record;
pub mod refresh;
pub mod remote;
pub mod stats;
pub mod view;
pub mod webhook;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use client::{HttpProxyClient, ProxyApi};
pub use error::{FetchError, ProxyError, UpstreamError, ViewError};
pub use filter::Filter;
pub use profile::DatasetProfile;
pub use record::{FieldValue, Fields, Record, RemoteRecord};
pub use refresh::AutoRefresh;
pub use remote::{AirtableClient, TableBackend};
pub use stats::Stats;
pub use view::{Dashboard, StagedEdit};

#![deny(clippy::all)]

mod config;
mod error;
mod identity;
mod lifecycle;
mod probe;
mod record;
mod retention;
mod search;
mod store;
mod view;

pub use config::Config;
pub use error::StoreError;
pub use identity::ShellIdentity;
pub use lifecycle::LifecycleMarker;
pub use lifecycle::LifecycleTracker;
pub use probe::ProcessProbe;
pub use probe::UnixProcessProbe;
pub use record::HistoryRecord;
pub use record::wall_clock_secs;
pub use retention::RetentionManager;
pub use search::DEFAULT_FUZZY_LIMIT;
pub use search::DEFAULT_FUZZY_THRESHOLD;
pub use search::exact;
pub use search::fuzzy;
pub use store::SessionStore;
pub use store::store_path;
pub use view::GlobalView;
pub use view::HistoryStats;

pub type Result<T> = std::result::Result<T, StoreError>;

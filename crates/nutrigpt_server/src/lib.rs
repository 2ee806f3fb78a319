//! NutriGPT service: daily plan cache, profile, progress log and chat over a
//! key-value store, exposed as an HTTP API.

pub mod cache;
pub mod chat;
pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod profile;
pub mod progress;
pub mod state;
pub mod store;

mod test_utils;

pub use cache::{
    CacheRead, CacheRecord, Clock, FixedClock, PlanCache, PlanFetch, PlanOrigin, SystemClock,
};
pub use error::{AppError, AppResult};
pub use state::AppState;
pub use store::{FileStore, MemoryStore, Store, StoreError};

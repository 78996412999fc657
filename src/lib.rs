//! White-label real-estate catalog core: tenant resolution, listing search,
//! multi-currency pricing and lead capture.

pub mod api;
pub mod config;
pub mod currency;
pub mod leads;
pub mod models;
pub mod search;
pub mod session;
pub mod state;
pub mod storage;
pub mod tenant;

pub use config::Config;
pub use session::CatalogSession;

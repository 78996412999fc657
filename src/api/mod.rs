pub mod error;
pub mod mapping;
pub mod memory;
pub mod strapi;
pub mod traits;
pub mod types;

pub use error::{ApiError, ErrorCategory};
pub use memory::InMemoryCatalog;
pub use strapi::StrapiClient;
pub use traits::CatalogApi;
pub use types::PropertyQuery;

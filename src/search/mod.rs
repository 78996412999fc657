pub mod filter;
pub mod history;
pub mod pagination;
pub mod sort;
pub mod stats;
pub mod suggestions;

pub use filter::{filter, normalize, Facet, FilterSet, RoomMatch};
pub use history::SearchHistory;
pub use pagination::Pagination;
pub use sort::{sort, SortKey};
pub use stats::{catalog_stats, facet_options, CatalogStats, FacetOptions};
pub use suggestions::{suggest, Suggestion, SuggestionKind};

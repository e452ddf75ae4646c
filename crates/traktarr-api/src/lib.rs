pub mod error;
pub mod kinds;
pub mod pagination;
pub mod traits;
pub mod trakt;

pub use error::TraktError;
pub use kinds::{HistoryKind, ListKind, RatingsKind};
pub use pagination::{fetch_all_pages, format_api_date, Page, PageFetcher, PageQuery, PaginationMeta};
pub use traits::AuthProvider;
pub use trakt::{DeviceCode, OAuthClient, TokenAuth, TokenInfo, TraktService, TraktSettings};

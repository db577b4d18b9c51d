pub mod cache;
pub mod provider;

pub use cache::{cache_key, DataCache};
pub use provider::{close_prices, validate_price_frame, CsvProvider, MarketDataProvider};

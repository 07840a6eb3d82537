//! Bar sources: the provider trait and its Yahoo and CSV implementations.

pub mod csv_dir;
pub mod provider;
pub mod yahoo;

pub use csv_dir::{parse_timestamp, CsvProvider};
pub use provider::{DataError, DataProvider};
pub use yahoo::YahooProvider;

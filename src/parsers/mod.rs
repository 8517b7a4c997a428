//! Parsers for text the storefront renders

mod price;

pub use price::{parse_price, ParsedPrice};

pub mod caching;
pub mod util;
pub mod yahoo_finance;

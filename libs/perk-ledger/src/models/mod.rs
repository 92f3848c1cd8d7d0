pub mod ledger;

pub use ledger::{Account, StockItem};

pub mod chain_rpc;
pub mod market_reader;

// Re-export commonly used types
pub use chain_rpc::{ChainRpcClient, TableQuery, TableSource};
pub use market_reader::MarketReader;

//! Providers Module - External Data Sources
//!
//! JSON-RPC, Alchemy transfers, block explorer, the scam registry snapshot
//! and the collector that fans out over them.

pub mod alchemy;
pub mod collector;
pub mod explorer;
pub mod registry;
pub mod rpc;

pub use alchemy::AlchemyClient;
pub use collector::{ChainDataSource, CollectedSignals, LiveChainSource, SignalCollector};
pub use explorer::ExplorerClient;
pub use registry::ScamStore;
pub use rpc::RpcProvider;

pub mod api;
pub mod config;
pub mod engine;
pub mod eth;
pub mod extract;
pub mod logger;
pub mod output;
pub mod resolver;
pub mod types;

/// Default recent-search base URL: a CORS proxy in front of api.twitter.com
/// that injects the shared application credential when no bearer is sent.
pub const DEFAULT_SEARCH_BASE: &str = "https://dark-resonance.isiain.workers.dev";

/// Public ENS subgraph endpoint (batch name resolution).
pub const ENS_GRAPH_URL: &str = "https://api.thegraph.com/subgraphs/name/ensdomains/ens";

/// ENS registry contract, same address on mainnet and the public testnets.
pub const ENS_REGISTRY: &str = "0x00000000000C2E074eC69A0dFb2997BA6C7d2e1e";

/// Max results per search page (Twitter API v2 cap).
pub const PAGE_SIZE: u32 = 100;

/// Names per batch query against the ENS subgraph.
pub const ENS_BATCH_SIZE: usize = 25;

/// Default number of addresses per output chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

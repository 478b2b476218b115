//! The bounded async fan-out queue a gateway node uses to resolve `search`
//! calls across a shuffled BPP set and relay `on_search`/`search` hops back
//! out, without blocking the inbound request past admission (§4.K/§4.L).

pub mod error;
pub mod lookup_processor;
pub mod queue;

pub use error::QueueError;
pub use lookup_processor::{DefaultLookupProcessor, FanoutShuffle, OsShuffle, SeededShuffle};
pub use queue::{ChannelTaskQueue, LookupProcessor, ProxyProcessor};

//! The MapReducer trait and the default sharding function.

use async_trait::async_trait;

use crate::error::Result;
use crate::record_types::{Pair, PairSink, ValueStream};

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a over a byte sequence. Fast, with adequate distribution
/// for partitioning; keys are hashed as their UTF-8 bytes.
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(FNV_OFFSET_BASIS, |h, &b| (h ^ u32::from(b)).wrapping_mul(FNV_PRIME))
}

/// Default sharding function: FNV-1a-32 of the key, modulo the shard
/// count. Identical keys land in the same shard on every host.
pub fn default_shard(shards: usize, key: &str) -> usize {
    fnv1a_32(key.as_bytes()) as usize % shards
}

/// A type implementing the map() and reduce() operations of a job.
/// The MapReducer is cloned once per spawned mapper/reducer invocation.
#[async_trait]
pub trait MapReducer: Clone + Send + Sync + 'static {
    /// Takes one input pair and emits any number of pairs through `out`.
    async fn map(&self, record: Pair, out: PairSink) -> Result<()>;

    /// Takes one key and its value stream; emits any number of result
    /// pairs through `out`. Values arrive in ascending order.
    async fn reduce(&self, key: String, values: ValueStream, out: PairSink) -> Result<()>;

    /// Determines the reduce partition a key belongs in, in [0, shards).
    fn shard(&self, shards: usize, key: &str) -> usize {
        default_shard(shards, key)
    }
}

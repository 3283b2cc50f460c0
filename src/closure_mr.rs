//! A MapReducer that uses supplied map()/reduce() functions.

use async_trait::async_trait;

use crate::error::Result;
use crate::mapreducer::MapReducer;
use crate::record_types::{Emitter, MultiRecord, Pair, PairSink, ValueStream};

/// Map() function type; emitted pairs are buffered in the Emitter.
pub type MapperF = fn(&mut Emitter, Pair) -> Result<()>;
/// Reduce() function type; receives one key with all of its values.
pub type ReducerF = fn(&mut Emitter, MultiRecord) -> Result<()>;

/// Use plain functions in a mapreduce (instead of implementing your own
/// MapReducer). The value stream of a key is collected before the
/// reducer function runs.
#[derive(Clone, Copy)]
pub struct ClosureMapReducer {
    mapper: MapperF,
    reducer: ReducerF,
}

impl ClosureMapReducer {
    /// Create a new MapReducer from the supplied functions.
    pub fn new(mapper: MapperF, reducer: ReducerF) -> ClosureMapReducer {
        ClosureMapReducer { mapper, reducer }
    }
}

#[async_trait]
impl MapReducer for ClosureMapReducer {
    async fn map(&self, record: Pair, out: PairSink) -> Result<()> {
        let mut emitter = Emitter::new();
        (self.mapper)(&mut emitter, record)?;
        for pair in emitter.into_pairs() {
            out.emit(pair.key, pair.value)?;
        }
        Ok(())
    }

    async fn reduce(&self, key: String, mut values: ValueStream, out: PairSink) -> Result<()> {
        let mut collected = Vec::new();
        while let Some(value) = values.next().await {
            collected.push(value);
        }
        let mut emitter = Emitter::new();
        (self.reducer)(&mut emitter, MultiRecord::new(key, collected))?;
        for pair in emitter.into_pairs() {
            out.emit(pair.key, pair.value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record_types::ValueStream;

    fn splitting_mapper(e: &mut Emitter, r: Pair) -> Result<()> {
        for w in r.value.split_whitespace() {
            e.emit(w, "1");
        }
        Ok(())
    }

    fn counting_reducer(e: &mut Emitter, group: MultiRecord) -> Result<()> {
        let key = group.key().to_owned();
        let n = group.into_iter().count();
        e.emit(key, n.to_string());
        Ok(())
    }

    #[tokio::test]
    async fn bridges_sync_functions() {
        let mr = ClosureMapReducer::new(splitting_mapper, counting_reducer);

        let (sink, mut emitted) = PairSink::channel();
        mr.map(Pair::new("1", "x y x"), sink).await.unwrap();
        let mut words = Vec::new();
        while let Ok(p) = emitted.try_recv() {
            words.push(p.key);
        }
        assert_eq!(words, vec!["x", "y", "x"]);

        let (values_tx, values) = ValueStream::channel(4);
        let (sink, mut emitted) = PairSink::channel();
        for v in ["1", "1", "1"] {
            values_tx.send(v.to_string()).await.unwrap();
        }
        drop(values_tx);
        mr.reduce("x".to_string(), values, sink).await.unwrap();
        let result = emitted.try_recv().unwrap();
        assert_eq!((result.key.as_str(), result.value.as_str()), ("x", "3"));
    }
}

//! Executes one map task on a worker.

use std::path::Path;

use tracing::{error, info};

use crate::container::Container;
use crate::error::{Error, Result};
use crate::http;
use crate::mapreducer::MapReducer;
use crate::record_types::PairSink;
use crate::task::{self, MapStats, MapTask};

impl MapTask {
    /// Downloads the source partition, runs the mapper over every input
    /// pair and distributes the emitted pairs across the R output
    /// containers by key hash.
    pub async fn process<MR: MapReducer>(&self, dir: &Path, client: &MR) -> Result<MapStats> {
        let input_path = dir.join(task::map_input_file(self.n));
        if let Err(e) = http::fetch(&self.source_host, &input_path).await {
            error!(task = self.n, url = %self.source_host, %e, "map input fetch failed");
            return Err(e);
        }
        let input = Container::open(&input_path)?;

        let mut outputs = Vec::with_capacity(self.r);
        for r in 0..self.r {
            outputs.push(Container::create(dir.join(task::map_output_file(self.n, r)))?);
        }

        let mut stats = MapStats::default();
        let mut scan = input.scan()?;
        for record in scan.rows()? {
            let record = record?;
            stats.pairs_in += 1;

            // One mapper in flight per input record; its emissions are
            // drained concurrently below so it never blocks on us.
            let (sink, mut emitted) = PairSink::channel();
            let mapper = client.clone();
            let handle = tokio::spawn(async move { mapper.map(record, sink).await });

            while let Some(pair) = emitted.recv().await {
                let shard = client.shard(self.r, &pair.key);
                outputs[shard].insert(&pair.key, &pair.value)?;
                stats.pairs_out += 1;
            }
            handle
                .await
                .map_err(|e| Error::User(format!("mapper panicked: {}", e)))??;
        }

        info!(
            task = self.n,
            pairs_in = stats.pairs_in,
            pairs_out = stats.pairs_out,
            "map task complete"
        );
        Ok(stats)
    }
}

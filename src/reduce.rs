//! Executes one reduce task on a worker.

use std::path::Path;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::container::Container;
use crate::error::{Error, Result};
use crate::mapreducer::MapReducer;
use crate::record_types::{Pair, PairSink, ValueStream};
use crate::shuffle;
use crate::task::{self, ReduceStats, ReduceTask};

/// One spawned reducer invocation: the value stream feeding it, and the
/// output it will have emitted by the time it completes.
struct ActiveReducer {
    key: String,
    values: mpsc::Sender<String>,
    emitted: mpsc::UnboundedReceiver<Pair>,
    handle: JoinHandle<Result<()>>,
}

impl ActiveReducer {
    fn spawn<MR: MapReducer>(client: &MR, key: String) -> ActiveReducer {
        let (values, stream) = ValueStream::channel(64);
        let (sink, emitted) = PairSink::channel();
        let reducer = client.clone();
        let k = key.clone();
        let handle = tokio::spawn(async move { reducer.reduce(k, stream, sink).await });
        ActiveReducer {
            key,
            values,
            emitted,
            handle,
        }
    }

    async fn push(&self, value: String) {
        // A reducer may stop consuming early; remaining values for the
        // key are then simply dropped.
        let _ = self.values.send(value).await;
    }

    /// Closes the value stream, waits for the reducer to finish and
    /// appends its emitted pairs to `output`.
    async fn finish(mut self, output: &Container) -> Result<u64> {
        drop(self.values);
        self.handle
            .await
            .map_err(|e| Error::User(format!("reducer panicked: {}", e)))??;
        let mut written = 0;
        while let Some(pair) = self.emitted.recv().await {
            output.insert(&pair.key, &pair.value)?;
            written += 1;
        }
        Ok(written)
    }
}

impl ReduceTask {
    /// Merges the upstream map partials into one input container, then
    /// streams each key group of the ordered scan through a reducer
    /// invocation, appending its emissions to the output container.
    pub async fn process<MR: MapReducer>(&self, dir: &Path, client: &MR) -> Result<ReduceStats> {
        let input_path = dir.join(task::reduce_input_file(self.n));
        let temp_path = dir.join(task::reduce_temp_file(self.n));
        let input = match shuffle::merge(&self.source_hosts, &input_path, &temp_path).await {
            Ok(input) => input,
            Err(e) => {
                error!(task = self.n, file = %input_path.display(), %e, "shuffle merge failed");
                return Err(e);
            }
        };
        let output = Container::create(dir.join(task::reduce_output_file(self.n)))?;

        let mut stats = ReduceStats::default();
        let mut current: Option<ActiveReducer> = None;
        let mut scan = input.scan_ordered()?;
        for record in scan.rows()? {
            let Pair { key, value } = record?;
            stats.values += 1;

            if current.as_ref().map_or(true, |active| active.key != key) {
                if let Some(active) = current.take() {
                    stats.pairs_out += active.finish(&output).await?;
                }
                stats.keys += 1;
                current = Some(ActiveReducer::spawn(client, key));
            }
            if let Some(active) = &current {
                active.push(value).await;
            }
        }
        if let Some(active) = current.take() {
            stats.pairs_out += active.finish(&output).await?;
        }

        info!(
            task = self.n,
            keys = stats.keys,
            values = stats.values,
            pairs_out = stats.pairs_out,
            "reduce task complete"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{data_router, serve};
    use crate::record_types::PairSink;
    use crate::wordcount;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use tokio::net::TcpListener;

    async fn serve_dir(dir: &Path) -> (String, tokio::task::JoinHandle<Result<()>>) {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let base = format!("127.0.0.1:{}", listener.local_addr().unwrap().port());
        let handle = tokio::spawn(serve(listener, data_router(dir)));
        (base, handle)
    }

    fn make_map_output(dir: &Path, name: &str, pairs: &[(&str, &str)]) {
        let c = Container::create(dir.join(name)).unwrap();
        for (k, v) in pairs {
            c.insert(k, v).unwrap();
        }
    }

    #[tokio::test]
    async fn reduces_merged_groups() {
        let dir = TempDir::new().unwrap();
        make_map_output(
            dir.path(),
            "map_0_output_0.sqlite3",
            &[("a", "1"), ("b", "1"), ("a", "1")],
        );
        make_map_output(dir.path(), "map_1_output_0.sqlite3", &[("b", "1"), ("c", "1")]);
        let (base, server) = serve_dir(dir.path()).await;

        let reduce = ReduceTask {
            m: 2,
            r: 1,
            n: 0,
            source_hosts: vec![
                task::data_url(&base, "map_0_output_0.sqlite3"),
                task::data_url(&base, "map_1_output_0.sqlite3"),
            ],
        };
        let stats = reduce.process(dir.path(), &wordcount::client()).await.unwrap();
        assert_eq!(stats.keys, 3);
        assert_eq!(stats.values, 5);
        assert_eq!(stats.pairs_out, 3);

        let out = Container::open(dir.path().join(task::reduce_output_file(0))).unwrap();
        let mut scan = out.scan_ordered().unwrap();
        let got: Vec<(String, String)> = scan
            .rows()
            .unwrap()
            .map(|p| p.map(|p| (p.key, p.value)))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(
            got,
            vec![
                ("a".into(), "2".into()),
                ("b".into(), "2".into()),
                ("c".into(), "1".into()),
            ]
        );
        server.abort();
    }

    /// Records the order in which keys and values reach the reducer.
    #[derive(Clone)]
    struct Recording {
        seen: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    }

    #[async_trait]
    impl MapReducer for Recording {
        async fn map(&self, _record: Pair, _out: PairSink) -> Result<()> {
            Ok(())
        }

        async fn reduce(&self, key: String, mut values: ValueStream, _out: PairSink) -> Result<()> {
            let mut group = Vec::new();
            while let Some(v) = values.next().await {
                group.push(v);
            }
            self.seen.lock().unwrap().push((key, group));
            Ok(())
        }
    }

    #[tokio::test]
    async fn delivers_keys_and_values_in_ascending_order() {
        let dir = TempDir::new().unwrap();
        make_map_output(
            dir.path(),
            "map_0_output_0.sqlite3",
            &[("m", "9"), ("a", "2"), ("m", "1"), ("a", "1"), ("z", "5")],
        );
        let (base, server) = serve_dir(dir.path()).await;

        let reduce = ReduceTask {
            m: 1,
            r: 1,
            n: 0,
            source_hosts: vec![task::data_url(&base, "map_0_output_0.sqlite3")],
        };
        let client = Recording {
            seen: Arc::new(Mutex::new(Vec::new())),
        };
        reduce.process(dir.path(), &client).await.unwrap();

        let seen = client.seen.lock().unwrap();
        let keys: Vec<&str> = seen.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "m", "z"]);
        for (_, values) in seen.iter() {
            let mut sorted = values.clone();
            sorted.sort();
            assert_eq!(*values, sorted);
        }
        server.abort();
    }
}

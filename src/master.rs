//! The master: partitions the source, hands out map tasks and then
//! reduce tasks to whichever worker polls next, and merges the reduce
//! outputs into the final container.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::info;

use crate::error::{Error, Result};
use crate::http;
use crate::parameters::JobConfig;
use crate::partition;
use crate::rpc::{self, MasterRpc};
use crate::shuffle;
use crate::task::{self, MapTask, ReduceTask, Task};

pub struct Master {
    config: JobConfig,
}

impl Master {
    pub fn new(config: JobConfig) -> Master {
        Master { config }
    }

    /// Runs one job to completion, serving the control and data planes
    /// on `host:port`. Returns the path of the merged output container.
    pub async fn run(&self, host: &str, port: u16) -> Result<PathBuf> {
        let listener = TcpListener::bind((host, port)).await?;
        self.run_on(host, listener).await
    }

    /// As `run`, on an already-bound listener; the advertised address is
    /// `host` plus the listener's actual port.
    pub async fn run_on(&self, host: &str, listener: TcpListener) -> Result<PathBuf> {
        let base = format!("{}:{}", host, listener.local_addr()?.port());

        let (request_tx, mut requests) = mpsc::channel(1);
        let (responses, response_rx) = mpsc::channel(1);
        let (finished_tx, mut finished) = mpsc::channel(1);
        let routes = rpc::router(Arc::new(MasterRpc::new(request_tx, response_rx, finished_tx)))
            .merge(http::data_router(&self.config.data_dir));
        let server = tokio::spawn(http::serve(listener, routes));

        info!(
            address = %base,
            maps = self.config.maps,
            reduces = self.config.reduces,
            "master up"
        );

        let result = self
            .drive(&base, &mut requests, &responses, &mut finished)
            .await;
        server.abort();
        result
    }

    async fn drive(
        &self,
        base: &str,
        requests: &mut mpsc::Receiver<()>,
        responses: &mpsc::Sender<Task>,
        finished: &mut mpsc::Receiver<String>,
    ) -> Result<PathBuf> {
        let cfg = &self.config;
        std::fs::create_dir_all(&cfg.data_dir)?;

        let pattern = cfg.data_dir.join(task::map_source_pattern());
        partition::partition(&cfg.source, &pattern.to_string_lossy(), cfg.maps)?;

        let map_addresses = run_phase(
            cfg.maps,
            |n| {
                Task::Map(MapTask {
                    m: cfg.maps,
                    r: cfg.reduces,
                    n,
                    source_host: task::data_url(base, &task::map_source_file(n)),
                })
            },
            requests,
            responses,
            finished,
        )
        .await?;
        info!("all map tasks finished");

        let reduce_addresses = run_phase(
            cfg.reduces,
            |n| {
                let source_hosts = (0..cfg.maps)
                    .map(|m| task::data_url(&map_addresses[m], &task::map_output_file(m, n)))
                    .collect();
                Task::Reduce(ReduceTask {
                    m: cfg.maps,
                    r: cfg.reduces,
                    n,
                    source_hosts,
                })
            },
            requests,
            responses,
            finished,
        )
        .await?;
        info!("all reduce tasks finished");

        let urls: Vec<String> = (0..cfg.reduces)
            .map(|r| task::data_url(&reduce_addresses[r], &task::reduce_output_file(r)))
            .collect();
        let temp = cfg.data_dir.join("merge_temp.sqlite3");
        let output = shuffle::merge(&urls, &cfg.output, &temp).await?;
        info!(
            pairs = output.count()?,
            output = %cfg.output.display(),
            "job complete"
        );
        Ok(cfg.output.clone())
    }
}

/// One phase of the job: hands tasks 0..count to the first `count` work
/// requests in order, answers further requests with idle tasks, and
/// multiplexes finished signals throughout, since a worker may report a
/// completion before the phase's later tasks have even been requested.
/// Returns the reporting workers' addresses in completion order; once
/// recorded, an entry is never overwritten.
async fn run_phase(
    count: usize,
    mut make_task: impl FnMut(usize) -> Task,
    requests: &mut mpsc::Receiver<()>,
    responses: &mpsc::Sender<Task>,
    finished: &mut mpsc::Receiver<String>,
) -> Result<Vec<String>> {
    let mut addresses = Vec::with_capacity(count);
    let mut assigned = 0;
    while addresses.len() < count {
        tokio::select! {
            signal = finished.recv() => {
                addresses.push(signal.ok_or(Error::Unavailable)?);
            }
            token = requests.recv() => {
                token.ok_or(Error::Unavailable)?;
                let assignment = if assigned < count {
                    assigned += 1;
                    make_task(assigned - 1)
                } else {
                    Task::Idle
                };
                responses
                    .send(assignment)
                    .await
                    .map_err(|_| Error::Unavailable)?;
            }
        }
    }
    Ok(addresses)
}

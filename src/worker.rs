//! The worker: serves its local data directory to peers and polls the
//! master for map and reduce work until the master goes away.

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::http;
use crate::mapreducer::MapReducer;
use crate::parameters::JobConfig;
use crate::rpc;
use crate::task::Task;

pub struct Worker<MR: MapReducer> {
    config: JobConfig,
    client: MR,
    master: String,
}

impl<MR: MapReducer> Worker<MR> {
    pub fn new(config: JobConfig, client: MR, master: impl Into<String>) -> Worker<MR> {
        Worker {
            config,
            client,
            master: master.into(),
        }
    }

    /// Binds `host:port`, serves `/data/…` from the working directory
    /// and polls for work. The advertised base URL is `host` plus the
    /// actually bound port, so an ephemeral port works.
    pub async fn run(&self, host: &str, port: u16) -> Result<()> {
        std::fs::create_dir_all(&self.config.data_dir)?;
        let listener = TcpListener::bind((host, port)).await?;
        let base = format!("{}:{}", host, listener.local_addr()?.port());
        let server = tokio::spawn(http::serve(
            listener,
            http::data_router(&self.config.data_dir),
        ));
        info!(address = %base, master = %self.master, "worker up");

        let result = self.poll(&base).await;
        server.abort();
        result
    }

    async fn poll(&self, base: &str) -> Result<()> {
        let mut completed = 0usize;
        loop {
            match rpc::call::<(), Task>(&self.master, rpc::WORK_REQUEST, &()).await {
                Ok(Task::Map(map)) => {
                    map.process(&self.config.data_dir, &self.client).await?;
                    self.report(base).await?;
                    completed += 1;
                }
                Ok(Task::Reduce(reduce)) => {
                    reduce.process(&self.config.data_dir, &self.client).await?;
                    self.report(base).await?;
                    completed += 1;
                }
                Ok(Task::Idle) => {
                    tokio::time::sleep(self.config.poll_interval).await;
                }
                // The master no longer answers. After at least one
                // completed task that means the job is done; before
                // that, it never was there to begin with, and the
                // transport failure itself is the fatal error.
                Err(err @ (Error::Unavailable | Error::Network(_))) => {
                    if completed > 0 {
                        info!(tasks = completed, "master gone, job finished");
                        return Ok(());
                    }
                    warn!(master = %self.master, "master unreachable at startup");
                    return Err(err);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn report(&self, base: &str) -> Result<()> {
        rpc::call::<String, ()>(&self.master, rpc::FINISHED_WORK, &base.to_string()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::JobConfig;
    use crate::wordcount;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn unreachable_master_is_fatal_at_startup() {
        let dir = TempDir::new().unwrap();
        let config = JobConfig::new()
            .set_data_dir(dir.path().join("data"))
            .set_poll_interval(Duration::from_millis(10));
        let worker = Worker::new(config, wordcount::client(), "127.0.0.1:1");
        match worker.run("127.0.0.1", 0).await {
            Err(Error::Network(_)) => (),
            other => panic!("expected fatal startup error, got {:?}", other),
        }
    }
}

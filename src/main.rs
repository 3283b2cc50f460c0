//! Process bootstrap: role selection and configuration.

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use distmr::master::Master;
use distmr::parameters::JobConfig;
use distmr::wordcount;
use distmr::worker::Worker;

#[derive(Debug, Parser)]
#[command(name = "distmr", about = "A distributed mapreduce engine")]
struct Cli {
    /// Role: `m` runs the master, `w` a worker.
    role: String,
    /// Port for RPC and data traffic.
    port: u16,
    /// Master address (`host:port`); required for workers.
    master: Option<String>,

    /// Address to bind and advertise to peers.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// Number of map tasks.
    #[arg(long, default_value_t = 9)]
    maps: usize,
    /// Number of reduce tasks.
    #[arg(long, default_value_t = 3)]
    reduces: usize,
    /// Source container the master splits (master role only).
    #[arg(long, default_value = "austen.sqlite3")]
    source: PathBuf,
    /// Local working directory, served as `/data/…`.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    /// Final merged output container (master role only).
    #[arg(long, default_value = "totally_awesome_output_file.sqlite3")]
    output: PathBuf,
    /// Worker idle re-poll interval in milliseconds.
    #[arg(long, default_value_t = 1000)]
    poll_interval_ms: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::try_parse().unwrap_or_else(|err| {
        let _ = err.print();
        process::exit(1);
    });

    let config = JobConfig::new()
        .set_tasks(cli.maps, cli.reduces)
        .set_source(cli.source)
        .set_data_dir(cli.data_dir)
        .set_output(cli.output)
        .set_poll_interval(Duration::from_millis(cli.poll_interval_ms));

    let outcome = match cli.role.as_str() {
        "m" => Master::new(config)
            .run(&cli.host, cli.port)
            .await
            .map(|_| ()),
        "w" => {
            let Some(master) = cli.master else {
                eprintln!("usage: distmr w <port> <masterAddress>");
                process::exit(1);
            };
            Worker::new(config, wordcount::client(), master)
                .run(&cli.host, cli.port)
                .await
        }
        other => {
            eprintln!("unknown role {:?}: use `m` or `w`", other);
            process::exit(1);
        }
    };

    if let Err(err) = outcome {
        error!(%err, "fatal");
        process::exit(1);
    }
}

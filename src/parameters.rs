//! Parameters for a mapreduce job.
//!

use std::path::PathBuf;
use std::time::Duration;

/// Per-job configuration shared by master and workers. The defaults
/// mirror the stock batch job; every knob can be overridden from the
/// command line.
#[derive(Clone, Debug)]
pub struct JobConfig {
    pub maps: usize,
    pub reduces: usize,

    pub source: PathBuf,
    pub data_dir: PathBuf,
    pub output: PathBuf,

    pub poll_interval: Duration,
}

impl Default for JobConfig {
    fn default() -> JobConfig {
        JobConfig {
            maps: 9,
            reduces: 3,
            source: PathBuf::from("austen.sqlite3"),
            data_dir: PathBuf::from("data"),
            output: PathBuf::from("totally_awesome_output_file.sqlite3"),
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl JobConfig {
    pub fn new() -> JobConfig {
        JobConfig::default()
    }

    /// Determines how many map and reduce tasks the job is split into.
    /// The reduce count also determines the sharding of map output data.
    ///
    /// Default 9/3
    pub fn set_tasks(mut self, maps: usize, reduces: usize) -> JobConfig {
        self.maps = maps;
        self.reduces = reduces;
        self
    }

    /// The source container the master splits into map partitions.
    pub fn set_source(mut self, source: impl Into<PathBuf>) -> JobConfig {
        self.source = source.into();
        self
    }

    /// The local working directory. Every file a process produces lands
    /// here, and the directory is what its HTTP endpoint serves to peers.
    /// (Note: make sure the location provides enough disk space.)
    ///
    /// Default `data`
    pub fn set_data_dir(mut self, dir: impl Into<PathBuf>) -> JobConfig {
        self.data_dir = dir.into();
        self
    }

    /// Where the master writes the final merged container.
    pub fn set_output(mut self, output: impl Into<PathBuf>) -> JobConfig {
        self.output = output.into();
        self
    }

    /// How long a worker sleeps after an idle reply before re-polling.
    ///
    /// Default 1s
    pub fn set_poll_interval(mut self, interval: Duration) -> JobConfig {
        self.poll_interval = interval;
        self
    }
}

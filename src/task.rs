//! Task descriptions exchanged between master and workers, and the file
//! naming scheme through which reducers locate map outputs.

use serde::{Deserialize, Serialize};

/// One map task: fetch the source partition at `source_host`, run the
/// mapper over it, produce `r` hashed output containers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapTask {
    /// Total number of map tasks in the job.
    pub m: usize,
    /// Total number of reduce tasks in the job.
    pub r: usize,
    /// This task's number, in [0, m).
    pub n: usize,
    /// URL of the source partition to fetch.
    pub source_host: String,
}

/// One reduce task: merge the n-th output of every map worker, reduce
/// the key groups, produce one output container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReduceTask {
    pub m: usize,
    pub r: usize,
    /// This task's number, in [0, r).
    pub n: usize,
    /// One URL per map task, each pointing at that map's n-th output.
    pub source_hosts: Vec<String>,
}

/// A work assignment. `Idle` tells the worker to sleep briefly and poll
/// again.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Task {
    Map(MapTask),
    Reduce(ReduceTask),
    Idle,
}

/// Counts reported by a completed map task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MapStats {
    pub pairs_in: u64,
    pub pairs_out: u64,
}

/// Counts reported by a completed reduce task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReduceStats {
    pub keys: u64,
    pub values: u64,
    pub pairs_out: u64,
}

// The naming scheme is contractual: reducers locate upstream map output
// purely by constructing these names.

pub fn map_source_file(m: usize) -> String {
    format!("map_{}_source.sqlite3", m)
}

/// Pattern handed to the partitioner; `{}` is the map task index.
pub fn map_source_pattern() -> &'static str {
    "map_{}_source.sqlite3"
}

pub fn map_input_file(m: usize) -> String {
    format!("map_{}_input.sqlite3", m)
}

pub fn map_output_file(m: usize, r: usize) -> String {
    format!("map_{}_output_{}.sqlite3", m, r)
}

pub fn reduce_input_file(r: usize) -> String {
    format!("reduce_{}_input.sqlite3", r)
}

pub fn reduce_output_file(r: usize) -> String {
    format!("reduce_{}_output.sqlite3", r)
}

pub fn reduce_temp_file(r: usize) -> String {
    format!("reduce_{}_temp.sqlite3", r)
}

/// URL under which `file` is served from the data directory of the
/// process at `base` (a `host:port` address).
pub fn data_url(base: &str, file: &str) -> String {
    format!("http://{}/data/{}", base, file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naming_scheme() {
        assert_eq!(map_source_file(4), "map_4_source.sqlite3");
        assert_eq!(
            map_source_pattern().replacen("{}", "4", 1),
            map_source_file(4)
        );
        assert_eq!(map_output_file(4, 2), "map_4_output_2.sqlite3");
        assert_eq!(reduce_temp_file(0), "reduce_0_temp.sqlite3");
        assert_eq!(
            data_url("10.0.0.7:8080", &reduce_output_file(1)),
            "http://10.0.0.7:8080/data/reduce_1_output.sqlite3"
        );
    }

    #[test]
    fn task_union_round_trips() {
        let task = Task::Map(MapTask {
            m: 9,
            r: 3,
            n: 1,
            source_host: "http://h:1/data/map_1_source.sqlite3".into(),
        });
        let encoded = serde_json::to_string(&task).unwrap();
        assert_eq!(serde_json::from_str::<Task>(&encoded).unwrap(), task);

        let idle: Task = serde_json::from_str(r#"{"kind":"idle"}"#).unwrap();
        assert_eq!(idle, Task::Idle);
    }
}

//! A distributed mapreduce engine: a master splits a key/value source
//! into map partitions, a pool of workers on different hosts executes
//! map and reduce tasks against SQLite-backed pair containers, and
//! intermediate data is shuffled between hosts over plain HTTP.
//!

pub mod closure_mr;
pub mod container;
pub mod error;
pub mod http;
mod map;
pub mod mapreducer;
pub mod master;
pub mod parameters;
pub mod partition;
pub mod record_types;
mod reduce;
pub mod rpc;
pub mod shuffle;
pub mod task;
pub mod wordcount;
pub mod worker;

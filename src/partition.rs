//! Splits a source container into per-map-task partitions.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::container::Container;
use crate::error::{Error, Result};

/// Splits `source` into `m` containers named by `pattern`, which must
/// contain one `{}` placeholder for the partition index. Records are
/// dealt round-robin, so partition sizes stay within one of each other
/// regardless of the key distribution; key locality comes later from
/// map-side hashing. All outputs are closed before the paths are
/// returned, in index order.
pub fn partition(source: impl AsRef<Path>, pattern: &str, m: usize) -> Result<Vec<PathBuf>> {
    let source = Container::open(source)?;
    let total = source.count()?;
    if m == 0 || (total as usize) < m {
        return Err(Error::Precondition(format!(
            "cannot split {} pairs into {} map partitions",
            total, m
        )));
    }

    let mut outputs = Vec::with_capacity(m);
    let mut paths = Vec::with_capacity(m);
    for i in 0..m {
        let path = PathBuf::from(pattern.replacen("{}", &i.to_string(), 1));
        outputs.push(Container::create(&path)?);
        paths.push(path);
    }

    let mut scan = source.scan()?;
    let mut next = 0;
    for pair in scan.rows()? {
        let pair = pair?;
        outputs[next].insert(&pair.key, &pair.value)?;
        next = (next + 1) % m;
    }
    drop(outputs);

    info!(partitions = m, pairs = total, "split source container");
    Ok(paths)
}

//! The shuffle merger: pulls a list of partial containers from peers
//! and folds them into one.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::container::Container;
use crate::error::Result;
use crate::http;

/// Fetches each URL in order into `temp` and merges its records into a
/// fresh container at `dest`, unlinking `temp` between merges. The
/// first failure aborts and propagates, leaving `dest` in place,
/// possibly partially populated; cleaning that up is the caller's
/// business.
pub async fn merge(urls: &[String], dest: impl AsRef<Path>, temp: impl AsRef<Path>) -> Result<Container> {
    let dest = Container::create(dest)?;
    let temp = temp.as_ref();
    for url in urls {
        http::fetch(url, temp).await?;
        dest.merge_from(temp)?;
        fs::remove_file(temp)?;
        debug!(url, dest = %dest.path().display(), "merged partial container");
    }
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::http::{data_router, serve};
    use crate::task::data_url;
    use tempfile::TempDir;
    use tokio::net::TcpListener;

    async fn serve_dir(dir: &Path) -> (String, tokio::task::JoinHandle<Result<()>>) {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let base = format!("127.0.0.1:{}", listener.local_addr().unwrap().port());
        let handle = tokio::spawn(serve(listener, data_router(dir)));
        (base, handle)
    }

    fn make_container(dir: &Path, name: &str, pairs: &[(&str, &str)]) {
        let c = Container::create(dir.join(name)).unwrap();
        for (k, v) in pairs {
            c.insert(k, v).unwrap();
        }
    }

    #[tokio::test]
    async fn merges_all_parts_and_removes_the_temp() {
        let dir = TempDir::new().unwrap();
        make_container(dir.path(), "part0.sqlite3", &[("a", "1"), ("b", "2")]);
        make_container(dir.path(), "part1.sqlite3", &[("c", "3")]);
        let (base, server) = serve_dir(dir.path()).await;

        let urls = vec![
            data_url(&base, "part0.sqlite3"),
            data_url(&base, "part1.sqlite3"),
        ];
        let dest = dir.path().join("merged.sqlite3");
        let temp = dir.path().join("temp.sqlite3");
        let merged = merge(&urls, &dest, &temp).await.unwrap();
        assert_eq!(merged.count().unwrap(), 3);
        assert!(!temp.exists());
        server.abort();
    }

    #[tokio::test]
    async fn aborts_on_first_bad_url_leaving_partial_dest() {
        let dir = TempDir::new().unwrap();
        make_container(dir.path(), "part0.sqlite3", &[("a", "1")]);
        let (base, server) = serve_dir(dir.path()).await;

        let urls = vec![
            data_url(&base, "part0.sqlite3"),
            data_url(&base, "absent.sqlite3"),
        ];
        let dest = dir.path().join("merged.sqlite3");
        let temp = dir.path().join("temp.sqlite3");
        let err = merge(&urls, &dest, &temp).await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
        assert_eq!(Container::open(&dest).unwrap().count().unwrap(), 1);
        server.abort();
    }
}

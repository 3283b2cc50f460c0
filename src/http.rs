//! The HTTP data plane: per-process file serving of the working
//! directory, and the symmetric streaming fetch.

use std::path::Path;

use axum::Router;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::debug;

use crate::error::Result;

/// Routes `GET /data/<file>` to the files under `dir`. Missing files
/// yield 404; other methods are rejected by the file service. Nothing
/// served this way is ever mutated or deleted by the server side.
pub fn data_router(dir: impl AsRef<Path>) -> Router {
    Router::new().nest_service("/data", ServeDir::new(dir.as_ref()))
}

/// Runs `router` on an already-bound listener.
pub async fn serve(listener: TcpListener, router: Router) -> Result<()> {
    axum::serve(listener, router).await?;
    Ok(())
}

/// Streams the body of `url` into `dest`, creating or truncating it.
pub async fn fetch(url: &str, dest: impl AsRef<Path>) -> Result<()> {
    let dest = dest.as_ref();
    let mut file = File::create(dest).await?;
    let mut response = reqwest::get(url).await?.error_for_status()?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        written += chunk.len() as u64;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    debug!(url, bytes = written, dest = %dest.display(), "fetched");
    Ok(())
}

//! The control plane between workers and master: two master-side
//! methods, carried as JSON over the master's HTTP endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};

use crate::error::{Error, Result};
use crate::task::Task;

pub const WORK_REQUEST: &str = "work_request";
pub const FINISHED_WORK: &str = "finished_work";

/// The master-side channel ends the RPC methods talk to. The request
/// token and the response receive are paired under one lock so that
/// concurrent workers cannot pick up each other's assignment.
pub struct MasterRpc {
    work: Mutex<(mpsc::Sender<()>, mpsc::Receiver<Task>)>,
    finished: mpsc::Sender<String>,
}

impl MasterRpc {
    pub fn new(
        requests: mpsc::Sender<()>,
        responses: mpsc::Receiver<Task>,
        finished: mpsc::Sender<String>,
    ) -> MasterRpc {
        MasterRpc {
            work: Mutex::new((requests, responses)),
            finished,
        }
    }
}

/// Routes for the master's two methods.
pub fn router(rpc: Arc<MasterRpc>) -> Router {
    Router::new()
        .route("/rpc/work_request", post(work_request))
        .route("/rpc/finished_work", post(finished_work))
        .with_state(rpc)
}

/// Blocks until the coordinator accepts the work request and answers
/// with a task. 503 once the master has closed its channels.
async fn work_request(
    State(rpc): State<Arc<MasterRpc>>,
) -> std::result::Result<Json<Task>, StatusCode> {
    let mut work = rpc.work.lock().await;
    let (requests, responses) = &mut *work;
    if requests.send(()).await.is_err() {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    match responses.recv().await {
        Some(task) => Ok(Json(task)),
        None => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}

/// Reports a completed task; the body is the worker's base URL, the
/// provenance recorded for the partition it produced.
async fn finished_work(
    State(rpc): State<Arc<MasterRpc>>,
    Json(address): Json<String>,
) -> std::result::Result<Json<()>, StatusCode> {
    match rpc.finished.send(address).await {
        Ok(()) => Ok(Json(())),
        Err(_) => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}

/// Invokes master method `method` at `address` over a fresh connection,
/// decoding the JSON reply. 503 surfaces as `Unavailable`, everything
/// else transport-related as `Network`.
pub async fn call<Req, Resp>(address: &str, method: &str, request: &Req) -> Result<Resp>
where
    Req: Serialize,
    Resp: DeserializeOwned,
{
    let url = format!("http://{}/rpc/{}", address, method);
    let response = reqwest::Client::builder()
        .build()?
        .post(&url)
        .json(request)
        .send()
        .await?;
    if response.status() == reqwest::StatusCode::SERVICE_UNAVAILABLE {
        return Err(Error::Unavailable);
    }
    Ok(response.error_for_status()?.json().await?)
}

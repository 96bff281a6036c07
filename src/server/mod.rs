//! JSON RPC surface over HTTP.
//!
//! `GET /status` reports readiness without touching the browser and
//! `POST /rpc` runs one harness operation per request.

pub mod errors;
pub mod handlers;
pub mod model;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::harness::Harness;

pub use errors::RpcError;
pub use handlers::{dispatch, RpcCtx};
pub use model::{RpcRequest, RpcResponse};

#[derive(Clone)]
pub struct RpcServer {
    harness: Arc<Harness>,
    permissive_cors: bool,
}

impl RpcServer {
    pub fn new(harness: Arc<Harness>) -> Self {
        Self {
            harness,
            permissive_cors: false,
        }
    }

    /// Lets browser pages on other origins call the endpoint.
    pub fn with_permissive_cors(mut self, enabled: bool) -> Self {
        self.permissive_cors = enabled;
        self
    }

    pub fn build(self) -> Router {
        let router = Router::new()
            .route("/status", get(handlers::status))
            .route("/rpc", post(handlers::rpc))
            .with_state(RpcCtx {
                harness: self.harness,
            })
            .layer(TraceLayer::new_for_http());
        if self.permissive_cors {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }
}

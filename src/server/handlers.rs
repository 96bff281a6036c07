use std::sync::Arc;

use axum::extract::State;
use axum::{response::IntoResponse, Json};
use extensions_bridge::ExtensionId;
use harness_remote_control::{CreateTab, CreateWindow};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info_span, Instrument};

use super::errors::RpcError;
use super::model::*;
use crate::errors::{HarnessError, HarnessResult};
use crate::harness::Harness;

#[derive(Clone)]
pub struct RpcCtx {
    pub harness: Arc<Harness>,
}

pub async fn status(State(ctx): State<RpcCtx>) -> impl IntoResponse {
    Json(RpcResponse::ok(json!(ctx.harness.status())))
}

pub async fn rpc(
    State(ctx): State<RpcCtx>,
    Json(req): Json<RpcRequest>,
) -> Result<Json<RpcResponse>, RpcError> {
    let span = info_span!("rpc", method = %req.method);
    let data = dispatch(&ctx.harness, &req.method, req.params)
        .instrument(span)
        .await?;
    Ok(Json(RpcResponse::ok(data)))
}

/// Runs one named harness operation with JSON params.
pub async fn dispatch(harness: &Harness, method: &str, params: Value) -> HarnessResult<Value> {
    debug!(target: "rpc", method, "dispatching");
    let forwarder = harness.forwarder();
    let waits = harness.waits();
    match method {
        "status" => to_value(harness.status()),
        "init" => harness.init().await.map(|_| Value::Null),
        "reset" => harness.reset().await.map(|_| Value::Null),

        "getTabs" => to_value(forwarder.tabs().await?),
        "getTab" => {
            let p: TabParams = parse(params)?;
            to_value(forwarder.tab(p.tab_id).await?)
        }
        "createTab" => {
            let p: CreateTab = parse_or_default(params)?;
            to_value(forwarder.create_tab(p).await?)
        }
        "closeTab" => {
            let p: TabParams = parse(params)?;
            forwarder.close_tab(p.tab_id).await?;
            Ok(Value::Null)
        }
        "updateTab" => {
            let p: UpdateTabParams = parse(params)?;
            to_value(forwarder.update_tab(p.tab_id, p.props).await?)
        }
        "moveTab" => {
            let p: MoveTabParams = parse(params)?;
            to_value(forwarder.move_tab(p.tab_id, p.index, p.window_id).await?)
        }
        "pinTab" => {
            let p: PinTabParams = parse(params)?;
            to_value(forwarder.pin_tab(p.tab_id, p.pinned).await?)
        }
        "muteTab" => {
            let p: MuteTabParams = parse(params)?;
            to_value(forwarder.mute_tab(p.tab_id, p.muted).await?)
        }

        "getWindows" => to_value(forwarder.windows().await?),
        "createWindow" => {
            let p: CreateWindow = parse_or_default(params)?;
            to_value(forwarder.create_window(p).await?)
        }
        "closeWindow" => {
            let p: WindowParams = parse(params)?;
            forwarder.close_window(p.window_id).await?;
            Ok(Value::Null)
        }
        "resizeWindow" => {
            let p: ResizeWindowParams = parse(params)?;
            to_value(
                forwarder
                    .resize_window(p.window_id, p.width, p.height)
                    .await?,
            )
        }
        "captureScreenshot" => {
            let p: ScreenshotParams = parse_or_default(params)?;
            to_value(forwarder.capture_screenshot(p.window_id).await?)
        }

        "getEvents" => {
            let p: EventsParams = parse(params)?;
            to_value(harness.fetch_events(p.category, p.clear).await)
        }
        "clearEvents" => {
            harness.clear_events();
            Ok(Value::Null)
        }

        "waitForTabUrl" => {
            let p: WaitUrlParams = parse(params)?;
            let options = p.wait.resolve(waits.tab_url);
            to_value(harness.wait_for_tab_url(&p.pattern, options).await?)
        }
        "waitForTabLoad" => {
            let p: WaitLoadParams = parse(params)?;
            let options = p.wait.resolve(waits.tab_load);
            to_value(harness.wait_for_tab_load(p.tab_id, options).await?)
        }
        "waitForEvent" => {
            let p: WaitEventParams = parse(params)?;
            let options = p.wait.resolve(waits.event);
            to_value(harness.wait_for_event(p.category, p.kind, options).await)
        }
        "waitForTabCount" => {
            let p: WaitCountParams = parse(params)?;
            let options = p.wait.resolve(waits.count);
            to_value(harness.wait_for_tab_count(p.count, options).await?)
        }
        "waitForWindowCount" => {
            let p: WaitCountParams = parse(params)?;
            let options = p.wait.resolve(waits.count);
            to_value(harness.wait_for_window_count(p.count, options).await?)
        }

        "sendToExtension" => {
            let p: SendParams = parse(params)?;
            harness
                .send_to_extension(&ExtensionId(p.extension_id), p.message)
                .await
        }
        "getExtensionUuids" => to_value(harness.extension_uuids().await?),

        other => Err(HarnessError::UnknownMethod(other.to_string())),
    }
}

fn parse<T: DeserializeOwned>(params: Value) -> HarnessResult<T> {
    serde_json::from_value(params).map_err(|err| HarnessError::invalid(err.to_string()))
}

fn parse_or_default<T: DeserializeOwned + Default>(params: Value) -> HarnessResult<T> {
    if params.is_null() {
        return Ok(T::default());
    }
    parse(params)
}

fn to_value<T: Serialize>(value: T) -> HarnessResult<Value> {
    serde_json::to_value(value).map_err(|err| HarnessError::invalid(err.to_string()))
}

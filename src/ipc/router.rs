use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    if let Some(resp) = handlers::core::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::session::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::setup::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::students::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::grades::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::attendance::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::transcript::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::overview::try_handle(state, &req) {
        return resp;
    }

    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}

use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use crate::session::SessionState;
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    let signed_in = !matches!(state.session, SessionState::LoggedOut);
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "signedIn": signed_in,
            "students": state.store.students().len()
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        _ => None,
    }
}

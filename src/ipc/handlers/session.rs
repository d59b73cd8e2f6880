use crate::access::{self, Action, Role, Section};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::session::{self, SessionEvent, SessionState};
use serde_json::json;

/// Everything the shell needs to render for the signed-in user: the
/// identity, the current view, and the role's sections and capabilities.
fn session_payload(state: &AppState) -> serde_json::Value {
    match &state.session {
        SessionState::LoggedOut => json!({ "signedIn": false }),
        SessionState::LoggedIn { account, view } => {
            let sections: Vec<&str> = access::visible_sections(account.role)
                .iter()
                .map(|s| s.as_str())
                .collect();
            let actions: Vec<&str> = Action::ALL
                .iter()
                .copied()
                .filter(|a| access::can_perform(account.role, *a))
                .map(Action::as_str)
                .collect();
            json!({
                "signedIn": true,
                "account": {
                    "id": account.id,
                    "name": account.name,
                    "role": account.role.as_str(),
                    "email": account.email,
                    "studentId": account.student_no,
                },
                "view": view.as_str(),
                "sections": sections,
                "actions": actions
            })
        }
    }
}

fn transition(state: &mut AppState, req: &Request, event: SessionEvent) -> serde_json::Value {
    match session::apply(&state.session, event, &state.accounts) {
        Ok(next) => {
            state.session = next;
            ok(&req.id, session_payload(state))
        }
        Err(e) => err(&req.id, e.code, e.message, None),
    }
}

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("role").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.role", None);
    };
    let Some(role) = Role::parse(raw) else {
        return err(
            &req.id,
            "bad_params",
            format!("unknown role: {}", raw),
            None,
        );
    };
    transition(state, req, SessionEvent::Login(role))
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    transition(state, req, SessionEvent::Logout)
}

fn handle_navigate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("view").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.view", None);
    };
    let Some(section) = Section::parse(raw) else {
        return err(
            &req.id,
            "bad_params",
            format!("unknown view: {}", raw),
            None,
        );
    };
    transition(state, req, SessionEvent::Navigate(section))
}

fn handle_current(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, session_payload(state))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.login" => Some(handle_login(state, req)),
        "session.logout" => Some(handle_logout(state, req)),
        "session.navigate" => Some(handle_navigate(state, req)),
        "session.current" => Some(handle_current(state, req)),
        _ => None,
    }
}

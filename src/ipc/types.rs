use std::collections::HashMap;

use serde::Deserialize;

use crate::session::SessionState;
use crate::store::{RecordStore, UserAccount};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub accounts: Vec<UserAccount>,
    pub session: SessionState,
    pub store: Box<dyn RecordStore>,
    // Setup overrides keyed by section; defaults apply underneath.
    pub settings: HashMap<String, serde_json::Value>,
}

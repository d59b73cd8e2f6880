mod access;
mod calc;
mod ipc;
mod seed;
mod session;
mod store;

use std::collections::HashMap;
use std::io::{self, BufRead, Write};

fn main() {
    // One session per process; the shell owns the daemon's lifetime.
    let mut state = ipc::AppState {
        accounts: seed::sample_accounts(),
        session: session::SessionState::LoggedOut,
        store: Box::new(seed::sample_store()),
        settings: HashMap::new(),
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id; ignore.
                let _ = writeln!(
                    stdout,
                    "{{\"ok\":false,\"error\":{{\"code\":\"bad_json\",\"message\":\"{}\"}}}}",
                    e
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}

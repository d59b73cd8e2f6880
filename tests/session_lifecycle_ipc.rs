use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_registrard");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn registrard");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn error_code(resp: &serde_json::Value) -> Option<&str> {
    resp.pointer("/error/code").and_then(|v| v.as_str())
}

#[test]
fn session_walks_the_state_machine() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    // Guarded methods refuse before sign-in.
    let list = request(&mut stdin, &mut reader, "1", "students.list", json!({}));
    assert_eq!(error_code(&list), Some("not_signed_in"));
    let logout = request(&mut stdin, &mut reader, "2", "session.logout", json!({}));
    assert_eq!(error_code(&logout), Some("not_signed_in"));
    let nav = request(
        &mut stdin,
        &mut reader,
        "3",
        "session.navigate",
        json!({ "view": "overview" }),
    );
    assert_eq!(error_code(&nav), Some("not_signed_in"));

    let bad_role = request(
        &mut stdin,
        &mut reader,
        "4",
        "session.login",
        json!({ "role": "registrar" }),
    );
    assert_eq!(error_code(&bad_role), Some("bad_params"));

    // Login lands on the overview with role-shaped sections and actions.
    let login = request(
        &mut stdin,
        &mut reader,
        "5",
        "session.login",
        json!({ "role": "student" }),
    );
    assert_eq!(
        login.pointer("/result/signedIn").and_then(|v| v.as_bool()),
        Some(true)
    );
    assert_eq!(
        login.pointer("/result/view").and_then(|v| v.as_str()),
        Some("overview")
    );
    assert_eq!(
        login
            .pointer("/result/account/studentId")
            .and_then(|v| v.as_str()),
        Some("STU2024001")
    );
    let sections: Vec<&str> = login
        .pointer("/result/sections")
        .and_then(|v| v.as_array())
        .map(|a| a.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();
    assert_eq!(sections, vec!["overview", "profile", "academic", "transcript"]);
    let actions: Vec<&str> = login
        .pointer("/result/actions")
        .and_then(|v| v.as_array())
        .map(|a| a.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();
    assert_eq!(actions, vec!["generate-transcript", "edit-own-profile"]);

    let again = request(
        &mut stdin,
        &mut reader,
        "6",
        "session.login",
        json!({ "role": "admin" }),
    );
    assert_eq!(error_code(&again), Some("bad_state"));

    // Students may not open the staff roster section.
    let hidden = request(
        &mut stdin,
        &mut reader,
        "7",
        "session.navigate",
        json!({ "view": "students" }),
    );
    assert_eq!(error_code(&hidden), Some("forbidden"));

    let moved = request(
        &mut stdin,
        &mut reader,
        "8",
        "session.navigate",
        json!({ "view": "transcript" }),
    );
    assert_eq!(
        moved.pointer("/result/view").and_then(|v| v.as_str()),
        Some("transcript")
    );

    let current = request(&mut stdin, &mut reader, "9", "session.current", json!({}));
    assert_eq!(
        current.pointer("/result/view").and_then(|v| v.as_str()),
        Some("transcript")
    );

    let out = request(&mut stdin, &mut reader, "10", "session.logout", json!({}));
    assert_eq!(
        out.pointer("/result/signedIn").and_then(|v| v.as_bool()),
        Some(false)
    );

    // A fresh login is allowed after logout and resets the view.
    let relogin = request(
        &mut stdin,
        &mut reader,
        "11",
        "session.login",
        json!({ "role": "admin" }),
    );
    assert_eq!(
        relogin.pointer("/result/view").and_then(|v| v.as_str()),
        Some("overview")
    );
    let admin_sections: Vec<&str> = relogin
        .pointer("/result/sections")
        .and_then(|v| v.as_array())
        .map(|a| a.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();
    assert_eq!(
        admin_sections,
        vec!["overview", "students", "academic", "attendance", "transcript"]
    );

    drop(stdin);
    let _ = child.wait();
}

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
fn attendance_rates_follow_filters() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request(
        &mut stdin,
        &mut reader,
        "1",
        "session.login",
        json!({ "role": "admin" }),
    );

    let all = request(&mut stdin, &mut reader, "2", "attendance.list", json!({}));
    assert_eq!(
        all.pointer("/result/summary/total").and_then(|v| v.as_u64()),
        Some(6)
    );
    assert_eq!(
        all.pointer("/result/summary/attended")
            .and_then(|v| v.as_u64()),
        Some(5)
    );
    assert_eq!(
        all.pointer("/result/summary/rate").and_then(|v| v.as_f64()),
        Some(83.3)
    );
    let courses: Vec<&str> = all
        .pointer("/result/courses")
        .and_then(|v| v.as_array())
        .map(|a| {
            a.iter()
                .filter_map(|c| c.get("courseCode").and_then(|v| v.as_str()))
                .collect()
        })
        .unwrap_or_default();
    assert_eq!(courses, vec!["CS301", "CS302"]);

    // One class day: present, present, late, absent -> 75.0.
    let day = request(
        &mut stdin,
        &mut reader,
        "3",
        "attendance.list",
        json!({ "filters": { "date": "2024-10-28" } }),
    );
    assert_eq!(
        day.pointer("/result/summary/total").and_then(|v| v.as_u64()),
        Some(4)
    );
    assert_eq!(
        day.pointer("/result/summary/rate").and_then(|v| v.as_f64()),
        Some(75.0)
    );
    let statuses: Vec<&str> = day
        .pointer("/result/records")
        .and_then(|v| v.as_array())
        .map(|a| {
            a.iter()
                .filter_map(|r| r.get("status").and_then(|v| v.as_str()))
                .collect()
        })
        .unwrap_or_default();
    assert_eq!(statuses, vec!["present", "present", "late", "absent"]);

    let course = request(
        &mut stdin,
        &mut reader,
        "4",
        "attendance.list",
        json!({ "filters": { "course": "cs302" } }),
    );
    assert_eq!(
        course
            .pointer("/result/summary/total")
            .and_then(|v| v.as_u64()),
        Some(2)
    );
    assert_eq!(
        course
            .pointer("/result/summary/rate")
            .and_then(|v| v.as_f64()),
        Some(100.0)
    );

    let bad = request(
        &mut stdin,
        &mut reader,
        "5",
        "attendance.list",
        json!({ "filters": { "date": "28/10/2024" } }),
    );
    assert_eq!(error_code(&bad), Some("bad_params"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn recording_attendance_validates_and_scopes() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request(
        &mut stdin,
        &mut reader,
        "1",
        "session.login",
        json!({ "role": "academic" }),
    );

    let bad_date = request(
        &mut stdin,
        &mut reader,
        "2",
        "attendance.record",
        json!({
            "studentId": "STU2024001",
            "courseCode": "CS301",
            "date": "29-10-2024",
            "status": "present"
        }),
    );
    assert_eq!(error_code(&bad_date), Some("validation_failed"));

    let bad_status = request(
        &mut stdin,
        &mut reader,
        "3",
        "attendance.record",
        json!({
            "studentId": "STU2024001",
            "courseCode": "CS301",
            "date": "2024-10-29",
            "status": "excused"
        }),
    );
    assert_eq!(error_code(&bad_status), Some("validation_failed"));
    assert_eq!(
        bad_status
            .pointer("/error/details/status")
            .and_then(|v| v.as_str()),
        Some("excused")
    );

    let recorded = request(
        &mut stdin,
        &mut reader,
        "4",
        "attendance.record",
        json!({
            "studentId": "STU2024001",
            "courseCode": "CS301",
            "date": "2024-10-29",
            "status": "late"
        }),
    );
    assert!(recorded
        .pointer("/result/attendanceId")
        .and_then(|v| v.as_str())
        .is_some());

    // The new row reuses the course name already on file.
    let listed = request(
        &mut stdin,
        &mut reader,
        "5",
        "attendance.list",
        json!({ "filters": { "date": "2024-10-29" } }),
    );
    assert_eq!(
        listed
            .pointer("/result/records/0/courseName")
            .and_then(|v| v.as_str()),
        Some("Data Structures")
    );
    assert_eq!(
        listed
            .pointer("/result/records/0/studentName")
            .and_then(|v| v.as_str()),
        Some("Emma Williams")
    );
    assert_eq!(
        listed
            .pointer("/result/summary/rate")
            .and_then(|v| v.as_f64()),
        Some(100.0)
    );

    let _ = request(&mut stdin, &mut reader, "6", "session.logout", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "7",
        "session.login",
        json!({ "role": "student" }),
    );

    // Students see their own rows only; criteria never change that scope.
    let own = request(&mut stdin, &mut reader, "8", "attendance.list", json!({}));
    let records = own
        .pointer("/result/records")
        .and_then(|v| v.as_array())
        .cloned()
        .expect("records array");
    assert_eq!(records.len(), 3);
    assert!(records
        .iter()
        .all(|r| r.get("studentId").and_then(|v| v.as_str()) == Some("STU2024001")));
    assert_eq!(
        own.pointer("/result/summary/rate").and_then(|v| v.as_f64()),
        Some(100.0)
    );

    let filtered = request(
        &mut stdin,
        &mut reader,
        "9",
        "attendance.list",
        json!({ "filters": { "date": "2024-10-28" } }),
    );
    assert_eq!(
        filtered
            .pointer("/result/records")
            .and_then(|v| v.as_array())
            .map(|a| a.len()),
        Some(3)
    );

    let record = request(
        &mut stdin,
        &mut reader,
        "10",
        "attendance.record",
        json!({
            "studentId": "STU2024001",
            "courseCode": "CS301",
            "date": "2024-10-30",
            "status": "present"
        }),
    );
    assert_eq!(error_code(&record), Some("forbidden"));

    drop(stdin);
    let _ = child.wait();
}

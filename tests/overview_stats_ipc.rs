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
fn overview_is_shaped_per_role() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let signed_out = request(&mut stdin, &mut reader, "1", "overview.stats", json!({}));
    assert_eq!(error_code(&signed_out), Some("not_signed_in"));

    let _ = request(
        &mut stdin,
        &mut reader,
        "2",
        "session.login",
        json!({ "role": "admin" }),
    );
    let admin = request(&mut stdin, &mut reader, "3", "overview.stats", json!({}));
    assert_eq!(
        admin.pointer("/result/role").and_then(|v| v.as_str()),
        Some("admin")
    );
    assert_eq!(
        admin
            .pointer("/result/totalStudents")
            .and_then(|v| v.as_u64()),
        Some(5)
    );
    assert_eq!(
        admin
            .pointer("/result/activeStudents")
            .and_then(|v| v.as_u64()),
        Some(4)
    );
    assert_eq!(
        admin.pointer("/result/courseCount").and_then(|v| v.as_u64()),
        Some(12)
    );
    assert_eq!(
        admin
            .pointer("/result/averageAttendance")
            .and_then(|v| v.as_f64()),
        Some(83.3)
    );
    assert_eq!(
        admin
            .pointer("/result/currentSemester")
            .and_then(|v| v.as_str()),
        Some("Fall 2024")
    );

    let _ = request(&mut stdin, &mut reader, "4", "session.logout", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "5",
        "session.login",
        json!({ "role": "academic" }),
    );
    let academic = request(&mut stdin, &mut reader, "6", "overview.stats", json!({}));
    assert_eq!(
        academic.pointer("/result/role").and_then(|v| v.as_str()),
        Some("academic")
    );
    assert_eq!(
        academic
            .pointer("/result/totalStudents")
            .and_then(|v| v.as_u64()),
        Some(5)
    );
    assert_eq!(
        academic
            .pointer("/result/taughtCourses")
            .and_then(|v| v.as_u64()),
        Some(3)
    );
    assert_eq!(
        academic
            .pointer("/result/recordedGrades")
            .and_then(|v| v.as_u64()),
        Some(3)
    );

    let _ = request(&mut stdin, &mut reader, "7", "session.logout", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "8",
        "session.login",
        json!({ "role": "student" }),
    );
    let student = request(&mut stdin, &mut reader, "9", "overview.stats", json!({}));
    assert_eq!(
        student.pointer("/result/role").and_then(|v| v.as_str()),
        Some("student")
    );
    assert_eq!(
        student.pointer("/result/gpa").and_then(|v| v.as_f64()),
        Some(3.76)
    );
    assert_eq!(
        student
            .pointer("/result/totalCredits")
            .and_then(|v| v.as_u64()),
        Some(28)
    );
    assert_eq!(
        student
            .pointer("/result/enrolledCourses")
            .and_then(|v| v.as_u64()),
        Some(4)
    );
    assert_eq!(
        student
            .pointer("/result/attendanceRate")
            .and_then(|v| v.as_f64()),
        Some(100.0)
    );

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn academic_counters_follow_new_grades() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request(
        &mut stdin,
        &mut reader,
        "1",
        "session.login",
        json!({ "role": "academic" }),
    );

    // Default instructor is the signed-in academic, so the add shows up
    // in both counters.
    let added = request(
        &mut stdin,
        &mut reader,
        "2",
        "grades.add",
        json!({
            "studentId": "STU2024002",
            "courseCode": "BUS305",
            "courseName": "Operations Management",
            "grade": "B",
            "credits": 3
        }),
    );
    assert!(added
        .pointer("/result/gradeId")
        .and_then(|v| v.as_str())
        .is_some());

    let stats = request(&mut stdin, &mut reader, "3", "overview.stats", json!({}));
    assert_eq!(
        stats
            .pointer("/result/taughtCourses")
            .and_then(|v| v.as_u64()),
        Some(4)
    );
    assert_eq!(
        stats
            .pointer("/result/recordedGrades")
            .and_then(|v| v.as_u64()),
        Some(4)
    );

    drop(stdin);
    let _ = child.wait();
}

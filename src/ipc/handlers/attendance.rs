use crate::access::{self, Action};
use crate::calc::{self, AttendanceStatus};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{AttendanceRecord, UserAccount};
use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;

struct HandlerErr {
    code: &'static str,
    message: String,
    details: Option<serde_json::Value>,
}

impl HandlerErr {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        HandlerErr {
            code,
            message: message.into(),
            details: None,
        }
    }

    fn with_details(code: &'static str, message: impl Into<String>, details: serde_json::Value) -> Self {
        HandlerErr {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

fn require_account(state: &AppState) -> Result<UserAccount, HandlerErr> {
    state
        .session
        .account()
        .cloned()
        .ok_or_else(|| HandlerErr::new("not_signed_in", "sign in first"))
}

fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

fn attendance_row(a: &AttendanceRecord) -> serde_json::Value {
    json!({
        "id": a.id.clone(),
        "studentId": a.student_no.clone(),
        "studentName": a.student_name.clone(),
        "courseCode": a.course_code.clone(),
        "courseName": a.course_name.clone(),
        "date": a.date.clone(),
        "status": a.status.as_str()
    })
}

fn attendance_list(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let account = require_account(state)?;
    let filters = calc::parse_record_filters(req.params.get("filters"))
        .map_err(|e| HandlerErr::new("bad_params", e.message))?;

    // Course options come from the role scope alone, so the dropdown stays
    // stable while criteria narrow the rows.
    let scope = calc::select_visible(
        state.store.attendance(),
        account.role,
        account.student_no.as_deref(),
        |a| a.student_no.as_str(),
        |_| true,
    );

    let mut courses: Vec<serde_json::Value> = Vec::new();
    let mut seen: Vec<&str> = Vec::new();
    for rec in &scope {
        if !seen.contains(&rec.course_code.as_str()) {
            seen.push(rec.course_code.as_str());
            courses.push(json!({
                "courseCode": rec.course_code.clone(),
                "courseName": rec.course_name.clone()
            }));
        }
    }

    let rows = calc::select_visible(
        state.store.attendance(),
        account.role,
        account.student_no.as_deref(),
        |a| a.student_no.as_str(),
        |a| filters.matches_attendance(a),
    );
    let summary = calc::attendance_summary(rows.iter().copied());
    let records: Vec<serde_json::Value> = rows.iter().map(|a| attendance_row(a)).collect();

    Ok(json!({
        "records": records,
        "summary": summary,
        "courses": courses,
        "filters": filters
    }))
}

fn attendance_record(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let account = require_account(state)?;
    if !access::can_perform(account.role, Action::RecordAttendance) {
        return Err(HandlerErr::new(
            "forbidden",
            format!("{} may not record attendance", account.role.as_str()),
        ));
    }

    let student_no = get_required_str(&req.params, "studentId")?;
    let course_code = get_required_str(&req.params, "courseCode")?;
    if course_code.trim().is_empty() {
        return Err(HandlerErr::with_details(
            "validation_failed",
            "courseCode must not be empty",
            json!({ "field": "courseCode" }),
        ));
    }
    let course_code = course_code.trim().to_string();

    let date_raw = get_required_str(&req.params, "date")?;
    let date = match NaiveDate::parse_from_str(date_raw.trim(), "%Y-%m-%d") {
        Ok(d) => d.format("%Y-%m-%d").to_string(),
        Err(_) => {
            return Err(HandlerErr::with_details(
                "validation_failed",
                "date must be YYYY-MM-DD",
                json!({ "date": date_raw }),
            ))
        }
    };

    let status_raw = get_required_str(&req.params, "status")?;
    let Some(status) = AttendanceStatus::parse(&status_raw) else {
        return Err(HandlerErr::with_details(
            "validation_failed",
            format!("unknown status: {}", status_raw),
            json!({ "status": status_raw }),
        ));
    };

    let course_name = match req.params.get("courseName").and_then(|v| v.as_str()) {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => course_name_for(state, &course_code),
    };
    let student_name = match state.store.find_student(&student_no) {
        Some(s) => s.name.clone(),
        None => "Unknown Student".to_string(),
    };

    let attendance_id = Uuid::new_v4().to_string();
    state.store.add_attendance(AttendanceRecord {
        id: attendance_id.clone(),
        student_no,
        student_name,
        course_code,
        course_name,
        date,
        status,
    });

    Ok(json!({ "attendanceId": attendance_id }))
}

fn course_name_for(state: &AppState, course_code: &str) -> String {
    if let Some(a) = state
        .store
        .attendance()
        .iter()
        .find(|a| a.course_code.eq_ignore_ascii_case(course_code))
    {
        return a.course_name.clone();
    }
    if let Some(g) = state
        .store
        .grades()
        .iter()
        .find(|g| g.course_code.eq_ignore_ascii_case(course_code))
    {
        return g.course_name.clone();
    }
    course_code.to_string()
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.list" => Some(match attendance_list(state, req) {
            Ok(v) => ok(&req.id, v),
            Err(e) => e.response(&req.id),
        }),
        "attendance.record" => Some(match attendance_record(state, req) {
            Ok(v) => ok(&req.id, v),
            Err(e) => e.response(&req.id),
        }),
        _ => None,
    }
}

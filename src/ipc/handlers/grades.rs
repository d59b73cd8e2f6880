use super::setup;
use crate::access::{self, Action};
use crate::calc::{self, LetterGrade};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{GradeRecord, UserAccount};
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

fn get_optional_str(params: &serde_json::Value, key: &str) -> Result<Option<String>, HandlerErr> {
    match params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => {
            let t = s.trim();
            if t.is_empty() {
                Ok(None)
            } else {
                Ok(Some(t.to_string()))
            }
        }
        Some(_) => Err(HandlerErr::new(
            "bad_params",
            format!("{} must be a string", key),
        )),
    }
}

fn grade_row(g: &GradeRecord) -> serde_json::Value {
    json!({
        "id": g.id.clone(),
        "studentId": g.student_no.clone(),
        "studentName": g.student_name.clone(),
        "courseCode": g.course_code.clone(),
        "courseName": g.course_name.clone(),
        "semester": g.semester.clone(),
        "grade": g.grade.as_str(),
        "credits": g.credits,
        "instructor": g.instructor.clone()
    })
}

fn grades_list(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let account = require_account(state)?;
    let filters = calc::parse_record_filters(req.params.get("filters"))
        .map_err(|e| HandlerErr::new("bad_params", e.message))?;

    let grades = state.store.grades();
    let visible = calc::select_visible(
        grades,
        account.role,
        account.student_no.as_deref(),
        |g| g.student_no.as_str(),
        |g| filters.matches_grade(g),
    );
    let summary = calc::grade_summary(visible.iter().copied());
    let rows: Vec<serde_json::Value> = visible.iter().map(|g| grade_row(g)).collect();

    Ok(json!({
        "records": rows,
        "summary": summary,
        "filters": filters
    }))
}

/// Resolve a display name for a course code from rows that already carry
/// it, falling back to the code itself.
fn course_name_for(state: &AppState, course_code: &str) -> String {
    if let Some(g) = state
        .store
        .grades()
        .iter()
        .find(|g| g.course_code.eq_ignore_ascii_case(course_code))
    {
        return g.course_name.clone();
    }
    if let Some(a) = state
        .store
        .attendance()
        .iter()
        .find(|a| a.course_code.eq_ignore_ascii_case(course_code))
    {
        return a.course_name.clone();
    }
    course_code.to_string()
}

fn student_name_for(state: &AppState, student_no: &str) -> String {
    if let Some(s) = state.store.find_student(student_no) {
        return s.name.clone();
    }
    if let Some(g) = state
        .store
        .grades()
        .iter()
        .find(|g| g.student_no == student_no)
    {
        return g.student_name.clone();
    }
    "Unknown Student".to_string()
}

fn grades_add(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let account = require_account(state)?;
    if !access::can_perform(account.role, Action::AddGrade) {
        return Err(HandlerErr::new(
            "forbidden",
            format!("{} may not add grades", account.role.as_str()),
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

    // Unknown letters never reach the store; GPA math depends on it.
    let grade_raw = get_required_str(&req.params, "grade")?;
    let Some(letter) = LetterGrade::parse(&grade_raw) else {
        return Err(HandlerErr::with_details(
            "validation_failed",
            format!("unknown grade letter: {}", grade_raw),
            json!({ "grade": grade_raw }),
        ));
    };

    let credits = match req.params.get("credits") {
        None | Some(serde_json::Value::Null) => 3,
        Some(v) => match v.as_u64() {
            Some(c) if (1..=12).contains(&c) => c,
            _ => {
                return Err(HandlerErr::with_details(
                    "validation_failed",
                    "credits must be an integer between 1 and 12",
                    json!({ "field": "credits" }),
                ))
            }
        },
    };

    let semester = match get_optional_str(&req.params, "semester")? {
        Some(s) => s,
        None => setup::current_semester(state),
    };
    let course_name = match get_optional_str(&req.params, "courseName")? {
        Some(s) => s,
        None => course_name_for(state, &course_code),
    };
    let instructor = match get_optional_str(&req.params, "instructor")? {
        Some(s) => s,
        None => account.name.clone(),
    };
    let student_name = student_name_for(state, &student_no);

    let grade_id = Uuid::new_v4().to_string();
    state.store.add_grade(GradeRecord {
        id: grade_id.clone(),
        student_no,
        student_name,
        course_code,
        course_name,
        semester,
        grade: letter,
        credits,
        instructor,
    });

    Ok(json!({ "gradeId": grade_id }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.list" => Some(match grades_list(state, req) {
            Ok(v) => ok(&req.id, v),
            Err(e) => e.response(&req.id),
        }),
        "grades.add" => Some(match grades_add(state, req) {
            Ok(v) => ok(&req.id, v),
            Err(e) => e.response(&req.id),
        }),
        _ => None,
    }
}

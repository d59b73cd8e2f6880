use super::setup::{self, SetupSection};
use crate::access::{self, Action, Role};
use crate::calc::{self, TranscriptModel};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{GradeRecord, UserAccount};
use chrono::Utc;
use serde_json::json;
use std::path::Path;

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

/// Which student this transcript is for. Staff name a student; a student
/// gets their own, and naming anyone else is refused.
fn resolve_target(account: &UserAccount, params: &serde_json::Value) -> Result<String, HandlerErr> {
    let requested = params.get("studentId").and_then(|v| v.as_str());
    match account.role {
        Role::Student => {
            let own = account.student_no.clone().ok_or_else(|| {
                HandlerErr::new("not_found", "no student row linked to this account")
            })?;
            match requested {
                None => Ok(own),
                Some(r) if r == own => Ok(own),
                Some(_) => Err(HandlerErr::new(
                    "forbidden",
                    "students may only request their own transcript",
                )),
            }
        }
        Role::Admin | Role::Academic => requested
            .map(|s| s.to_string())
            .ok_or_else(|| HandlerErr::new("bad_params", "missing studentId")),
    }
}

fn semester_filter(params: &serde_json::Value) -> Result<Option<String>, HandlerErr> {
    match params.get("semester") {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => {
            let t = s.trim();
            if t.is_empty() || t.eq_ignore_ascii_case("all") {
                Ok(None)
            } else {
                Ok(Some(t.to_string()))
            }
        }
        Some(_) => Err(HandlerErr::new("bad_params", "semester must be a string")),
    }
}

fn build_for_request(
    state: &AppState,
    req: &Request,
) -> Result<TranscriptModel, HandlerErr> {
    let account = require_account(state)?;
    if !access::can_perform(account.role, Action::GenerateTranscript) {
        return Err(HandlerErr::new(
            "forbidden",
            format!("{} may not generate transcripts", account.role.as_str()),
        ));
    }
    let target = resolve_target(&account, &req.params)?;
    let semester = semester_filter(&req.params)?;

    let Some(student) = state.store.find_student(&target) else {
        return Err(HandlerErr::new(
            "not_found",
            format!("no student: {}", target),
        ));
    };

    let rows: Vec<&GradeRecord> = state
        .store
        .grades()
        .iter()
        .filter(|g| {
            g.student_no == target
                && semester
                    .as_deref()
                    .map(|s| g.semester.eq_ignore_ascii_case(s))
                    .unwrap_or(true)
        })
        .collect();

    let issued_on = Utc::now().format("%Y-%m-%d").to_string();
    Ok(calc::build_transcript(student, &rows, issued_on))
}

fn handle_generate(state: &mut AppState, req: &Request) -> serde_json::Value {
    match build_for_request(state, req) {
        Ok(model) => ok(&req.id, json!({ "transcript": model })),
        Err(e) => e.response(&req.id),
    }
}

fn render_text(model: &TranscriptModel, institution: &str, registrar: &str) -> String {
    let mut out = String::new();
    out.push_str(institution);
    out.push('\n');
    out.push_str("Official Academic Transcript\n\n");

    out.push_str(&format!("Student ID:      {}\n", model.student_no));
    out.push_str(&format!("Name:            {}\n", model.student_name));
    out.push_str(&format!("Program:         {}\n", model.program));
    out.push_str(&format!("Year:            {}\n", model.year));
    if let Some(enrolled) = &model.enrollment_date {
        out.push_str(&format!("Enrollment Date: {}\n", enrolled));
    }
    if let Some(dob) = &model.date_of_birth {
        out.push_str(&format!("Date of Birth:   {}\n", dob));
    }
    out.push('\n');

    for sem in &model.semesters {
        out.push_str(&format!(
            "{}  (GPA {:.2}, {} credits)\n",
            sem.semester, sem.summary.gpa, sem.summary.total_credits
        ));
        for course in &sem.courses {
            out.push_str(&format!(
                "  {:<8} {:<34} {:>2}  {} cr\n",
                course.course_code, course.course_name, course.grade, course.credits
            ));
        }
        out.push('\n');
    }

    out.push_str(&format!("Cumulative GPA: {:.2}\n", model.cumulative.gpa));
    out.push_str(&format!(
        "Total Credits:  {}\n\n",
        model.cumulative.total_credits
    ));
    out.push_str(&format!("Issued on {} by {}\n", model.issued_on, registrar));
    out
}

fn write_text(path: &Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, text)?;
    Ok(())
}

fn handle_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let out_path = match req.params.get("outPath").and_then(|v| v.as_str()) {
        Some(p) if !p.trim().is_empty() => p.to_string(),
        _ => return err(&req.id, "bad_params", "missing outPath", None),
    };
    let model = match build_for_request(state, req) {
        Ok(m) => m,
        Err(e) => return e.response(&req.id),
    };

    let institution = setup::effective_section(state, SetupSection::Institution);
    let name = institution
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or("NSBM Green University")
        .to_string();
    let registrar = institution
        .get("registrar")
        .and_then(|v| v.as_str())
        .unwrap_or("Registrar's Office")
        .to_string();

    let text = render_text(&model, &name, &registrar);
    if let Err(e) = write_text(Path::new(&out_path), &text) {
        return err(
            &req.id,
            "io_failed",
            e.to_string(),
            Some(json!({ "path": out_path })),
        );
    }
    ok(
        &req.id,
        json!({ "path": out_path, "bytes": text.len() }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "transcript.generate" => Some(handle_generate(state, req)),
        "transcript.export" => Some(handle_export(state, req)),
        _ => None,
    }
}

use crate::access::{self, Action, Role};
use crate::calc;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{AttendanceRecord, EnrollmentStatus, GradeRecord, Student};
use chrono::Utc;
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

fn require_role(state: &AppState) -> Result<(Role, Option<String>), HandlerErr> {
    match state.session.account() {
        Some(account) => Ok((account.role, account.student_no.clone())),
        None => Err(HandlerErr::new("not_signed_in", "sign in first")),
    }
}

fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

fn now_stamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn student_row(s: &Student, gpa: f64) -> serde_json::Value {
    json!({
        "id": s.id.clone(),
        "studentId": s.student_no.clone(),
        "name": s.name.clone(),
        "email": s.email.clone(),
        "program": s.program.clone(),
        "year": s.year.clone(),
        "status": s.status.as_str(),
        "gpa": gpa
    })
}

fn student_detail(s: &Student) -> serde_json::Value {
    json!({
        "id": s.id.clone(),
        "studentId": s.student_no.clone(),
        "name": s.name.clone(),
        "email": s.email.clone(),
        "program": s.program.clone(),
        "year": s.year.clone(),
        "status": s.status.as_str(),
        "phone": s.phone.clone(),
        "address": s.address.clone(),
        "dateOfBirth": s.date_of_birth.clone(),
        "enrollmentDate": s.enrollment_date.clone(),
        "advisor": s.advisor.clone(),
        "updatedAt": s.updated_at.clone()
    })
}

fn students_list(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let (role, own_no) = require_role(state)?;
    let query = match req.params.get("query") {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => {
            let t = s.trim().to_lowercase();
            if t.is_empty() {
                None
            } else {
                Some(t)
            }
        }
        Some(_) => return Err(HandlerErr::new("bad_params", "query must be a string")),
    };

    let students = state.store.students();
    let visible = calc::select_visible(
        students,
        role,
        own_no.as_deref(),
        |s| s.student_no.as_str(),
        |s| match &query {
            None => true,
            Some(q) => {
                s.name.to_lowercase().contains(q)
                    || s.student_no.to_lowercase().contains(q)
                    || s.email.to_lowercase().contains(q)
            }
        },
    );

    let grades = state.store.grades();
    let rows: Vec<serde_json::Value> = visible
        .iter()
        .map(|s| {
            let own = grades.iter().filter(|g| g.student_no == s.student_no);
            student_row(s, calc::grade_summary(own).gpa)
        })
        .collect();

    Ok(json!({ "students": rows, "total": rows.len() }))
}

fn students_create(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let (role, _) = require_role(state)?;
    if !access::can_perform(role, Action::AddStudent) {
        return Err(HandlerErr::new(
            "forbidden",
            format!("{} may not add students", role.as_str()),
        ));
    }

    let mut missing: Vec<&str> = Vec::new();
    let mut field = |key: &'static str| -> Option<String> {
        match req.params.get(key).and_then(|v| v.as_str()) {
            Some(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => {
                missing.push(key);
                None
            }
        }
    };
    let name = field("name");
    let email = field("email");
    let program = field("program");
    let year = field("year");
    if !missing.is_empty() {
        return Err(HandlerErr::with_details(
            "validation_failed",
            "missing or empty fields",
            json!({ "fields": missing }),
        ));
    }
    // The closure pushed nothing, so these all hold values.
    let (Some(name), Some(email), Some(program), Some(year)) = (name, email, program, year) else {
        return Err(HandlerErr::new("validation_failed", "missing or empty fields"));
    };

    let student_no = format!("STU{}", Utc::now().timestamp_millis());
    let id = Uuid::new_v4().to_string();
    state.store.add_student(Student {
        id: id.clone(),
        student_no: student_no.clone(),
        name,
        email,
        program,
        year,
        status: EnrollmentStatus::Active,
        phone: None,
        address: None,
        date_of_birth: None,
        enrollment_date: Some(Utc::now().format("%Y-%m-%d").to_string()),
        advisor: None,
        updated_at: Some(now_stamp()),
    });

    Ok(json!({ "id": id, "studentId": student_no }))
}

#[derive(Default)]
struct StudentPatch {
    name: Option<String>,
    email: Option<String>,
    program: Option<String>,
    year: Option<String>,
    status: Option<EnrollmentStatus>,
    // Nullable fields: outer None = leave alone, inner None = clear.
    phone: Option<Option<String>>,
    address: Option<Option<String>>,
    date_of_birth: Option<Option<String>>,
    advisor: Option<Option<String>>,
}

impl StudentPatch {
    fn apply(self, s: &mut Student) {
        if let Some(v) = self.name {
            s.name = v;
        }
        if let Some(v) = self.email {
            s.email = v;
        }
        if let Some(v) = self.program {
            s.program = v;
        }
        if let Some(v) = self.year {
            s.year = v;
        }
        if let Some(v) = self.status {
            s.status = v;
        }
        if let Some(v) = self.phone {
            s.phone = v;
        }
        if let Some(v) = self.address {
            s.address = v;
        }
        if let Some(v) = self.date_of_birth {
            s.date_of_birth = v;
        }
        if let Some(v) = self.advisor {
            s.advisor = v;
        }
        s.updated_at = Some(now_stamp());
    }
}

fn patch_string(v: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    match v.as_str() {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(_) => Err(HandlerErr::with_details(
            "validation_failed",
            format!("{} must not be empty", key),
            json!({ "field": key }),
        )),
        None => Err(HandlerErr::with_details(
            "validation_failed",
            format!("{} must be a string", key),
            json!({ "field": key }),
        )),
    }
}

fn patch_nullable_string(v: &serde_json::Value, key: &str) -> Result<Option<String>, HandlerErr> {
    if v.is_null() {
        return Ok(None);
    }
    patch_string(v, key).map(Some)
}

fn parse_student_patch(
    patch: &serde_json::Map<String, serde_json::Value>,
    role: Role,
) -> Result<StudentPatch, HandlerErr> {
    if patch.is_empty() {
        return Err(HandlerErr::new(
            "bad_params",
            "patch must include at least one field",
        ));
    }
    let mut out = StudentPatch::default();
    for (k, v) in patch {
        match k.as_str() {
            "name" => out.name = Some(patch_string(v, k)?),
            "email" => out.email = Some(patch_string(v, k)?),
            "program" => out.program = Some(patch_string(v, k)?),
            "year" => out.year = Some(patch_string(v, k)?),
            "status" => {
                if role != Role::Admin {
                    return Err(HandlerErr::new(
                        "forbidden",
                        "only admin may change enrollment status",
                    ));
                }
                let raw = patch_string(v, k)?;
                let Some(status) = EnrollmentStatus::parse(&raw) else {
                    return Err(HandlerErr::with_details(
                        "validation_failed",
                        format!("unknown status: {}", raw),
                        json!({ "field": "status" }),
                    ));
                };
                out.status = Some(status);
            }
            "phone" => out.phone = Some(patch_nullable_string(v, k)?),
            "address" => out.address = Some(patch_nullable_string(v, k)?),
            "dateOfBirth" => out.date_of_birth = Some(patch_nullable_string(v, k)?),
            "advisor" => out.advisor = Some(patch_nullable_string(v, k)?),
            _ => {
                return Err(HandlerErr::new(
                    "bad_params",
                    format!("unknown student field: {}", k),
                ))
            }
        }
    }
    Ok(out)
}

fn students_update(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let (role, own_no) = require_role(state)?;
    let target = get_required_str(&req.params, "studentId")?;

    let allowed = match role {
        Role::Admin => access::can_perform(role, Action::EditStudent),
        Role::Student => {
            access::can_perform(role, Action::EditOwnProfile) && own_no.as_deref() == Some(target.as_str())
        }
        Role::Academic => false,
    };
    if !allowed {
        let message = if role == Role::Student {
            "students may only edit their own profile".to_string()
        } else {
            format!("{} may not edit students", role.as_str())
        };
        return Err(HandlerErr::new("forbidden", message));
    }

    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return Err(HandlerErr::new("bad_params", "patch must be an object"));
    };
    let patch = parse_student_patch(patch_obj, role)?;

    let Some(student) = state.store.student_mut(&target) else {
        return Err(HandlerErr::new(
            "not_found",
            format!("no student: {}", target),
        ));
    };
    patch.apply(student);

    Ok(json!({ "ok": true, "studentId": target }))
}

fn students_delete(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let (role, _) = require_role(state)?;
    if !access::can_perform(role, Action::DeleteStudent) {
        return Err(HandlerErr::new(
            "forbidden",
            format!("{} may not delete students", role.as_str()),
        ));
    }
    let target = get_required_str(&req.params, "studentId")?;
    if !state.store.remove_student(&target) {
        return Err(HandlerErr::new(
            "not_found",
            format!("no student: {}", target),
        ));
    }
    Ok(json!({ "ok": true }))
}

fn students_profile(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let (role, own_no) = require_role(state)?;

    let target = match role {
        Role::Student => {
            let own = own_no.ok_or_else(|| {
                HandlerErr::new("not_found", "no student row linked to this account")
            })?;
            match req.params.get("studentId").and_then(|v| v.as_str()) {
                None => own,
                Some(requested) if requested == own => own,
                Some(_) => {
                    return Err(HandlerErr::new(
                        "forbidden",
                        "students may only view their own profile",
                    ))
                }
            }
        }
        Role::Admin | Role::Academic => get_required_str(&req.params, "studentId")?,
    };

    let Some(student) = state.store.find_student(&target) else {
        return Err(HandlerErr::new(
            "not_found",
            format!("no student: {}", target),
        ));
    };

    let own_grades: Vec<&GradeRecord> = state
        .store
        .grades()
        .iter()
        .filter(|g| g.student_no == target)
        .collect();
    let summary = calc::grade_summary(own_grades.iter().copied());

    let courses: Vec<serde_json::Value> = own_grades
        .iter()
        .map(|g| {
            json!({
                "courseCode": g.course_code.clone(),
                "courseName": g.course_name.clone(),
                "semester": g.semester.clone(),
                "grade": g.grade.as_str(),
                "credits": g.credits,
                "instructor": g.instructor.clone()
            })
        })
        .collect();

    // Per-course attendance, first-seen course order.
    let mut course_order: Vec<(&str, &str)> = Vec::new();
    for rec in state.store.attendance() {
        if rec.student_no == target
            && !course_order.iter().any(|(code, _)| *code == rec.course_code)
        {
            course_order.push((rec.course_code.as_str(), rec.course_name.as_str()));
        }
    }
    let attendance: Vec<serde_json::Value> = course_order
        .iter()
        .map(|(code, name)| {
            let rows: Vec<&AttendanceRecord> = state
                .store
                .attendance()
                .iter()
                .filter(|a| a.student_no == target && a.course_code == *code)
                .collect();
            let stats = calc::attendance_summary(rows.into_iter());
            json!({
                "courseCode": code,
                "courseName": name,
                "total": stats.total,
                "attended": stats.attended,
                "rate": stats.rate
            })
        })
        .collect();

    Ok(json!({
        "student": student_detail(student),
        "gpa": summary,
        "courses": courses,
        "attendance": attendance
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(match students_list(state, req) {
            Ok(v) => ok(&req.id, v),
            Err(e) => e.response(&req.id),
        }),
        "students.create" => Some(match students_create(state, req) {
            Ok(v) => ok(&req.id, v),
            Err(e) => e.response(&req.id),
        }),
        "students.update" => Some(match students_update(state, req) {
            Ok(v) => ok(&req.id, v),
            Err(e) => e.response(&req.id),
        }),
        "students.delete" => Some(match students_delete(state, req) {
            Ok(v) => ok(&req.id, v),
            Err(e) => e.response(&req.id),
        }),
        "students.profile" => Some(match students_profile(state, req) {
            Ok(v) => ok(&req.id, v),
            Err(e) => e.response(&req.id),
        }),
        _ => None,
    }
}

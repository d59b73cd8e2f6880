use super::setup;
use crate::access::Role;
use crate::calc;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::EnrollmentStatus;
use serde_json::json;
use std::collections::BTreeSet;

fn handle_stats(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(account) = state.session.account() else {
        return err(&req.id, "not_signed_in", "sign in first", None);
    };
    let role = account.role;
    let name = account.name.clone();
    let own_no = account.student_no.clone();
    let current_semester = setup::current_semester(state);

    let result = match role {
        Role::Admin => {
            let students = state.store.students();
            let active = students
                .iter()
                .filter(|s| s.status == EnrollmentStatus::Active)
                .count();
            let mut courses: BTreeSet<&str> = BTreeSet::new();
            for g in state.store.grades() {
                courses.insert(g.course_code.as_str());
            }
            for a in state.store.attendance() {
                courses.insert(a.course_code.as_str());
            }
            let attendance = calc::attendance_summary(state.store.attendance());
            json!({
                "role": "admin",
                "totalStudents": students.len(),
                "activeStudents": active,
                "courseCount": courses.len(),
                "averageAttendance": attendance.rate,
                "currentSemester": current_semester
            })
        }
        Role::Academic => {
            let mut taught: BTreeSet<&str> = BTreeSet::new();
            let mut recorded: usize = 0;
            for g in state.store.grades() {
                if g.instructor == name {
                    taught.insert(g.course_code.as_str());
                    recorded += 1;
                }
            }
            json!({
                "role": "academic",
                "totalStudents": state.store.students().len(),
                "taughtCourses": taught.len(),
                "recordedGrades": recorded,
                "currentSemester": current_semester
            })
        }
        Role::Student => {
            let own = own_no.unwrap_or_default();
            let grades: Vec<_> = state
                .store
                .grades()
                .iter()
                .filter(|g| g.student_no == own)
                .collect();
            let summary = calc::grade_summary(grades.iter().copied());
            let enrolled: BTreeSet<&str> = grades
                .iter()
                .filter(|g| g.semester.eq_ignore_ascii_case(&current_semester))
                .map(|g| g.course_code.as_str())
                .collect();
            let attendance_rows: Vec<_> = state
                .store
                .attendance()
                .iter()
                .filter(|a| a.student_no == own)
                .collect();
            let attendance = calc::attendance_summary(attendance_rows.into_iter());
            json!({
                "role": "student",
                "gpa": summary.gpa,
                "totalCredits": summary.total_credits,
                "enrolledCourses": enrolled.len(),
                "attendanceRate": attendance.rate,
                "currentSemester": current_semester
            })
        }
    };

    ok(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "overview.stats" => Some(handle_stats(state, req)),
        _ => None,
    }
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::access::Role;
use crate::store::{AttendanceRecord, GradeRecord, Student};

/// Letter grades on the registrar's fixed 4.0 scale. Unknown letters are
/// rejected at ingestion, so every stored record carries one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LetterGrade {
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    CMinus,
    D,
    F,
}

impl LetterGrade {
    pub const ALL: [LetterGrade; 10] = [
        LetterGrade::A,
        LetterGrade::AMinus,
        LetterGrade::BPlus,
        LetterGrade::B,
        LetterGrade::BMinus,
        LetterGrade::CPlus,
        LetterGrade::C,
        LetterGrade::CMinus,
        LetterGrade::D,
        LetterGrade::F,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "A" => Some(LetterGrade::A),
            "A-" => Some(LetterGrade::AMinus),
            "B+" => Some(LetterGrade::BPlus),
            "B" => Some(LetterGrade::B),
            "B-" => Some(LetterGrade::BMinus),
            "C+" => Some(LetterGrade::CPlus),
            "C" => Some(LetterGrade::C),
            "C-" => Some(LetterGrade::CMinus),
            "D" => Some(LetterGrade::D),
            "F" => Some(LetterGrade::F),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LetterGrade::A => "A",
            LetterGrade::AMinus => "A-",
            LetterGrade::BPlus => "B+",
            LetterGrade::B => "B",
            LetterGrade::BMinus => "B-",
            LetterGrade::CPlus => "C+",
            LetterGrade::C => "C",
            LetterGrade::CMinus => "C-",
            LetterGrade::D => "D",
            LetterGrade::F => "F",
        }
    }

    pub fn points(self) -> f64 {
        match self {
            LetterGrade::A => 4.0,
            LetterGrade::AMinus => 3.7,
            LetterGrade::BPlus => 3.3,
            LetterGrade::B => 3.0,
            LetterGrade::BMinus => 2.7,
            LetterGrade::CPlus => 2.3,
            LetterGrade::C => 2.0,
            LetterGrade::CMinus => 1.7,
            LetterGrade::D => 1.0,
            LetterGrade::F => 0.0,
        }
    }
}

/// Attendance status for one student on one class day.
/// `late` still counts as attended for rate purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
}

impl AttendanceStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "present" => Some(AttendanceStatus::Present),
            "late" => Some(AttendanceStatus::Late),
            "absent" => Some(AttendanceStatus::Absent),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Absent => "absent",
        }
    }

    pub fn counts_as_attended(self) -> bool {
        !matches!(self, AttendanceStatus::Absent)
    }
}

/// GPA rounding: `Int(100*x + 0.5) / 100`, two decimals.
pub fn round_off_2_decimals(x: f64) -> f64 {
    ((100.0 * x) + 0.5).floor() / 100.0
}

/// Rate rounding: `Int(10*x + 0.5) / 10`, one decimal.
pub fn round_off_1_decimal(x: f64) -> f64 {
    ((10.0 * x) + 0.5).floor() / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeSummary {
    pub gpa: f64,
    pub total_credits: u64,
    pub course_count: usize,
}

/// Credit-weighted grade point average over the given records.
/// An empty set, or one whose credits sum to zero, yields 0.00.
pub fn grade_summary<'a, I>(records: I) -> GradeSummary
where
    I: IntoIterator<Item = &'a GradeRecord>,
{
    let mut total_credits: u64 = 0;
    let mut weighted_points: f64 = 0.0;
    let mut course_count: usize = 0;

    for rec in records {
        course_count += 1;
        total_credits += rec.credits;
        weighted_points += rec.grade.points() * rec.credits as f64;
    }

    let gpa = if total_credits > 0 {
        round_off_2_decimals(weighted_points / total_credits as f64)
    } else {
        0.0
    };

    GradeSummary {
        gpa,
        total_credits,
        course_count,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub total: usize,
    pub attended: usize,
    pub rate: f64,
}

/// Attendance rate over the given records, in percent with one decimal.
/// Present and late both count as attended; an empty set yields 0.0.
pub fn attendance_summary<'a, I>(records: I) -> AttendanceSummary
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    let mut total: usize = 0;
    let mut attended: usize = 0;

    for rec in records {
        total += 1;
        if rec.status.counts_as_attended() {
            attended += 1;
        }
    }

    let rate = if total > 0 {
        round_off_1_decimal(100.0 * attended as f64 / total as f64)
    } else {
        0.0
    };

    AttendanceSummary {
        total,
        attended,
        rate,
    }
}

/// Role-scoped selection over any record carrying a student number.
///
/// Staff roles see every record matching `criteria`. The student role is
/// pinned to the viewer's own student number regardless of criteria, and a
/// viewer with no student number sees nothing. Input order is preserved.
pub fn select_visible<'a, T, K, C>(
    records: &'a [T],
    role: Role,
    viewer_student_no: Option<&str>,
    student_no: K,
    criteria: C,
) -> Vec<&'a T>
where
    K: Fn(&T) -> &str,
    C: Fn(&T) -> bool,
{
    records
        .iter()
        .filter(|rec| match role {
            Role::Student => viewer_student_no
                .map(|own| student_no(rec) == own)
                .unwrap_or(false),
            Role::Admin | Role::Academic => criteria(rec),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct CalcError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl CalcError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFilters {
    pub semester: Option<String>,
    pub course: Option<String>,
    pub date: Option<String>,
}

fn parse_filter_string(raw: &serde_json::Value, key: &str) -> Result<Option<String>, CalcError> {
    match raw {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => {
            let t = s.trim();
            if t.is_empty() || t.eq_ignore_ascii_case("all") {
                Ok(None)
            } else {
                Ok(Some(t.to_string()))
            }
        }
        _ => Err(CalcError::new(
            "bad_params",
            format!("filters.{} must be a string or \"all\"", key),
        )),
    }
}

/// Parse the optional `filters` object shared by the record listings.
/// Missing keys, nulls and the `"all"` sentinel all mean "no filter".
/// A date filter must be an ISO `YYYY-MM-DD` day.
pub fn parse_record_filters(raw: Option<&serde_json::Value>) -> Result<RecordFilters, CalcError> {
    let mut out = RecordFilters::default();
    let Some(v) = raw else {
        return Ok(out);
    };
    if v.is_null() {
        return Ok(out);
    }
    let Some(obj) = v.as_object() else {
        return Err(CalcError::new("bad_params", "filters must be an object"));
    };

    if let Some(sem) = obj.get("semester") {
        out.semester = parse_filter_string(sem, "semester")?;
    }
    if let Some(course) = obj.get("course") {
        out.course = parse_filter_string(course, "course")?;
    }
    if let Some(date) = obj.get("date") {
        out.date = match parse_filter_string(date, "date")? {
            None => None,
            Some(s) => match chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
                Ok(d) => Some(d.format("%Y-%m-%d").to_string()),
                Err(_) => {
                    return Err(CalcError::new(
                        "bad_params",
                        "filters.date must be YYYY-MM-DD",
                    ))
                }
            },
        };
    }

    Ok(out)
}

impl RecordFilters {
    pub fn matches_grade(&self, rec: &GradeRecord) -> bool {
        if let Some(sem) = &self.semester {
            if !rec.semester.eq_ignore_ascii_case(sem) {
                return false;
            }
        }
        if let Some(course) = &self.course {
            if !rec.course_code.eq_ignore_ascii_case(course) {
                return false;
            }
        }
        true
    }

    pub fn matches_attendance(&self, rec: &AttendanceRecord) -> bool {
        if let Some(course) = &self.course {
            if !rec.course_code.eq_ignore_ascii_case(course) {
                return false;
            }
        }
        if let Some(date) = &self.date {
            if rec.date != *date {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptCourse {
    pub course_code: String,
    pub course_name: String,
    pub credits: u64,
    pub grade: String,
    pub points: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSemester {
    pub semester: String,
    pub courses: Vec<TranscriptCourse>,
    pub summary: GradeSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptModel {
    #[serde(rename = "studentId")]
    pub student_no: String,
    pub student_name: String,
    pub program: String,
    pub year: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    pub semesters: Vec<TranscriptSemester>,
    pub cumulative: GradeSummary,
    pub issued_on: String,
}

/// Assemble a transcript from a student's grade rows. Semesters keep their
/// first-seen order, courses keep record order within each semester.
pub fn build_transcript(
    student: &Student,
    records: &[&GradeRecord],
    issued_on: String,
) -> TranscriptModel {
    let mut semester_order: Vec<String> = Vec::new();
    let mut by_semester: HashMap<String, Vec<&GradeRecord>> = HashMap::new();

    for rec in records {
        if !by_semester.contains_key(&rec.semester) {
            semester_order.push(rec.semester.clone());
        }
        by_semester.entry(rec.semester.clone()).or_default().push(rec);
    }

    let semesters = semester_order
        .into_iter()
        .map(|name| {
            let rows = by_semester.remove(&name).unwrap_or_default();
            let summary = grade_summary(rows.iter().copied());
            let courses = rows
                .into_iter()
                .map(|rec| TranscriptCourse {
                    course_code: rec.course_code.clone(),
                    course_name: rec.course_name.clone(),
                    credits: rec.credits,
                    grade: rec.grade.as_str().to_string(),
                    points: rec.grade.points(),
                })
                .collect();
            TranscriptSemester {
                semester: name,
                courses,
                summary,
            }
        })
        .collect();

    TranscriptModel {
        student_no: student.student_no.clone(),
        student_name: student.name.clone(),
        program: student.program.clone(),
        year: student.year.clone(),
        enrollment_date: student.enrollment_date.clone(),
        date_of_birth: student.date_of_birth.clone(),
        semesters,
        cumulative: grade_summary(records.iter().copied()),
        issued_on,
    }
}

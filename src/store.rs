use crate::access::Role;
use crate::calc::{AttendanceStatus, LetterGrade};

/// A canned sign-in identity. Student accounts carry the roster number
/// that pins their record visibility.
#[derive(Debug, Clone)]
pub struct UserAccount {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub email: String,
    pub student_no: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentStatus {
    Active,
    Inactive,
    Graduated,
}

impl EnrollmentStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => Some(EnrollmentStatus::Active),
            "inactive" => Some(EnrollmentStatus::Inactive),
            "graduated" => Some(EnrollmentStatus::Graduated),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Inactive => "inactive",
            EnrollmentStatus::Graduated => "graduated",
        }
    }
}

/// One roster row. `id` is the stable row key, `student_no` the public
/// registrar number that grade and attendance records join on.
#[derive(Debug, Clone)]
pub struct Student {
    pub id: String,
    pub student_no: String,
    pub name: String,
    pub email: String,
    pub program: String,
    pub year: String,
    pub status: EnrollmentStatus,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<String>,
    pub enrollment_date: Option<String>,
    pub advisor: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GradeRecord {
    pub id: String,
    pub student_no: String,
    pub student_name: String,
    pub course_code: String,
    pub course_name: String,
    pub semester: String,
    pub grade: LetterGrade,
    pub credits: u64,
    pub instructor: String,
}

/// Attendance for one student on one class day. The date is kept as the
/// normalized `YYYY-MM-DD` text it was validated from.
#[derive(Debug, Clone)]
pub struct AttendanceRecord {
    pub id: String,
    pub student_no: String,
    pub student_name: String,
    pub course_code: String,
    pub course_name: String,
    pub date: String,
    pub status: AttendanceStatus,
}

/// Storage seam for the records workspace. Handlers only talk to this
/// trait; swapping the in-memory store for a persistent one is a local
/// change.
pub trait RecordStore {
    fn students(&self) -> &[Student];
    fn grades(&self) -> &[GradeRecord];
    fn attendance(&self) -> &[AttendanceRecord];

    fn find_student(&self, student_no: &str) -> Option<&Student>;
    fn student_mut(&mut self, student_no: &str) -> Option<&mut Student>;
    fn add_student(&mut self, student: Student);
    fn remove_student(&mut self, student_no: &str) -> bool;

    fn add_grade(&mut self, record: GradeRecord);
    fn add_attendance(&mut self, record: AttendanceRecord);
}

/// Append-only in-memory store. Insertion order is the listing order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    students: Vec<Student>,
    grades: Vec<GradeRecord>,
    attendance: Vec<AttendanceRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn students(&self) -> &[Student] {
        &self.students
    }

    fn grades(&self) -> &[GradeRecord] {
        &self.grades
    }

    fn attendance(&self) -> &[AttendanceRecord] {
        &self.attendance
    }

    fn find_student(&self, student_no: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.student_no == student_no)
    }

    fn student_mut(&mut self, student_no: &str) -> Option<&mut Student> {
        self.students.iter_mut().find(|s| s.student_no == student_no)
    }

    fn add_student(&mut self, student: Student) {
        self.students.push(student);
    }

    fn remove_student(&mut self, student_no: &str) -> bool {
        let before = self.students.len();
        self.students.retain(|s| s.student_no != student_no);
        self.students.len() != before
    }

    fn add_grade(&mut self, record: GradeRecord) {
        self.grades.push(record);
    }

    fn add_attendance(&mut self, record: AttendanceRecord) {
        self.attendance.push(record);
    }
}

use crate::access::Role;
use crate::calc::{AttendanceStatus, LetterGrade};
use crate::store::{
    AttendanceRecord, EnrollmentStatus, GradeRecord, MemoryStore, RecordStore, Student, UserAccount,
};

/// One canned account per role. There is no password layer; picking a
/// role at sign-in picks the matching identity.
pub fn sample_accounts() -> Vec<UserAccount> {
    vec![
        UserAccount {
            id: "admin-001".to_string(),
            name: "Sarah Johnson".to_string(),
            role: Role::Admin,
            email: "sarah.johnson@nsbm.ac.lk".to_string(),
            student_no: None,
        },
        UserAccount {
            id: "acad-001".to_string(),
            name: "Dr. Michael Chen".to_string(),
            role: Role::Academic,
            email: "michael.chen@nsbm.ac.lk".to_string(),
            student_no: None,
        },
        UserAccount {
            id: "student-001".to_string(),
            name: "Emma Williams".to_string(),
            role: Role::Student,
            email: "emma.williams@students.nsbm.ac.lk".to_string(),
            student_no: Some("STU2024001".to_string()),
        },
    ]
}

fn student(
    id: &str,
    student_no: &str,
    name: &str,
    email: &str,
    program: &str,
    year: &str,
    status: EnrollmentStatus,
) -> Student {
    Student {
        id: id.to_string(),
        student_no: student_no.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        program: program.to_string(),
        year: year.to_string(),
        status,
        phone: None,
        address: None,
        date_of_birth: None,
        enrollment_date: None,
        advisor: None,
        updated_at: None,
    }
}

fn grade(
    id: &str,
    student_no: &str,
    student_name: &str,
    course_code: &str,
    course_name: &str,
    semester: &str,
    letter: LetterGrade,
    credits: u64,
    instructor: &str,
) -> GradeRecord {
    GradeRecord {
        id: id.to_string(),
        student_no: student_no.to_string(),
        student_name: student_name.to_string(),
        course_code: course_code.to_string(),
        course_name: course_name.to_string(),
        semester: semester.to_string(),
        grade: letter,
        credits,
        instructor: instructor.to_string(),
    }
}

fn attendance(
    id: &str,
    student_no: &str,
    student_name: &str,
    course_code: &str,
    course_name: &str,
    date: &str,
    status: AttendanceStatus,
) -> AttendanceRecord {
    AttendanceRecord {
        id: id.to_string(),
        student_no: student_no.to_string(),
        student_name: student_name.to_string(),
        course_code: course_code.to_string(),
        course_name: course_name.to_string(),
        date: date.to_string(),
        status,
    }
}

/// The demo workspace the daemon starts with. GPAs are never stored;
/// every figure the listings show is derived from these rows.
pub fn sample_store() -> MemoryStore {
    let mut store = MemoryStore::new();

    let mut emma = student(
        "s-001",
        "STU2024001",
        "Emma Williams",
        "emma.williams@students.nsbm.ac.lk",
        "Computer Science",
        "3rd Year",
        EnrollmentStatus::Active,
    );
    emma.phone = Some("+94 71 234 5678".to_string());
    emma.address = Some("Mahenwatte, Pitipana, Homagama, Sri Lanka".to_string());
    emma.date_of_birth = Some("2002-05-15".to_string());
    emma.enrollment_date = Some("2021-09-01".to_string());
    emma.advisor = Some("Dr. Michael Chen".to_string());
    store.add_student(emma);

    store.add_student(student(
        "s-002",
        "STU2024002",
        "James Anderson",
        "james.anderson@students.nsbm.ac.lk",
        "Business Administration",
        "2nd Year",
        EnrollmentStatus::Active,
    ));
    store.add_student(student(
        "s-003",
        "STU2024003",
        "Sophia Martinez",
        "sophia.martinez@students.nsbm.ac.lk",
        "Engineering",
        "4th Year",
        EnrollmentStatus::Active,
    ));
    store.add_student(student(
        "s-004",
        "STU2024004",
        "Michael Brown",
        "michael.brown@students.nsbm.ac.lk",
        "Psychology",
        "1st Year",
        EnrollmentStatus::Active,
    ));
    store.add_student(student(
        "s-005",
        "STU2023050",
        "Olivia Davis",
        "olivia.davis@students.nsbm.ac.lk",
        "Computer Science",
        "Graduate",
        EnrollmentStatus::Graduated,
    ));

    // Emma Williams, Fall 2024: 53.0 points over 14 credits.
    store.add_grade(grade(
        "g-001",
        "STU2024001",
        "Emma Williams",
        "CS301",
        "Data Structures",
        "Fall 2024",
        LetterGrade::A,
        4,
        "Dr. Michael Chen",
    ));
    store.add_grade(grade(
        "g-002",
        "STU2024001",
        "Emma Williams",
        "CS302",
        "Database Systems",
        "Fall 2024",
        LetterGrade::AMinus,
        3,
        "Dr. Johnson",
    ));
    store.add_grade(grade(
        "g-003",
        "STU2024001",
        "Emma Williams",
        "CS303",
        "Web Development",
        "Fall 2024",
        LetterGrade::BPlus,
        3,
        "Dr. Wilson",
    ));
    store.add_grade(grade(
        "g-004",
        "STU2024001",
        "Emma Williams",
        "CS304",
        "Computer Networks",
        "Fall 2024",
        LetterGrade::A,
        4,
        "Dr. Lee",
    ));

    // Emma Williams, Spring 2024: 52.3 points over 14 credits.
    store.add_grade(grade(
        "g-005",
        "STU2024001",
        "Emma Williams",
        "CS201",
        "Algorithms",
        "Spring 2024",
        LetterGrade::A,
        4,
        "Dr. Michael Chen",
    ));
    store.add_grade(grade(
        "g-006",
        "STU2024001",
        "Emma Williams",
        "CS202",
        "Operating Systems",
        "Spring 2024",
        LetterGrade::BPlus,
        4,
        "Dr. Wilson",
    ));
    store.add_grade(grade(
        "g-007",
        "STU2024001",
        "Emma Williams",
        "CS203",
        "Software Engineering",
        "Spring 2024",
        LetterGrade::AMinus,
        3,
        "Dr. Johnson",
    ));
    store.add_grade(grade(
        "g-008",
        "STU2024001",
        "Emma Williams",
        "MAT201",
        "Discrete Mathematics",
        "Spring 2024",
        LetterGrade::A,
        3,
        "Prof. Smith",
    ));

    store.add_grade(grade(
        "g-009",
        "STU2024002",
        "James Anderson",
        "BUS201",
        "Marketing Principles",
        "Fall 2024",
        LetterGrade::BPlus,
        3,
        "Prof. Smith",
    ));
    store.add_grade(grade(
        "g-010",
        "STU2024003",
        "Sophia Martinez",
        "ENG401",
        "Advanced Thermodynamics",
        "Fall 2024",
        LetterGrade::A,
        4,
        "Dr. Brown",
    ));
    store.add_grade(grade(
        "g-011",
        "STU2024004",
        "Michael Brown",
        "PSY101",
        "Introduction to Psychology",
        "Fall 2024",
        LetterGrade::B,
        3,
        "Dr. Taylor",
    ));
    store.add_grade(grade(
        "g-012",
        "STU2023050",
        "Olivia Davis",
        "CS401",
        "Machine Learning",
        "Fall 2023",
        LetterGrade::A,
        4,
        "Dr. Michael Chen",
    ));

    store.add_attendance(attendance(
        "a-001",
        "STU2024001",
        "Emma Williams",
        "CS301",
        "Data Structures",
        "2024-10-28",
        AttendanceStatus::Present,
    ));
    store.add_attendance(attendance(
        "a-002",
        "STU2024002",
        "James Anderson",
        "CS301",
        "Data Structures",
        "2024-10-28",
        AttendanceStatus::Present,
    ));
    store.add_attendance(attendance(
        "a-003",
        "STU2024003",
        "Sophia Martinez",
        "CS301",
        "Data Structures",
        "2024-10-28",
        AttendanceStatus::Late,
    ));
    store.add_attendance(attendance(
        "a-004",
        "STU2024004",
        "Michael Brown",
        "CS301",
        "Data Structures",
        "2024-10-28",
        AttendanceStatus::Absent,
    ));
    store.add_attendance(attendance(
        "a-005",
        "STU2024001",
        "Emma Williams",
        "CS302",
        "Database Systems",
        "2024-10-27",
        AttendanceStatus::Present,
    ));
    store.add_attendance(attendance(
        "a-006",
        "STU2024002",
        "James Anderson",
        "CS302",
        "Database Systems",
        "2024-10-27",
        AttendanceStatus::Present,
    ));

    store
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc;

    #[test]
    fn one_account_per_role() {
        let accounts = sample_accounts();
        assert_eq!(accounts.len(), 3);
        for role in [Role::Admin, Role::Academic, Role::Student] {
            assert_eq!(accounts.iter().filter(|a| a.role == role).count(), 1);
        }
        let student = accounts.iter().find(|a| a.role == Role::Student).unwrap();
        assert_eq!(student.student_no.as_deref(), Some("STU2024001"));
    }

    #[test]
    fn every_grade_row_joins_a_seeded_student() {
        let store = sample_store();
        for rec in store.grades() {
            assert!(
                store.find_student(&rec.student_no).is_some(),
                "dangling grade row for {}",
                rec.student_no
            );
        }
        for rec in store.attendance() {
            assert!(store.find_student(&rec.student_no).is_some());
        }
    }

    #[test]
    fn seeded_gpas_match_the_scale() {
        let store = sample_store();
        let own = |no: &str| {
            store
                .grades()
                .iter()
                .filter(|g| g.student_no == no)
                .collect::<Vec<_>>()
        };

        // 105.3 points over 28 credits -> 3.76 cumulative.
        let emma = calc::grade_summary(own("STU2024001").into_iter());
        assert_eq!(emma.gpa, 3.76);
        assert_eq!(emma.total_credits, 28);
        assert_eq!(emma.course_count, 8);

        assert_eq!(calc::grade_summary(own("STU2024002").into_iter()).gpa, 3.30);
        assert_eq!(calc::grade_summary(own("STU2024003").into_iter()).gpa, 4.00);
        assert_eq!(calc::grade_summary(own("STU2024004").into_iter()).gpa, 3.00);
        assert_eq!(calc::grade_summary(own("STU2023050").into_iter()).gpa, 4.00);
    }

    #[test]
    fn seeded_attendance_day_matches_the_rate_vector() {
        let store = sample_store();
        let day: Vec<&AttendanceRecord> = store
            .attendance()
            .iter()
            .filter(|a| a.date == "2024-10-28")
            .collect();
        let summary = calc::attendance_summary(day.into_iter());
        assert_eq!(summary.total, 4);
        assert_eq!(summary.rate, 75.0);

        let all = calc::attendance_summary(store.attendance());
        assert_eq!(all.total, 6);
        assert_eq!(all.rate, 83.3);
    }
}

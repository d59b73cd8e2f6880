/// Signed-in roles. Every capability and section check keys off one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Academic,
    Student,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "academic" => Some(Role::Academic),
            "student" => Some(Role::Student),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Academic => "academic",
            Role::Student => "student",
        }
    }
}

/// Navigable sections of the records workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Overview,
    Students,
    Profile,
    Academic,
    Attendance,
    Transcript,
}

impl Section {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "overview" => Some(Section::Overview),
            "students" => Some(Section::Students),
            "profile" => Some(Section::Profile),
            "academic" => Some(Section::Academic),
            "attendance" => Some(Section::Attendance),
            "transcript" => Some(Section::Transcript),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Section::Overview => "overview",
            Section::Students => "students",
            Section::Profile => "profile",
            Section::Academic => "academic",
            Section::Attendance => "attendance",
            Section::Transcript => "transcript",
        }
    }
}

/// Mutating or privileged operations gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    AddStudent,
    EditStudent,
    DeleteStudent,
    AddGrade,
    RecordAttendance,
    GenerateTranscript,
    EditOwnProfile,
    EditSetup,
}

impl Action {
    pub const ALL: [Action; 8] = [
        Action::AddStudent,
        Action::EditStudent,
        Action::DeleteStudent,
        Action::AddGrade,
        Action::RecordAttendance,
        Action::GenerateTranscript,
        Action::EditOwnProfile,
        Action::EditSetup,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::AddStudent => "add-student",
            Action::EditStudent => "edit-student",
            Action::DeleteStudent => "delete-student",
            Action::AddGrade => "add-grade",
            Action::RecordAttendance => "record-attendance",
            Action::GenerateTranscript => "generate-transcript",
            Action::EditOwnProfile => "edit-own-profile",
            Action::EditSetup => "edit-setup",
        }
    }
}

/// The capability table. One place, keyed by action; handlers never
/// hand-roll role comparisons.
pub fn allowed_roles(action: Action) -> &'static [Role] {
    match action {
        Action::AddStudent => &[Role::Admin],
        Action::EditStudent => &[Role::Admin],
        Action::DeleteStudent => &[Role::Admin],
        Action::AddGrade => &[Role::Admin, Role::Academic],
        Action::RecordAttendance => &[Role::Admin, Role::Academic],
        Action::GenerateTranscript => &[Role::Admin, Role::Student],
        Action::EditOwnProfile => &[Role::Student],
        Action::EditSetup => &[Role::Admin],
    }
}

pub fn can_perform(role: Role, action: Action) -> bool {
    allowed_roles(action).contains(&role)
}

/// Which sections a role may open. The roster is staff-only, the profile
/// page is the student's own, transcripts are registrar or self service.
pub fn visible_sections(role: Role) -> &'static [Section] {
    match role {
        Role::Admin => &[
            Section::Overview,
            Section::Students,
            Section::Academic,
            Section::Attendance,
            Section::Transcript,
        ],
        Role::Academic => &[
            Section::Overview,
            Section::Students,
            Section::Academic,
            Section::Attendance,
        ],
        Role::Student => &[
            Section::Overview,
            Section::Profile,
            Section::Academic,
            Section::Transcript,
        ],
    }
}

pub fn section_visible(role: Role, section: Section) -> bool {
    visible_sections(role).contains(&section)
}

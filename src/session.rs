use crate::access::{self, Role, Section};
use crate::store::UserAccount;

/// The one piece of mutable UI-facing state the daemon holds: who is
/// signed in and which section they are looking at.
#[derive(Debug, Clone)]
pub enum SessionState {
    LoggedOut,
    LoggedIn { account: UserAccount, view: Section },
}

impl SessionState {
    pub fn account(&self) -> Option<&UserAccount> {
        match self {
            SessionState::LoggedOut => None,
            SessionState::LoggedIn { account, .. } => Some(account),
        }
    }
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Login(Role),
    Logout,
    Navigate(Section),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionError {
    pub code: &'static str,
    pub message: String,
}

impl SessionError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// The only way session state changes. Every transition is checked here,
/// so handlers cannot reach a state the table does not allow. Login lands
/// on the overview; navigation is limited to the role's visible sections.
pub fn apply(
    state: &SessionState,
    event: SessionEvent,
    accounts: &[UserAccount],
) -> Result<SessionState, SessionError> {
    match (state, event) {
        (SessionState::LoggedOut, SessionEvent::Login(role)) => {
            let account = accounts
                .iter()
                .find(|a| a.role == role)
                .cloned()
                .ok_or_else(|| {
                    SessionError::new("not_found", format!("no account for role: {}", role.as_str()))
                })?;
            Ok(SessionState::LoggedIn {
                account,
                view: Section::Overview,
            })
        }
        (SessionState::LoggedIn { .. }, SessionEvent::Login(_)) => Err(SessionError::new(
            "bad_state",
            "already signed in; sign out first",
        )),
        (SessionState::LoggedIn { .. }, SessionEvent::Logout) => Ok(SessionState::LoggedOut),
        (SessionState::LoggedOut, SessionEvent::Logout) => {
            Err(SessionError::new("not_signed_in", "sign in first"))
        }
        (SessionState::LoggedIn { account, .. }, SessionEvent::Navigate(section)) => {
            if !access::section_visible(account.role, section) {
                return Err(SessionError::new(
                    "forbidden",
                    format!(
                        "section not available to {}: {}",
                        account.role.as_str(),
                        section.as_str()
                    ),
                ));
            }
            Ok(SessionState::LoggedIn {
                account: account.clone(),
                view: section,
            })
        }
        (SessionState::LoggedOut, SessionEvent::Navigate(_)) => {
            Err(SessionError::new("not_signed_in", "sign in first"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accounts() -> Vec<UserAccount> {
        vec![
            UserAccount {
                id: "admin-001".to_string(),
                name: "Sarah Johnson".to_string(),
                role: Role::Admin,
                email: "sarah@example.edu".to_string(),
                student_no: None,
            },
            UserAccount {
                id: "student-001".to_string(),
                name: "Emma Williams".to_string(),
                role: Role::Student,
                email: "emma@example.edu".to_string(),
                student_no: Some("STU2024001".to_string()),
            },
        ]
    }

    #[test]
    fn login_lands_on_overview() {
        let accounts = accounts();
        let state = apply(&SessionState::LoggedOut, SessionEvent::Login(Role::Admin), &accounts)
            .unwrap();
        match state {
            SessionState::LoggedIn { account, view } => {
                assert_eq!(account.id, "admin-001");
                assert_eq!(view, Section::Overview);
            }
            SessionState::LoggedOut => panic!("expected a signed-in state"),
        }
    }

    #[test]
    fn double_login_is_rejected() {
        let accounts = accounts();
        let signed_in =
            apply(&SessionState::LoggedOut, SessionEvent::Login(Role::Admin), &accounts).unwrap();
        let err = apply(&signed_in, SessionEvent::Login(Role::Student), &accounts).unwrap_err();
        assert_eq!(err.code, "bad_state");
    }

    #[test]
    fn logout_requires_a_session() {
        let accounts = accounts();
        let err = apply(&SessionState::LoggedOut, SessionEvent::Logout, &accounts).unwrap_err();
        assert_eq!(err.code, "not_signed_in");

        let signed_in =
            apply(&SessionState::LoggedOut, SessionEvent::Login(Role::Admin), &accounts).unwrap();
        let state = apply(&signed_in, SessionEvent::Logout, &accounts).unwrap();
        assert!(matches!(state, SessionState::LoggedOut));
    }

    #[test]
    fn navigation_is_limited_to_visible_sections() {
        let accounts = accounts();
        let signed_in =
            apply(&SessionState::LoggedOut, SessionEvent::Login(Role::Student), &accounts).unwrap();

        let moved = apply(&signed_in, SessionEvent::Navigate(Section::Transcript), &accounts)
            .unwrap();
        match moved {
            SessionState::LoggedIn { view, .. } => assert_eq!(view, Section::Transcript),
            SessionState::LoggedOut => panic!("expected a signed-in state"),
        }

        let err = apply(&signed_in, SessionEvent::Navigate(Section::Students), &accounts)
            .unwrap_err();
        assert_eq!(err.code, "forbidden");
    }

    #[test]
    fn navigation_while_signed_out_is_rejected() {
        let accounts = accounts();
        let err = apply(
            &SessionState::LoggedOut,
            SessionEvent::Navigate(Section::Overview),
            &accounts,
        )
        .unwrap_err();
        assert_eq!(err.code, "not_signed_in");
    }
}

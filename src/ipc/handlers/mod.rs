pub mod attendance;
pub mod core;
pub mod grades;
pub mod overview;
pub mod session;
pub mod setup;
pub mod students;
pub mod transcript;

pub mod tutor_session;

pub use tutor_session::{TutorSession, FAILURE_NOTICE, MISSING_INPUT_NOTICE};

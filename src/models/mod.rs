pub mod answer_key;
pub mod content;
pub mod exam;
pub mod request;
pub mod tutor;

pub use answer_key::lookup_official_answer;
pub use content::{ContentPart, ImageRef};
pub use exam::ExamReference;
pub use request::{AnalyzeCommand, AnalyzeRequest, RequestMode};
pub use tutor::{DisplayPayload, HistoryEntry, TutorResponse};

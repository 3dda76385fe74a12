//! Session planning, selection and the running-quiz state machine.

pub mod plan;
pub mod runner;
pub mod select;
pub mod service;

pub use plan::{SessionMode, SessionRequest, plan_session};
pub use runner::{AnswerOutcome, QuestionView, QuizSession, ResolvedAnswer, SessionSummary};
pub use select::{focus_score, select_focus, select_srs};
pub use service::{SessionAnswerResult, SessionLoopService};

#![forbid(unsafe_code)]

//! Application services: answer recording, session planning and running,
//! and dashboard aggregation over the question catalog and progress store.

pub mod app_services;
pub mod dashboard;
pub mod error;
pub mod progress_service;
pub mod sessions;

pub use app_services::AppServices;
pub use dashboard::{DashboardService, DashboardStats, compute_stats};
pub use error::{AppServicesError, DashboardError, ProgressServiceError, SessionError};
pub use progress_service::{ProgressService, RecordedAnswer};
pub use sessions::{
    QuestionView, QuizSession, SessionAnswerResult, SessionLoopService, SessionMode,
    SessionRequest, SessionSummary,
};

// ABOUTME: Public library API for maktab diary summaries
// ABOUTME: Re-exports the client, parser and collaborator modules

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod diary;
pub mod error;
pub mod logging;
pub mod model;
pub mod onboarding;
pub mod registry;
pub mod sensor;
pub mod util;

pub use api::ApiClient;
pub use diary::parse_diary;
pub use error::{Error, Result};
pub use model::{Average, DiarySummary, LessonMark, LessonSummary, RawLessonEntry};

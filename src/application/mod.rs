pub mod use_cases;

pub use use_cases::analyze::AnalyzeUseCase;
pub use use_cases::auth::AuthUseCase;
pub use use_cases::report::ReportUseCase;
pub use use_cases::session::{SessionBackend, SessionController};

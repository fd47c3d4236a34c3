mod progress;
mod service;
mod state;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::SessionProgress;
pub use service::QuizSession;
pub use state::{GradingMode, ParseGradingModeError, QuestionState};
pub use view::{OptionView, QuestionView, QuizOutcome};
pub use workflow::{QuizLoopService, QuizScreen};

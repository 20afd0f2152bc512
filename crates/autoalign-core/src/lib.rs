pub mod alignment;
pub mod config;
pub mod error;
pub mod normalize;
pub mod projection;
pub mod report;
pub mod session;
pub mod upload;

pub use alignment::{AlignmentRequest, AlignmentResult, AlignmentStatus, AuditEntry};
pub use config::SessionConfig;
pub use error::{FailureKind, OracleFailure, TransitionError};
pub use normalize::{Message, MessageCategory, Role, Severity, normalize};
pub use projection::{Arena, DebateProgress, Panel};
pub use report::{AlignedReport, ExportFormat, ScoreBand};
pub use session::{OraclePhase, RequestToken, Session, Stage};
pub use upload::{Category, UploadRegistry, UploadedFile};

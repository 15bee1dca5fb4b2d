//! Domain models shared by the database layer and the HTTP service

pub mod affiliate;
pub mod notification;
pub mod project;
pub mod suggestion;
pub mod titulin;
pub mod user;
pub mod video;

pub use affiliate::{AffiliateCompany, AffiliateMatch};
pub use notification::{NewNotification, Notification, NotificationKind, NotificationSettings};
pub use project::{format_series_number, Project};
pub use suggestion::{NewSuggestion, Suggestion, SuggestionStatus, SUGGESTION_CATEGORIES};
pub use titulin::{
    AnalysisData, ChannelInfo, HarvestedVideo, TitulinChannel, TitulinStats, TitulinVideo,
    TrainingExample,
};
pub use user::{Actor, User, VideoLimits};
pub use video::{
    AssignedTo, CorrectionEntry, CorrectionFiles, CorrectionTargets, CorrectionsMeta,
    FileCorrection, OptimizationMeta, ReviewedBy, SecondaryStatus, UserRef, Video, VideoMetadata,
};

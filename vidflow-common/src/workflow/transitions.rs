//! Transition table
//!
//! Per-role map of `current status → allowed next statuses`, written as an
//! exhaustive match so adding a role or status forces every table to be
//! revisited. Roles without entries (`content_reviewer`, `media_reviewer`)
//! may not move videos at all.

use super::{Role, VideoStatus};

use VideoStatus::*;

/// Statuses `role` may move a video to from `from`
pub fn allowed_transitions(role: Role, from: VideoStatus) -> &'static [VideoStatus] {
    match role {
        Role::Optimizer => match from {
            Pending => &[InProgress],
            InProgress => &[OptimizeReview],
            TitleCorrections => &[OptimizeReview],
            EnRevision => &[OptimizeReview],
            OptimizeReview | UploadReview | MediaCorrections | Review | YoutubeReady
            | Completed => &[],
        },
        Role::Youtuber => match from {
            YoutubeReady => &[Completed],
            Pending | InProgress | OptimizeReview | TitleCorrections | UploadReview
            | MediaCorrections | Review | Completed | EnRevision => &[],
        },
        Role::Reviewer => match from {
            OptimizeReview => &[TitleCorrections, UploadReview],
            UploadReview => &[OptimizeReview],
            MediaCorrections => &[UploadReview],
            EnRevision => &[OptimizeReview, TitleCorrections, MediaCorrections],
            Pending | InProgress | TitleCorrections | Review | YoutubeReady | Completed => &[],
        },
        Role::Admin => match from {
            Pending => &[
                InProgress,
                OptimizeReview,
                TitleCorrections,
                UploadReview,
                MediaCorrections,
                Review,
                YoutubeReady,
                Completed,
                EnRevision,
            ],
            InProgress => &[
                OptimizeReview,
                TitleCorrections,
                UploadReview,
                MediaCorrections,
                Review,
                YoutubeReady,
                Completed,
                EnRevision,
            ],
            OptimizeReview => &[
                TitleCorrections,
                UploadReview,
                MediaCorrections,
                Review,
                YoutubeReady,
                Completed,
                EnRevision,
            ],
            TitleCorrections => &[
                OptimizeReview,
                UploadReview,
                MediaCorrections,
                Review,
                YoutubeReady,
                Completed,
                EnRevision,
            ],
            UploadReview => &[MediaCorrections, Review, YoutubeReady, Completed, EnRevision],
            MediaCorrections => &[UploadReview, Review, YoutubeReady, Completed, EnRevision],
            Review => &[YoutubeReady, TitleCorrections, MediaCorrections, Completed, EnRevision],
            YoutubeReady => &[Completed],
            Completed => &[],
            EnRevision => &[
                OptimizeReview,
                TitleCorrections,
                MediaCorrections,
                Review,
                YoutubeReady,
                Completed,
            ],
        },
        Role::ContentReviewer | Role::MediaReviewer => &[],
    }
}

/// True when `role` may move a video from `from` to `to`
pub fn can_transition(role: Role, from: VideoStatus, to: VideoStatus) -> bool {
    allowed_transitions(role, from).contains(&to)
}

/// Preceding status in the main pipeline, used when reverting a step
pub fn previous_state(status: VideoStatus) -> Option<VideoStatus> {
    match status {
        Pending => None,
        InProgress => Some(Pending),
        OptimizeReview => Some(InProgress),
        TitleCorrections => Some(OptimizeReview),
        UploadReview => Some(TitleCorrections),
        MediaCorrections => Some(UploadReview),
        Review => Some(MediaCorrections),
        YoutubeReady => Some(Review),
        Completed => Some(YoutubeReady),
        EnRevision => Some(Completed),
    }
}

/// Whether `role` may revert a video sitting in `status` to its previous state
pub fn can_revert_state(role: Role, status: VideoStatus) -> bool {
    match role {
        Role::Admin => true,
        Role::Optimizer => matches!(status, InProgress | OptimizeReview | TitleCorrections),
        Role::ContentReviewer => matches!(status, OptimizeReview | TitleCorrections),
        Role::MediaReviewer => matches!(status, UploadReview | MediaCorrections),
        Role::Youtuber => matches!(status, UploadReview | MediaCorrections),
        Role::Reviewer => matches!(status, OptimizeReview | TitleCorrections | YoutubeReady | Completed),
    }
}

/// Whether `role` may clear the assignee of a video in `status`
///
/// Only admins and youtubers unassign; youtubers only while media work is
/// open, admins anywhere but the closing states.
pub fn can_unassign_video(role: Role, status: VideoStatus) -> bool {
    match role {
        Role::Youtuber => matches!(status, UploadReview | MediaCorrections),
        Role::Admin => !matches!(status, Completed | YoutubeReady | EnRevision),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimizer_pipeline() {
        assert!(can_transition(Role::Optimizer, Pending, InProgress));
        assert!(can_transition(Role::Optimizer, InProgress, OptimizeReview));
        assert!(can_transition(Role::Optimizer, TitleCorrections, OptimizeReview));
        assert!(!can_transition(Role::Optimizer, Pending, Completed));
        assert!(!can_transition(Role::Optimizer, OptimizeReview, UploadReview));
    }

    #[test]
    fn test_reviewer_table() {
        assert_eq!(
            allowed_transitions(Role::Reviewer, OptimizeReview),
            &[TitleCorrections, UploadReview]
        );
        assert!(can_transition(Role::Reviewer, EnRevision, MediaCorrections));
        assert!(!can_transition(Role::Reviewer, UploadReview, MediaCorrections));
    }

    #[test]
    fn test_youtuber_only_publishes() {
        for from in VideoStatus::ALL {
            for to in VideoStatus::ALL {
                let expected = from == YoutubeReady && to == Completed;
                assert_eq!(can_transition(Role::Youtuber, from, to), expected, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_review_only_roles_have_no_transitions() {
        for from in VideoStatus::ALL {
            assert!(allowed_transitions(Role::ContentReviewer, from).is_empty());
            assert!(allowed_transitions(Role::MediaReviewer, from).is_empty());
        }
    }

    #[test]
    fn test_no_role_leaves_completed_except_nobody() {
        for role in Role::ALL {
            assert!(allowed_transitions(role, Completed).is_empty());
        }
    }

    #[test]
    fn test_admin_graph_is_near_complete() {
        assert_eq!(allowed_transitions(Role::Admin, Pending).len(), 9);
        assert!(can_transition(Role::Admin, Review, TitleCorrections));
        assert!(!can_transition(Role::Admin, YoutubeReady, Pending));
        assert!(!can_transition(Role::Admin, UploadReview, Pending));
    }

    #[test]
    fn test_no_self_loops() {
        for role in Role::ALL {
            for status in VideoStatus::ALL {
                assert!(!can_transition(role, status, status));
            }
        }
    }

    #[test]
    fn test_previous_state_chain() {
        let mut steps = 0;
        let mut current = Some(Completed);
        while let Some(status) = current {
            current = previous_state(status);
            steps += 1;
        }
        assert_eq!(steps, 9);
        assert_eq!(previous_state(EnRevision), Some(Completed));
    }

    #[test]
    fn test_unassign_permissions() {
        assert!(can_unassign_video(Role::Youtuber, UploadReview));
        assert!(!can_unassign_video(Role::Youtuber, Review));
        assert!(can_unassign_video(Role::Admin, InProgress));
        assert!(!can_unassign_video(Role::Admin, YoutubeReady));
        assert!(!can_unassign_video(Role::Reviewer, UploadReview));
    }

    #[test]
    fn test_revert_permissions() {
        assert!(can_revert_state(Role::Admin, Pending));
        assert!(can_revert_state(Role::Reviewer, Completed));
        assert!(!can_revert_state(Role::Optimizer, Completed));
    }
}

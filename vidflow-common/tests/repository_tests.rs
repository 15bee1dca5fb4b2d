//! Repository tests against a fresh SQLite database per test

use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use tempfile::TempDir;

use vidflow_common::db::{
    affiliates, init::init_database, notifications, projects, sessions, suggestions, titulin,
    users, videos,
};
use vidflow_common::models::{
    AnalysisData, ChannelInfo, HarvestedVideo, NewNotification, NewSuggestion,
    NotificationSettings, SuggestionStatus, User,
};
use vidflow_common::workflow::{apply_update, CorrectionRequest, Role, VideoPatch, VideoStatus};
use vidflow_common::Error;

// ============================================================================
// Helpers
// ============================================================================

async fn setup() -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("vidflow.db")).await.unwrap();
    (dir, pool)
}

async fn make_user(pool: &SqlitePool, username: &str, role: Role) -> User {
    users::create_user(
        pool,
        &users::NewUser {
            username: username.to_string(),
            password_hash: "not-a-real-hash".to_string(),
            full_name: None,
            email: None,
            role,
            max_assigned_videos: None,
            max_monthly_videos: None,
        },
    )
    .await
    .unwrap()
}

async fn make_project(pool: &SqlitePool, prefix: Option<&str>) -> i64 {
    projects::create_project(
        pool,
        &projects::ProjectInput {
            name: "Canal principal".into(),
            prefix: prefix.map(str::to_string),
            description: None,
        },
    )
    .await
    .unwrap()
    .id
}

fn new_video(title: &str) -> videos::NewVideo {
    videos::NewVideo {
        title: title.to_string(),
        ..Default::default()
    }
}

// ============================================================================
// Users & sessions
// ============================================================================

#[tokio::test]
async fn test_duplicate_username_is_conflict() {
    let (_dir, pool) = setup().await;
    make_user(&pool, "ana", Role::Optimizer).await;

    let err = users::create_user(
        &pool,
        &users::NewUser {
            username: "ana".into(),
            password_hash: "x".into(),
            full_name: None,
            email: None,
            role: Role::Reviewer,
            max_assigned_videos: None,
            max_monthly_videos: None,
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Conflict(_)));
}

#[tokio::test]
async fn test_credentials_lookup_returns_hash() {
    let (_dir, pool) = setup().await;
    let user = make_user(&pool, "ana", Role::Optimizer).await;

    let (found, hash) = users::get_user_credentials(&pool, "ana").await.unwrap().unwrap();
    assert_eq!(found.id, user.id);
    assert_eq!(found.role, Role::Optimizer);
    assert_eq!(hash, "not-a-real-hash");

    assert!(users::get_user_credentials(&pool, "nadie").await.unwrap().is_none());
}

#[tokio::test]
async fn test_session_lifecycle() {
    let (_dir, pool) = setup().await;
    let user = make_user(&pool, "ana", Role::Admin).await;

    let token = sessions::create_session(&pool, user.id, Duration::hours(1)).await.unwrap();
    let found = sessions::session_user(&pool, &token, Utc::now()).await.unwrap();
    assert_eq!(found.map(|u| u.id), Some(user.id));

    // Expired from the perspective of a later clock
    let later = Utc::now() + Duration::hours(2);
    assert!(sessions::session_user(&pool, &token, later).await.unwrap().is_none());

    sessions::delete_session(&pool, &token).await.unwrap();
    assert!(sessions::session_user(&pool, &token, Utc::now()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_limits_update_and_project_access() {
    let (_dir, pool) = setup().await;
    let user = make_user(&pool, "yt", Role::Youtuber).await;
    let p1 = make_project(&pool, None).await;
    let p2 = make_project(&pool, Some("B")).await;

    let updated = users::update_limits(&pool, user.id, Some(5), None).await.unwrap();
    assert_eq!(updated.max_assigned_videos, Some(5));
    assert_eq!(updated.max_monthly_videos, None);

    users::set_project_access(&pool, user.id, &[p2, p1, p2]).await.unwrap();
    assert_eq!(users::project_access(&pool, user.id).await.unwrap(), vec![p1, p2]);

    users::set_project_access(&pool, user.id, &[p1]).await.unwrap();
    assert_eq!(users::project_access(&pool, user.id).await.unwrap(), vec![p1]);
}

// ============================================================================
// Videos
// ============================================================================

#[tokio::test]
async fn test_series_numbers_advance() {
    let (_dir, pool) = setup().await;
    let project = make_project(&pool, Some("tec")).await;

    let first = videos::create_video(&pool, project, &new_video("Uno"), None).await.unwrap();
    let second = videos::create_video(&pool, project, &new_video("Dos"), None).await.unwrap();

    assert_eq!(first.series_number.as_deref(), Some("TEC-0001"));
    assert_eq!(second.series_number.as_deref(), Some("TEC-0002"));
    assert_eq!(first.status, VideoStatus::Pending);

    let project = projects::require_project(&pool, project).await.unwrap();
    assert_eq!(project.current_number, 2);
}

#[tokio::test]
async fn test_create_video_in_missing_project_fails() {
    let (_dir, pool) = setup().await;
    let err = videos::create_video(&pool, 999, &new_video("Uno"), None).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_bulk_create_skips_blank_titles() {
    let (_dir, pool) = setup().await;
    let project = make_project(&pool, None).await;

    let titles = vec!["Uno".to_string(), "  ".to_string(), "Dos".to_string()];
    let created = videos::bulk_create_videos(&pool, project, &titles, 50, None).await.unwrap();

    assert_eq!(created.len(), 2);
    assert_eq!(created[0].series_number.as_deref(), Some("0001"));
    assert_eq!(created[1].series_number.as_deref(), Some("0002"));
}

#[tokio::test]
async fn test_bulk_create_enforces_limits() {
    let (_dir, pool) = setup().await;
    let project = make_project(&pool, None).await;

    let blank = vec!["".to_string()];
    assert!(matches!(
        videos::bulk_create_videos(&pool, project, &blank, 50, None).await,
        Err(Error::InvalidInput(_))
    ));

    let too_many: Vec<String> = (0..51).map(|i| format!("Video {}", i)).collect();
    assert!(matches!(
        videos::bulk_create_videos(&pool, project, &too_many, 50, None).await,
        Err(Error::InvalidInput(_))
    ));

    // Nothing was written by the rejected batches
    assert!(videos::list_videos(&pool, Some(project), false).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_trash_restore_and_empty() {
    let (_dir, pool) = setup().await;
    let admin = make_user(&pool, "admin", Role::Admin).await;
    let project = make_project(&pool, None).await;
    let a = videos::create_video(&pool, project, &new_video("A"), None).await.unwrap();
    let b = videos::create_video(&pool, project, &new_video("B"), None).await.unwrap();

    let trashed = videos::delete_videos(&pool, project, &[a.id, b.id], false, admin.id).await.unwrap();
    assert_eq!(trashed, 2);
    assert!(videos::list_videos(&pool, Some(project), false).await.unwrap().is_empty());
    assert_eq!(videos::list_videos(&pool, Some(project), true).await.unwrap().len(), 2);

    let restored = videos::restore_video(&pool, project, a.id).await.unwrap();
    assert!(!restored.is_deleted);
    assert!(restored.deleted_by.is_none());

    assert_eq!(videos::empty_trash(&pool, project).await.unwrap(), 1);
    assert!(videos::get_video(&pool, b.id).await.unwrap().is_none());
    assert!(videos::get_video(&pool, a.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_trashed_video_hidden_from_project_lookup() {
    let (_dir, pool) = setup().await;
    let admin = make_user(&pool, "admin", Role::Admin).await;
    let project = make_project(&pool, None).await;
    let video = videos::create_video(&pool, project, &new_video("A"), None).await.unwrap();
    videos::delete_videos(&pool, project, &[video.id], false, admin.id).await.unwrap();

    let err = videos::require_project_video(&pool, project, video.id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let trashed = videos::require_project_video_with_trash(&pool, project, video.id).await.unwrap();
    assert!(trashed.is_deleted);

    // Writes never resurrect a trashed row
    let mut edited = trashed.clone();
    edited.title = "Editado".into();
    let err = videos::save_video(&pool, &edited).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let restored = videos::restore_video(&pool, project, video.id).await.unwrap();
    assert_eq!(restored.title, "A");
    assert!(videos::require_project_video(&pool, project, video.id).await.is_ok());
}

#[tokio::test]
async fn test_concurrent_upload_claims_have_one_winner() {
    let (_dir, pool) = setup().await;
    let admin = make_user(&pool, "admin", Role::Admin).await;
    let first = make_user(&pool, "yt1", Role::Youtuber).await;
    let second = make_user(&pool, "yt2", Role::Youtuber).await;
    let project = make_project(&pool, None).await;
    let video = videos::create_video(&pool, project, &new_video("Uno"), None).await.unwrap();

    let to_upload = VideoPatch {
        status: Some(VideoStatus::UploadReview),
        ..Default::default()
    };
    let plan = apply_update(&admin.actor(), &video, to_upload, Utc::now()).unwrap();
    videos::save_video(&pool, &plan.video).await.unwrap();

    let (a, b) = tokio::join!(
        videos::claim_upload(&pool, video.id, first.id, Utc::now()),
        videos::claim_upload(&pool, video.id, second.id, Utc::now()),
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(a ^ b, "exactly one claim wins: {} {}", a, b);

    let (winner, loser) = if a { (&first, &second) } else { (&second, &first) };
    let stored = videos::get_video(&pool, video.id).await.unwrap().unwrap();
    assert_eq!(stored.current_reviewer_id, Some(winner.id));
    assert_eq!(stored.content_uploaded_by, Some(winner.id));

    assert!(!videos::claim_upload(&pool, video.id, loser.id, Utc::now()).await.unwrap());
    assert!(videos::claim_upload(&pool, video.id, winner.id, Utc::now()).await.unwrap());
}

#[tokio::test]
async fn test_upload_claim_requires_upload_review() {
    let (_dir, pool) = setup().await;
    let youtuber = make_user(&pool, "yt", Role::Youtuber).await;
    let project = make_project(&pool, None).await;
    let video = videos::create_video(&pool, project, &new_video("Uno"), None).await.unwrap();

    assert!(!videos::claim_upload(&pool, video.id, youtuber.id, Utc::now()).await.unwrap());
    let stored = videos::get_video(&pool, video.id).await.unwrap().unwrap();
    assert_eq!(stored.current_reviewer_id, None);
}

#[tokio::test]
async fn test_correction_history_survives_persistence() {
    let (_dir, pool) = setup().await;
    let admin = make_user(&pool, "admin", Role::Admin).await;
    let project = make_project(&pool, None).await;
    let mut video = videos::create_video(&pool, project, &new_video("Uno"), None).await.unwrap();

    for round in 0..2 {
        // Walk to upload_review, then request corrections
        let to_upload = VideoPatch {
            status: Some(VideoStatus::UploadReview),
            ..Default::default()
        };
        video = videos::save_video(&pool, &apply_update(&admin.actor(), &video, to_upload, Utc::now()).unwrap().video)
            .await
            .unwrap();

        let request = VideoPatch {
            status: Some(VideoStatus::MediaCorrections),
            corrections: Some(CorrectionRequest {
                comment: format!("Ronda {}", round),
                video: true,
                thumbnail: false,
            }),
            ..Default::default()
        };
        let plan = apply_update(&admin.actor(), &video, request, Utc::now()).unwrap();
        video = videos::save_video(&pool, &plan.video).await.unwrap();

        let history = &video.metadata.corrections.as_ref().unwrap().history;
        assert_eq!(history.len(), round + 1);
        assert_eq!(history[round].comment, format!("Ronda {}", round));
    }

    let reloaded = videos::get_video(&pool, video.id).await.unwrap().unwrap();
    assert_eq!(reloaded.metadata.corrections.unwrap().history.len(), 2);
    assert_eq!(reloaded.media_reviewed_by, Some(admin.id));
}

#[tokio::test]
async fn test_reviewer_name_is_joined() {
    let (_dir, pool) = setup().await;
    let optimizer = make_user(&pool, "opti", Role::Optimizer).await;
    let project = make_project(&pool, None).await;
    let video = videos::create_video(&pool, project, &new_video("Uno"), None).await.unwrap();

    let claim = VideoPatch {
        status: Some(VideoStatus::InProgress),
        ..Default::default()
    };
    let plan = apply_update(&optimizer.actor(), &video, claim, Utc::now()).unwrap();
    let saved = videos::save_video(&pool, &plan.video).await.unwrap();

    assert_eq!(saved.current_reviewer_id, Some(optimizer.id));
    assert_eq!(saved.reviewer_username.as_deref(), Some("opti"));
}

// ============================================================================
// Notifications
// ============================================================================

fn notice(title: &str) -> NewNotification {
    NewNotification {
        title: title.to_string(),
        message: "Mensaje".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_notification_read_and_archive() {
    let (_dir, pool) = setup().await;
    let sender = make_user(&pool, "admin", Role::Admin).await;
    let user = make_user(&pool, "ana", Role::Optimizer).await;

    let first = notifications::create_notification(&pool, user.id, &notice("Uno"), Some(sender.id))
        .await
        .unwrap()
        .unwrap();
    notifications::create_notification(&pool, user.id, &notice("Dos"), None)
        .await
        .unwrap();

    assert_eq!(first.sender_username.as_deref(), Some("admin"));
    assert_eq!(notifications::list_notifications(&pool, user.id, false, 50).await.unwrap().len(), 2);

    assert!(notifications::mark_read(&pool, user.id, first.id).await.unwrap());
    assert!(!notifications::mark_read(&pool, sender.id, first.id).await.unwrap());
    assert_eq!(notifications::list_notifications(&pool, user.id, false, 50).await.unwrap().len(), 1);
    assert_eq!(notifications::list_notifications(&pool, user.id, true, 50).await.unwrap().len(), 2);

    assert!(notifications::archive(&pool, user.id, first.id).await.unwrap());
    assert_eq!(notifications::list_notifications(&pool, user.id, true, 50).await.unwrap().len(), 1);

    assert_eq!(notifications::mark_all_read(&pool, user.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_in_app_disabled_suppresses_creation() {
    let (_dir, pool) = setup().await;
    let user = make_user(&pool, "ana", Role::Optimizer).await;

    let settings = NotificationSettings {
        in_app_enabled: false,
        ..NotificationSettings::default()
    };
    notifications::save_settings(&pool, user.id, &settings).await.unwrap();
    assert_eq!(notifications::get_settings(&pool, user.id).await.unwrap(), settings);

    let created = notifications::create_notification(&pool, user.id, &notice("Uno"), None)
        .await
        .unwrap();
    assert!(created.is_none());
    assert!(notifications::list_notifications(&pool, user.id, true, 50).await.unwrap().is_empty());
}

// ============================================================================
// Affiliates
// ============================================================================

fn company(name: &str, keywords: &[&str]) -> affiliates::CompanyInput {
    affiliates::CompanyInput {
        name: name.to_string(),
        affiliate_url: format!("https://{}.example/ref", name.to_lowercase()),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_company_names_are_unique_case_insensitive() {
    let (_dir, pool) = setup().await;
    affiliates::create_company(&pool, &company("Hostinger", &[])).await.unwrap();

    let err = affiliates::create_company(&pool, &company("HOSTINGER", &[])).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    let (created, skipped) = affiliates::import_company_names(
        &pool,
        &["hostinger".to_string(), "NordVPN".to_string()],
    )
    .await
    .unwrap();
    assert_eq!((created, skipped), (1, 1));
}

#[tokio::test]
async fn test_scan_records_each_match_once() {
    let (_dir, pool) = setup().await;
    let project = make_project(&pool, None).await;
    let video = videos::create_video(&pool, project, &new_video("Mi experiencia con NordVPN"), None)
        .await
        .unwrap();
    affiliates::create_company(&pool, &company("NordVPN", &[])).await.unwrap();
    affiliates::create_company(&pool, &company("Hostinger", &["hosting"])).await.unwrap();

    let matched = affiliates::scan_video(&pool, video.id, &video.title).await.unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].name, "NordVPN");

    let again = affiliates::scan_video(&pool, video.id, &video.title).await.unwrap();
    assert!(again.is_empty());

    let matches = affiliates::list_matches_for_video(&pool, video.id).await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].company_name.as_deref(), Some("NordVPN"));

    let included = affiliates::set_inclusion(&pool, matches[0].id, true).await.unwrap();
    assert!(included.included_by_youtuber);
}

#[tokio::test]
async fn test_reactivating_company_is_reported() {
    let (_dir, pool) = setup().await;
    let project = make_project(&pool, None).await;
    videos::create_video(&pool, project, &new_video("Mejor hosting barato"), None).await.unwrap();

    let mut input = company("Hostinger", &["hosting"]);
    input.active = Some(false);
    let created = affiliates::create_company(&pool, &input).await.unwrap();
    assert!(!created.active);

    input.active = Some(true);
    let (updated, reactivated) = affiliates::update_company(&pool, created.id, &input).await.unwrap();
    assert!(reactivated);

    let matched = affiliates::scan_videos_for_company(&pool, &updated).await.unwrap();
    assert_eq!(matched.len(), 1);
}

// ============================================================================
// Titulin
// ============================================================================

fn harvested(youtube_id: &str, title: &str) -> HarvestedVideo {
    HarvestedVideo {
        youtube_id: youtube_id.to_string(),
        title: title.to_string(),
        description: None,
        published_at: Some(Utc::now()),
        thumbnail_url: None,
        view_count: Some(10),
        tags: vec!["rust".into()],
    }
}

#[tokio::test]
async fn test_upsert_by_youtube_id() {
    let (_dir, pool) = setup().await;

    assert!(titulin::upsert_video(&pool, "UC1", &harvested("abc", "Primero")).await.unwrap());
    assert!(!titulin::upsert_video(&pool, "UC1", &harvested("abc", "Renombrado")).await.unwrap());

    let (list, total) = titulin::list_videos(&pool, &titulin::VideoQuery::default(), 20, 0)
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(list[0].title, "Renombrado");
    assert_eq!(list[0].tags, vec!["rust".to_string()]);
}

#[tokio::test]
async fn test_analysis_and_filters() {
    let (_dir, pool) = setup().await;
    titulin::upsert_video(&pool, "UC1", &harvested("a", "Cómo aprender Rust")).await.unwrap();
    titulin::upsert_video(&pool, "UC2", &harvested("b", "Noticias de hoy")).await.unwrap();

    let (all, _) = titulin::list_videos(&pool, &titulin::VideoQuery::default(), 20, 0).await.unwrap();
    let rust = all.iter().find(|v| v.youtube_id == "a").unwrap();

    titulin::store_video_embedding(&pool, rust.id, &[0.1, 0.2, 0.3]).await.unwrap();
    titulin::store_analysis(
        &pool,
        rust.id,
        &AnalysisData {
            is_evergreen: true,
            confidence: 0.9,
            reason: "Tutorial".into(),
            analyzed_at: Utc::now(),
        },
    )
    .await
    .unwrap();

    let analyzed = titulin::VideoQuery {
        analyzed: Some(true),
        ..Default::default()
    };
    let (list, total) = titulin::list_videos(&pool, &analyzed, 20, 0).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(list[0].analysis_data.as_ref().map(|a| a.is_evergreen), Some(true));

    let by_channel = titulin::VideoQuery {
        channel_id: Some("UC2".into()),
        ..Default::default()
    };
    assert_eq!(titulin::list_videos(&pool, &by_channel, 20, 0).await.unwrap().1, 1);

    let pool_entries = titulin::labelled_embeddings(&pool, None).await.unwrap();
    assert_eq!(pool_entries.len(), 1);
    assert!(titulin::labelled_embeddings(&pool, Some(rust.id)).await.unwrap().is_empty());

    let stats = titulin::stats(&pool).await.unwrap();
    assert_eq!((stats.total_videos, stats.analyzed_videos, stats.evergreen_videos), (2, 1, 1));
}

#[tokio::test]
async fn test_send_to_optimize_only_once() {
    let (_dir, pool) = setup().await;
    let admin = make_user(&pool, "admin", Role::Admin).await;
    let project = make_project(&pool, Some("TT")).await;
    titulin::upsert_video(&pool, "UC1", &harvested("abc", "Guía de Rust")).await.unwrap();
    let (list, _) = titulin::list_videos(&pool, &titulin::VideoQuery::default(), 20, 0).await.unwrap();

    let video_id = titulin::send_to_optimize(&pool, list[0].id, project, admin.id).await.unwrap();
    let video = videos::get_video(&pool, video_id).await.unwrap().unwrap();
    assert_eq!(video.title, "Guía de Rust");
    assert_eq!(video.series_number.as_deref(), Some("TT-0001"));
    assert_eq!(video.tags.as_deref(), Some("rust"));

    let err = titulin::send_to_optimize(&pool, list[0].id, project, admin.id).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn test_channel_delete_removes_videos() {
    let (_dir, pool) = setup().await;
    let info = ChannelInfo {
        channel_id: "UC1".into(),
        name: "Canal".into(),
        description: None,
        thumbnail_url: None,
        subscriber_count: Some(100),
        video_count: Some(1),
    };
    let channel = titulin::create_channel(&pool, &info, "https://youtube.com/@canal").await.unwrap();
    assert!(matches!(
        titulin::create_channel(&pool, &info, "https://youtube.com/@canal").await,
        Err(Error::Conflict(_))
    ));

    titulin::upsert_video(&pool, "UC1", &harvested("abc", "Uno")).await.unwrap();
    titulin::delete_channel(&pool, channel.id).await.unwrap();

    assert_eq!(titulin::stats(&pool).await.unwrap().total_videos, 0);
}

#[tokio::test]
async fn test_training_example_bulk_operations() {
    let (_dir, pool) = setup().await;
    let created = titulin::create_training_examples(
        &pool,
        &[
            ("Cómo cocinar arroz".to_string(), true),
            ("".to_string(), true),
            ("Resultados del partido".to_string(), false),
        ],
        None,
    )
    .await
    .unwrap();
    assert_eq!(created, 2);

    let evergreen = titulin::ExampleQuery {
        kind: Some("evergreen".into()),
        ..Default::default()
    };
    let (list, total) = titulin::list_training_examples(&pool, &evergreen, 10, 0).await.unwrap();
    assert_eq!(total, 1);
    assert!(!list[0].has_embedding);

    let all = titulin::all_training_examples(&pool).await.unwrap();
    let ids: Vec<i64> = all.iter().map(|e| e.id).collect();
    assert_eq!(titulin::set_examples_evergreen(&pool, &ids, true).await.unwrap(), 2);
    assert_eq!(titulin::set_examples_category(&pool, &ids[..1], Some("cocina")).await.unwrap(), 1);

    let pending = titulin::examples_without_embedding(&pool, 10).await.unwrap();
    assert_eq!(pending.len(), 2);
    titulin::store_example_embedding(&pool, pending[0].0, &[1.0, 0.0]).await.unwrap();
    assert_eq!(titulin::examples_without_embedding(&pool, 10).await.unwrap().len(), 1);

    assert_eq!(titulin::delete_training_examples(&pool, &ids).await.unwrap(), 2);
}

// ============================================================================
// Suggestions
// ============================================================================

#[tokio::test]
async fn test_suggestion_flow() {
    let (_dir, pool) = setup().await;
    let user = make_user(&pool, "ana", Role::Optimizer).await;

    let created = suggestions::create_suggestion(
        &pool,
        user.id,
        &NewSuggestion {
            title: "Modo oscuro".into(),
            description: "Un tema oscuro para el panel".into(),
            category: "interfaz".into(),
        },
    )
    .await
    .unwrap();
    assert_eq!(created.status, SuggestionStatus::Pending);
    assert_eq!(created.username.as_deref(), Some("ana"));

    let filter = suggestions::SuggestionFilter {
        search: Some("oscuro".into()),
        ..Default::default()
    };
    assert_eq!(suggestions::list_suggestions(&pool, &filter).await.unwrap().len(), 1);

    let updated = suggestions::update_status(&pool, created.id, SuggestionStatus::Implemented, Some("Hecho"))
        .await
        .unwrap();
    assert_eq!(updated.status, SuggestionStatus::Implemented);
    assert_eq!(updated.admin_notes.as_deref(), Some("Hecho"));

    assert_eq!(suggestions::list_user_suggestions(&pool, user.id).await.unwrap().len(), 1);
}

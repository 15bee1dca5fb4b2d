//! Notification delivery: persist, then push to live connections

pub mod hub;

pub use hub::{ConnectionId, NotificationHub};

use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use vidflow_common::db::{affiliates, notifications, users};
use vidflow_common::events::ServerMessage;
use vidflow_common::models::{AffiliateCompany, NewNotification, Notification, NotificationKind, Video};
use vidflow_common::workflow::Role;
use vidflow_common::Result;

/// Store a notification for `user_id` and push it to their open sockets
///
/// `None` when the recipient disabled in-app notifications.
pub async fn notify_user(
    db: &SqlitePool,
    hub: &NotificationHub,
    user_id: i64,
    notification: &NewNotification,
    created_by: Option<i64>,
) -> Result<Option<Notification>> {
    let stored = notifications::create_notification(db, user_id, notification, created_by).await?;
    match &stored {
        Some(n) => {
            let delivered = hub
                .push(user_id, ServerMessage::NewNotification { data: n.clone() })
                .await;
            debug!(user_id, notification = n.id, delivered, "Notification created");
        }
        None => debug!(user_id, "In-app notifications disabled, skipped"),
    }
    Ok(stored)
}

async fn notify_each(
    db: &SqlitePool,
    hub: &NotificationHub,
    recipients: Vec<i64>,
    notification: &NewNotification,
    created_by: Option<i64>,
) -> Result<usize> {
    let mut sent = 0;
    for user_id in recipients {
        if notify_user(db, hub, user_id, notification, created_by).await?.is_some() {
            sent += 1;
        }
    }
    Ok(sent)
}

/// Notify every user with `role`, except the sender
pub async fn notify_role(
    db: &SqlitePool,
    hub: &NotificationHub,
    role: Role,
    notification: &NewNotification,
    created_by: Option<i64>,
) -> Result<usize> {
    let recipients: Vec<i64> = users::user_ids_with_role(db, role)
        .await?
        .into_iter()
        .filter(|id| Some(*id) != created_by)
        .collect();

    info!("Notifying {} users with role {}", recipients.len(), role);
    notify_each(db, hub, recipients, notification, created_by).await
}

/// Notify every user
pub async fn notify_all(
    db: &SqlitePool,
    hub: &NotificationHub,
    notification: &NewNotification,
    created_by: Option<i64>,
) -> Result<usize> {
    let recipients = users::all_user_ids(db).await?;
    info!("Notifying all {} users", recipients.len());
    notify_each(db, hub, recipients, notification, created_by).await
}

/// Initial `unread_notifications` message for a fresh connection, if any
pub async fn unread_message(db: &SqlitePool, user_id: i64, limit: i64) -> Result<Option<ServerMessage>> {
    let mut unread = notifications::list_notifications(db, user_id, false, limit).await?;
    if unread.is_empty() {
        return Ok(None);
    }
    unread.reverse();
    Ok(Some(ServerMessage::UnreadNotifications { data: unread }))
}

fn affiliate_notice(video: &Video, company: &AffiliateCompany) -> NewNotification {
    NewNotification {
        title: "Enlace de afiliado requerido".to_string(),
        message: format!(
            "El video \"{}\" menciona a {}. Recuerda incluir el enlace de afiliado en la descripción y tarjetas del video.",
            video.title, company.name
        ),
        kind: NotificationKind::Info,
        action_url: Some(format!("/videos?id={}", video.id)),
        action_label: Some("Ver video".to_string()),
        related_entity_type: Some("video".to_string()),
        related_entity_id: Some(video.id),
    }
}

/// Tell the video's youtuber about affiliate mentions, once per match
///
/// Matches stay un-notified while no youtuber is attached; they are sent
/// when one claims the video.
pub async fn affiliate_mentions(
    db: &SqlitePool,
    hub: &NotificationHub,
    video: &Video,
    companies: &[AffiliateCompany],
) -> Result<()> {
    let Some(youtuber) = video.content_uploaded_by else {
        return Ok(());
    };

    for company in companies {
        notify_user(db, hub, youtuber, &affiliate_notice(video, company), None).await?;
        affiliates::mark_notified(db, video.id, company.id).await?;
    }
    Ok(())
}

/// Notify the youtuber about matches recorded before they were attached
pub async fn pending_affiliate_mentions(db: &SqlitePool, hub: &NotificationHub, video: &Video) -> Result<()> {
    if video.content_uploaded_by.is_none() {
        return Ok(());
    }

    let mut pending = Vec::new();
    for m in affiliates::list_matches_for_video(db, video.id).await? {
        if m.notified {
            continue;
        }
        if let Some(company) = affiliates::get_company(db, m.company_id).await? {
            pending.push(company);
        }
    }
    affiliate_mentions(db, hub, video, &pending).await
}

/// Match a video title against active companies and notify new mentions
///
/// Errors are logged, not returned.
pub async fn scan_affiliates(db: &SqlitePool, hub: &NotificationHub, video: &Video) {
    let result = async {
        let new_matches = affiliates::scan_video(db, video.id, &video.title).await?;
        if !new_matches.is_empty() {
            info!("Video {} mentions {} affiliate companies", video.id, new_matches.len());
        }
        affiliate_mentions(db, hub, video, &new_matches).await
    }
    .await;

    if let Err(e) = result {
        warn!("Affiliate scan failed for video {}: {}", video.id, e);
    }
}

//! Notification broadcasts and per-user inbox entries.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use shopx_core::{
    CustomerSegment, NotificationId, NotificationStatus, PageRequest, Role, SellerId, UserId,
    UserNotificationId,
};

use super::{RepositoryError, search_term};
use crate::models::notification::{
    CustomerActivity, InboxItem, Notification, NotificationInput, RecipientRow, UserTypeStats,
};

const NOTIFICATION_COLUMNS: &str = r"
    id, title, content, type, icon, action_text, action_url, target_audience, status,
    scheduled_at, sent_at, created_at, created_by, total_sent, total_read,
    seller_id, customer_segment
";

/// Per-buyer order history with one seller (`$1`), over all statuses.
const SELLER_BUYERS: &str = r"
    SELECT o.user_id,
           COUNT(DISTINCT o.id) AS total_orders,
           COALESCE(SUM(od.quantity * od.unit_price), 0) AS total_spent,
           MAX(o.order_date) AS last_order_date
    FROM shop.order_detail od
    JOIN shop.order o ON o.id = od.order_id
    JOIN shop.product p ON p.id = od.product_id
    WHERE p.seller_id = $1
    GROUP BY o.user_id
";

/// Window for the `recent` customer segment.
pub const RECENT_BUYER_DAYS: i64 = 30;

/// Spend with one seller that makes a buyer part of the `vip` segment.
pub const VIP_SPEND: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

fn role_names(roles: &[Role]) -> Vec<String> {
    roles.iter().map(|r| r.as_str().to_owned()).collect()
}

/// Repository for notifications.
pub struct NotificationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NotificationRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Admin listing, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<NotificationStatus>,
        kind: Option<&str>,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<(Vec<Notification>, i64), RepositoryError> {
        let pattern = search_term(search);
        let filter = r"
            WHERE ($1::shop.notification_status IS NULL OR status = $1)
              AND ($2::text IS NULL OR type = $2)
              AND ($3::text IS NULL OR title ILIKE $3 OR content ILIKE $3)
        ";

        let count_sql = format!("SELECT COUNT(*) FROM shop.notification {filter}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(status)
            .bind(kind)
            .bind(pattern.as_deref())
            .fetch_one(self.pool)
            .await?;

        let list_sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM shop.notification {filter} ORDER BY created_at DESC, id DESC LIMIT $4 OFFSET $5"
        );
        let rows = sqlx::query_as::<_, Notification>(&list_sql)
            .bind(status)
            .bind(kind)
            .bind(pattern.as_deref())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        Ok((rows, total))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: NotificationId) -> Result<Option<Notification>, RepositoryError> {
        let sql = format!("SELECT {NOTIFICATION_COLUMNS} FROM shop.notification WHERE id = $1");
        let row = sqlx::query_as::<_, Notification>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Insert a draft.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        input: &NotificationInput,
        created_by: UserId,
    ) -> Result<Notification, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO shop.notification
                (title, content, type, icon, action_text, action_url, target_audience,
                 scheduled_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {NOTIFICATION_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, Notification>(&sql)
            .bind(input.title.trim())
            .bind(&input.content)
            .bind(&input.kind)
            .bind(&input.icon)
            .bind(input.action_text.as_deref())
            .bind(input.action_url.as_deref())
            .bind(input.target_audience)
            .bind(input.scheduled_at)
            .bind(created_by)
            .fetch_one(self.pool)
            .await?;
        Ok(row)
    }

    /// Replace a draft's content.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no draft has this ID.
    pub async fn update_draft(
        &self,
        id: NotificationId,
        input: &NotificationInput,
    ) -> Result<Notification, RepositoryError> {
        let sql = format!(
            r"
            UPDATE shop.notification
            SET title = $2, content = $3, type = $4, icon = $5, action_text = $6,
                action_url = $7, target_audience = $8, scheduled_at = $9
            WHERE id = $1 AND status = 'draft'
            RETURNING {NOTIFICATION_COLUMNS}
            "
        );
        sqlx::query_as::<_, Notification>(&sql)
            .bind(id)
            .bind(input.title.trim())
            .bind(&input.content)
            .bind(&input.kind)
            .bind(&input.icon)
            .bind(input.action_text.as_deref())
            .bind(input.action_url.as_deref())
            .bind(input.target_audience)
            .bind(input.scheduled_at)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no draft has this ID.
    pub async fn delete_draft(&self, id: NotificationId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.notification WHERE id = $1 AND status = 'draft'")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// A seller's own notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_seller(
        &self,
        seller_id: SellerId,
        kind: Option<&str>,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<(Vec<Notification>, i64), RepositoryError> {
        let pattern = search_term(search);
        let filter = r"
            WHERE seller_id = $1
              AND ($2::text IS NULL OR type = $2)
              AND ($3::text IS NULL OR title ILIKE $3 OR content ILIKE $3)
        ";

        let count_sql = format!("SELECT COUNT(*) FROM shop.notification {filter}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(seller_id)
            .bind(kind)
            .bind(pattern.as_deref())
            .fetch_one(self.pool)
            .await?;

        let list_sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM shop.notification {filter} ORDER BY created_at DESC, id DESC LIMIT $4 OFFSET $5"
        );
        let rows = sqlx::query_as::<_, Notification>(&list_sql)
            .bind(seller_id)
            .bind(kind)
            .bind(pattern.as_deref())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        Ok((rows, total))
    }

    /// A notification, if this seller wrote it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_seller(
        &self,
        seller_id: SellerId,
        id: NotificationId,
    ) -> Result<Option<Notification>, RepositoryError> {
        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM shop.notification WHERE id = $1 AND seller_id = $2"
        );
        let row = sqlx::query_as::<_, Notification>(&sql)
            .bind(id)
            .bind(seller_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Insert a seller's draft addressed to one segment of their buyers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_for_seller(
        &self,
        seller_id: SellerId,
        created_by: UserId,
        input: &NotificationInput,
        segment: CustomerSegment,
    ) -> Result<Notification, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO shop.notification
                (title, content, type, icon, action_text, action_url, target_audience,
                 scheduled_at, created_by, seller_id, customer_segment)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {NOTIFICATION_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, Notification>(&sql)
            .bind(input.title.trim())
            .bind(&input.content)
            .bind(&input.kind)
            .bind(&input.icon)
            .bind(input.action_text.as_deref())
            .bind(input.action_url.as_deref())
            .bind(input.target_audience)
            .bind(input.scheduled_at)
            .bind(created_by)
            .bind(seller_id)
            .bind(segment)
            .fetch_one(self.pool)
            .await?;
        Ok(row)
    }

    /// Replace the content and segment of a seller's draft.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the seller has no such draft.
    pub async fn update_seller_draft(
        &self,
        seller_id: SellerId,
        id: NotificationId,
        input: &NotificationInput,
        segment: CustomerSegment,
    ) -> Result<Notification, RepositoryError> {
        let sql = format!(
            r"
            UPDATE shop.notification
            SET title = $3, content = $4, type = $5, icon = $6, action_text = $7,
                action_url = $8, scheduled_at = $9, customer_segment = $10
            WHERE id = $1 AND seller_id = $2 AND status = 'draft'
            RETURNING {NOTIFICATION_COLUMNS}
            "
        );
        sqlx::query_as::<_, Notification>(&sql)
            .bind(id)
            .bind(seller_id)
            .bind(input.title.trim())
            .bind(&input.content)
            .bind(&input.kind)
            .bind(&input.icon)
            .bind(input.action_text.as_deref())
            .bind(input.action_url.as_deref())
            .bind(input.scheduled_at)
            .bind(segment)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Everyone who has ordered this seller's products, biggest spenders first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn seller_customers(
        &self,
        seller_id: SellerId,
    ) -> Result<Vec<CustomerActivity>, RepositoryError> {
        let sql = format!(
            r"
            WITH buyers AS ({SELLER_BUYERS})
            SELECT u.id AS user_id, u.full_name, u.email,
                   b.total_orders, b.total_spent, b.last_order_date
            FROM buyers b
            JOIN shop.user u ON u.id = b.user_id
            WHERE u.role = 'customer'
            ORDER BY b.total_spent DESC, u.id
            "
        );
        let rows = sqlx::query_as::<_, CustomerActivity>(&sql)
            .bind(seller_id)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Undeleted deliveries of a notification, with each recipient's history
    /// with `seller_id`, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recipients(
        &self,
        seller_id: SellerId,
        id: NotificationId,
    ) -> Result<Vec<RecipientRow>, RepositoryError> {
        let sql = format!(
            r"
            WITH buyers AS ({SELLER_BUYERS})
            SELECT un.id, u.id AS user_id, u.full_name, u.email, u.phone, u.avatar,
                   u.is_active, un.is_read, un.received_at, un.read_at,
                   COALESCE(b.total_orders, 0) AS total_orders,
                   COALESCE(b.total_spent, 0) AS total_spent,
                   b.last_order_date
            FROM shop.user_notification un
            JOIN shop.user u ON u.id = un.user_id
            LEFT JOIN buyers b ON b.user_id = un.user_id
            WHERE un.notification_id = $2 AND NOT un.is_deleted
            ORDER BY u.full_name NULLS LAST, un.id
            "
        );
        let rows = sqlx::query_as::<_, RecipientRow>(&sql)
            .bind(seller_id)
            .bind(id)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Active accounts holding any of `roles`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recipient_count(&self, roles: &[Role]) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM shop.user WHERE is_active AND role::text = ANY($1)",
        )
        .bind(role_names(roles))
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Sent/read counts grouped by recipient role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats_by_user_type(
        &self,
        id: NotificationId,
    ) -> Result<Vec<UserTypeStats>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserTypeStats>(
            r"
            SELECT user_type,
                   COUNT(*) AS sent,
                   COUNT(*) FILTER (WHERE is_read) AS read
            FROM shop.user_notification
            WHERE notification_id = $1
            GROUP BY user_type
            ORDER BY user_type
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Drafts whose schedule has come due, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn due_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<NotificationId>, RepositoryError> {
        let ids: Vec<NotificationId> = sqlx::query_scalar(
            r"
            SELECT id FROM shop.notification
            WHERE status = 'draft' AND scheduled_at IS NOT NULL AND scheduled_at <= $1
            ORDER BY scheduled_at, id
            ",
        )
        .bind(now)
        .fetch_all(self.pool)
        .await?;
        Ok(ids)
    }

    /// A user's inbox, newest first, excluding deleted entries.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn inbox(
        &self,
        user_id: UserId,
        unread_only: bool,
        page: PageRequest,
    ) -> Result<(Vec<InboxItem>, i64), RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM shop.user_notification
            WHERE user_id = $1 AND NOT is_deleted AND (NOT $2 OR NOT is_read)
            ",
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, InboxItem>(
            r"
            SELECT un.id, un.notification_id, n.title, n.content, n.type, n.icon,
                   n.action_text, n.action_url, un.is_read, un.read_at, un.received_at
            FROM shop.user_notification un
            JOIN shop.notification n ON n.id = un.notification_id
            WHERE un.user_id = $1 AND NOT un.is_deleted AND (NOT $2 OR NOT un.is_read)
            ORDER BY un.received_at DESC, un.id DESC
            LIMIT $3 OFFSET $4
            ",
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok((rows, total))
    }

    /// Whether the entry is already read, or `None` if the user has no such
    /// (undeleted) entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn inbox_entry_read(
        &self,
        user_id: UserId,
        id: UserNotificationId,
    ) -> Result<Option<bool>, RepositoryError> {
        let is_read: Option<bool> = sqlx::query_scalar(
            "SELECT is_read FROM shop.user_notification WHERE id = $1 AND user_id = $2 AND NOT is_deleted",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(is_read)
    }

    /// Mark an entry read and bump the broadcast's read counter.
    ///
    /// Already-read entries are left alone, so the counter moves once per
    /// recipient.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_read(
        &self,
        user_id: UserId,
        id: UserNotificationId,
    ) -> Result<bool, RepositoryError> {
        let updated: Option<NotificationId> = sqlx::query_scalar(
            r"
            WITH marked AS (
                UPDATE shop.user_notification
                SET is_read = TRUE, read_at = NOW()
                WHERE id = $1 AND user_id = $2 AND NOT is_read AND NOT is_deleted
                RETURNING notification_id
            )
            UPDATE shop.notification n
            SET total_read = n.total_read + 1
            FROM marked
            WHERE n.id = marked.notification_id
            RETURNING n.id
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(updated.is_some())
    }

    /// Hide an entry from the user's inbox.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such entry.
    pub async fn soft_delete(
        &self,
        user_id: UserId,
        id: UserNotificationId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.user_notification
            SET is_deleted = TRUE, deleted_at = NOW()
            WHERE id = $1 AND user_id = $2 AND NOT is_deleted
            ",
        )
        .bind(id)
        .bind(user_id)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn unread_count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM shop.user_notification WHERE user_id = $1 AND NOT is_read AND NOT is_deleted",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }
}

/// Lock a notification row for sending.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock(
    conn: &mut PgConnection,
    id: NotificationId,
) -> Result<Option<Notification>, RepositoryError> {
    let sql = format!("SELECT {NOTIFICATION_COLUMNS} FROM shop.notification WHERE id = $1 FOR UPDATE");
    let row = sqlx::query_as::<_, Notification>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Create inbox entries for every active account holding one of `roles`.
/// Returns how many entries were created.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn deliver(
    conn: &mut PgConnection,
    id: NotificationId,
    roles: &[Role],
) -> Result<u64, RepositoryError> {
    let result = sqlx::query(
        r"
        INSERT INTO shop.user_notification (notification_id, user_id, user_type)
        SELECT $1, u.id, u.role
        FROM shop.user u
        WHERE u.is_active AND u.role::text = ANY($2)
        ON CONFLICT (notification_id, user_id) DO NOTHING
        ",
    )
    .bind(id)
    .bind(role_names(roles))
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Create inbox entries for the active customers in one segment of a
/// seller's buyers. Returns how many entries were created.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn deliver_to_buyers(
    conn: &mut PgConnection,
    id: NotificationId,
    seller_id: SellerId,
    segment: CustomerSegment,
    now: DateTime<Utc>,
) -> Result<u64, RepositoryError> {
    let sql = format!(
        r"
        WITH buyers AS ({SELLER_BUYERS})
        INSERT INTO shop.user_notification (notification_id, user_id, user_type)
        SELECT $2, u.id, u.role
        FROM buyers b
        JOIN shop.user u ON u.id = b.user_id
        WHERE u.is_active AND u.role = 'customer'
          AND CASE $3::shop.customer_segment
                WHEN 'recent' THEN b.last_order_date >= $4
                WHEN 'frequent' THEN b.total_orders >= 3
                WHEN 'vip' THEN b.total_spent >= $5
                ELSE TRUE
              END
        ON CONFLICT (notification_id, user_id) DO NOTHING
        "
    );
    let result = sqlx::query(&sql)
        .bind(seller_id)
        .bind(id)
        .bind(segment)
        .bind(now - Duration::days(RECENT_BUYER_DAYS))
        .bind(VIP_SPEND)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Flip a draft to sent and record its delivery count.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn mark_sent(
    conn: &mut PgConnection,
    id: NotificationId,
    total_sent: i32,
    sent_at: DateTime<Utc>,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE shop.notification SET status = 'sent', sent_at = $2, total_sent = $3 WHERE id = $1",
    )
    .bind(id)
    .bind(sent_at)
    .bind(total_sent)
    .execute(conn)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_names() {
        assert_eq!(
            role_names(&[Role::Customer, Role::Seller]),
            vec!["customer".to_owned(), "seller".to_owned()]
        );
        assert!(role_names(&[]).is_empty());
    }
}

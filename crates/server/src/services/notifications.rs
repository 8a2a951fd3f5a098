//! Admin broadcasts, seller announcements and user inboxes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use shopx_core::pricing::round_money;
use shopx_core::{
    Audience, CustomerSegment, NotificationId, NotificationStatus, PageRequest, Paged, Role,
    SellerId, UserId, UserNotificationId,
};

use super::{ServiceError, ServiceResult};
use crate::db::RepositoryError;
use crate::db::notifications::{self, NotificationRepository};
use crate::models::notification::{
    InboxItem, Notification, NotificationFilter, NotificationInput, NotificationRecipient,
    NotificationStats, RecipientCount, SellerCustomer, SellerNotificationFilter,
    SellerNotificationInput,
};

/// Percentage of deliveries that were read, rounded to two places.
#[must_use]
pub fn read_rate(read: i64, sent: i64) -> Decimal {
    if sent <= 0 {
        return Decimal::ZERO;
    }
    round_money(Decimal::from(read) * Decimal::ONE_HUNDRED / Decimal::from(sent))
}

fn validate_input(input: &NotificationInput) -> ServiceResult<()> {
    let title = input.title.trim().chars().count();
    if title == 0 {
        return Err(ServiceError::InvalidArgument("title is required".to_owned()));
    }
    if title > 200 {
        return Err(ServiceError::InvalidArgument(
            "title must be at most 200 characters".to_owned(),
        ));
    }
    if input.content.trim().is_empty() {
        return Err(ServiceError::InvalidArgument("content is required".to_owned()));
    }
    Ok(())
}

/// Whether a draft may be sent at `now`.
fn check_sendable(notification: &Notification, now: DateTime<Utc>) -> ServiceResult<()> {
    if notification.status == NotificationStatus::Sent {
        return Err(ServiceError::InvalidOperation(
            "notification has already been sent".to_owned(),
        ));
    }
    if let Some(at) = notification.scheduled_at
        && at > now
    {
        return Err(ServiceError::InvalidOperation(format!(
            "notification is scheduled for {at} and will be sent then"
        )));
    }
    Ok(())
}

/// Who a notification reaches when sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Every active account holding one of the roles. Sending to nobody is refused.
    Roles(&'static [Role]),
    /// Active customers in one segment of a seller's buyers. A seller with no
    /// buyers yet may still send; the notification reaches nobody.
    Buyers(SellerId, CustomerSegment),
}

impl Delivery {
    #[must_use]
    pub fn of(notification: &Notification) -> Self {
        match notification.seller_id {
            Some(seller_id) => {
                Self::Buyers(seller_id, notification.customer_segment.unwrap_or_default())
            }
            None => Self::Roles(notification.target_audience.roles()),
        }
    }
}

pub struct NotificationService<'a> {
    pool: &'a PgPool,
    notifications: NotificationRepository<'a>,
}

impl<'a> NotificationService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            notifications: NotificationRepository::new(pool),
        }
    }

    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for an unknown status filter.
    pub async fn list(
        &self,
        filter: &NotificationFilter,
        page: PageRequest,
    ) -> ServiceResult<Paged<Notification>> {
        let status = filter
            .status
            .as_deref()
            .map(str::parse::<NotificationStatus>)
            .transpose()
            .map_err(|e| ServiceError::InvalidArgument(e.to_string()))?;
        let page = page.normalized();
        let (items, total) = self
            .notifications
            .list(status, filter.kind.as_deref(), filter.search.as_deref(), page)
            .await?;
        Ok(Paged::new(items, page, total))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the notification doesn't exist.
    pub async fn get(&self, id: NotificationId) -> ServiceResult<Notification> {
        self.notifications
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("notification", id))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for a blank title or content.
    #[instrument(skip(self, input), fields(audience = %input.target_audience))]
    pub async fn create(
        &self,
        created_by: UserId,
        input: &NotificationInput,
    ) -> ServiceResult<Notification> {
        validate_input(input)?;
        let notification = self.notifications.create(input, created_by).await?;
        tracing::info!(notification_id = %notification.id, "Created notification draft");
        Ok(notification)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::InvalidOperation` once the notification is sent.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: NotificationId,
        input: &NotificationInput,
    ) -> ServiceResult<Notification> {
        validate_input(input)?;
        self.require_draft(id).await?;
        self.notifications
            .update_draft(id, input)
            .await
            .map_err(|e| gone(e, id))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::InvalidOperation` once the notification is sent.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: NotificationId) -> ServiceResult<()> {
        self.require_draft(id).await?;
        self.notifications
            .delete_draft(id)
            .await
            .map_err(|e| gone(e, id))
    }

    /// Deliver a draft to every active account in its audience, or to the
    /// chosen segment of its seller's buyers.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidOperation` if it was already sent, is
    /// scheduled for later, or nobody is in an admin broadcast's audience.
    #[instrument(skip(self, now))]
    pub async fn send(&self, id: NotificationId, now: DateTime<Utc>) -> ServiceResult<Notification> {
        let mut tx = self.pool.begin().await?;

        let notification = notifications::lock(&mut tx, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("notification", id))?;
        check_sendable(&notification, now)?;

        let delivered = match Delivery::of(&notification) {
            Delivery::Roles(roles) => {
                let delivered = notifications::deliver(&mut tx, id, roles).await?;
                if delivered == 0 {
                    return Err(ServiceError::InvalidOperation(format!(
                        "no active recipients for audience '{}'",
                        notification.target_audience
                    )));
                }
                delivered
            }
            Delivery::Buyers(seller_id, segment) => {
                notifications::deliver_to_buyers(&mut tx, id, seller_id, segment, now).await?
            }
        };
        let total_sent = i32::try_from(delivered).unwrap_or(i32::MAX);
        notifications::mark_sent(&mut tx, id, total_sent, now).await?;
        tx.commit().await?;

        tracing::info!(delivered, "Sent notification");
        self.get(id).await
    }

    /// Send every draft whose schedule has come due. Failures are logged and
    /// skipped; returns how many were sent.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the due list can't be read.
    pub async fn send_due(&self, now: DateTime<Utc>) -> ServiceResult<usize> {
        let due = self.notifications.due_scheduled(now).await?;
        let mut sent = 0;
        for id in due {
            match self.send(id, now).await {
                Ok(_) => sent += 1,
                Err(e) => tracing::warn!(notification_id = %id, error = %e, "Scheduled notification not sent"),
            }
        }
        Ok(sent)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn recipient_count(&self, audience: Audience) -> ServiceResult<RecipientCount> {
        let count = self.notifications.recipient_count(audience.roles()).await?;
        Ok(RecipientCount { audience, count })
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the notification doesn't exist.
    pub async fn stats(&self, id: NotificationId) -> ServiceResult<NotificationStats> {
        let notification = self.get(id).await?;
        let by_user_type = self.notifications.stats_by_user_type(id).await?;
        let total_sent = i64::from(notification.total_sent);
        let total_read = i64::from(notification.total_read);
        Ok(NotificationStats {
            notification_id: id,
            total_sent,
            total_read,
            read_rate: read_rate(total_read, total_sent),
            by_user_type,
        })
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn inbox(
        &self,
        user_id: UserId,
        unread_only: bool,
        page: PageRequest,
    ) -> ServiceResult<Paged<InboxItem>> {
        let page = page.normalized();
        let (items, total) = self.notifications.inbox(user_id, unread_only, page).await?;
        Ok(Paged::new(items, page, total))
    }

    /// Mark an inbox entry read. Reading twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user has no such entry.
    #[instrument(skip(self))]
    pub async fn mark_read(&self, user_id: UserId, id: UserNotificationId) -> ServiceResult<()> {
        match self.notifications.inbox_entry_read(user_id, id).await? {
            None => Err(ServiceError::not_found("notification", id)),
            Some(true) => Ok(()),
            Some(false) => {
                self.notifications.mark_read(user_id, id).await?;
                Ok(())
            }
        }
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user has no such entry.
    pub async fn remove_from_inbox(
        &self,
        user_id: UserId,
        id: UserNotificationId,
    ) -> ServiceResult<()> {
        self.notifications
            .soft_delete(user_id, id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ServiceError::not_found("notification", id),
                other => ServiceError::Repository(other),
            })
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn unread_count(&self, user_id: UserId) -> ServiceResult<i64> {
        Ok(self.notifications.unread_count(user_id).await?)
    }


    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn seller_list(
        &self,
        seller_id: SellerId,
        filter: &SellerNotificationFilter,
        page: PageRequest,
    ) -> ServiceResult<Paged<Notification>> {
        let page = page.normalized();
        let (items, total) = self
            .notifications
            .list_for_seller(seller_id, filter.kind.as_deref(), filter.search.as_deref(), page)
            .await?;
        Ok(Paged::new(items, page, total))
    }

    /// Another seller's notification is reported as missing.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` unless this seller wrote it.
    pub async fn seller_get(&self, seller_id: SellerId, id: NotificationId) -> ServiceResult<Notification> {
        self.notifications
            .get_for_seller(seller_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("notification", id))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for a blank title or content.
    #[instrument(skip(self, input), fields(segment = %input.target_customers))]
    pub async fn seller_create(
        &self,
        seller_id: SellerId,
        created_by: UserId,
        input: &SellerNotificationInput,
    ) -> ServiceResult<Notification> {
        let broadcast = input.to_broadcast();
        validate_input(&broadcast)?;
        let notification = self
            .notifications
            .create_for_seller(seller_id, created_by, &broadcast, input.target_customers)
            .await?;
        tracing::info!(notification_id = %notification.id, "Created seller notification draft");
        Ok(notification)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` unless this seller wrote it, and
    /// `ServiceError::InvalidOperation` once it is sent.
    #[instrument(skip(self, input))]
    pub async fn seller_update(
        &self,
        seller_id: SellerId,
        id: NotificationId,
        input: &SellerNotificationInput,
    ) -> ServiceResult<Notification> {
        let broadcast = input.to_broadcast();
        validate_input(&broadcast)?;
        require_unsent(&self.seller_get(seller_id, id).await?)?;
        self.notifications
            .update_seller_draft(seller_id, id, &broadcast, input.target_customers)
            .await
            .map_err(|e| gone(e, id))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` unless this seller wrote it, and
    /// `ServiceError::InvalidOperation` once it is sent.
    #[instrument(skip(self))]
    pub async fn seller_delete(&self, seller_id: SellerId, id: NotificationId) -> ServiceResult<()> {
        require_unsent(&self.seller_get(seller_id, id).await?)?;
        self.notifications
            .delete_draft(id)
            .await
            .map_err(|e| gone(e, id))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` unless this seller wrote it, plus the
    /// errors of [`Self::send`].
    pub async fn seller_send(
        &self,
        seller_id: SellerId,
        id: NotificationId,
        now: DateTime<Utc>,
    ) -> ServiceResult<Notification> {
        self.seller_get(seller_id, id).await?;
        self.send(id, now).await
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` unless this seller wrote it.
    pub async fn seller_stats(
        &self,
        seller_id: SellerId,
        id: NotificationId,
    ) -> ServiceResult<NotificationStats> {
        self.seller_get(seller_id, id).await?;
        self.stats(id).await
    }

    /// The seller's buyers, each with a tier.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn seller_customers(&self, seller_id: SellerId) -> ServiceResult<Vec<SellerCustomer>> {
        let rows = self.notifications.seller_customers(seller_id).await?;
        Ok(rows.into_iter().map(SellerCustomer::from).collect())
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` unless this seller wrote it.
    pub async fn seller_recipients(
        &self,
        seller_id: SellerId,
        id: NotificationId,
    ) -> ServiceResult<Vec<NotificationRecipient>> {
        self.seller_get(seller_id, id).await?;
        let rows = self.notifications.recipients(seller_id, id).await?;
        Ok(rows.into_iter().map(NotificationRecipient::from).collect())
    }

    async fn require_draft(&self, id: NotificationId) -> ServiceResult<()> {
        require_unsent(&self.get(id).await?)
    }
}

fn require_unsent(notification: &Notification) -> ServiceResult<()> {
    if notification.status == NotificationStatus::Sent {
        return Err(ServiceError::InvalidOperation(
            "sent notifications cannot be changed".to_owned(),
        ));
    }
    Ok(())
}

/// A draft that was sent or removed between the check and the write.
fn gone(e: RepositoryError, id: NotificationId) -> ServiceError {
    match e {
        RepositoryError::NotFound => {
            ServiceError::InvalidOperation(format!("notification {id} is no longer a draft"))
        }
        other => ServiceError::Repository(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft(scheduled_at: Option<DateTime<Utc>>) -> Notification {
        Notification {
            id: NotificationId::new(1),
            title: "Sale".to_owned(),
            content: "Everything must go".to_owned(),
            kind: "promo".to_owned(),
            icon: "bell".to_owned(),
            action_text: None,
            action_url: None,
            target_audience: Audience::All,
            status: NotificationStatus::Draft,
            scheduled_at,
            sent_at: None,
            created_at: Utc::now(),
            created_by: None,
            total_sent: 0,
            total_read: 0,
            seller_id: None,
            customer_segment: None,
        }
    }

    #[test]
    fn test_read_rate() {
        assert_eq!(read_rate(0, 0), Decimal::ZERO);
        assert_eq!(read_rate(1, 3), "33.33".parse::<Decimal>().unwrap());
        assert_eq!(read_rate(4, 4), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn test_check_sendable() {
        let now = Utc::now();
        assert!(check_sendable(&draft(None), now).is_ok());
        assert!(check_sendable(&draft(Some(now - Duration::minutes(1))), now).is_ok());
        assert!(matches!(
            check_sendable(&draft(Some(now + Duration::hours(1))), now),
            Err(ServiceError::InvalidOperation(_))
        ));

        let mut sent = draft(None);
        sent.status = NotificationStatus::Sent;
        assert!(check_sendable(&sent, now).is_err());
    }

    #[test]
    fn test_delivery_follows_author() {
        let broadcast = draft(None);
        assert_eq!(
            Delivery::of(&broadcast),
            Delivery::Roles(&[Role::Customer, Role::Seller, Role::Admin])
        );

        let mut from_seller = draft(None);
        from_seller.target_audience = Audience::Customers;
        from_seller.seller_id = Some(SellerId::new(4));
        from_seller.customer_segment = Some(CustomerSegment::Vip);
        assert_eq!(
            Delivery::of(&from_seller),
            Delivery::Buyers(SellerId::new(4), CustomerSegment::Vip)
        );

        from_seller.customer_segment = None;
        assert_eq!(
            Delivery::of(&from_seller),
            Delivery::Buyers(SellerId::new(4), CustomerSegment::All)
        );
    }

    #[test]
    fn test_sent_notification_is_frozen() {
        assert!(require_unsent(&draft(None)).is_ok());
        let mut sent = draft(None);
        sent.status = NotificationStatus::Sent;
        assert!(matches!(
            require_unsent(&sent),
            Err(ServiceError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_seller_input_targets_customers() {
        let input: SellerNotificationInput = serde_json::from_value(serde_json::json!({
            "title": "Restocked",
            "content": "Your favourite mug is back",
        }))
        .unwrap();
        assert_eq!(input.kind, "promotion");
        assert_eq!(input.target_customers, CustomerSegment::All);
        let broadcast = input.to_broadcast();
        assert_eq!(broadcast.target_audience, Audience::Customers);
        assert!(validate_input(&broadcast).is_ok());
    }

    #[test]
    fn test_validate_input() {
        let mut input = NotificationInput {
            title: "Hello".to_owned(),
            content: "World".to_owned(),
            kind: "info".to_owned(),
            icon: "bell".to_owned(),
            action_text: None,
            action_url: None,
            target_audience: Audience::Customers,
            scheduled_at: None,
        };
        assert!(validate_input(&input).is_ok());
        input.content = "  ".to_owned();
        assert!(validate_input(&input).is_err());
        input.content = "ok".to_owned();
        input.title = String::new();
        assert!(validate_input(&input).is_err());
    }
}

//! Contact messages from users to the admins.

use sqlx::PgPool;
use tracing::instrument;

use shopx_core::{ContactId, ContactStatus, PageRequest, Paged, UserId};

use super::{ServiceError, ServiceResult};
use crate::db::RepositoryError;
use crate::db::contacts::ContactRepository;
use crate::models::contact::{Contact, ContactFilter};

/// Longest accepted message, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Parse the requested status; only closing a message is allowed.
///
/// # Errors
///
/// Returns `ServiceError::InvalidArgument` for anything but `closed`.
pub fn closing_status(value: &str) -> ServiceResult<ContactStatus> {
    match value.parse::<ContactStatus>() {
        Ok(ContactStatus::Closed) => Ok(ContactStatus::Closed),
        Ok(other) => Err(ServiceError::InvalidArgument(format!(
            "status can only be changed to 'closed', not '{other}'"
        ))),
        Err(e) => Err(ServiceError::InvalidArgument(e.to_string())),
    }
}

pub struct ContactService<'a> {
    contacts: ContactRepository<'a>,
}

impl<'a> ContactService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            contacts: ContactRepository::new(pool),
        }
    }

    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for an empty or overlong message.
    #[instrument(skip(self, message))]
    pub async fn create(&self, user_id: UserId, message: &str) -> ServiceResult<Contact> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ServiceError::InvalidArgument("message is required".to_owned()));
        }
        if message.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(ServiceError::InvalidArgument(format!(
                "message must be at most {MAX_MESSAGE_LENGTH} characters"
            )));
        }
        let contact = self.contacts.create(user_id, message).await?;
        tracing::info!(contact_id = %contact.id, "Received contact message");
        Ok(contact)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for an unknown status filter.
    pub async fn list(&self, filter: &ContactFilter, page: PageRequest) -> ServiceResult<Paged<Contact>> {
        let status = filter
            .status
            .as_deref()
            .map(str::parse::<ContactStatus>)
            .transpose()
            .map_err(|e| ServiceError::InvalidArgument(e.to_string()))?;
        let page = page.normalized();
        let (items, total) = self
            .contacts
            .list(status, filter.search.as_deref(), page)
            .await?;
        Ok(Paged::new(items, page, total))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the message doesn't exist.
    pub async fn get(&self, id: ContactId) -> ServiceResult<Contact> {
        self.contacts
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("contact", id))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` unless the new status is `closed`.
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: ContactId, status: &str) -> ServiceResult<Contact> {
        let status = closing_status(status)?;
        self.contacts.set_status(id, status).await.map_err(|e| not_found(e, id))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the message doesn't exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ContactId) -> ServiceResult<()> {
        self.contacts.delete(id).await.map_err(|e| not_found(e, id))
    }
}

fn not_found(e: RepositoryError, id: ContactId) -> ServiceError {
    match e {
        RepositoryError::NotFound => ServiceError::not_found("contact", id),
        other => ServiceError::Repository(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_closing_is_accepted() {
        assert!(matches!(closing_status("closed"), Ok(ContactStatus::Closed)));
        assert!(matches!(closing_status(" Closed "), Ok(ContactStatus::Closed)));
        assert!(matches!(
            closing_status("responded"),
            Err(ServiceError::InvalidArgument(_))
        ));
        assert!(closing_status("new").is_err());
        assert!(closing_status("archived").is_err());
    }
}

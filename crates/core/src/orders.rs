//! Order lifecycle rules.
//!
//! Pure functions deciding who may move an order between statuses, whether
//! a move returns stock, and how the refund window is measured. The server
//! applies them inside the transaction that performs the update.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::OrderStatus;

/// Days after delivery during which a customer can ask for a refund.
pub const REFUND_WINDOW_DAYS: i64 = 3;

/// Who is asking for a status change, and whether they are party to the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusActor {
    Admin,
    /// A seller; `owns_order` is true when the order contains one of their products.
    Seller { owns_order: bool },
    /// A customer; `owns_order` is true when they placed the order.
    Customer { owns_order: bool },
}

/// Why a status change was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The actor may not make this change at all.
    #[error("{0}")]
    Forbidden(String),
    /// The change is not valid from the order's current status.
    #[error("{0}")]
    InvalidTransition(String),
}

/// Check that `actor` may move an order from `from` to `to`.
///
/// `order_date` is the order's date column, which is re-stamped on delivery
/// and therefore marks the start of the refund window.
///
/// # Errors
///
/// Returns [`TransitionError::Forbidden`] when the actor lacks permission and
/// [`TransitionError::InvalidTransition`] when the lifecycle does not allow the move.
pub fn check_transition(
    actor: StatusActor,
    from: OrderStatus,
    to: OrderStatus,
    order_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), TransitionError> {
    check_permission(actor, from, to)?;

    if from == to {
        return Err(TransitionError::InvalidTransition(format!(
            "order is already {from}"
        )));
    }

    if from.is_terminal() {
        return Err(TransitionError::InvalidTransition(format!(
            "order is {from} and can no longer change status"
        )));
    }

    let in_window = now - order_date <= Duration::days(REFUND_WINDOW_DAYS);

    match from {
        OrderStatus::Delivered => {
            if to != OrderStatus::RefundRequested {
                return Err(TransitionError::InvalidTransition(
                    "a delivered order can only move to refund_requested".to_owned(),
                ));
            }
            if !in_window {
                return Err(TransitionError::InvalidTransition(format!(
                    "the {REFUND_WINDOW_DAYS}-day refund window has closed"
                )));
            }
        }
        OrderStatus::RefundRequested => {
            let allowed = if in_window {
                matches!(to, OrderStatus::Refunded | OrderStatus::RefundRejected)
            } else {
                to == OrderStatus::Refunded
            };
            if !allowed {
                return Err(TransitionError::InvalidTransition(
                    "order has an open refund request".to_owned(),
                ));
            }
        }
        _ => {}
    }

    Ok(())
}

fn check_permission(
    actor: StatusActor,
    from: OrderStatus,
    to: OrderStatus,
) -> Result<(), TransitionError> {
    match actor {
        StatusActor::Admin => Ok(()),
        StatusActor::Seller { owns_order: false } | StatusActor::Customer { owns_order: false } => {
            Err(TransitionError::Forbidden(
                "you are not allowed to update this order".to_owned(),
            ))
        }
        StatusActor::Seller { owns_order: true } => {
            let allowed = match to {
                OrderStatus::Processing | OrderStatus::Shipping | OrderStatus::Delivered => true,
                OrderStatus::Cancelled => from == OrderStatus::PendingConfirmation,
                OrderStatus::RefundRejected => from == OrderStatus::RefundRequested,
                _ => false,
            };
            if allowed {
                Ok(())
            } else {
                Err(TransitionError::Forbidden(format!(
                    "sellers cannot move an order from {from} to {to}"
                )))
            }
        }
        StatusActor::Customer { owns_order: true } => {
            let allowed = matches!(
                (from, to),
                (OrderStatus::Delivered, OrderStatus::RefundRequested)
                    | (OrderStatus::PendingConfirmation, OrderStatus::Cancelled)
            );
            if allowed {
                Ok(())
            } else {
                Err(TransitionError::Forbidden(format!(
                    "customers cannot move an order from {from} to {to}"
                )))
            }
        }
    }
}

/// Whether moving from `from` to `to` puts the ordered quantities back in stock.
#[must_use]
pub const fn restocks(from: OrderStatus, to: OrderStatus) -> bool {
    matches!(
        (from, to),
        (
            OrderStatus::PendingConfirmation | OrderStatus::Processing,
            OrderStatus::Cancelled
        ) | (OrderStatus::RefundRequested, OrderStatus::Refunded)
    )
}

/// Whether a refund may be requested right now.
#[must_use]
pub fn can_request_refund(status: OrderStatus, order_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    status == OrderStatus::Delivered && now - order_date <= Duration::days(REFUND_WINDOW_DAYS)
}

/// Whole days (rounded up) left in the refund window; zero when closed or not delivered.
#[must_use]
pub fn days_left_for_refund(status: OrderStatus, order_date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    if status != OrderStatus::Delivered {
        return 0;
    }
    let remaining = order_date + Duration::days(REFUND_WINDOW_DAYS) - now;
    let hours = remaining.num_hours();
    if hours <= 0 { 0 } else { (hours + 23) / 24 }
}

/// Delivered orders whose `order_date` is at or before this instant are auto-completed.
#[must_use]
pub fn auto_complete_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(REFUND_WINDOW_DAYS)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use OrderStatus::*;

    fn now() -> DateTime<Utc> {
        "2026-03-10T12:00:00Z".parse().unwrap()
    }

    fn days_ago(days: i64) -> DateTime<Utc> {
        now() - Duration::days(days)
    }

    const SELLER: StatusActor = StatusActor::Seller { owns_order: true };
    const CUSTOMER: StatusActor = StatusActor::Customer { owns_order: true };

    #[test]
    fn test_admin_can_move_forward() {
        assert!(check_transition(StatusActor::Admin, Processing, Shipping, now(), now()).is_ok());
        assert!(check_transition(StatusActor::Admin, Shipping, Cancelled, now(), now()).is_ok());
    }

    #[test]
    fn test_strangers_are_forbidden() {
        let err = check_transition(
            StatusActor::Seller { owns_order: false },
            Processing,
            Shipping,
            now(),
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::Forbidden(_)));

        let err = check_transition(
            StatusActor::Customer { owns_order: false },
            Delivered,
            RefundRequested,
            now(),
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::Forbidden(_)));
    }

    #[test]
    fn test_seller_can_cancel_only_unconfirmed() {
        assert!(check_transition(SELLER, PendingConfirmation, Cancelled, now(), now()).is_ok());
        assert!(matches!(
            check_transition(SELLER, Processing, Cancelled, now(), now()),
            Err(TransitionError::Forbidden(_))
        ));
    }

    #[test]
    fn test_seller_fulfilment_steps() {
        assert!(check_transition(SELLER, Processing, Shipping, now(), now()).is_ok());
        assert!(check_transition(SELLER, Shipping, Delivered, now(), now()).is_ok());
        assert!(matches!(
            check_transition(SELLER, Processing, Completed, now(), now()),
            Err(TransitionError::Forbidden(_))
        ));
    }

    #[test]
    fn test_delivered_only_allows_refund_request_in_window() {
        assert!(check_transition(CUSTOMER, Delivered, RefundRequested, days_ago(2), now()).is_ok());
        assert!(matches!(
            check_transition(CUSTOMER, Delivered, RefundRequested, days_ago(4), now()),
            Err(TransitionError::InvalidTransition(_))
        ));
        assert!(matches!(
            check_transition(StatusActor::Admin, Delivered, Shipping, now(), now()),
            Err(TransitionError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_terminal_statuses() {
        for from in [Cancelled, Refunded, Completed] {
            assert!(matches!(
                check_transition(StatusActor::Admin, from, Processing, now(), now()),
                Err(TransitionError::InvalidTransition(_))
            ));
        }
    }

    #[test]
    fn test_admin_can_move_rejected_refund() {
        assert!(check_transition(StatusActor::Admin, RefundRejected, Completed, now(), now()).is_ok());
        assert!(!RefundRejected.is_terminal());
    }

    #[test]
    fn test_stale_refund_request_can_only_be_refunded() {
        let admin = StatusActor::Admin;
        assert!(check_transition(admin, RefundRequested, Refunded, days_ago(5), now()).is_ok());
        assert!(matches!(
            check_transition(admin, RefundRequested, RefundRejected, days_ago(5), now()),
            Err(TransitionError::InvalidTransition(_))
        ));
        assert!(check_transition(SELLER, RefundRequested, RefundRejected, days_ago(1), now()).is_ok());
    }

    #[test]
    fn test_only_admin_can_refund() {
        for when in [days_ago(1), days_ago(5)] {
            assert!(matches!(
                check_transition(SELLER, RefundRequested, Refunded, when, now()),
                Err(TransitionError::Forbidden(_))
            ));
        }
        assert!(matches!(
            check_transition(CUSTOMER, RefundRequested, Refunded, days_ago(1), now()),
            Err(TransitionError::Forbidden(_))
        ));
        assert!(check_transition(StatusActor::Admin, RefundRequested, Refunded, days_ago(1), now()).is_ok());
    }

    #[test]
    fn test_same_status_is_rejected() {
        assert!(matches!(
            check_transition(StatusActor::Admin, Shipping, Shipping, now(), now()),
            Err(TransitionError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_restocks() {
        assert!(restocks(PendingConfirmation, Cancelled));
        assert!(restocks(Processing, Cancelled));
        assert!(restocks(RefundRequested, Refunded));
        assert!(!restocks(Shipping, Cancelled));
        assert!(!restocks(Delivered, RefundRequested));
    }

    #[test]
    fn test_refund_window_helpers() {
        assert!(can_request_refund(Delivered, days_ago(1), now()));
        assert!(!can_request_refund(Delivered, days_ago(4), now()));
        assert!(!can_request_refund(Shipping, now(), now()));

        assert_eq!(days_left_for_refund(Delivered, now(), now()), 3);
        assert_eq!(
            days_left_for_refund(Delivered, now() - Duration::hours(30), now()),
            2
        );
        assert_eq!(days_left_for_refund(Delivered, days_ago(10), now()), 0);
        assert_eq!(days_left_for_refund(Processing, now(), now()), 0);
    }

    #[test]
    fn test_auto_complete_cutoff() {
        assert_eq!(auto_complete_cutoff(now()), days_ago(3));
    }
}

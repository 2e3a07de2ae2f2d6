use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use tracing::warn;

use crate::{
    entities::order::{ActiveModel as OrderActiveModel, OrderStatus},
    errors::ServiceError,
};

/// Statuses reachable from `from`; terminal statuses allow nothing
pub fn allowed_transitions(from: OrderStatus) -> &'static [OrderStatus] {
    use OrderStatus::*;
    match from {
        Draft => &[Pending, Cancelled],
        Pending => &[Approved, OnHold, Cancelled],
        Approved => &[Ordered, Cancelled],
        Ordered => &[Received, PartiallyReceived, Cancelled],
        OnHold => &[Pending, Cancelled],
        PartiallyReceived => &[Received],
        Received | Cancelled => &[],
    }
}

/// Validates if a status transition is allowed
pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

/// Rejects transitions missing from the allow-list
pub fn ensure_transition(from: OrderStatus, to: OrderStatus) -> Result<(), ServiceError> {
    if is_valid_transition(from, to) {
        Ok(())
    } else {
        metrics::counter!("store_orders.status_transitions.rejected", 1);
        warn!(from = %from, to = %to, "Rejected order status transition");
        Err(ServiceError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Validates `from -> to` and writes the new status onto `active`,
/// stamping `received_date` for receipt statuses and `updated_at` always.
pub fn apply_transition(
    active: &mut OrderActiveModel,
    from: OrderStatus,
    to: OrderStatus,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    ensure_transition(from, to)?;

    active.status = Set(to);
    if to.marks_receipt() {
        active.received_date = Set(Some(now));
    }
    active.updated_at = Set(Some(now));
    Ok(())
}

/// Merges status-update notes into the order's existing notes
pub fn append_status_note(
    existing: Option<&str>,
    note: &str,
    now: DateTime<Utc>,
) -> String {
    match existing {
        Some(current) if !current.is_empty() => format!(
            "{}\n[{}] Status update: {}",
            current,
            now.format("%Y-%m-%d %H:%M"),
            note
        ),
        _ => note.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::WireEnum;
    use assert_matches::assert_matches;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use rstest::rstest;
    use sea_orm::{ActiveValue, Iterable};

    #[rstest]
    #[case(OrderStatus::Draft, OrderStatus::Pending, true)]
    #[case(OrderStatus::Draft, OrderStatus::Cancelled, true)]
    #[case(OrderStatus::Draft, OrderStatus::Approved, false)]
    #[case(OrderStatus::Pending, OrderStatus::Approved, true)]
    #[case(OrderStatus::Pending, OrderStatus::OnHold, true)]
    #[case(OrderStatus::Pending, OrderStatus::Ordered, false)]
    #[case(OrderStatus::Approved, OrderStatus::Ordered, true)]
    #[case(OrderStatus::Ordered, OrderStatus::Received, true)]
    #[case(OrderStatus::Ordered, OrderStatus::PartiallyReceived, true)]
    #[case(OrderStatus::Ordered, OrderStatus::Pending, false)]
    #[case(OrderStatus::OnHold, OrderStatus::Pending, true)]
    #[case(OrderStatus::OnHold, OrderStatus::Approved, false)]
    #[case(OrderStatus::PartiallyReceived, OrderStatus::Received, true)]
    #[case(OrderStatus::PartiallyReceived, OrderStatus::Cancelled, false)]
    #[case(OrderStatus::Received, OrderStatus::Pending, false)]
    #[case(OrderStatus::Cancelled, OrderStatus::Draft, false)]
    #[case(OrderStatus::Draft, OrderStatus::Draft, false)]
    fn transition_table(#[case] from: OrderStatus, #[case] to: OrderStatus, #[case] ok: bool) {
        assert_eq!(is_valid_transition(from, to), ok);
    }

    #[test]
    fn terminal_statuses_reject_everything() {
        for to in OrderStatus::iter() {
            assert!(!is_valid_transition(OrderStatus::Received, to));
            assert!(!is_valid_transition(OrderStatus::Cancelled, to));
        }
    }

    #[test]
    fn invalid_transition_error_names_both_statuses() {
        let err = ensure_transition(OrderStatus::Cancelled, OrderStatus::Pending).unwrap_err();
        assert_matches!(
            err,
            ServiceError::InvalidTransition { ref from, ref to } if from == "Cancelled" && to == "Pending"
        );
    }

    #[test]
    fn receipt_statuses_stamp_received_date() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let mut active = OrderActiveModel::default();

        apply_transition(&mut active, OrderStatus::Ordered, OrderStatus::Received, now).unwrap();
        assert_eq!(active.status, ActiveValue::Set(OrderStatus::Received));
        assert_eq!(active.received_date, ActiveValue::Set(Some(now)));
        assert_eq!(active.updated_at, ActiveValue::Set(Some(now)));
    }

    #[test]
    fn non_receipt_statuses_leave_received_date_alone() {
        let now = Utc::now();
        let mut active = OrderActiveModel::default();

        apply_transition(&mut active, OrderStatus::Pending, OrderStatus::Approved, now).unwrap();
        assert_eq!(active.received_date, ActiveValue::NotSet);
        assert_eq!(active.updated_at, ActiveValue::Set(Some(now)));
    }

    #[test]
    fn rejected_transition_does_not_touch_model() {
        let mut active = OrderActiveModel::default();
        let result = apply_transition(
            &mut active,
            OrderStatus::Cancelled,
            OrderStatus::Pending,
            Utc::now(),
        );
        assert!(result.is_err());
        assert_eq!(active.status, ActiveValue::NotSet);
        assert_eq!(active.updated_at, ActiveValue::NotSet);
    }

    #[test]
    fn first_note_is_stored_verbatim() {
        let now = Utc::now();
        assert_eq!(append_status_note(None, "Approved by Sam", now), "Approved by Sam");
        assert_eq!(append_status_note(Some(""), "x", now), "x");
    }

    #[test]
    fn later_notes_are_appended_with_timestamp() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 14, 5, 59).unwrap();
        assert_eq!(
            append_status_note(Some("Initial"), "Shipped early", now),
            "Initial\n[2024-01-15 14:05] Status update: Shipped early"
        );
    }

    fn status() -> impl Strategy<Value = OrderStatus> {
        (0i64..8).prop_map(|ordinal| OrderStatus::from_ordinal(ordinal).unwrap())
    }

    proptest! {
        #[test]
        fn no_self_transitions(s in status()) {
            prop_assert!(!is_valid_transition(s, s));
        }

        #[test]
        fn only_terminal_statuses_have_no_exits(s in status()) {
            prop_assert_eq!(allowed_transitions(s).is_empty(), s.is_terminal());
        }
    }
}

//! Received-lines badge, panel and confirmation.

#![allow(clippy::unwrap_used)]

use inbound_core::Origin;
use inbound_integration_tests::{Call, FakeErp, Failure, open_line, received_line, screen};
use inbound_receiving::NotificationLevel;
use inbound_receiving::engine::{Focus, Picker};

fn confirms(erp: &FakeErp) -> usize {
    erp.count_calls(|c| matches!(c, Call::ConfirmReceipt(_)))
}

#[tokio::test]
async fn test_order_with_only_received_lines_locks_origin() {
    let erp = FakeErp::new().with_received(
        "500123",
        Origin::Sales,
        [
            received_line("500123", 10),
            received_line("500123", 20),
            received_line("500123", 30),
        ],
    );
    let screen = screen(&erp);

    let notification = screen.paste("500123").await;
    assert!(notification.is_none(), "{notification:?}");

    let session = screen.snapshot().await;
    assert_eq!(session.origin, Some(Origin::Sales));
    assert!(session.origin_locked);
    assert_eq!(session.received.badge(), Some(3));
    assert!(!session.received.open);
    assert!(matches!(session.picker, Picker::Hidden));
    assert!(session.selected.is_none());
    assert_eq!(session.focus, Focus::Order);

    // Purchase is probed first and has nothing.
    let probes: Vec<Origin> = erp
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::LookupReceivedLines(_, origin) => Some(origin),
            _ => None,
        })
        .collect();
    assert_eq!(probes, vec![Origin::Purchase, Origin::Sales]);
}

#[tokio::test]
async fn test_locked_origin_cannot_be_changed() {
    let erp = FakeErp::new().with_received("500124", Origin::Sales, [received_line("500124", 10)]);
    let screen = screen(&erp);

    screen.paste("500124").await;
    let notification = screen.choose_origin(Origin::Purchase).await.unwrap();
    assert_eq!(notification.level, NotificationLevel::Warning);
    assert_eq!(screen.snapshot().await.origin, Some(Origin::Sales));
}

#[tokio::test]
async fn test_confirm_all_stops_at_first_failure() {
    let erp = FakeErp::new().with_received(
        "600",
        Origin::Transfer,
        (1..=4).map(|i| received_line("600", i * 10)),
    );
    erp.fail_confirm_call(2, Failure::rejected("Receipt locked"));
    let screen = screen(&erp);

    screen.paste("600").await;
    assert!(screen.open_received_lines().await.is_none());
    assert!(screen.snapshot().await.received.open);

    let notification = screen.confirm_all_received().await.unwrap();
    assert_eq!(notification.level, NotificationLevel::Error);
    assert_eq!(notification.message, "Confirmed 1/4 received lines");
    assert!(notification.details.unwrap().contains("Receipt locked"));
    assert_eq!(confirms(&erp), 2);

    let session = screen.snapshot().await;
    assert_eq!(session.received.badge(), Some(3));
    assert_eq!(session.received.lines()[0].position, 20);
    assert!(session.received.open);
    assert_eq!(erp.received_count("600", Origin::Transfer), 3);
}

#[tokio::test]
async fn test_confirm_all_empties_panel() {
    let erp = FakeErp::new().with_received(
        "610",
        Origin::Production,
        [received_line("610", 10), received_line("610", 20)],
    );
    let screen = screen(&erp);

    screen.paste("610").await;
    screen.open_received_lines().await;
    let notification = screen.confirm_all_received().await.unwrap();

    assert_eq!(notification.level, NotificationLevel::Success);
    assert_eq!(notification.message, "Confirmed 2/2 received lines");
    let session = screen.snapshot().await;
    assert_eq!(session.received.badge(), None);
    assert!(!session.received.open);
}

#[tokio::test]
async fn test_confirming_last_line_closes_panel() {
    let erp = FakeErp::new().with_received("620", Origin::Sales, [received_line("620", 10)]);
    let screen = screen(&erp);

    screen.paste("620").await;
    screen.open_received_lines().await;
    let notification = screen.confirm_received(0).await.unwrap();

    assert_eq!(notification.level, NotificationLevel::Success);
    assert_eq!(notification.message, "Confirmed line 10");
    let session = screen.snapshot().await;
    assert!(!session.received.open);
    assert_eq!(session.received.count(), Some(0));

    let confirm = erp
        .calls()
        .into_iter()
        .find_map(|c| match c {
            Call::ConfirmReceipt(r) => Some(r),
            _ => None,
        })
        .unwrap();
    assert_eq!(confirm.transaction_id.as_deref(), Some("TX-620-10"));
    assert_eq!(confirm.etag.as_deref(), Some("etag-10"));
}

#[tokio::test]
async fn test_unknown_panel_entry_is_refused() {
    let erp = FakeErp::new().with_received("630", Origin::Sales, [received_line("630", 10)]);
    let screen = screen(&erp);

    screen.paste("630").await;
    let notification = screen.confirm_received(5).await.unwrap();
    assert_eq!(notification.level, NotificationLevel::Warning);
    assert_eq!(confirms(&erp), 0);
}

#[tokio::test]
async fn test_panel_stays_closed_without_received_lines() {
    let erp = FakeErp::new().with_open_lines([open_line("640", 10, Origin::Sales, "ITM-1")]);
    let screen = screen(&erp);

    screen.paste("640/10").await;
    let notification = screen.open_received_lines().await.unwrap();
    assert_eq!(notification.level, NotificationLevel::Info);
    assert!(!screen.snapshot().await.received.open);
}

#[tokio::test]
async fn test_submit_refreshes_known_received_lines() {
    let erp = FakeErp::new()
        .with_open_lines([open_line("650", 10, Origin::Sales, "ITM-1")])
        .with_received("650", Origin::Sales, [received_line("650", 20)]);
    let screen = screen(&erp);

    screen.paste("650/10").await;
    screen.open_received_lines().await;
    screen.close_received_lines().await;
    assert_eq!(screen.snapshot().await.received.badge(), Some(1));

    screen.edit_delivery_note("DN-9").await;
    screen.submit().await;

    let session = screen.snapshot().await;
    assert_eq!(session.received.badge(), Some(2));
    assert!(!session.received.open);
}

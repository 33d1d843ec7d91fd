//! Order and line resolution through the receiving screen.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use inbound_core::{ItemCode, OrderNumber, Origin};
use inbound_integration_tests::{Call, FakeErp, lot, open_line, screen};
use inbound_receiving::NotificationLevel;
use inbound_receiving::engine::{Focus, Picker};
use rust_decimal::Decimal;

fn lookups(erp: &FakeErp) -> usize {
    erp.count_calls(|c| matches!(c, Call::LookupOrderLines(_)))
}

#[tokio::test]
async fn test_scanned_purchase_line_autofills() {
    let erp = FakeErp::new().with_open_lines([open_line("200000066", 10, Origin::Purchase, "ITM-1")]);
    let screen = screen(&erp);

    let notification = screen.paste("200000066/10").await;
    assert!(notification.is_none(), "{notification:?}");

    let session = screen.snapshot().await;
    assert_eq!(session.order, "200000066");
    assert_eq!(session.line, "10");
    assert_eq!(session.origin, Some(Origin::Purchase));
    assert!(session.origin_locked);
    assert_eq!(session.item(), Some(&ItemCode::new("ITM-1")));
    assert_eq!(session.unit(), Some("pcs"));
    assert_eq!(session.to_be_received_qty(), Some(Decimal::new(12, 0)));
    assert_eq!(session.quantity, "12");
    assert!(!session.lot_visible());
    assert_eq!(session.focus, Focus::DeliveryNote);

    let calls = erp.calls();
    match &calls[0] {
        Call::LookupOrderLines(query) => {
            assert_eq!(query.order, OrderNumber::new("200000066"));
            assert_eq!(query.line, Some(10));
            assert_eq!(query.origin, None);
        }
        other => panic!("unexpected first call: {other:?}"),
    }
}

#[tokio::test]
async fn test_scanned_tracked_line_focuses_lot() {
    let erp = FakeErp::new()
        .with_open_lines([open_line("300", 20, Origin::Transfer, "ITM-LOT")])
        .with_tracked_item("ITM-LOT");
    let screen = screen(&erp);

    screen.paste("300/20").await;

    let session = screen.snapshot().await;
    assert!(session.lot_visible());
    assert_eq!(session.focus, Focus::Lot);
}

#[tokio::test]
async fn test_order_with_several_lines_opens_picker() {
    let erp = FakeErp::new().with_open_lines([
        open_line("400", 30, Origin::Sales, "ITM-3"),
        open_line("400", 10, Origin::Sales, "ITM-1"),
    ]);
    let screen = screen(&erp);

    screen.edit_order("400").await;
    screen.resolve().await;

    let session = screen.snapshot().await;
    assert_eq!(session.origin, Some(Origin::Sales));
    assert!(session.selected.is_none());
    match &session.picker {
        Picker::Lines { lines, open } => {
            assert!(*open);
            let numbers: Vec<u32> = lines.iter().map(|l| l.line).collect();
            assert_eq!(numbers, vec![10, 30]);
        }
        other => panic!("unexpected picker: {other:?}"),
    }

    screen.choose_line(None, 30).await;
    let session = screen.snapshot().await;
    assert_eq!(session.line, "30");
    assert!(!session.picker.is_open());
    assert_eq!(session.focus, Focus::DeliveryNote);
}

#[tokio::test]
async fn test_multiple_origins_are_grouped() {
    let erp = FakeErp::new().with_open_lines([
        open_line("500", 10, Origin::Purchase, "ITM-1"),
        open_line("500", 20, Origin::Production, "ITM-2"),
        open_line("500", 30, Origin::Production, "ITM-3"),
    ]);
    let screen = screen(&erp);

    screen.edit_order("500").await;
    screen.resolve().await;

    let session = screen.snapshot().await;
    assert!(session.origin.is_none());
    assert!(session.origin_choice_required);
    assert!(session.missing_fields().contains(&"origin"));
    assert!(session.picker.offers_origins());
    assert_eq!(session.picker.lines_for(Origin::Production).map(<[_]>::len), Some(2));
    assert_eq!(session.picker.lines_for(Origin::Purchase).map(<[_]>::len), Some(1));

    screen.choose_origin(Origin::Purchase).await;
    let session = screen.snapshot().await;
    assert_eq!(session.origin, Some(Origin::Purchase));
    assert_eq!(session.line, "10");
    assert!(session.selected.is_some());
}

#[tokio::test]
async fn test_origin_choice_records_resolved_key() {
    let erp = FakeErp::new().with_open_lines([
        open_line("500", 10, Origin::Purchase, "ITM-1"),
        open_line("500", 20, Origin::Production, "ITM-2"),
    ]);
    let screen = screen(&erp);

    screen.edit_order("500").await;
    screen.resolve().await;
    screen.choose_origin(Origin::Purchase).await;

    let session = screen.snapshot().await;
    assert!(!session.needs_lookup());
    let key = session.last_resolved_key.unwrap();
    assert_eq!(key.order, "500");
    assert_eq!(key.line, "10");
    assert_eq!(key.origin, Some(Origin::Purchase));

    // The chosen triple is not looked up again.
    screen.resolve().await;
    assert_eq!(lookups(&erp), 1);

    // Editing the line forgets it, even back to the same value.
    screen.edit_line("10").await;
    let session = screen.snapshot().await;
    assert!(session.last_resolved_key.is_none());
    assert!(session.needs_lookup());
}

#[tokio::test]
async fn test_unknown_order_reports_not_found() {
    let erp = FakeErp::new();
    let screen = screen(&erp);

    let notification = screen.paste("999/1").await.unwrap();
    assert_eq!(notification.level, NotificationLevel::Warning);
    assert!(notification.message.contains("order 999 line 1"));
    assert_eq!(screen.snapshot().await.focus, Focus::Order);

    // Every origin was probed for received lines.
    let probes = erp.count_calls(|c| matches!(c, Call::LookupReceivedLines(..)));
    assert_eq!(probes, Origin::ALL.len());
}

#[tokio::test]
async fn test_non_numeric_line_is_refused() {
    let erp = FakeErp::new();
    let screen = screen(&erp);

    screen.edit_order("600").await;
    screen.edit_line("ten").await;
    let notification = screen.resolve().await.unwrap();
    assert_eq!(notification.level, NotificationLevel::Warning);
    assert_eq!(lookups(&erp), 0);
}

#[tokio::test]
async fn test_same_triple_is_not_resolved_twice() {
    let erp = FakeErp::new().with_open_lines([open_line("700", 10, Origin::Purchase, "ITM-1")]);
    let screen = screen(&erp);

    screen.paste("700/10").await;
    screen.resolve().await;
    screen.resolve().await;
    assert_eq!(lookups(&erp), 1);

    screen.edit_line("10").await;
    screen.resolve().await;
    assert_eq!(lookups(&erp), 2);
}

#[tokio::test]
async fn test_result_for_superseded_order_is_discarded() {
    let erp = FakeErp::new().with_open_lines([open_line("800", 10, Origin::Purchase, "ITM-1")]);
    let screen = Arc::new(screen(&erp));
    erp.hold_order_lookups();

    let in_flight = {
        let screen = Arc::clone(&screen);
        tokio::spawn(async move { screen.paste("800/10").await })
    };
    erp.order_lookup_started().await;

    // Same value as before: still an edit.
    screen.edit_order("800").await;
    erp.release_order_lookup();
    let notification = in_flight.await.unwrap();

    assert!(notification.is_none());
    let session = screen.snapshot().await;
    assert_eq!(session.order, "800");
    assert!(session.selected.is_none());
    assert!(session.origin.is_none());
    assert!(matches!(session.picker, Picker::Hidden));
    assert!(session.needs_lookup());
}

#[tokio::test]
async fn test_lot_resolution_for_superseded_line_is_discarded() {
    let erp = FakeErp::new()
        .with_open_lines([
            open_line("810", 10, Origin::Transfer, "ITM-LOT"),
            open_line("810", 20, Origin::Transfer, "ITM-2"),
        ])
        .with_tracked_item("ITM-LOT");
    let screen = Arc::new(screen(&erp));
    erp.hold_lot_lookups();

    let in_flight = {
        let screen = Arc::clone(&screen);
        tokio::spawn(async move { screen.paste("810/10").await })
    };
    erp.lot_lookup_started().await;

    screen.edit_line("20").await;
    erp.release_lot_lookup();
    in_flight.await.unwrap();

    let session = screen.snapshot().await;
    assert_eq!(session.line, "20");
    assert!(session.selected.is_none());
    assert!(session.lots.requirement.is_none());
}

#[tokio::test]
async fn test_lot_resolution_for_previously_chosen_line_is_discarded() {
    let erp = FakeErp::new()
        .with_open_lines([
            open_line("4711", 10, Origin::Transfer, "TRK"),
            open_line("4711", 20, Origin::Transfer, "PLAIN"),
        ])
        .with_tracked_item("TRK")
        .with_lot("TRK", Origin::Transfer, None, lot("L-1", None));
    let screen = Arc::new(screen(&erp));

    screen.edit_order("4711").await;
    screen.resolve().await;
    erp.hold_lot_lookups();

    let in_flight = {
        let screen = Arc::clone(&screen);
        tokio::spawn(async move { screen.choose_line(None, 10).await })
    };
    erp.lot_lookup_started().await;

    assert!(screen.choose_line(None, 20).await.is_none());
    erp.release_lot_lookup();
    assert!(in_flight.await.unwrap().is_none());

    let session = screen.snapshot().await;
    assert_eq!(session.line, "20");
    assert_eq!(session.item(), Some(&ItemCode::new("PLAIN")));
    assert!(!session.lot_visible());
    assert!(!session.lots.tracked());
    assert_eq!(session.lots.existing.count, 0);
    assert_eq!(session.focus, Focus::DeliveryNote);
    assert!(!session.missing_fields().contains(&"lot"));
}

#[tokio::test]
async fn test_cleared_line_is_not_refilled() {
    let erp = FakeErp::new().with_open_lines([open_line("900", 10, Origin::Sales, "ITM-1")]);
    let screen = screen(&erp);

    screen.paste("900/10").await;
    screen.clear_line().await;
    screen.resolve().await;

    let session = screen.snapshot().await;
    assert!(session.line.is_empty());
    assert!(session.selected.is_none());
    assert!(matches!(session.picker, Picker::Lines { open: false, .. }));
}

//! Terminal output.

#![allow(clippy::print_stdout)]

use inbound_core::ScanCode;
use inbound_receiving::engine::{Focus, Picker, ReceivedLinesTracker, ResolutionSession};
use inbound_receiving::{Notification, NotificationLevel};

pub fn scan(code: &ScanCode) {
    println!("order: {}", code.order);
    println!("line:  {}", code.line);
}

pub fn help() {
    println!("Scan an order code, or type a command:");
    println!("  :line <n> | :line | :origin <name> | :lot <code> | :lot #<n>");
    println!("  :bplot <code> | :note <text> | :qty <n> | :submit");
    println!("  :received | :confirm <n> | :confirm-all | :clear-line | :help | :quit");
}

pub fn notification(notification: Option<&Notification>) {
    let Some(notification) = notification else {
        return;
    };
    let tag = match notification.level {
        NotificationLevel::Success => "OK",
        NotificationLevel::Info => "--",
        NotificationLevel::Warning => "!!",
        NotificationLevel::Error => "ERR",
    };
    println!("[{tag}] {notification}");
}

pub fn session(session: &ResolutionSession) {
    let origin = session.origin.map_or("-", |o| o.label());
    let lock = if session.origin_locked { " (fixed)" } else { "" };
    println!(
        "order {}  line {}  origin {origin}{lock}",
        or_dash(&session.order),
        or_dash(&session.line)
    );

    if let Some(line) = &session.selected {
        println!(
            "item {} {}  expected {} {}",
            line.item, line.item_description, line.to_be_received_qty, line.order_unit
        );
    }
    match &session.picker {
        Picker::Lines { lines, open: true } => {
            let numbers: Vec<String> = lines.iter().map(|l| format!("{} ({})", l.line, l.item)).collect();
            println!("pick a line: {}", numbers.join(", "));
        }
        Picker::OriginLines { groups, open: true } => {
            for (origin, lines) in groups {
                let numbers: Vec<String> = lines.iter().map(|l| l.line.to_string()).collect();
                println!("  {:<18} lines {}", origin.label(), numbers.join(", "));
            }
        }
        _ => {}
    }
    if session.lot_visible() {
        println!("lot {}  existing {}", or_dash(&session.lots.lot), session.lots.existing.count);
        for (i, record) in session.lots.existing.lots.iter().enumerate() {
            let bp = record.business_partner_lot.as_deref().unwrap_or("");
            println!("  #{} {} {bp}", i + 1, record.lot);
        }
    }
    if session.business_partner_lot_visible() {
        println!("supplier lot {}", or_dash(&session.lots.business_partner_lot));
    }
    println!(
        "delivery note {}  quantity {}",
        or_dash(&session.delivery_note),
        or_dash(&session.quantity)
    );
    if let Some(count) = session.received.badge() {
        println!("received lines waiting: {count}");
    }

    if session.can_submit() {
        println!("ready (:submit)");
    } else if session.selected.is_some() {
        println!("next: {}", focus_name(session.focus));
    }
}

pub fn received_lines(tracker: &ReceivedLinesTracker) {
    let lines = tracker.lines();
    if lines.is_empty() {
        println!("no received lines");
        return;
    }
    for (i, line) in lines.iter().enumerate() {
        println!(
            "  {:>2}. line {:<4} {} {} {}  slip {}  lot {}",
            i + 1,
            line.position,
            line.item,
            line.quantity,
            line.unit,
            line.packing_slip,
            line.lot.as_deref().unwrap_or("-")
        );
    }
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() { "-" } else { value }
}

const fn focus_name(focus: Focus) -> &'static str {
    match focus {
        Focus::Order => "order",
        Focus::Line => "line",
        Focus::Lot => "lot",
        Focus::BusinessPartnerLot => "supplier lot",
        Focus::DeliveryNote => "delivery note",
        Focus::Quantity => "quantity",
    }
}

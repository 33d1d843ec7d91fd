//! Interactive receiving session.
//!
//! Every input line is either a scan (order, or order and line joined by a
//! separator) or a command starting with `:`:
//!
//! | Command            | Effect                                       |
//! |--------------------|----------------------------------------------|
//! | `:line <n>`        | pick or type a line                          |
//! | `:line`            | clear the line                               |
//! | `:origin <name>`   | pick an origin group                         |
//! | `:lot <code>`      | type and check a lot                         |
//! | `:lot #<n>`        | use the n-th existing lot                    |
//! | `:bplot <code>`    | supplier lot                                 |
//! | `:note <text>`     | delivery note                                |
//! | `:qty <n>`         | quantity                                     |
//! | `:submit`          | receive                                      |
//! | `:received`        | show received lines                          |
//! | `:confirm <n>`     | confirm the n-th received line               |
//! | `:confirm-all`     | confirm all received lines                   |
//! | `:clear-line`      | clear the line                               |
//! | `:help`            | list commands                                |
//! | `:quit`            | end the session                              |

use inbound_core::Origin;
use inbound_receiving::config::ReceivingConfig;
use inbound_receiving::{HttpErpConnector, Notification, ReceivingScreen};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::CliError;
use crate::render;

/// One line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Scanned or typed order code.
    Scan(String),
    /// Line number, or `None` to clear the line.
    Line(Option<u32>),
    /// Origin group.
    Origin(Origin),
    /// Typed lot.
    Lot(String),
    /// Existing lot by 1-based position.
    ExistingLot(usize),
    /// Supplier lot.
    BusinessPartnerLot(String),
    /// Delivery note.
    Note(String),
    /// Quantity as typed.
    Quantity(String),
    /// Receive.
    Submit,
    /// Show received lines.
    Received,
    /// Confirm the received line at a 1-based position.
    Confirm(usize),
    /// Confirm all received lines.
    ConfirmAll,
    /// List commands.
    Help,
    /// End the session.
    Quit,
    /// Input that could not be understood.
    Invalid(String),
}

/// Interpret one line of operator input.
#[must_use]
pub fn parse_input(raw: &str) -> Input {
    let raw = raw.trim();
    let Some(command) = raw.strip_prefix(':') else {
        return Input::Scan(raw.to_string());
    };
    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(name, arg)| (name, arg.trim()));

    let position = |arg: &str| arg.trim_start_matches('#').parse::<usize>().ok().filter(|n| *n > 0);
    let invalid = || Input::Invalid(raw.to_string());

    match name {
        "line" if arg.is_empty() => Input::Line(None),
        "line" => arg.parse().map_or_else(|_| invalid(), |n| Input::Line(Some(n))),
        "clear-line" => Input::Line(None),
        "origin" => arg.parse().map_or_else(|_| invalid(), Input::Origin),
        "lot" if arg.starts_with('#') => position(arg).map_or_else(invalid, Input::ExistingLot),
        "lot" => Input::Lot(arg.to_string()),
        "bplot" => Input::BusinessPartnerLot(arg.to_string()),
        "note" => Input::Note(arg.to_string()),
        "qty" => Input::Quantity(arg.to_string()),
        "submit" => Input::Submit,
        "received" => Input::Received,
        "confirm" => position(arg).map_or_else(invalid, Input::Confirm),
        "confirm-all" => Input::ConfirmAll,
        "help" => Input::Help,
        "quit" | "q" => Input::Quit,
        _ => invalid(),
    }
}

/// Run the interactive session until `:quit` or end of input.
///
/// # Errors
///
/// Returns `CliError` when the ERP client cannot be built or input cannot
/// be read. Receiving failures are shown and the session continues.
pub async fn run(config: &ReceivingConfig) -> Result<(), CliError> {
    let connector = HttpErpConnector::new(&config.erp)?;
    let screen = ReceivingScreen::new(connector, config.origin_probe_order.clone());
    tracing::info!(screen = %screen.id(), company = %config.erp.company, "Receiving session started");

    render::notification(screen.mount().await.as_ref());
    render::help();
    render::session(&screen.snapshot().await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = parse_input(&line);
        if input == Input::Quit {
            break;
        }
        if input == Input::Help {
            render::help();
            continue;
        }
        let notification = execute(&screen, input).await;
        render::notification(notification.as_ref());
        render::session(&screen.snapshot().await);
    }

    screen.leave().await;
    tracing::info!(screen = %screen.id(), "Receiving session ended");
    Ok(())
}

async fn execute(screen: &ReceivingScreen<HttpErpConnector>, input: Input) -> Option<Notification> {
    match input {
        Input::Scan(code) if code.is_empty() => screen.regain_focus().await,
        Input::Scan(code) => screen.paste(&code).await,
        Input::Line(None) => {
            screen.clear_line().await;
            None
        }
        Input::Line(Some(line)) => {
            let snapshot = screen.snapshot().await;
            if snapshot.picker.find(snapshot.origin, line).is_some() {
                screen.choose_line(snapshot.origin, line).await
            } else {
                screen.edit_line(&line.to_string()).await;
                screen.resolve().await
            }
        }
        Input::Origin(origin) => screen.choose_origin(origin).await,
        Input::Lot(lot) => {
            screen.edit_lot(&lot).await;
            screen.blur_lot().await
        }
        Input::ExistingLot(position) => screen.choose_existing_lot(position - 1).await,
        Input::BusinessPartnerLot(lot) => {
            screen.edit_business_partner_lot(&lot).await;
            None
        }
        Input::Note(note) => {
            screen.edit_delivery_note(&note).await;
            None
        }
        Input::Quantity(quantity) => {
            screen.edit_quantity(&quantity).await;
            None
        }
        Input::Submit => screen.submit().await,
        Input::Received => {
            let notification = screen.open_received_lines().await;
            render::received_lines(&screen.snapshot().await.received);
            notification
        }
        Input::Confirm(position) => screen.confirm_received(position - 1).await,
        Input::ConfirmAll => screen.confirm_all_received().await,
        Input::Invalid(raw) => Some(Notification::new(
            inbound_receiving::NotificationLevel::Warning,
            format!("Unknown command: {raw}"),
        )),
        Input::Help | Input::Quit => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_scan() {
        assert_eq!(parse_input(" 200000066/10 "), Input::Scan("200000066/10".to_string()));
    }

    #[test]
    fn test_line_commands() {
        assert_eq!(parse_input(":line 20"), Input::Line(Some(20)));
        assert_eq!(parse_input(":line"), Input::Line(None));
        assert_eq!(parse_input(":clear-line"), Input::Line(None));
        assert!(matches!(parse_input(":line x"), Input::Invalid(_)));
    }

    #[test]
    fn test_origin_command() {
        assert_eq!(parse_input(":origin sales"), Input::Origin(Origin::Sales));
        assert!(matches!(parse_input(":origin outbound"), Input::Invalid(_)));
    }

    #[test]
    fn test_lot_commands() {
        assert_eq!(parse_input(":lot L-1"), Input::Lot("L-1".to_string()));
        assert_eq!(parse_input(":lot #2"), Input::ExistingLot(2));
        assert!(matches!(parse_input(":lot #0"), Input::Invalid(_)));
        assert_eq!(
            parse_input(":bplot SUP 9"),
            Input::BusinessPartnerLot("SUP 9".to_string())
        );
    }

    #[test]
    fn test_field_commands_keep_text() {
        assert_eq!(parse_input(":note DN 4711"), Input::Note("DN 4711".to_string()));
        assert_eq!(parse_input(":qty 2,5"), Input::Quantity("2,5".to_string()));
    }

    #[test]
    fn test_received_commands() {
        assert_eq!(parse_input(":received"), Input::Received);
        assert_eq!(parse_input(":confirm 3"), Input::Confirm(3));
        assert!(matches!(parse_input(":confirm"), Input::Invalid(_)));
        assert_eq!(parse_input(":confirm-all"), Input::ConfirmAll);
    }

    #[test]
    fn test_session_commands() {
        assert_eq!(parse_input(":submit"), Input::Submit);
        assert_eq!(parse_input(":quit"), Input::Quit);
        assert_eq!(parse_input(":help"), Input::Help);
        assert!(matches!(parse_input(":dance"), Input::Invalid(_)));
    }
}

//! Command parser for the : command system

use crate::app::Tab;

/// Parsed command from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Navigation
    Tab(Tab),
    Chat(String),

    // Inbox
    Read(String),
    Refresh,

    // Offers
    NewOffer,
    Offers,

    Help,
    Quit,

    // Unknown command
    Unknown(String),
}

/// Parse a command string (without the leading :)
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    let mut parts = input.splitn(2, ' ');
    let cmd = parts.next().unwrap_or("");
    let args = parts
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    match cmd.to_lowercase().as_str() {
        "tab" | "t" => match args.as_deref().and_then(Tab::from_name) {
            Some(tab) => Command::Tab(tab),
            None => Command::Unknown(input.to_string()),
        },
        "overview" | "home" => Command::Tab(Tab::Overview),
        "messages" | "inbox" | "msg" => Command::Tab(Tab::Messages),
        "profile" => Command::Tab(Tab::Profile),
        "chat" | "open" => match args {
            Some(id) => Command::Chat(id),
            None => Command::Unknown(input.to_string()),
        },
        "read" => match args {
            Some(id) => Command::Read(id),
            None => Command::Unknown(input.to_string()),
        },
        "refresh" | "r" => Command::Refresh,
        "offer" | "new" => Command::NewOffer,
        "offers" => Command::Offers,
        "help" | "h" => Command::Help,
        "quit" | "q" => Command::Quit,
        _ => Command::Unknown(input.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_navigation_commands() {
        assert_eq!(parse_command("tab messages"), Command::Tab(Tab::Messages));
        assert_eq!(parse_command("t offres"), Command::Tab(Tab::Offers));
        assert_eq!(parse_command("inbox"), Command::Tab(Tab::Messages));
        assert_eq!(
            parse_command("chat 65f0c1"),
            Command::Chat("65f0c1".to_string())
        );
    }

    #[test]
    fn test_parse_inbox_commands() {
        assert_eq!(parse_command("read c1"), Command::Read("c1".to_string()));
        assert_eq!(parse_command("  refresh "), Command::Refresh);
        assert_eq!(parse_command("offer"), Command::NewOffer);
        assert_eq!(parse_command("offers"), Command::Offers);
    }

    #[test]
    fn test_parse_missing_arguments() {
        assert_eq!(parse_command("chat"), Command::Unknown("chat".to_string()));
        assert_eq!(parse_command("read   "), Command::Unknown("read".to_string()));
        assert_eq!(
            parse_command("tab nowhere"),
            Command::Unknown("tab nowhere".to_string())
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            parse_command("notacommand"),
            Command::Unknown("notacommand".to_string())
        );
    }
}

//! Bot command parsing
//!
//! Commands arrive as plain message text. The command word may carry the
//! bot's username (`/balance@sentinel_bot`), arguments are whitespace
//! separated.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    AddWallet {
        address: String,
        chain: Option<String>,
    },
    RemoveWallet(String),
    ListWallets,
    Balance(Option<String>),
    Status,
    Check,
    /// A command that is missing a required argument
    Usage(&'static str),
    Unknown(String),
}

impl BotCommand {
    /// `None` for text that is not a command at all
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if !text.starts_with('/') {
            return None;
        }

        let mut parts = text.split_whitespace();
        let head = parts.next()?;
        let name = head[1..].split('@').next().unwrap_or_default().to_lowercase();
        let first = parts.next().map(str::to_string);
        let second = parts.next().map(str::to_string);

        let command = match name.as_str() {
            "start" => Self::Start,
            "help" => Self::Help,
            "addwallet" => match first {
                Some(address) => Self::AddWallet {
                    address,
                    chain: second,
                },
                None => Self::Usage("/addwallet <address> [chain]"),
            },
            "removewallet" => match first {
                Some(address) => Self::RemoveWallet(address),
                None => Self::Usage("/removewallet <address>"),
            },
            "listwallet" | "listwallets" => Self::ListWallets,
            "balance" => Self::Balance(first),
            "status" => Self::Status,
            "check" => Self::Check,
            _ => Self::Unknown(name),
        };
        Some(command)
    }
}

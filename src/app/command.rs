use super::accounts::SortField;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Network,
    Gateway,
    Help,
    Sort(SortField),
    Direction { descending: bool },
    Upstake { address: String, amount: u64 },
    Fund { address: String, amount: u64 },
    FundAll { amount: u64 },
    UpstakeAll { amount: u64 },
    Show { address: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Usage(&'static str),
    InvalidAmount(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Usage(usage) => write!(f, "usage: {usage}"),
            CommandError::InvalidAmount(raw) => {
                write!(f, "amount must be a positive integer: {raw}")
            }
        }
    }
}

impl std::error::Error for CommandError {}

const UPSTAKE_USAGE: &str = "u <address> <amount>";
const FUND_USAGE: &str = "f <address> <amount> or fund <address> <amount>";
const FUND_ALL_USAGE: &str = "fa <amount> or fund-all <amount> (each app receives <amount>)";
const UPSTAKE_ALL_USAGE: &str =
    "ua <amount> or upstake-all <amount> (each app gets <amount> added to its stake)";
const SHOW_USAGE: &str = "show <address>";

/// Parse a committed command buffer. `Ok(None)` means the input is not a command
/// at all and should be ignored.
pub fn parse(input: &str) -> Result<Option<Command>, CommandError> {
    let input = input.trim();
    let exact = match input {
        "q" | "quit" => Some(Command::Quit),
        "n" | "network" => Some(Command::Network),
        "g" | "gateway" => Some(Command::Gateway),
        "h" | "help" => Some(Command::Help),
        "asc" => Some(Command::Direction { descending: false }),
        "desc" => Some(Command::Direction { descending: true }),
        "ss" => Some(Command::Sort(SortField::Status)),
        "sa" => Some(Command::Sort(SortField::Address)),
        "sp" => Some(Command::Sort(SortField::Stake)),
        "sb" => Some(Command::Sort(SortField::Balance)),
        "sv" => Some(Command::Sort(SortField::Service)),
        "sg" => Some(Command::Sort(SortField::Gateway)),
        _ => None,
    };
    if exact.is_some() {
        return Ok(exact);
    }

    let parts: Vec<&str> = input.split_whitespace().collect();
    let Some((head, args)) = parts.split_first() else {
        return Ok(None);
    };
    let command = match *head {
        "u" => {
            let (address, amount) = address_and_amount(args, UPSTAKE_USAGE)?;
            Command::Upstake { address, amount }
        }
        "f" | "fund" => {
            let (address, amount) = address_and_amount(args, FUND_USAGE)?;
            Command::Fund { address, amount }
        }
        "fa" | "fund-all" => Command::FundAll {
            amount: amount_only(args, FUND_ALL_USAGE)?,
        },
        "ua" | "upstake-all" => Command::UpstakeAll {
            amount: amount_only(args, UPSTAKE_ALL_USAGE)?,
        },
        "sort" => Command::Sort(SortField::from_name(args.first().copied().unwrap_or_default())),
        "show" => {
            let address = args.first().ok_or(CommandError::Usage(SHOW_USAGE))?;
            Command::Show {
                address: address.to_string(),
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(command))
}

fn address_and_amount(args: &[&str], usage: &'static str) -> Result<(String, u64), CommandError> {
    match args {
        [address, amount, ..] => Ok((address.to_string(), parse_amount(amount)?)),
        _ => Err(CommandError::Usage(usage)),
    }
}

fn amount_only(args: &[&str], usage: &'static str) -> Result<u64, CommandError> {
    let amount = args.first().ok_or(CommandError::Usage(usage))?;
    parse_amount(amount)
}

pub fn parse_amount(raw: &str) -> Result<u64, CommandError> {
    match raw.parse::<u64>() {
        Ok(amount) if amount > 0 => Ok(amount),
        _ => Err(CommandError::InvalidAmount(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_tokens() {
        assert_eq!(parse(" q "), Ok(Some(Command::Quit)));
        assert_eq!(parse("gateway"), Ok(Some(Command::Gateway)));
        assert_eq!(parse("sort balance"), Ok(Some(Command::Sort(SortField::Balance))));
        assert_eq!(parse("sg"), Ok(Some(Command::Sort(SortField::Gateway))));
        assert_eq!(parse("sort colour"), Ok(Some(Command::Sort(SortField::Service))));
        assert_eq!(parse("desc"), Ok(Some(Command::Direction { descending: true })));
    }

    #[test]
    fn prefixed_commands() {
        assert_eq!(
            parse("u pokt1abc 500"),
            Ok(Some(Command::Upstake {
                address: "pokt1abc".into(),
                amount: 500
            }))
        );
        assert_eq!(
            parse("fund pokt1abc 7"),
            Ok(Some(Command::Fund {
                address: "pokt1abc".into(),
                amount: 7
            }))
        );
        assert_eq!(parse("fund-all 3"), Ok(Some(Command::FundAll { amount: 3 })));
        assert_eq!(parse("fa 3"), Ok(Some(Command::FundAll { amount: 3 })));
        assert_eq!(parse("ua 9"), Ok(Some(Command::UpstakeAll { amount: 9 })));
        assert_eq!(
            parse("show pokt1abc"),
            Ok(Some(Command::Show {
                address: "pokt1abc".into()
            }))
        );
    }

    #[test]
    fn bad_amounts_are_validation_errors() {
        assert_eq!(
            parse("u a1 abc"),
            Err(CommandError::InvalidAmount("abc".into()))
        );
        assert_eq!(parse("fa 0"), Err(CommandError::InvalidAmount("0".into())));
        assert_eq!(parse("ua -4"), Err(CommandError::InvalidAmount("-4".into())));
        assert_eq!(parse("u a1"), Err(CommandError::Usage(UPSTAKE_USAGE)));
        assert_eq!(parse("show"), Err(CommandError::Usage(SHOW_USAGE)));
    }

    #[test]
    fn unknown_input_is_ignored() {
        assert_eq!(parse("launch rockets"), Ok(None));
        assert_eq!(parse(""), Ok(None));
    }
}

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Longest ticker the market-data endpoints accept, share-class suffix included.
const MAX_TICKER_LEN: usize = 10;

/// Uppercase ticker used as the lookup key for every upstream call.
///
/// Letters and digits, starting with a letter, with `.` or `-` allowed as a
/// share-class separator (`BRK.B`, `BF-B`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Parse a ticker, folding it to uppercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let ticker = input.trim().to_ascii_uppercase();

        let mut chars = ticker.chars();
        match chars.next() {
            None => return Err(ValidationError::EmptySymbol),
            Some(ch) if !ch.is_ascii_alphabetic() => {
                return Err(ValidationError::SymbolInvalidStart { ch })
            }
            Some(_) => {}
        }
        if let Some((index, ch)) = chars
            .enumerate()
            .find(|(_, ch)| !(ch.is_ascii_alphanumeric() || matches!(*ch, '.' | '-')))
        {
            return Err(ValidationError::SymbolInvalidChar {
                ch,
                index: index + 1,
            });
        }

        if ticker.len() > MAX_TICKER_LEN {
            return Err(ValidationError::SymbolTooLong {
                len: ticker.len(),
                max: MAX_TICKER_LEN,
            });
        }
        Ok(Self(ticker))
    }

    /// Parse a list of raw tickers, skipping blanks and duplicates while
    /// preserving first-seen order.
    pub fn parse_list<'a, I>(inputs: I) -> Result<Vec<Self>, ValidationError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut output: Vec<Self> = Vec::new();
        for raw in inputs {
            if raw.trim().is_empty() {
                continue;
            }
            let symbol = Self::parse(raw)?;
            if !output.contains(&symbol) {
                output.push(symbol);
            }
        }
        Ok(output)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Symbol {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

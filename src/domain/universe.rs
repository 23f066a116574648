//! Ticker universe: code lists from configuration or a listing file, A-share
//! board filters and special-treatment (ST) exclusion.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),

    #[error("unknown board '{0}' (expected main, gem, star or bj)")]
    UnknownBoard(String),
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

/// Listing board of a mainland code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Board {
    Main,
    /// ChiNext, 300xxx / 301xxx.
    Gem,
    /// STAR market, 688xxx.
    Star,
    /// Beijing exchange, 4xxxxx / 8xxxxx or a `.BJ` suffix.
    Bj,
}

impl Board {
    pub fn classify(code: &str) -> Board {
        let upper = code.trim().to_uppercase();
        if upper.ends_with(".BJ") {
            return Board::Bj;
        }
        let digits = upper.split('.').next().unwrap_or_default();
        if digits.starts_with("300") || digits.starts_with("301") {
            Board::Gem
        } else if digits.starts_with("688") {
            Board::Star
        } else if digits.starts_with('4') || digits.starts_with('8') {
            Board::Bj
        } else {
            Board::Main
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Board::Main => "main",
            Board::Gem => "gem",
            Board::Star => "star",
            Board::Bj => "bj",
        };
        f.write_str(name)
    }
}

impl FromStr for Board {
    type Err = UniverseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "main" => Ok(Board::Main),
            "gem" => Ok(Board::Gem),
            "star" => Ok(Board::Star),
            "bj" => Ok(Board::Bj),
            other => Err(UniverseError::UnknownBoard(other.to_string())),
        }
    }
}

/// Parse `gem,star` into boards. An empty string means no exclusions.
pub fn parse_boards(input: &str) -> Result<Vec<Board>, UniverseError> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }
    input.split(',').map(str::parse).collect()
}

/// Drop codes listed on any of the `excluded` boards, keeping order.
pub fn filter_boards(codes: Vec<String>, excluded: &[Board]) -> Vec<String> {
    codes
        .into_iter()
        .filter(|c| !excluded.contains(&Board::classify(c)))
        .collect()
}

/// Special-treatment names: `ST` at the start or end, or `*ST` anywhere.
pub fn is_st_name(name: &str) -> bool {
    name.starts_with("ST") || name.contains("*ST") || name.ends_with("ST")
}

/// One row of a listing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedStock {
    /// Symbol as used for the data file name, e.g. `000001`.
    pub code: String,
    /// Exchange-qualified code such as `430047.BJ`.
    pub ts_code: Option<String>,
    pub name: Option<String>,
}

impl ListedStock {
    pub fn board(&self) -> Board {
        Board::classify(self.ts_code.as_deref().unwrap_or(&self.code))
    }
}

/// Parsed listing file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stocklist {
    pub stocks: Vec<ListedStock>,
    /// Header of the column names were read from, if the file had one.
    pub name_column: Option<String>,
}

impl Stocklist {
    /// Codes left after board exclusions and, when `exclude_st` is set, ST
    /// names. Without a name column the ST filter is skipped with a warning.
    pub fn codes(&self, excluded: &[Board], exclude_st: bool) -> Vec<String> {
        let drop_st = exclude_st && self.name_column.is_some();
        if exclude_st && !drop_st {
            warn!("stocklist has no name column, skipping ST exclusion");
        }

        let mut st_count = 0usize;
        let codes: Vec<String> = self
            .stocks
            .iter()
            .filter(|s| !excluded.contains(&s.board()))
            .filter(|s| {
                let st = drop_st && s.name.as_deref().is_some_and(is_st_name);
                st_count += usize::from(st);
                !st
            })
            .map(|s| s.code.clone())
            .collect();

        if st_count > 0 {
            info!(removed = st_count, "excluded ST stocks");
        }
        codes
    }
}

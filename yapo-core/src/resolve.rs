//! Resolution of comma-separated identifier strings.
//!
//! `info("micex/SBER, cbr/USD")` resolves every identifier in request order
//! and fails as a whole if any one of them fails.

use crate::registry::{LookupError, Registry};
use crate::symbol::{Symbol, SymbolId};

/// Result shape of [`info`]: one identifier yields a bare symbol, two or
/// more yield an ordered list.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Single(Symbol),
    Many(Vec<Symbol>),
}

impl Resolution {
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(symbols) => symbols.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_single(&self) -> Option<&Symbol> {
        match self {
            Self::Single(symbol) => Some(symbol),
            Self::Many(_) => None,
        }
    }

    pub fn into_vec(self) -> Vec<Symbol> {
        match self {
            Self::Single(symbol) => vec![symbol],
            Self::Many(symbols) => symbols,
        }
    }
}

/// Split on commas, trim each piece, parse each as `namespace/ticker`.
pub fn parse_ids(ids: &str) -> Result<Vec<SymbolId>, LookupError> {
    ids.split(',')
        .map(|piece| piece.trim().parse::<SymbolId>().map_err(LookupError::from))
        .collect()
}

pub fn info(registry: &Registry, ids: &str) -> Result<Resolution, LookupError> {
    let mut symbols = parse_ids(ids)?
        .iter()
        .map(|id| registry.lookup_id(id))
        .collect::<Result<Vec<_>, _>>()?;

    if symbols.len() == 1 {
        if let Some(symbol) = symbols.pop() {
            return Ok(Resolution::Single(symbol));
        }
    }
    Ok(Resolution::Many(symbols))
}

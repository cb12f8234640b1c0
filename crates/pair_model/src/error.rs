//! Formula errors

use thiserror::Error;

/// Operation named in [`FormulaError::ZeroAmount`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Deposit,
    Withdraw,
    Swap,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Deposit => write!(f, "deposit"),
            Operation::Withdraw => write!(f, "withdraw"),
            Operation::Swap => write!(f, "swap"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    #[error("invalid swap: amount_in={amount_in} reserve_in={reserve_in} reserve_out={reserve_out}")]
    InvalidSwap {
        amount_in: u64,
        reserve_in: u64,
        reserve_out: u64,
    },

    #[error("deposit ratio mismatch: native share {native_share} != token share {token_share}")]
    RatioMismatch {
        native_share: u64,
        token_share: u64,
    },

    #[error("insufficient liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity { requested: u64, available: u64 },

    #[error("{operation} amount must be positive")]
    ZeroAmount { operation: Operation },

    #[error("arithmetic overflow in {context}")]
    Overflow { context: &'static str },
}

pub type FormulaResult<T> = Result<T, FormulaError>;

use std::fmt;

use chrono::NaiveDateTime;

/// Columns every transactions file must carry, in reporting order.
pub const REQUIRED_COLUMNS: [&str; 4] = ["datetime", "amount", "merchant_category", "expense_type"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseType {
    Essential,
    NonEssential,
    /// Label that is neither essential nor non-essential, kept verbatim.
    Unrecognized(String),
}

impl ExpenseType {
    pub fn parse(raw: &str) -> Self {
        let label = raw.trim().to_lowercase();
        match label.as_str() {
            "essential" => Self::Essential,
            "non-essential" | "non_essential" | "nonessential" | "non essential" => {
                Self::NonEssential
            }
            _ => Self::Unrecognized(raw.trim().to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Essential => "essential",
            Self::NonEssential => "non-essential",
            Self::Unrecognized(s) => s,
        }
    }
}

impl fmt::Display for ExpenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub datetime: NaiveDateTime,
    pub amount: f64,
    pub merchant_category: String,
    pub expense_type: ExpenseType,
}

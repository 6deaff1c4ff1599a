use std::collections::HashMap;

use crate::fmt::money;
use crate::models::{ExpenseType, Transaction};

/// Categories listed in the digest handed to the advice service.
pub const TOP_CATEGORIES: usize = 5;

pub const NEEDS_SHARE: f64 = 0.50;
pub const WANTS_SHARE: f64 = 0.30;
pub const SAVINGS_SHARE: f64 = 0.20;

// ---------------------------------------------------------------------------
// Spending summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub name: String,
    pub total: f64,
    pub count: usize,
}

/// 50/30/20 split of a monthly income.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetSplit {
    pub income: f64,
    pub needs: f64,
    pub wants: f64,
    pub savings: f64,
}

impl BudgetSplit {
    /// `None` unless income is strictly positive.
    pub fn from_income(income: f64) -> Option<Self> {
        if !income.is_finite() || income <= 0.0 {
            return None;
        }
        Some(Self {
            income,
            needs: income * NEEDS_SHARE,
            wants: income * WANTS_SHARE,
            savings: income * SAVINGS_SHARE,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpendingSummary {
    pub transaction_count: usize,
    pub total_spend: f64,
    /// Sorted by descending total; ties keep first-appearance order.
    pub by_category: Vec<CategoryTotal>,
    pub essential_total: f64,
    pub non_essential_total: f64,
    /// Spend whose expense_type label was not recognised.
    pub unrecognized_total: f64,
    pub average_transaction: f64,
    pub budget: Option<BudgetSplit>,
}

pub fn summarize(transactions: &[Transaction], income: Option<f64>) -> SpendingSummary {
    let mut by_category: Vec<CategoryTotal> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut essential_total = 0.0;
    let mut non_essential_total = 0.0;
    let mut unrecognized_total = 0.0;

    for txn in transactions {
        let slot = *index
            .entry(txn.merchant_category.as_str())
            .or_insert_with(|| {
                by_category.push(CategoryTotal {
                    name: txn.merchant_category.clone(),
                    total: 0.0,
                    count: 0,
                });
                by_category.len() - 1
            });
        by_category[slot].total += txn.amount;
        by_category[slot].count += 1;

        match txn.expense_type {
            ExpenseType::Essential => essential_total += txn.amount,
            ExpenseType::NonEssential => non_essential_total += txn.amount,
            ExpenseType::Unrecognized(_) => unrecognized_total += txn.amount,
        }
    }

    // sort_by is stable, so equal totals stay in first-appearance order
    by_category.sort_by(|a, b| b.total.total_cmp(&a.total));

    let total_spend: f64 = transactions.iter().map(|t| t.amount).sum();
    let average_transaction = if transactions.is_empty() {
        0.0
    } else {
        total_spend / transactions.len() as f64
    };

    SpendingSummary {
        transaction_count: transactions.len(),
        total_spend,
        by_category,
        essential_total,
        non_essential_total,
        unrecognized_total,
        average_transaction,
        budget: income.and_then(BudgetSplit::from_income),
    }
}

/// First `rows` transactions, or all of them when `rows` is `None`.
pub fn limit_rows(transactions: &[Transaction], rows: Option<usize>) -> &[Transaction] {
    match rows {
        Some(n) if n < transactions.len() => &transactions[..n],
        _ => transactions,
    }
}

// ---------------------------------------------------------------------------
// Digest text
// ---------------------------------------------------------------------------

/// Fixed-shape digest fed to the advice prompt and shown to the user.
pub fn build_summary_text(summary: &SpendingSummary, top_n: usize) -> String {
    let mut lines = vec![
        format!("Transactions analysed: {}", summary.transaction_count),
        format!("Total spend: {}", money(summary.total_spend)),
        format!("Essential spend: {}", money(summary.essential_total)),
        format!("Non-essential spend: {}", money(summary.non_essential_total)),
    ];
    if summary.unrecognized_total != 0.0 {
        lines.push(format!(
            "Unclassified spend: {}",
            money(summary.unrecognized_total)
        ));
    }
    lines.push(format!(
        "Average transaction: {}",
        money(summary.average_transaction)
    ));
    lines.push("Top categories:".to_string());
    if summary.by_category.is_empty() {
        lines.push("- (none)".to_string());
    }
    for cat in summary.by_category.iter().take(top_n) {
        lines.push(format!("- {}: {}", cat.name, money(cat.total)));
    }

    if let Some(budget) = &summary.budget {
        lines.push(format!("Monthly income: {}", money(budget.income)));
        lines.push("Suggested 50/30/20 budget:".to_string());
        lines.push(format!("- Needs (50%): {}", money(budget.needs)));
        lines.push(format!("- Wants (30%): {}", money(budget.wants)));
        lines.push(format!("- Savings (20%): {}", money(budget.savings)));
    }

    lines.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn txn(amount: f64, category: &str, expense_type: &str) -> Transaction {
        Transaction {
            datetime: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            amount,
            merchant_category: category.to_string(),
            expense_type: ExpenseType::parse(expense_type),
        }
    }

    fn sample() -> Vec<Transaction> {
        vec![
            txn(120.0, "Dining", "non-essential"),
            txn(800.0, "Groceries", "essential"),
            txn(300.0, "Travel", "non-essential"),
            txn(200.0, "Groceries", "essential"),
            txn(60.5, "Dining", "non-essential"),
            txn(1500.0, "Rent", "essential"),
        ]
    }

    #[test]
    fn test_totals_split_by_expense_type() {
        let s = summarize(&sample(), None);
        assert_eq!(s.transaction_count, 6);
        assert!((s.total_spend - 2980.5).abs() < 1e-9);
        assert!((s.essential_total - 2500.0).abs() < 1e-9);
        assert!((s.non_essential_total - 480.5).abs() < 1e-9);
        assert!((s.total_spend - (s.essential_total + s.non_essential_total)).abs() < 1e-9);
        assert!((s.average_transaction - 2980.5 / 6.0).abs() < 1e-9);
        assert!(s.budget.is_none());
    }

    #[test]
    fn test_categories_sorted_descending() {
        let s = summarize(&sample(), None);
        let names: Vec<&str> = s.by_category.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Rent", "Groceries", "Travel", "Dining"]);
        assert_eq!(s.by_category[1].count, 2);
        for pair in s.by_category.windows(2) {
            assert!(pair[0].total >= pair[1].total);
        }
    }

    #[test]
    fn test_category_ties_keep_first_appearance() {
        let rows = vec![
            txn(50.0, "Zoo", "non-essential"),
            txn(100.0, "Books", "non-essential"),
            txn(50.0, "Apps", "non-essential"),
            txn(50.0, "Zoo", "non-essential"),
        ];
        let s = summarize(&rows, None);
        let names: Vec<&str> = s.by_category.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Zoo", "Books", "Apps"]);
    }

    #[test]
    fn test_unrecognized_labels_excluded_from_subtotals() {
        let rows = vec![
            txn(100.0, "Fuel", "essential"),
            txn(40.0, "Gifts", "mixed"),
        ];
        let s = summarize(&rows, None);
        assert_eq!(s.total_spend, 140.0);
        assert_eq!(s.essential_total, 100.0);
        assert_eq!(s.non_essential_total, 0.0);
        assert_eq!(s.unrecognized_total, 40.0);
    }

    #[test]
    fn test_empty_input() {
        let s = summarize(&[], Some(1000.0));
        assert_eq!(s.total_spend, 0.0);
        assert_eq!(s.average_transaction, 0.0);
        assert!(s.by_category.is_empty());
        assert!(s.budget.is_some());
        let text = build_summary_text(&s, TOP_CATEGORIES);
        assert!(text.contains("- (none)"));
    }

    #[test]
    fn test_budget_split_sums_to_income() {
        for income in [1.0, 333.33, 45_000.0, 123_456.78] {
            let b = BudgetSplit::from_income(income).unwrap();
            assert!((b.needs + b.wants + b.savings - income).abs() <= income * 1e-12);
            assert_eq!(b.needs, income * 0.5);
        }
    }

    #[test]
    fn test_budget_split_requires_positive_income() {
        assert!(BudgetSplit::from_income(0.0).is_none());
        assert!(BudgetSplit::from_income(-10.0).is_none());
        assert!(BudgetSplit::from_income(f64::NAN).is_none());
        assert!(summarize(&sample(), Some(0.0)).budget.is_none());
    }

    #[test]
    fn test_limit_rows() {
        let rows = sample();
        assert_eq!(limit_rows(&rows, Some(3)).len(), 3);
        assert_eq!(limit_rows(&rows, Some(100)).len(), 6);
        assert_eq!(limit_rows(&rows, None).len(), 6);
        assert_eq!(limit_rows(&rows, Some(0)).len(), 0);
    }

    #[test]
    fn test_summary_text_shape() {
        let s = summarize(&sample(), None);
        let text = build_summary_text(&s, TOP_CATEGORIES);
        let expected = "\
Transactions analysed: 6
Total spend: ₹2,980.50
Essential spend: ₹2,500.00
Non-essential spend: ₹480.50
Average transaction: ₹496.75
Top categories:
- Rent: ₹1,500.00
- Groceries: ₹1,000.00
- Travel: ₹300.00
- Dining: ₹180.50";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_summary_text_top_n_and_budget() {
        let rows: Vec<Transaction> = (0..8)
            .map(|i| txn(100.0 + i as f64, &format!("Cat{i}"), "essential"))
            .collect();
        let s = summarize(&rows, Some(50_000.0));
        let text = build_summary_text(&s, TOP_CATEGORIES);
        let listed = text.lines().filter(|l| l.starts_with("- Cat")).count();
        assert_eq!(listed, 5);
        assert!(text.contains("- Cat7: ₹107.00"));
        assert!(!text.contains("Cat2"));
        assert!(text.ends_with(
            "Monthly income: ₹50,000.00\n\
             Suggested 50/30/20 budget:\n\
             - Needs (50%): ₹25,000.00\n\
             - Wants (30%): ₹15,000.00\n\
             - Savings (20%): ₹10,000.00"
        ));
    }

    #[test]
    fn test_summary_text_is_deterministic() {
        let s = summarize(&sample(), Some(10_000.0));
        assert_eq!(
            build_summary_text(&s, TOP_CATEGORIES),
            build_summary_text(&s, TOP_CATEGORIES)
        );
    }
}

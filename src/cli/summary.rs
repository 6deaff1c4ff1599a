use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{analyse, Analysis, AnalysisArgs, AnalysisOptions};
use crate::error::Result;
use crate::fmt::{money, pct};
use crate::importer::load_file;
use crate::reports::SpendingSummary;
use crate::settings::{load_settings, resolve_input};

pub fn run(args: AnalysisArgs) -> Result<()> {
    let settings = load_settings();
    let path = resolve_input(args.file.as_deref(), &settings)?;
    let opts = AnalysisOptions::resolve(&args, &settings);

    let dataset = load_file(&path)?;
    let analysis = analyse(&dataset.transactions, &opts);
    print_analysis(&analysis);
    Ok(())
}

pub(crate) fn print_analysis(analysis: &Analysis) {
    println!("{}", render_tables(&analysis.summary));
    println!("{}", "Spending Summary".bold());
    println!("{}", analysis.digest);
}

pub fn render_tables(summary: &SpendingSummary) -> String {
    let mut out = String::new();

    let mut table = Table::new();
    table.set_header(vec!["Category", "Amount", "%", "Count"]);
    for item in &summary.by_category {
        table.add_row(vec![
            Cell::new(&item.name),
            Cell::new(money(item.total)),
            Cell::new(format!("{:.1}%", pct(item.total, summary.total_spend))),
            Cell::new(item.count),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(money(summary.total_spend)),
        Cell::new(""),
        Cell::new(summary.transaction_count),
    ]);
    out.push_str(&format!("Spend by Category\n{table}\n\n"));

    let mut split = Table::new();
    split.set_header(vec!["Expense type", "Amount", "%"]);
    split.add_row(vec![
        Cell::new("Essential".green()),
        Cell::new(money(summary.essential_total)),
        Cell::new(format!("{:.1}%", pct(summary.essential_total, summary.total_spend))),
    ]);
    split.add_row(vec![
        Cell::new("Non-essential".yellow()),
        Cell::new(money(summary.non_essential_total)),
        Cell::new(format!(
            "{:.1}%",
            pct(summary.non_essential_total, summary.total_spend)
        )),
    ]);
    if summary.unrecognized_total != 0.0 {
        split.add_row(vec![
            Cell::new("Unclassified".red()),
            Cell::new(money(summary.unrecognized_total)),
            Cell::new(format!(
                "{:.1}%",
                pct(summary.unrecognized_total, summary.total_spend)
            )),
        ]);
    }
    out.push_str(&format!("Essential vs Non-essential\n{split}\n"));
    out.push_str(&format!(
        "Average transaction: {}\n",
        money(summary.average_transaction)
    ));

    if let Some(budget) = &summary.budget {
        let mut bt = Table::new();
        bt.set_header(vec!["Bucket", "Share", "Amount"]);
        bt.add_row(vec![Cell::new("Needs"), Cell::new("50%"), Cell::new(money(budget.needs))]);
        bt.add_row(vec![Cell::new("Wants"), Cell::new("30%"), Cell::new(money(budget.wants))]);
        bt.add_row(vec![
            Cell::new("Savings"),
            Cell::new("20%"),
            Cell::new(money(budget.savings)),
        ]);
        out.push_str(&format!(
            "\n50/30/20 Budget for {}\n{bt}\n",
            money(budget.income)
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::parse_transactions;
    use crate::reports::summarize;

    #[test]
    fn test_render_tables_lists_categories_and_budget() {
        colored::control::set_override(false);
        let csv = "datetime,amount,merchant_category,expense_type\n\
                   2024-01-01,300,Groceries,essential\n\
                   2024-01-02,100,Movies,non-essential\n";
        let rows = parse_transactions(csv.as_bytes()).unwrap();
        let out = render_tables(&summarize(&rows, Some(10_000.0)));
        assert!(out.contains("Groceries"));
        assert!(out.contains("75.0%"));
        assert!(out.contains("₹5,000.00"));
        assert!(out.contains("50/30/20 Budget for ₹10,000.00"));
        assert!(!out.contains("Unclassified"));
    }

    #[test]
    fn test_render_tables_without_income_has_no_budget() {
        let out = render_tables(&summarize(&[], None));
        assert!(!out.contains("50/30/20"));
        assert!(out.contains("Average transaction: ₹0.00"));
    }
}

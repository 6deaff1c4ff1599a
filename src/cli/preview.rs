use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::fmt::money;
use crate::importer::load_file;
use crate::models::Transaction;
use crate::settings::{load_settings, resolve_input};

pub fn run(file: Option<String>, limit: usize) -> Result<()> {
    let settings = load_settings();
    let path = resolve_input(file.as_deref(), &settings)?;
    let dataset = load_file(&path)?;
    println!("{}", render(&dataset.transactions, limit));
    Ok(())
}

pub fn render(transactions: &[Transaction], limit: usize) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Date", "Amount", "Category", "Type"]);
    for t in transactions.iter().take(limit) {
        table.add_row(vec![
            Cell::new(t.datetime.format("%Y-%m-%d %H:%M")),
            Cell::new(money(t.amount)),
            Cell::new(&t.merchant_category),
            Cell::new(&t.expense_type),
        ]);
    }
    format!(
        "Sample Data ({} of {} rows)\n{table}",
        transactions.len().min(limit),
        transactions.len()
    )
}

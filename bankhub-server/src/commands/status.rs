//! Status command - show user, account and transaction summary

use anyhow::Result;
use colored::Colorize;

use super::get_context;
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let status = ctx.status_service.get_status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "BankHub Status".bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["Users".to_string(), status.total_users.to_string()]);
    for entry in &status.users_by_role {
        table.add_row(vec![format!("  {}", entry.role), entry.count.to_string()]);
    }
    table.add_row(vec!["Accounts".to_string(), status.total_accounts.to_string()]);
    table.add_row(vec![
        "Transactions".to_string(),
        status.total_transactions.to_string(),
    ]);
    table.add_row(vec!["Total balance".to_string(), status.total_balance.to_string()]);

    println!("{}", table);
    println!("Database: {}", ctx.repository.db_path().display());

    Ok(())
}

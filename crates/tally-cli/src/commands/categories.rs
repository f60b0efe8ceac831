//! Categories command - inspect the keyword table.

use clap::Args;
use console::style;

use tally_core::Category;

use super::load_config;

/// Arguments for the categories command.
#[derive(Args)]
pub struct CategoriesArgs {
    /// Classify this description instead of listing the rules
    #[arg(long)]
    classify: Option<String>,

    /// Print rules as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: CategoriesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let table = config.keyword_table();

    if let Some(description) = &args.classify {
        println!("{}", table.classify(description));
        return Ok(());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(table.rules())?);
        return Ok(());
    }

    println!("{}", style("Keyword rules (first match wins):").bold());
    for (i, rule) in table.rules().iter().enumerate() {
        println!("  {:>2}. {:<18} {}", i + 1, rule.keyword, rule.category);
    }

    println!();
    println!("{}", style("Categories:").bold());
    for category in Category::ALL {
        println!("  {}", category);
    }
    println!("  {}", style(Category::UNCATEGORIZED).dim());

    Ok(())
}

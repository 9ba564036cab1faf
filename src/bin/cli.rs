#![cfg(not(tarpaulin_include))]

use chrono::NaiveDate;
use inventory::catalog::CatalogCache;
use inventory::edit_buffer::EditField;
use inventory::filter::{self, Choice, FilterSelection};
use inventory::session::{InventorySession, ResetState};
use inventory::{config, downloader, loader, preview, saving, writer};
use std::env;
use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;

fn print_help() {
    println!("Commands:");
    println!("  q                          Quit");
    println!("  areas                      List the areas of the catalog");
    println!("  area <AREA>                Select an area (clears the other filters)");
    println!("  cat|sub|prod <VALUE|ALL>   Narrow by category, sub-family or product");
    println!("  rows                       Show the editable grid");
    println!("  set <PRODUCT> <FIELD> <N>  Stage a quantity (closed, open, bottles)");
    println!("  preview                    Show the valuation preview");
    println!("  date <DD-MM-YYYY>          Set the inventory date");
    println!("  save                       Commit the rows shown by preview");
    println!("  comment <TEXT>             Overwrite the general comment");
    println!("  reset | yes | no           Request, confirm or cancel an area reset");
    println!("  view <TAB> [<ROW> <COL>]   Print a 10x10 window of a worksheet");
    println!("  export <TAB>               Print a worksheet as CSV");
    println!("  reload                     Reload the catalog on next use");
    println!("  snapshot <PATH>            Save the workbook to a compressed snapshot");
}

/// Splits `set` arguments: the product name may contain spaces, the last two
/// tokens are the field and the value.
fn split_set_args(args: &str) -> Option<(&str, &str, &str)> {
    let (rest, value) = args.trim().rsplit_once(' ')?;
    let (product, field) = rest.trim_end().rsplit_once(' ')?;
    Some((product.trim(), field, value))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() > 3 {
        eprintln!("Usage: {} [workbook] [config.toml]", args[0]);
        return Ok(());
    }
    let workbook = args.get(1).map(String::as_str).unwrap_or("demos/workbook");
    let config = config::load_config(args.get(2).map(Path::new))?;
    let mut store = loader::load_spreadsheet(workbook)?;
    let catalog = CatalogCache::new();
    let mut session = InventorySession::new();
    let format = config.layout.date_format.clone();

    let mut start_time = Instant::now();
    let mut status = String::from("ok");
    loop {
        let elapsed_time = start_time.elapsed().as_secs_f64();
        let area = session
            .selection()
            .map(|s| s.area.clone())
            .unwrap_or_else(|| "-".to_string());
        let date = writer::format_date(session.date, &format).unwrap_or_else(|_| format.clone());
        print!("[{:.1}] ({}) {} {} > ", elapsed_time, status, area, date);
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        start_time = Instant::now();

        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        if command == "q" {
            break;
        }

        let result: inventory::Result<String> = (|| match command {
            "" => Ok("ok".to_string()),
            "help" => {
                print_help();
                Ok("ok".to_string())
            }
            "areas" => {
                let entries = catalog.get_or_load(&store, &config.catalog)?;
                for area in filter::areas(&entries, &config.catalog.excluded_areas) {
                    println!("  {}", area);
                }
                Ok("ok".to_string())
            }
            "area" => {
                let area = session.select(FilterSelection::new(rest))?;
                Ok(format!("area {}", area))
            }
            "cat" | "sub" | "prod" => {
                let mut selection = session
                    .selection()
                    .cloned()
                    .ok_or_else(|| inventory::InventoryError::InvalidArea("no area selected".into()))?;
                let choice = Choice::parse(rest);
                match command {
                    "cat" => {
                        selection.category = choice;
                        selection.sub_family = Choice::All;
                        selection.product = Choice::All;
                    }
                    "sub" => {
                        selection.sub_family = choice;
                        selection.product = Choice::All;
                    }
                    _ => selection.product = choice,
                }
                session.select(selection)?;
                Ok("ok".to_string())
            }
            "rows" => {
                let entries = catalog.get_or_load(&store, &config.catalog)?;
                for row in session.edit_rows(&entries)? {
                    let bottles = row.bottles.map(|b| format!("\t{}", b)).unwrap_or_default();
                    println!(
                        "  {:<30}\t{}\t{}\t{}\t{}{}",
                        row.product, row.unit, row.uom_quantity, row.closed, row.open, bottles
                    );
                }
                Ok("ok".to_string())
            }
            "set" => {
                let (product, field, value) = split_set_args(rest).ok_or_else(|| {
                    inventory::InventoryError::InvalidInput("set <PRODUCT> <FIELD> <N>".into())
                })?;
                let field = EditField::parse(field).ok_or_else(|| {
                    inventory::InventoryError::InvalidInput(format!("unknown field '{}'", field))
                })?;
                session.edit(product, field, Some(value))?;
                Ok("staged".to_string())
            }
            "preview" => {
                let entries = catalog.get_or_load(&store, &config.catalog)?;
                let rows = session.preview(&entries)?;
                for row in &rows {
                    println!(
                        "  {:<30}\tclosed {}\topen {}\tvalue {:.2}",
                        row.product, row.closed, row.open, row.value
                    );
                }
                println!("  total {:.2}", preview::preview_total(&rows));
                Ok(format!("{} rows", rows.len()))
            }
            "date" => {
                session.date = NaiveDate::parse_from_str(rest, &format).map_err(|e| {
                    inventory::InventoryError::InvalidInput(format!("invalid date '{}': {}", rest, e))
                })?;
                Ok("ok".to_string())
            }
            "save" => {
                let entries = catalog.get_or_load(&store, &config.catalog)?;
                let report = session.save(&mut store, &entries, &config)?;
                if !report.missing_products.is_empty() {
                    println!("  not found: {}", report.missing_products.join(", "));
                }
                Ok(format!("{} rows saved", report.rows_written))
            }
            "comment" => {
                session.save_comment(&mut store, &config, rest)?;
                Ok("comment saved".to_string())
            }
            "reset" => {
                let area = session.request_reset()?;
                println!("  This clears every quantity and the comment of {}. Type 'yes' or 'no'.", area);
                Ok("confirm?".to_string())
            }
            "yes" => {
                let written = session.confirm_reset(&mut store, &config)?;
                Ok(format!("{} cells cleared", written))
            }
            "no" => {
                session.cancel_reset()?;
                Ok("cancelled".to_string())
            }
            "view" => {
                let mut parts = rest.split_whitespace();
                let tab = parts.next().unwrap_or_default();
                let view_row = parts.next().and_then(|r| r.parse().ok()).unwrap_or(0);
                let view_col = parts.next().and_then(|c| c.parse().ok()).unwrap_or(0);
                store.worksheet(tab)?.display(view_row, view_col);
                Ok("ok".to_string())
            }
            "export" => {
                print!("{}", downloader::to_csv(store.worksheet(rest)?)?);
                Ok("ok".to_string())
            }
            "reload" => {
                catalog.invalidate();
                Ok("catalog invalidated".to_string())
            }
            "snapshot" => {
                saving::save_spreadsheet(&store, rest)?;
                Ok(format!("saved to {}", rest))
            }
            _ => Ok("invalid command".to_string()),
        })();

        status = match result {
            Ok(message) => message,
            Err(e) => {
                eprintln!("  error: {}", e);
                String::from("error")
            }
        };
        if let ResetState::AwaitingConfirmation(area) = session.reset_state() {
            status = format!("reset {}?", area);
        }
    }

    Ok(())
}

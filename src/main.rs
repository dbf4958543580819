// Entry point and high-level CLI flow.
//
// - Option [1] loads the sales export and normalizes it, printing
//   diagnostics and the covered date span.
// - Option [2] assembles the full dashboard report, writes the JSON payload
//   plus two CSV exports, and prints the KPI block and table previews.
// - After generating the report, the user can go back to the menu or exit.
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::Mutex;

use ventas_report::types::{
    CanonicalRecord, DateSpan, MonthTrendRow, ProductMixRow, RankedRow, Report, View, ViewData,
};
use ventas_report::{loader, normalizer, output, report, util};

const INPUT_PATH: &str = "ventas.csv";
const REPORT_PATH: &str = "report.json";
const PRODUCT_MIX_PATH: &str = "product_mix.csv";
const MONTHLY_TREND_PATH: &str = "monthly_trend.csv";

// Simple in-memory app state so we only load/normalize the export once but
// can generate reports multiple times in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<(Vec<CanonicalRecord>, Option<DateSpan>)>,
}

/// Read a single line of input after printing the common "Enter choice:"
/// prompt.
fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask the user whether to go back to the menu after generating the report.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to menu (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).ok();
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: load and normalize the sales export.
fn handle_load() {
    match loader::load_rows(INPUT_PATH) {
        Ok(rows) => {
            let (records, info) = normalizer::normalize_rows(&rows);
            println!(
                "Processing dataset... ({} rows loaded)",
                util::format_int(info.rows_in as i64)
            );
            if info.rows_without_sale_date > 0 {
                println!(
                    "Note: {} rows have no parseable sale date.",
                    util::format_int(info.rows_without_sale_date as i64)
                );
            }
            match info.span {
                Some(span) => println!("Periodo: {} a {}\n", span.from, span.to),
                None => println!("Periodo: no disponible\n"),
            }
            let mut state = APP_STATE.lock().unwrap();
            state.data = Some((records, info.span));
        }
        Err(e) => {
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

/// Handle option [2]: assemble the report, write the renderer payload and
/// the CSV exports, and print previews.
fn handle_generate_report() {
    let data = {
        let state = APP_STATE.lock().unwrap();
        state.data.clone()
    };
    let Some((records, span)) = data else {
        println!("Error: No data loaded. Please load the export first (option 1).\n");
        return;
    };

    println!("Generating dashboard report...\n");
    let rep = report::assemble(&records, span);

    if let Err(e) = output::write_json(REPORT_PATH, &rep) {
        eprintln!("Write error: {}", e);
    }
    let mix = product_mix_rows(&rep);
    if let Err(e) = output::write_csv(PRODUCT_MIX_PATH, &mix) {
        eprintln!("Write error: {}", e);
    }
    let trend = month_trend_rows(&rep);
    if let Err(e) = output::write_csv(MONTHLY_TREND_PATH, &trend) {
        eprintln!("Write error: {}", e);
    }

    print_kpi_block(&rep);

    println!("{}", rep.top_dates_by_value.title);
    output::preview_table(&money_rows(&rep.top_dates_by_value), 3);
    println!("{}", rep.top_products_by_revenue.title);
    output::preview_table(&money_rows(&rep.top_products_by_revenue), 3);
    println!("{}", rep.product_mix.title);
    output::preview_table(&mix, 3);

    println!(
        "(Full report exported to {}, tables to {} and {})\n",
        REPORT_PATH, PRODUCT_MIX_PATH, MONTHLY_TREND_PATH
    );
}

fn print_kpi_block(rep: &Report) {
    let k = &rep.kpis;
    println!("KPIs PRINCIPALES");
    println!("================");
    println!("GMV (Ventas Brutas):      {}", util::format_money(k.gross_value));
    println!("Ventas Netas:             {}", util::format_money(k.net_value));
    println!("Unidades Vendidas:        {}", util::format_int(k.total_units as i64));
    println!("Ingresos por Productos:   {}", util::format_money(k.product_revenue));
    println!("Ventas atribuidas a Ads:  {}", util::format_money(k.advertised_value));
    println!("Ventas sin Ads:           {}", util::format_money(k.organic_value));
    println!();
    println!(
        "Participación atribuida a publicidad: {:.1}%",
        k.advertised_share_pct
    );
    println!(
        "Ticket Promedio (GMV/tx): {}\n",
        util::format_money(k.average_ticket)
    );
}

/// Flatten a category view into ranked preview rows with money formatting.
fn money_rows(view: &View) -> Vec<RankedRow> {
    match &view.data {
        ViewData::Categories { categories, values } => categories
            .iter()
            .zip(values)
            .enumerate()
            .map(|(i, (category, value))| RankedRow {
                rank: i + 1,
                category: category.clone(),
                value: util::format_money(*value),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn product_mix_rows(rep: &Report) -> Vec<ProductMixRow> {
    match &rep.product_mix.data {
        ViewData::MultiSeries { categories, series } if series.len() == 2 => categories
            .iter()
            .enumerate()
            .map(|(i, product)| ProductMixRow {
                product: product.clone(),
                value: util::format_money(series[0].values[i]),
                units: util::format_int(series[1].values[i] as i64),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn month_trend_rows(rep: &Report) -> Vec<MonthTrendRow> {
    match &rep.monthly_trend.data {
        ViewData::Categories { categories, values } => categories
            .iter()
            .zip(values)
            .map(|(month, value)| MonthTrendRow {
                month: month.clone(),
                value: util::format_money(*value),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn main() {
    loop {
        println!("Dashboard de Ventas");
        println!("[1] Load the sales export");
        println!("[2] Generate dashboard report\n");
        match read_choice().as_str() {
            "1" => {
                handle_load();
            }
            "2" => {
                println!();
                handle_generate_report();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1 or 2.\n");
            }
        }
    }
}

use chrono::{NaiveDate, Weekday};
use serde::Serialize;
use tabled::Tabled;

/// One cell of the source export, as handed over by the decoding layer.
///
/// Spreadsheet decoders produce typed values (`Number`, `Date`) while a CSV
/// export produces only text; the scalar parsers accept all four variants so
/// either feed works.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Absent,
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

/// One transaction row keyed off the export's contract columns, before any
/// type coercion. A column missing from the file leaves its field `Absent`
/// in every row.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    pub sale_date: Cell,
    pub transit_date: Cell,
    pub delivery_date: Cell,
    pub advertised: Cell,
    pub total: Cell,
    pub product_revenue: Cell,
    pub units: Cell,
    pub unit_price: Cell,
    pub fees_and_taxes: Cell,
    pub shipping_cost: Cell,
    pub product_id: Cell,
    pub state: Cell,
    pub municipality: Cell,
}

/// The normalized representation of one transaction. Base fields keep their
/// parse result (`None` when the cell was unreadable); derived fields are
/// computed once at construction and never change afterwards.
#[derive(Debug, Clone)]
pub struct CanonicalRecord {
    pub sale_date: Option<NaiveDate>,
    pub transit_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub advertised: Option<bool>,
    pub total: Option<f64>,
    pub product_revenue: Option<f64>,
    pub units: Option<f64>,
    pub unit_price: Option<f64>,
    pub fees_and_taxes: Option<f64>,
    pub shipping_cost: Option<f64>,
    pub product_id: String,
    pub state: String,
    pub municipality: String,
    /// |total|, absent when the total was unreadable.
    pub sale_value: Option<f64>,
    /// Days from sale to delivery, only when within the [0, 60] window.
    pub delivery_days: Option<f64>,
    /// `YYYY-MM` bucket of the sale date.
    pub period_key: Option<String>,
    /// `YYYY-MM-DD` bucket of the sale date.
    pub date_key: Option<String>,
    pub weekday: Option<Weekday>,
    pub month_name: Option<&'static str>,
    /// product revenue + fees and taxes + shipping, absent addends as zero.
    pub operating_margin: f64,
}

/// Earliest and latest sale date seen in the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DateSpan {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Headline summary metrics of the whole dataset.
#[derive(Debug, Clone, Serialize)]
pub struct Kpis {
    pub gross_value: f64,
    pub net_value: f64,
    pub total_units: f64,
    pub product_revenue: f64,
    pub advertised_value: f64,
    pub organic_value: f64,
    pub advertised_share_pct: f64,
    pub average_ticket: f64,
    pub transactions: usize,
}

/// How the renderer should draw a view. Carried in the payload because the
/// state-distribution view switches kind on a category-count threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    BarHorizontal,
    Pie,
    Line,
    Area,
    GroupedBars,
    DualAxisBars,
    ComboBarLine,
    Histogram,
    Scatter,
}

#[derive(Debug, Clone, Serialize)]
pub struct NamedSeries {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScatterPoint {
    pub day: u32,
    pub value: f64,
    pub label: String,
}

/// The shape of one aggregation result.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ViewData {
    Categories {
        categories: Vec<String>,
        values: Vec<f64>,
    },
    MultiSeries {
        categories: Vec<String>,
        series: Vec<NamedSeries>,
    },
    Histogram {
        labels: Vec<String>,
        counts: Vec<u64>,
        mean: f64,
        median: f64,
    },
    Scatter {
        points: Vec<ScatterPoint>,
    },
    /// The view's required inputs were entirely absent; the renderer should
    /// show an empty state instead of misleading zeros.
    Unavailable,
}

#[derive(Debug, Clone, Serialize)]
pub struct View {
    pub title: String,
    pub chart: ChartKind,
    pub data: ViewData,
}

/// The full dashboard payload handed to the rendering collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub period: Option<DateSpan>,
    pub kpis: Kpis,
    pub top_dates_by_value: View,
    pub top_products_by_units: View,
    pub top_products_by_revenue: View,
    pub value_by_state: View,
    pub state_distribution: View,
    pub delivery_by_weekday: View,
    pub advertised_daily: View,
    pub advertised_totals: View,
    pub product_mix: View,
    pub monthly_trend: View,
    pub unit_price_histogram: View,
    pub top_days_of_month: View,
    pub top_municipalities: View,
    pub margin_by_state: View,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RankedRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Categoria")]
    #[tabled(rename = "Categoria")]
    pub category: String,
    #[serde(rename = "Valor")]
    #[tabled(rename = "Valor")]
    pub value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ProductMixRow {
    #[serde(rename = "IDproducto")]
    #[tabled(rename = "IDproducto")]
    pub product: String,
    #[serde(rename = "Ventas")]
    #[tabled(rename = "Ventas")]
    pub value: String,
    #[serde(rename = "Unidades")]
    #[tabled(rename = "Unidades")]
    pub units: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MonthTrendRow {
    #[serde(rename = "Mes")]
    #[tabled(rename = "Mes")]
    pub month: String,
    #[serde(rename = "Ventas")]
    #[tabled(rename = "Ventas")]
    pub value: String,
}

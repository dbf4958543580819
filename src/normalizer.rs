// Raw row -> canonical record.
//
// One pass over the loaded rows produces the immutable record set the
// aggregation engine works on, plus the dataset's date span for the report
// header. A malformed row never aborts the pass; it just yields a record
// with more absent fields.
use crate::parsers::{parse_date_smart, parse_number, parse_tri_boolean};
use crate::types::{CanonicalRecord, Cell, DateSpan, RawRow};
use chrono::Datelike;

/// Shown in place of a blank identifying string so blanks still group.
pub const PLACEHOLDER: &str = "—";

/// Longest believable sale-to-delivery span in days; anything outside
/// [0, MAX_DELIVERY_DAYS] is a data-entry error, dropped rather than clamped.
const MAX_DELIVERY_DAYS: f64 = 60.0;

const MONTH_NAMES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Diagnostics of a normalization pass, for the loading console output.
#[derive(Debug, Clone)]
pub struct NormalizeReport {
    pub rows_in: usize,
    pub rows_without_sale_date: usize,
    /// `None` when no row carried a parseable sale date; reported as
    /// unavailable, never as a zero-length range.
    pub span: Option<DateSpan>,
}

pub fn normalize_rows(rows: &[RawRow]) -> (Vec<CanonicalRecord>, NormalizeReport) {
    let records: Vec<CanonicalRecord> = rows.iter().map(normalize_row).collect();

    let rows_without_sale_date = records.iter().filter(|r| r.sale_date.is_none()).count();
    let mut dates: Vec<_> = records.iter().filter_map(|r| r.sale_date).collect();
    dates.sort();
    let span = match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => Some(DateSpan {
            from: *first,
            to: *last,
        }),
        _ => None,
    };

    let report = NormalizeReport {
        rows_in: rows.len(),
        rows_without_sale_date,
        span,
    };
    (records, report)
}

pub fn normalize_row(row: &RawRow) -> CanonicalRecord {
    let sale_date = parse_date_smart(&row.sale_date);
    let transit_date = parse_date_smart(&row.transit_date);
    let delivery_date = parse_date_smart(&row.delivery_date);
    let advertised = parse_tri_boolean(&row.advertised);

    let total = parse_number(&row.total);
    let product_revenue = parse_number(&row.product_revenue);
    let units = parse_number(&row.units);
    let unit_price = parse_number(&row.unit_price);
    let fees_and_taxes = parse_number(&row.fees_and_taxes);
    let shipping_cost = parse_number(&row.shipping_cost);

    let sale_value = total.map(f64::abs);
    let delivery_days = match (sale_date, delivery_date) {
        (Some(sold), Some(delivered)) => {
            let days = (delivered - sold).num_days() as f64;
            (0.0..=MAX_DELIVERY_DAYS).contains(&days).then_some(days)
        }
        _ => None,
    };
    let period_key = sale_date.map(|d| d.format("%Y-%m").to_string());
    let date_key = sale_date.map(|d| d.format("%Y-%m-%d").to_string());
    let weekday = sale_date.map(|d| d.weekday());
    let month_name = sale_date.map(|d| MONTH_NAMES[d.month0() as usize]);
    let operating_margin = product_revenue.unwrap_or(0.0)
        + fees_and_taxes.unwrap_or(0.0)
        + shipping_cost.unwrap_or(0.0);

    CanonicalRecord {
        sale_date,
        transit_date,
        delivery_date,
        advertised,
        total,
        product_revenue,
        units,
        unit_price,
        fees_and_taxes,
        shipping_cost,
        product_id: identifier(&row.product_id),
        state: identifier(&row.state),
        municipality: identifier(&row.municipality),
        sale_value,
        delivery_days,
        period_key,
        date_key,
        weekday,
        month_name,
        operating_margin,
    }
}

fn identifier(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) if !s.trim().is_empty() => s.trim().to_string(),
        // Spreadsheet feeds sometimes carry product ids as numbers.
        Cell::Number(n) if n.fract() == 0.0 && n.is_finite() => format!("{}", *n as i64),
        Cell::Number(n) if n.is_finite() => n.to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Weekday};

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn dated_row(sale: &str, delivery: &str) -> RawRow {
        RawRow {
            sale_date: text(sale),
            delivery_date: text(delivery),
            ..RawRow::default()
        }
    }

    #[test]
    fn delivery_window_is_inclusive_at_sixty_days() {
        let at_limit = normalize_row(&dated_row("2024-01-01", "2024-03-01"));
        assert_eq!(at_limit.delivery_days, Some(60.0));

        let past_limit = normalize_row(&dated_row("2024-01-01", "2024-03-06"));
        assert_eq!(past_limit.delivery_days, None);

        let negative = normalize_row(&dated_row("2024-01-10", "2024-01-05"));
        assert_eq!(negative.delivery_days, None);
    }

    #[test]
    fn date_derived_fields_follow_the_sale_date() {
        let rec = normalize_row(&RawRow {
            sale_date: text("2024-01-05"),
            ..RawRow::default()
        });
        assert_eq!(rec.period_key.as_deref(), Some("2024-01"));
        assert_eq!(rec.date_key.as_deref(), Some("2024-01-05"));
        assert_eq!(rec.weekday, Some(Weekday::Fri));
        assert_eq!(rec.month_name, Some("enero"));

        let undated = normalize_row(&RawRow::default());
        assert_eq!(undated.period_key, None);
        assert_eq!(undated.date_key, None);
        assert_eq!(undated.weekday, None);
        assert_eq!(undated.month_name, None);
        assert_eq!(undated.delivery_days, None);
    }

    #[test]
    fn blank_identifiers_get_the_placeholder() {
        let rec = normalize_row(&RawRow {
            state: text("  Jalisco  "),
            ..RawRow::default()
        });
        assert_eq!(rec.state, "Jalisco");
        assert_eq!(rec.product_id, PLACEHOLDER);
        assert_eq!(rec.municipality, PLACEHOLDER);
    }

    #[test]
    fn operating_margin_substitutes_zero_for_absent_addends() {
        let rec = normalize_row(&RawRow {
            product_revenue: Cell::Number(80.0),
            shipping_cost: text("-12.50"),
            ..RawRow::default()
        });
        assert_eq!(rec.operating_margin, 67.5);
    }

    #[test]
    fn sale_value_is_the_absolute_total() {
        let rec = normalize_row(&RawRow {
            total: text("-100"),
            ..RawRow::default()
        });
        assert_eq!(rec.total, Some(-100.0));
        assert_eq!(rec.sale_value, Some(100.0));
    }

    #[test]
    fn span_covers_the_dataset_or_is_unavailable() {
        let rows = vec![
            RawRow {
                sale_date: text("2024-02-01"),
                ..RawRow::default()
            },
            RawRow::default(),
            RawRow {
                sale_date: text("2024-01-05"),
                ..RawRow::default()
            },
        ];
        let (records, report) = normalize_rows(&rows);
        assert_eq!(records.len(), 3);
        assert_eq!(report.rows_in, 3);
        assert_eq!(report.rows_without_sale_date, 1);
        let span = report.span.unwrap();
        assert_eq!(span.from, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(span.to, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());

        let (_, empty) = normalize_rows(&[RawRow::default()]);
        assert_eq!(empty.span, None);
    }
}

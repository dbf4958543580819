// Report assembly: the fixed view set and the KPI battery.
//
// Each view function picks its key/value extractors, runs the aggregation
// engine, and shapes the result into a payload the renderer can draw without
// further computation. Ordering and truncation rules here are part of the
// output contract.
use crate::aggregate::{self, Direction};
use crate::types::{
    CanonicalRecord, ChartKind, DateSpan, Kpis, NamedSeries, Report, ScatterPoint, View, ViewData,
};
use chrono::{Datelike, Weekday};
use std::collections::HashMap;

/// At most this many distinct states render as a pie; above it the view
/// becomes ranked bars. A usability threshold, part of the output contract.
const PIE_CATEGORY_LIMIT: usize = 8;
const DISTRIBUTION_BAR_LIMIT: usize = 15;
const HISTOGRAM_BINS: usize = 30;
/// The advertised-vs-organic daily view covers the last N observed dates.
const DAILY_WINDOW: usize = 30;

const WEEKDAY_AXIS: [(Weekday, &str); 7] = [
    (Weekday::Mon, "Lun"),
    (Weekday::Tue, "Mar"),
    (Weekday::Wed, "Mié"),
    (Weekday::Thu, "Jue"),
    (Weekday::Fri, "Vie"),
    (Weekday::Sat, "Sáb"),
    (Weekday::Sun, "Dom"),
];

pub fn assemble(records: &[CanonicalRecord], period: Option<DateSpan>) -> Report {
    Report {
        period,
        kpis: kpis(records),
        top_dates_by_value: top_dates_by_value(records),
        top_products_by_units: top_products_by_units(records),
        top_products_by_revenue: top_products_by_revenue(records),
        value_by_state: value_by_state(records),
        state_distribution: state_distribution(records),
        delivery_by_weekday: delivery_by_weekday(records),
        advertised_daily: advertised_daily(records),
        advertised_totals: advertised_totals(records),
        product_mix: product_mix(records),
        monthly_trend: monthly_trend(records),
        unit_price_histogram: unit_price_histogram(records),
        top_days_of_month: top_days_of_month(records),
        top_municipalities: top_municipalities(records),
        margin_by_state: margin_by_state(records),
    }
}

pub fn kpis(records: &[CanonicalRecord]) -> Kpis {
    let gross_value: f64 = records.iter().filter_map(|r| r.sale_value).sum();
    let net_value: f64 = records.iter().filter_map(|r| r.total).sum();
    let total_units: f64 = records.iter().filter_map(|r| r.units).sum();
    let product_revenue: f64 = records.iter().filter_map(|r| r.product_revenue).sum();
    let split = aggregate::split_sums(records, |r| r.advertised, |r| r.sale_value);
    let advertised_share_pct = if gross_value > 0.0 {
        split.flagged / gross_value * 100.0
    } else {
        0.0
    };
    let average_ticket = gross_value / records.len().max(1) as f64;
    Kpis {
        gross_value,
        net_value,
        total_units,
        product_revenue,
        advertised_value: split.flagged,
        organic_value: split.unflagged,
        advertised_share_pct,
        average_ticket,
        transactions: records.len(),
    }
}

fn categories_view(title: &str, chart: ChartKind, groups: Vec<(String, f64)>) -> View {
    let (categories, values) = groups.into_iter().unzip();
    View {
        title: title.to_string(),
        chart,
        data: ViewData::Categories { categories, values },
    }
}

fn top_dates_by_value(records: &[CanonicalRecord]) -> View {
    let sums = aggregate::sum_by_key(records, |r| r.date_key.clone(), |r| r.sale_value);
    let mut top = aggregate::rank_by_value(sums, Direction::Descending, Some(10));
    // Reversed so the bars read bottom-up as ascending.
    top.reverse();
    categories_view("Top 10 fechas por ventas", ChartKind::Bar, top)
}

fn top_products_by_units(records: &[CanonicalRecord]) -> View {
    let sums = aggregate::sum_by_key(records, |r| Some(r.product_id.clone()), |r| r.units);
    let mut top = aggregate::rank_by_value(sums, Direction::Descending, Some(10));
    top.reverse();
    categories_view(
        "Top 10 productos por unidades",
        ChartKind::BarHorizontal,
        top,
    )
}

fn top_products_by_revenue(records: &[CanonicalRecord]) -> View {
    let sums = aggregate::sum_by_key(
        records,
        |r| Some(r.product_id.clone()),
        |r| r.product_revenue,
    );
    let mut top = aggregate::rank_by_value(sums, Direction::Descending, Some(10));
    top.reverse();
    categories_view(
        "Top 10 productos por ingresos",
        ChartKind::BarHorizontal,
        top,
    )
}

fn value_by_state(records: &[CanonicalRecord]) -> View {
    let sums = aggregate::sum_by_key(records, |r| Some(r.state.clone()), |r| r.sale_value);
    let ranked = aggregate::rank_by_value(sums, Direction::Ascending, None);
    categories_view("Ventas por estado", ChartKind::BarHorizontal, ranked)
}

fn state_distribution(records: &[CanonicalRecord]) -> View {
    let sums = aggregate::sum_by_key(records, |r| Some(r.state.clone()), |r| r.sale_value);
    let ranked = aggregate::rank_by_value(sums, Direction::Descending, None);
    if ranked.len() <= PIE_CATEGORY_LIMIT {
        categories_view("Distribución por estado", ChartKind::Pie, ranked)
    } else {
        let mut top = ranked;
        top.truncate(DISTRIBUTION_BAR_LIMIT);
        let top = aggregate::rank_by_value(top, Direction::Ascending, None);
        categories_view("Distribución por estado", ChartKind::BarHorizontal, top)
    }
}

fn delivery_by_weekday(records: &[CanonicalRecord]) -> View {
    let means = aggregate::mean_by_key(records, |r| r.weekday, |r| r.delivery_days);
    let mut categories = Vec::with_capacity(WEEKDAY_AXIS.len());
    let mut values = Vec::with_capacity(WEEKDAY_AXIS.len());
    for (day, label) in WEEKDAY_AXIS {
        categories.push(label.to_string());
        values.push(
            means
                .iter()
                .find(|(k, _)| *k == day)
                .map(|(_, v)| *v)
                .unwrap_or(0.0),
        );
    }
    View {
        title: "Tiempo de entrega promedio por día de la semana".to_string(),
        chart: ChartKind::Line,
        data: ViewData::Categories { categories, values },
    }
}

fn advertised_daily(records: &[CanonicalRecord]) -> View {
    // Axis: dates where the flag is known, ascending, last 30.
    let mut dates: Vec<String> = records
        .iter()
        .filter(|r| r.advertised.is_some())
        .filter_map(|r| r.date_key.clone())
        .collect();
    dates.sort();
    dates.dedup();
    let start = dates.len().saturating_sub(DAILY_WINDOW);
    let window = dates.split_off(start);

    let organic = daily_sums(records, false);
    let advertised = daily_sums(records, true);
    let series = vec![
        NamedSeries {
            name: "Sin Publicidad".to_string(),
            values: window
                .iter()
                .map(|d| organic.get(d).copied().unwrap_or(0.0))
                .collect(),
        },
        NamedSeries {
            name: "Con Publicidad".to_string(),
            values: window
                .iter()
                .map(|d| advertised.get(d).copied().unwrap_or(0.0))
                .collect(),
        },
    ];
    View {
        title: "Ventas con y sin publicidad (últimos 30 días)".to_string(),
        chart: ChartKind::GroupedBars,
        data: ViewData::MultiSeries {
            categories: window,
            series,
        },
    }
}

fn daily_sums(records: &[CanonicalRecord], advertised: bool) -> HashMap<String, f64> {
    aggregate::sum_by_key(
        records,
        |r| {
            (r.advertised == Some(advertised))
                .then(|| r.date_key.clone())
                .flatten()
        },
        |r| r.sale_value,
    )
    .into_iter()
    .collect()
}

fn advertised_totals(records: &[CanonicalRecord]) -> View {
    let value_split = aggregate::split_sums(records, |r| r.advertised, |r| r.sale_value);
    let unit_split = aggregate::split_sums(records, |r| r.advertised, |r| r.units);
    View {
        title: "Comparación global con y sin publicidad".to_string(),
        chart: ChartKind::DualAxisBars,
        data: ViewData::MultiSeries {
            categories: vec!["Con Publicidad".to_string(), "Sin Publicidad".to_string()],
            series: vec![
                NamedSeries {
                    name: "Ventas (MXN)".to_string(),
                    values: vec![value_split.flagged, value_split.unflagged],
                },
                NamedSeries {
                    name: "Unidades".to_string(),
                    values: vec![unit_split.flagged, unit_split.unflagged],
                },
            ],
        },
    }
}

fn product_mix(records: &[CanonicalRecord]) -> View {
    let value_sums = aggregate::sum_by_key(records, |r| Some(r.product_id.clone()), |r| r.sale_value);
    let top = aggregate::rank_by_value(value_sums, Direction::Descending, Some(15));
    let unit_sums: HashMap<String, f64> =
        aggregate::sum_by_key(records, |r| Some(r.product_id.clone()), |r| r.units)
            .into_iter()
            .collect();
    let units: Vec<f64> = top
        .iter()
        .map(|(id, _)| unit_sums.get(id).copied().unwrap_or(0.0))
        .collect();
    let (categories, values): (Vec<String>, Vec<f64>) = top.into_iter().unzip();
    View {
        title: "Ventas y unidades por producto (Top 15)".to_string(),
        chart: ChartKind::ComboBarLine,
        data: ViewData::MultiSeries {
            categories,
            series: vec![
                NamedSeries {
                    name: "Ventas (MXN)".to_string(),
                    values,
                },
                NamedSeries {
                    name: "Unidades".to_string(),
                    values: units,
                },
            ],
        },
    }
}

fn monthly_trend(records: &[CanonicalRecord]) -> View {
    let series = aggregate::time_series(records, |r| r.period_key.clone(), |r| r.sale_value);
    categories_view("Evolución mensual de ventas", ChartKind::Area, series)
}

fn unit_price_histogram(records: &[CanonicalRecord]) -> View {
    let values: Vec<f64> = records.iter().filter_map(|r| r.unit_price).collect();
    let title = "Distribución de precios unitarios".to_string();
    match aggregate::histogram(&values, HISTOGRAM_BINS) {
        Some(h) => View {
            title,
            chart: ChartKind::Histogram,
            data: ViewData::Histogram {
                labels: h.edges.iter().map(|e| format!("{:.0}", e)).collect(),
                counts: h.counts,
                mean: h.mean,
                median: h.median,
            },
        },
        None => View {
            title,
            chart: ChartKind::Histogram,
            data: ViewData::Unavailable,
        },
    }
}

fn top_days_of_month(records: &[CanonicalRecord]) -> View {
    // Month buckets aggregate across years: the 5th of every January lands
    // in ("enero", 5).
    let sums = aggregate::sum_by_key(
        records,
        |r| match (r.month_name, r.sale_date) {
            (Some(month), Some(date)) => Some((month, date.day())),
            _ => None,
        },
        |r| r.sale_value,
    );
    let top = aggregate::rank_by_value(sums, Direction::Descending, Some(20));
    let points = top
        .into_iter()
        .map(|((month, day), value)| ScatterPoint {
            day,
            value,
            label: month.to_string(),
        })
        .collect();
    View {
        title: "Top 20 días del mes por ventas".to_string(),
        chart: ChartKind::Scatter,
        data: ViewData::Scatter { points },
    }
}

fn top_municipalities(records: &[CanonicalRecord]) -> View {
    let sums = aggregate::sum_by_key(records, |r| Some(r.municipality.clone()), |r| r.sale_value);
    let mut top = aggregate::rank_by_value(sums, Direction::Descending, Some(10));
    top.reverse();
    categories_view("Top 10 municipios por ventas", ChartKind::BarHorizontal, top)
}

fn margin_by_state(records: &[CanonicalRecord]) -> View {
    let means = aggregate::mean_by_key(
        records,
        |r| Some(r.state.clone()),
        |r| Some(r.operating_margin),
    );
    let ranked = aggregate::rank_by_value(means, Direction::Ascending, None);
    categories_view(
        "Margen operativo promedio por estado",
        ChartKind::BarHorizontal,
        ranked,
    )
}

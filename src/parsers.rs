// Scalar parsers over raw export cells.
//
// Every parser here is failure-to-absent: a cell that cannot be read as the
// requested type yields `None`, never an error, so one bad cell can only
// ever blank out its own field.
use crate::types::Cell;
use chrono::{Duration, NaiveDate};

/// Offset between the spreadsheet date-serial epoch (1899-12-30) and the
/// Unix epoch, in days.
const SERIAL_UNIX_OFFSET: f64 = 25_569.0;

/// Parse a cell as a decimal number.
///
/// Numeric cells pass through unchanged (when finite). Text cells are
/// trimmed, then stripped of the decorations the export puts on amounts
/// like `"$1,234.50 MXN"`: the currency symbol, thousands separators,
/// whitespace, and the letters of the currency code.
pub fn parse_number(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Absent | Cell::Date(_) => None,
        Cell::Number(n) => n.is_finite().then_some(*n),
        Cell::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            let cleaned: String = s
                .chars()
                .filter(|c| {
                    !c.is_whitespace()
                        && !matches!(c, '$' | ',')
                        && !matches!(c.to_ascii_lowercase(), 'm' | 'x' | 'n')
                })
                .collect();
            cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
        }
    }
}

/// Parse a cell as a calendar date, polymorphic over the cell's shape.
///
/// - `Date` passes through.
/// - `Number` is read as a spreadsheet date serial (serials <= 0 rejected).
/// - `Text` tries an ISO `YYYY-MM-DD...` prefix, then `DD/MM/YYYY`, then a
///   couple of generic fallback formats.
pub fn parse_date_smart(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Absent => None,
        Cell::Date(d) => Some(*d),
        Cell::Number(n) => serial_to_date(*n),
        Cell::Text(s) => parse_date_text(s.trim()),
    }
}

fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial <= 0.0 {
        return None;
    }
    // Fractional serials carry a time of day; round to the nearest second
    // and truncate to the day.
    let secs = ((serial - SERIAL_UNIX_OFFSET) * 86_400.0).round() as i64;
    let days = secs.div_euclid(86_400);
    // `NaiveDate::default()` is the Unix epoch, 1970-01-01.
    NaiveDate::default().checked_add_signed(Duration::try_days(days)?)
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    if is_iso_prefix(s) {
        return NaiveDate::parse_from_str(&s[..10], "%Y-%m-%d").ok();
    }
    if is_dmy_prefix(s) {
        return NaiveDate::parse_from_str(&s[..10], "%d/%m/%Y").ok();
    }
    for fmt in ["%Y/%m/%d", "%d-%m-%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

fn is_iso_prefix(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b[..4].iter().all(u8::is_ascii_digit)
        && b[5..7].iter().all(u8::is_ascii_digit)
        && b[8..10].iter().all(u8::is_ascii_digit)
}

fn is_dmy_prefix(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 10
        && b[2] == b'/'
        && b[5] == b'/'
        && b[..2].iter().all(u8::is_ascii_digit)
        && b[3..5].iter().all(u8::is_ascii_digit)
        && b[6..10].iter().all(u8::is_ascii_digit)
}

/// Parse a cell as a tri-state boolean flag.
///
/// The export writes the advertising flag in several spellings; anything
/// outside the lexicon is unknown (`None`), not `false`.
pub fn parse_tri_boolean(cell: &Cell) -> Option<bool> {
    match cell {
        Cell::Number(n) if *n == 1.0 => Some(true),
        Cell::Number(n) if *n == 0.0 => Some(false),
        Cell::Text(s) => match normalize_key(s).as_str() {
            "si" | "yes" | "true" | "1" => Some(true),
            "no" | "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Trimmed, lower-cased, diacritic-folded form of a string, used wherever a
/// value is the basis of a lookup or grouping key. Never shown to the user.
pub fn normalize_key(raw: &str) -> String {
    raw.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(fold_diacritic)
        .collect()
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn currency_strings_parse_like_their_stripped_form() {
        assert_eq!(parse_number(&text("$1,234.50 MXN")), Some(1234.5));
        assert_eq!(
            parse_number(&text("$1,234.50 MXN")),
            parse_number(&text("1234.50"))
        );
        assert_eq!(parse_number(&text(" -100 ")), Some(-100.0));
    }

    #[test]
    fn numeric_cells_pass_through_when_finite() {
        assert_eq!(parse_number(&Cell::Number(42.5)), Some(42.5));
        assert_eq!(parse_number(&Cell::Number(f64::NAN)), None);
        assert_eq!(parse_number(&Cell::Number(f64::INFINITY)), None);
    }

    #[test]
    fn unparseable_numbers_are_absent() {
        assert_eq!(parse_number(&text("")), None);
        assert_eq!(parse_number(&text("pendiente")), None);
        assert_eq!(parse_number(&Cell::Absent), None);
        assert_eq!(parse_number(&Cell::Date(NaiveDate::default())), None);
    }

    #[test]
    fn spreadsheet_serials_map_to_fixed_days() {
        // 44000 - 25569 = 18431 days after 1970-01-01.
        assert_eq!(
            parse_date_smart(&Cell::Number(44000.0)),
            NaiveDate::from_ymd_opt(2020, 6, 18)
        );
        assert_eq!(parse_date_smart(&Cell::Number(0.0)), None);
        assert_eq!(parse_date_smart(&Cell::Number(-7.0)), None);
    }

    #[test]
    fn serial_round_trips_a_calendar_day() {
        let day = NaiveDate::from_ymd_opt(2021, 3, 15).unwrap();
        let serial = (day - NaiveDate::default()).num_days() as f64 + 25_569.0;
        assert_eq!(parse_date_smart(&Cell::Number(serial)), Some(day));
    }

    #[test]
    fn date_strings_parse_by_shape() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 5);
        assert_eq!(parse_date_smart(&text("2024-01-05")), day);
        assert_eq!(parse_date_smart(&text("2024-01-05T10:30:00")), day);
        assert_eq!(parse_date_smart(&text("05/01/2024")), day);
        assert_eq!(parse_date_smart(&text("2024/01/05")), day);
        assert_eq!(parse_date_smart(&text("mañana")), None);
    }

    #[test]
    fn native_dates_pass_through() {
        let day = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(parse_date_smart(&Cell::Date(day)), Some(day));
    }

    #[test]
    fn tri_boolean_lexicon() {
        assert_eq!(parse_tri_boolean(&text("Sí")), Some(true));
        assert_eq!(parse_tri_boolean(&text("SI")), Some(true));
        assert_eq!(parse_tri_boolean(&text("1")), Some(true));
        assert_eq!(parse_tri_boolean(&text("no")), Some(false));
        assert_eq!(parse_tri_boolean(&text("maybe")), None);
        assert_eq!(parse_tri_boolean(&Cell::Number(1.0)), Some(true));
        assert_eq!(parse_tri_boolean(&Cell::Number(0.0)), Some(false));
        assert_eq!(parse_tri_boolean(&Cell::Number(2.0)), None);
        assert_eq!(parse_tri_boolean(&Cell::Absent), None);
    }

    #[test]
    fn normalize_key_folds_case_and_accents() {
        assert_eq!(normalize_key("  Municipio/Alcaldía "), "municipio/alcaldia");
        assert_eq!(normalize_key("Costos de envío"), "costos de envio");
        assert_eq!(normalize_key("SÍ"), "si");
    }
}

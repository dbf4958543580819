// CSV file boundary.
//
// The only job here is getting contract columns out of the export file and
// into `RawRow`s; all type coercion happens later in the normalizer. Headers
// are resolved once into an explicit column map instead of being looked up
// per row, so the accented and unaccented spellings of a header resolve to
// the same field.
use crate::parsers::normalize_key;
use crate::types::{Cell, RawRow};
use csv::{Reader, ReaderBuilder, StringRecord};
use std::error::Error;
use std::io::Read;

/// Column-name-to-field mapping, resolved from the header record at load
/// time. A contract column missing from the file keeps `None` and yields
/// `Cell::Absent` for every row.
#[derive(Debug, Default)]
struct ColumnMap {
    sale_date: Option<usize>,
    transit_date: Option<usize>,
    delivery_date: Option<usize>,
    advertised: Option<usize>,
    total: Option<usize>,
    product_revenue: Option<usize>,
    units: Option<usize>,
    unit_price: Option<usize>,
    fees_and_taxes: Option<usize>,
    shipping_cost: Option<usize>,
    product_id: Option<usize>,
    state: Option<usize>,
    municipality: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> ColumnMap {
        let mut map = ColumnMap::default();
        for (idx, name) in headers.iter().enumerate() {
            let slot = match normalize_key(name).as_str() {
                "fecha venta" => &mut map.sale_date,
                "fechacamino" => &mut map.transit_date,
                "fechaentrega" => &mut map.delivery_date,
                "venta por publicidad" => &mut map.advertised,
                "total (mxn)" => &mut map.total,
                "ingresos por productos (mxn)" => &mut map.product_revenue,
                "unidades" => &mut map.units,
                "precio unitario de venta de la publicacion (mxn)" => &mut map.unit_price,
                "cargo por venta e impuestos" => &mut map.fees_and_taxes,
                "costos de envio" => &mut map.shipping_cost,
                "idproducto" => &mut map.product_id,
                "estado" => &mut map.state,
                "municipio/alcaldia" => &mut map.municipality,
                _ => continue,
            };
            // First matching header wins if the file repeats one.
            slot.get_or_insert(idx);
        }
        map
    }

    fn cell(&self, record: &StringRecord, slot: Option<usize>) -> Cell {
        match slot.and_then(|i| record.get(i)) {
            Some(s) if !s.trim().is_empty() => Cell::Text(s.trim().to_string()),
            _ => Cell::Absent,
        }
    }

    fn extract(&self, record: &StringRecord) -> RawRow {
        RawRow {
            sale_date: self.cell(record, self.sale_date),
            transit_date: self.cell(record, self.transit_date),
            delivery_date: self.cell(record, self.delivery_date),
            advertised: self.cell(record, self.advertised),
            total: self.cell(record, self.total),
            product_revenue: self.cell(record, self.product_revenue),
            units: self.cell(record, self.units),
            unit_price: self.cell(record, self.unit_price),
            fees_and_taxes: self.cell(record, self.fees_and_taxes),
            shipping_cost: self.cell(record, self.shipping_cost),
            product_id: self.cell(record, self.product_id),
            state: self.cell(record, self.state),
            municipality: self.cell(record, self.municipality),
        }
    }
}

/// Load the sales export from disk. Failing to open or read the file is the
/// one fatal error of the pipeline and is returned to the caller.
pub fn load_rows(path: &str) -> Result<Vec<RawRow>, Box<dyn Error>> {
    let rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    read_rows(rdr)
}

/// Same as [`load_rows`] over any byte source.
pub fn load_rows_from_reader<R: Read>(reader: R) -> Result<Vec<RawRow>, Box<dyn Error>> {
    let rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    read_rows(rdr)
}

fn read_rows<R: Read>(mut rdr: Reader<R>) -> Result<Vec<RawRow>, Box<dyn Error>> {
    let columns = ColumnMap::from_headers(rdr.headers()?);
    let mut rows = Vec::new();
    for result in rdr.records() {
        // A record the csv crate cannot read at all is skipped; a short or
        // ragged record just leaves fields absent.
        let Ok(record) = result else { continue };
        rows.push(columns.extract(&record));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_contract_headers_including_unaccented_variant() {
        let csv_text = "\
Fecha Venta,Total (MXN),Unidades,IDproducto,Municipio/Alcaldia
2024-01-05,\"$1,234.50 MXN\",2,ABC123,Coyoacán
";
        let rows = load_rows_from_reader(csv_text.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sale_date, Cell::Text("2024-01-05".to_string()));
        assert_eq!(rows[0].total, Cell::Text("$1,234.50 MXN".to_string()));
        assert_eq!(rows[0].municipality, Cell::Text("Coyoacán".to_string()));
        // Columns not present in the file stay absent.
        assert_eq!(rows[0].shipping_cost, Cell::Absent);
    }

    #[test]
    fn blank_cells_and_short_records_degrade_to_absent() {
        let csv_text = "\
Fecha Venta,Total (MXN),Estado
2024-01-05,,Jalisco
2024-01-06
";
        let rows = load_rows_from_reader(csv_text.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].total, Cell::Absent);
        assert_eq!(rows[0].state, Cell::Text("Jalisco".to_string()));
        assert_eq!(rows[1].state, Cell::Absent);
    }
}

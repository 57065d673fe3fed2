use crate::data::{AccountRecord, Error, TargetTable, BOM};
use std::io::{BufRead, BufReader};

/// Trait for doing something with an account key read from the membership
/// file. `MembershipSet` collects them for the lookup; tests use it to check
/// exactly which keys come out of a CSV stream.
pub(crate) trait KeyCollector {
    fn collect_key(&mut self, key: &str);
}

/// Opens a CSV reader past a leading UTF-8 BOM, telling whether there was one.
fn reader<R: std::io::Read>(
    reader: R,
    delimiter: u8,
) -> Result<(bool, csv::Reader<BufReader<R>>), Error> {
    let mut buffered = BufReader::new(reader);
    let bom = buffered
        .fill_buf()
        .map_err(csv::Error::from)?
        .starts_with(BOM);
    if bom {
        buffered.consume(BOM.len());
    }
    let rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(buffered);
    Ok((bom, rdr))
}

/// Reads the `key_column` of every row, trimmed. Blank keys are skipped.
pub(crate) fn read_membership<R: std::io::Read, C: KeyCollector>(
    reader: R,
    key_column: &str,
    delimiter: u8,
    collector: &mut C,
) -> Result<(), Error> {
    let (_, mut rdr) = self::reader(reader, delimiter)?;
    let index = rdr
        .headers()?
        .iter()
        .position(|h| h == key_column)
        .ok_or_else(|| Error::MissingColumn(key_column.to_owned()))?;
    for result in rdr.records() {
        let record = result?;
        // a short row simply has no key
        let key = record.get(index).unwrap_or_default().trim();
        if !key.is_empty() {
            collector.collect_key(key);
        }
    }
    Ok(())
}

/// Loads the whole target file. Fields are kept verbatim; short rows are
/// padded with empty fields up to the header width, longer rows are refused.
pub(crate) fn read_target<R: std::io::Read>(
    reader: R,
    delimiter: u8,
) -> Result<TargetTable, Error> {
    let (bom, mut rdr) = self::reader(reader, delimiter)?;
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_owned).collect();
    let width = headers.len();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.len() > width {
            return Err(Error::ExtraFields {
                line: record.position().map_or(0, |p| p.line()),
                expected: width,
                found: record.len(),
            });
        }
        let mut row = AccountRecord::new(record.iter());
        row.fields.resize(width, String::new());
        rows.push(row);
    }
    Ok(TargetTable { bom, headers, rows })
}

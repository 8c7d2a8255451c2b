// Reads CSV with the permissive parser and writes it back out with the csv crate.
// Every field is quoted: the parser also treats a leading `'` as a quote, which the
// csv crate's minimal quoting does not account for.
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use csv::{QuoteStyle, Writer, WriterBuilder};
use tracing::info;

use crate::data::csv_parser::CsvReader;
use crate::error::Result;

/// Output writer that accepts rows of any length and quotes every field.
pub fn output_writer<W: Write>(delimiter: u8, out: W) -> Writer<W> {
    WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Always)
        .flexible(true)
        .from_writer(out)
}

/// Copies every row of `input` to `writer`, returning the number of rows written.
pub fn recode_stream<R, W>(reader: &CsvReader, input: R, writer: &mut Writer<W>) -> Result<usize>
where
    R: BufRead,
    W: Write,
{
    let mut written = 0;
    for row in reader.rows(input) {
        writer.write_record(&row?)?;
        written += 1;
    }
    Ok(written)
}

pub fn recode_file<W: Write>(
    reader: &CsvReader,
    path: &Path,
    writer: &mut Writer<W>,
) -> Result<usize> {
    let file = File::open(path)?;
    let written = recode_stream(reader, BufReader::new(file), writer)?;
    info!(path = %path.display(), rows = written, "Recoded CSV file");
    Ok(written)
}

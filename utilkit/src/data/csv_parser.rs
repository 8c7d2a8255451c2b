// Streaming, permissive CSV reader.
//
// Fields may be wrapped in `"` or `'`; inside a quoted field a doubled quote is a
// literal quote, and delimiters or line breaks are kept as text. Malformed quoting
// never fails: whatever was read so far becomes the field. Only I/O faults of the
// underlying reader are reported.
use std::io::{BufRead, ErrorKind};

use shared::models::{CsvDialect, Row};
use tracing::{debug, trace};

use crate::data::typed::FromRow;
use crate::error::{Result, ToolkitError};

pub const DEFAULT_DELIMITER: u8 = b';';

/// Byte-at-a-time view of a caller-owned buffered reader.
pub struct CharStream<R> {
    inner: R,
}

impl<R: BufRead> CharStream<R> {
    pub fn new(inner: R) -> Self {
        CharStream { inner }
    }

    /// Consumes and returns the next byte, `None` once the reader is exhausted.
    pub fn get(&mut self) -> Result<Option<u8>> {
        loop {
            match self.inner.fill_buf() {
                Ok(buf) => {
                    let byte = buf.first().copied();
                    if byte.is_some() {
                        self.inner.consume(1);
                    }
                    return Ok(byte);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn is_line_end(ch: Option<u8>) -> bool {
    matches!(ch, Some(b'\n' | b'\r'))
}

fn into_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

/// Parses the next row. Leading line breaks are skipped, so blank lines and CRLF
/// endings never produce rows of their own. Returns an empty row at end of stream.
pub fn parse_line<R: BufRead>(stream: &mut CharStream<R>, delimiter: u8) -> Result<Row> {
    let mut ch = stream.get()?;
    while is_line_end(ch) {
        ch = stream.get()?;
    }
    if ch.is_none() {
        return Ok(Row::new());
    }

    let mut row = Row::new();
    let (field, mut next) = parse_entry(stream, ch, delimiter)?;
    row.push(field);
    while next == Some(delimiter) {
        let first = stream.get()?;
        let (field, after) = parse_entry(stream, first, delimiter)?;
        row.push(field);
        next = after;
    }
    Ok(row)
}

/// Parses one field starting at `first`, which has already been read from the stream.
///
/// Returns the field text together with the byte that ended it. That byte has been
/// consumed; it is the delimiter, a line break, whatever followed a closing quote,
/// or `None` at end of stream.
pub fn parse_entry<R: BufRead>(
    stream: &mut CharStream<R>,
    first: Option<u8>,
    delimiter: u8,
) -> Result<(String, Option<u8>)> {
    match first {
        Some(quote @ (b'"' | b'\'')) => parse_quoted(stream, quote),
        _ => parse_unquoted(stream, first, delimiter),
    }
}

fn parse_quoted<R: BufRead>(stream: &mut CharStream<R>, quote: u8) -> Result<(String, Option<u8>)> {
    let mut buffer = Vec::new();
    loop {
        match stream.get()? {
            None => return Ok((into_text(buffer), None)),
            Some(byte) if byte == quote => {
                let next = stream.get()?;
                if next != Some(quote) {
                    return Ok((into_text(buffer), next));
                }
                buffer.push(quote);
            }
            Some(byte) => buffer.push(byte),
        }
    }
}

fn parse_unquoted<R: BufRead>(
    stream: &mut CharStream<R>,
    first: Option<u8>,
    delimiter: u8,
) -> Result<(String, Option<u8>)> {
    let mut buffer = Vec::new();
    let mut ch = first;
    while let Some(byte) = ch {
        if byte == delimiter || byte == b'\n' || byte == b'\r' {
            break;
        }
        buffer.push(byte);
        ch = stream.get()?;
    }
    Ok((into_text(buffer), ch))
}

/// Reader configuration for one parse pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvReader {
    delimiter: u8,
    skip_first_row: bool,
}

impl CsvReader {
    pub fn new(delimiter: u8, skip_first_row: bool) -> Self {
        CsvReader { delimiter, skip_first_row }
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    pub fn set_delimiter(&mut self, delimiter: u8) {
        self.delimiter = delimiter;
    }

    pub fn skips_first_row(&self) -> bool {
        self.skip_first_row
    }

    pub fn set_skip_first_row(&mut self, skip: bool) {
        self.skip_first_row = skip;
    }

    /// Lazily parses `input` row by row.
    pub fn rows<R: BufRead>(&self, input: R) -> Rows<R> {
        Rows {
            stream: CharStream::new(input),
            delimiter: self.delimiter,
            skip_pending: self.skip_first_row,
            finished: false,
        }
    }

    /// Calls `on_row` for every row of `input`, after dropping the header row if configured.
    pub fn read_rows<R, F>(&self, input: R, mut on_row: F) -> Result<()>
    where
        R: BufRead,
        F: FnMut(Row),
    {
        let mut count = 0usize;
        for row in self.rows(input) {
            on_row(row?);
            count += 1;
        }
        debug!(rows = count, delimiter = %char::from(self.delimiter), "Finished reading CSV rows");
        Ok(())
    }

    /// Like [`CsvReader::read_rows`], converting each row into the tuple `T` first.
    pub fn read_typed<T, R, F>(&self, input: R, mut on_tuple: F) -> Result<()>
    where
        T: FromRow,
        R: BufRead,
        F: FnMut(T),
    {
        let mut count = 0usize;
        for row in self.rows(input) {
            let row = row?;
            if row.len() != T::ARITY {
                trace!(
                    expected = T::ARITY,
                    found = row.len(),
                    "Row arity differs from tuple arity"
                );
            }
            on_tuple(T::from_row(&row));
            count += 1;
        }
        debug!(rows = count, arity = T::ARITY, "Finished reading typed CSV rows");
        Ok(())
    }
}

impl Default for CsvReader {
    fn default() -> Self {
        CsvReader::new(DEFAULT_DELIMITER, false)
    }
}

impl TryFrom<&CsvDialect> for CsvReader {
    type Error = ToolkitError;

    fn try_from(dialect: &CsvDialect) -> Result<Self> {
        if !dialect.delimiter.is_ascii() {
            return Err(ToolkitError::ConfigError(format!(
                "CSV delimiter '{}' is not a single ASCII character",
                dialect.delimiter
            )));
        }
        Ok(CsvReader::new(dialect.delimiter as u8, dialect.skip_first_row))
    }
}

/// Iterator returned by [`CsvReader::rows`].
pub struct Rows<R> {
    stream: CharStream<R>,
    delimiter: u8,
    skip_pending: bool,
    finished: bool,
}

impl<R: BufRead> Iterator for Rows<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            match parse_line(&mut self.stream, self.delimiter) {
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                Ok(row) if row.is_empty() => self.finished = true,
                Ok(row) if self.skip_pending => {
                    self.skip_pending = false;
                    trace!(fields = row.len(), "Skipping first CSV row");
                }
                Ok(row) => {
                    trace!(fields = row.len(), "Parsed CSV row");
                    return Some(Ok(row));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Read};

    fn stream(input: &str) -> CharStream<&[u8]> {
        CharStream::new(input.as_bytes())
    }

    fn collect_rows(reader: &CsvReader, input: &str) -> Vec<Row> {
        let mut rows = Vec::new();
        reader.read_rows(input.as_bytes(), |row| rows.push(row)).unwrap();
        rows
    }

    #[test]
    fn test_parse_line_unquoted_round_trip() {
        let line = "WINFUT;30/12/2024;18:20:00;124.080;;600.822.115,84";
        let row = parse_line(&mut stream(line), b';').unwrap();
        assert_eq!(row.len(), 6);
        assert_eq!(row[4], "");
        assert_eq!(row.join(";"), line);
    }

    #[test]
    fn test_parse_line_trailing_delimiter_adds_empty_field() {
        let row = parse_line(&mut stream("a;b;\n"), b';').unwrap();
        assert_eq!(row, vec!["a", "b", ""]);
    }

    #[test]
    fn test_parse_line_exhausted_stream() {
        let mut s = stream("\r\n\n");
        assert!(parse_line(&mut s, b';').unwrap().is_empty());
        assert!(parse_line(&mut s, b';').unwrap().is_empty());
    }

    #[test]
    fn test_quoted_entry_keeps_delimiter_and_positions_stream() {
        let mut s = stream("\"x;y\";next");
        let first = s.get().unwrap();
        let (field, terminator) = parse_entry(&mut s, first, b';').unwrap();
        assert_eq!(field, "x;y");
        assert_eq!(terminator, Some(b';'));
        let first = s.get().unwrap();
        let (field, terminator) = parse_entry(&mut s, first, b';').unwrap();
        assert_eq!(field, "next");
        assert_eq!(terminator, None);
    }

    #[test]
    fn test_unquoted_entry_stops_at_line_break() {
        let mut s = stream("abc\rdef");
        let first = s.get().unwrap();
        let (field, terminator) = parse_entry(&mut s, first, b';').unwrap();
        assert_eq!(field, "abc");
        assert_eq!(terminator, Some(b'\r'));
        assert_eq!(s.get().unwrap(), Some(b'd'));
    }

    #[test]
    fn test_doubled_quote_is_literal() {
        let row = parse_line(&mut stream("\"a\"\"b\"\n"), b';').unwrap();
        assert_eq!(row, vec!["a\"b"]);
    }

    #[test]
    fn test_single_quotes_and_embedded_line_break() {
        let row = parse_line(&mut stream("'it''s';'two\nlines';\"mixed 'q'\""), b';').unwrap();
        assert_eq!(row, vec!["it's", "two\nlines", "mixed 'q'"]);
    }

    #[test]
    fn test_unterminated_quote_returns_partial_field() {
        let row = parse_line(&mut stream("a;\"never closed;b\n"), b';').unwrap();
        assert_eq!(row, vec!["a", "never closed;b\n"]);
    }

    #[test]
    fn test_text_after_closing_quote_ends_row() {
        let mut s = stream("\"ab\"x;c\n");
        assert_eq!(parse_line(&mut s, b';').unwrap(), vec!["ab"]);
        assert_eq!(parse_line(&mut s, b';').unwrap(), vec!["", "c"]);
    }

    #[test]
    fn test_read_rows_two_rows() {
        let rows = collect_rows(&CsvReader::default(), "a;b\nc;d\n");
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_read_rows_skips_header() {
        let rows = collect_rows(&CsvReader::new(b';', true), "a;b\nc;d\n");
        assert_eq!(rows, vec![vec!["c", "d"]]);
    }

    #[test]
    fn test_read_rows_crlf_and_blank_lines() {
        let rows = collect_rows(&CsvReader::new(b',', false), "h1,h2\r\n\r\n1,2\r\n\n3,4");
        assert_eq!(rows, vec![vec!["h1", "h2"], vec!["1", "2"], vec!["3", "4"]]);
    }

    #[test]
    fn test_read_rows_empty_input() {
        assert!(collect_rows(&CsvReader::default(), "").is_empty());
        assert!(collect_rows(&CsvReader::new(b';', true), "only;header").is_empty());
    }

    #[test]
    fn test_read_rows_utf8_fields() {
        let rows = collect_rows(&CsvReader::default(), "Máximo;Mínimo\n");
        assert_eq!(rows, vec![vec!["Máximo", "Mínimo"]]);
    }

    #[test]
    fn test_reader_configuration_can_change_between_passes() {
        let mut reader = CsvReader::default();
        assert_eq!(reader.delimiter(), b';');
        assert!(!reader.skips_first_row());

        reader.set_delimiter(b'|');
        reader.set_skip_first_row(true);
        let rows = collect_rows(&reader, "x|y\n1|2;3\n");
        assert_eq!(rows, vec![vec!["1", "2;3"]]);
    }

    #[test]
    fn test_reader_from_dialect() {
        let dialect = CsvDialect { delimiter: ',', skip_first_row: true };
        let reader = CsvReader::try_from(&dialect).unwrap();
        assert_eq!(reader, CsvReader::new(b',', true));

        let bad = CsvDialect { delimiter: '§', skip_first_row: false };
        let err = CsvReader::try_from(&bad).unwrap_err();
        assert!(matches!(err, ToolkitError::ConfigError(_)));
    }

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(ErrorKind::Other, "disk on fire"))
        }
    }

    #[test]
    fn test_io_failure_is_reported() {
        let result = CsvReader::default().read_rows(BufReader::new(BrokenReader), |_| {});
        let err = result.unwrap_err();
        assert!(matches!(err, ToolkitError::IoError { .. }));
        assert!(err.to_string().contains("disk on fire"));
    }
}

use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord};
use sha2::{Digest, Sha256};

/// One row of the attendance sheet.
///
/// Field 0 is the full name, field 1 the group identifier. Every field from
/// the configured skip offset onward is one session; a non-empty value means
/// the student was present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<String>,
    line: u64,
}

impl Record {
    pub fn new(fields: Vec<String>, line: u64) -> Self {
        Self { fields, line }
    }

    pub fn name(&self) -> &str {
        self.fields.first().map(String::as_str).unwrap_or_default()
    }

    pub fn group(&self) -> &str {
        self.fields.get(1).map(String::as_str).unwrap_or_default()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Source lines this row spans beyond its first (quoted line breaks)
    fn extra_lines(&self) -> u64 {
        self.fields
            .iter()
            .map(|f| f.matches('\n').count() as u64)
            .sum()
    }

    /// 1-based line number in the source CSV
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Number of non-empty fields from `skip` onward.
    /// Rows shorter than `skip` have no attendance columns and count 0.
    pub fn attendance(&self, skip: usize) -> usize {
        self.fields
            .get(skip..)
            .map_or(0, |marks| marks.iter().filter(|m| !m.is_empty()).count())
    }
}

impl Record {
    fn from_row(row: &StringRecord, line: u64) -> Self {
        Self::new(row.iter().map(str::to_string).collect(), line)
    }
}

/// Maps row byte offsets to source line numbers.
///
/// The position the CSV reader attaches to a row is taken before it skips
/// blank lines, so the row's real start lies past any run of line breaks.
struct LineCursor<'a> {
    content: &'a [u8],
    byte: usize,
    line: u64,
    /// First line not covered by a row yielded so far
    next_line: u64,
}

impl<'a> LineCursor<'a> {
    fn new(content: &'a [u8]) -> Self {
        Self {
            content,
            byte: 0,
            line: 1,
            next_line: 1,
        }
    }

    /// Line on which the row read from `offset` really starts
    fn row_start(&mut self, offset: u64) -> u64 {
        let mut start = usize::try_from(offset).map_or(self.content.len(), |o| o.max(self.byte));
        while matches!(self.content.get(start), Some(b'\r' | b'\n')) {
            start += 1;
        }
        let start = start.min(self.content.len());
        self.line += self.content[self.byte..start]
            .iter()
            .filter(|b| **b == b'\n')
            .count() as u64;
        self.byte = start;
        self.line
    }

    /// Resolve `row` to a record, preceded by an empty record for every
    /// blank line since the previous row
    fn place(&mut self, row: &StringRecord) -> Vec<Record> {
        let offset = row.position().map_or(self.byte as u64, |p| p.byte());
        let line = self.row_start(offset);
        let record = Record::from_row(row, line);

        let mut placed: Vec<Record> = (self.next_line..line)
            .map(|blank| Record::new(Vec::new(), blank))
            .collect();
        self.next_line = line + 1 + record.extra_lines();
        placed.push(record);
        placed
    }
}

/// The cached attendance sheet: raw CSV bytes exactly as fetched, plus the
/// bookkeeping timestamps of the refresh logic.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    content: Vec<u8>,
    hash: String,
    /// Last successful remote fetch
    pub(crate) fetched_at: Option<DateTime<Utc>>,
    /// Last fetch whose content differed from the previous content
    pub(crate) changed_at: Option<DateTime<Utc>>,
}

/// Hex-encoded SHA-256 of the given bytes
pub fn content_hash(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

impl Dataset {
    pub fn new(content: Vec<u8>) -> Self {
        let hash = content_hash(&content);
        Self {
            content,
            hash,
            fetched_at: None,
            changed_at: None,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_timestamps(
        mut self,
        fetched_at: Option<DateTime<Utc>>,
        changed_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.fetched_at = fetched_at;
        self.changed_at = changed_at;
        self
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn content_hash(&self) -> &str {
        &self.hash
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub fn changed_at(&self) -> Option<DateTime<Utc>> {
        self.changed_at
    }

    /// Swap in new content, keeping the timestamps untouched.
    pub(crate) fn replace_content(&mut self, content: Vec<u8>) {
        self.hash = content_hash(&content);
        self.content = content;
    }

    /// Iterate over the rows in file order.
    ///
    /// Every row is yielded, including a potential header row. Rows may have
    /// differing lengths; decoding errors (invalid UTF-8, broken quoting) are
    /// yielded as `Err`. The CSV reader skips blank lines, so each blank line
    /// between two rows is yielded as a record with no fields.
    pub fn records(&self) -> impl Iterator<Item = Result<Record, csv::Error>> + '_ {
        let mut cursor = LineCursor::new(&self.content);
        ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(self.content.as_slice())
            .into_records()
            .flat_map(move |row| -> Vec<Result<Record, csv::Error>> {
                match row {
                    Ok(row) => cursor.place(&row).into_iter().map(Ok).collect(),
                    Err(e) => vec![Err(e)],
                }
            })
    }
}

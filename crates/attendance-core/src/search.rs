//! Linear search over the cached attendance sheet.

use thiserror::Error;
use tracing::error;

use crate::models::{Dataset, Record, SearchMode};
use crate::utils::contains_ignore_case;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Failed to decode CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed row at line {line}: {fields} fields, expected at least {expected}")]
    MalformedRow {
        line: u64,
        fields: usize,
        expected: usize,
    },
}

/// One matching student
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub name: String,
    pub group: String,
    pub attendance: usize,
}

/// Row matcher with the sheet layout baked in
#[derive(Debug, Clone, Copy)]
pub struct SearchEngine {
    skip_columns: usize,
    max_results: usize,
}

fn matches(mode: SearchMode, record: &Record, query: &str) -> bool {
    match mode {
        SearchMode::Name => contains_ignore_case(record.name(), query),
        SearchMode::Group => record.group() == query,
    }
}

impl SearchEngine {
    pub fn new(skip_columns: usize, max_results: usize) -> Self {
        Self {
            skip_columns,
            max_results,
        }
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Scan the dataset in row order and collect up to `max_results` matches.
    ///
    /// Any row that cannot be decoded or is shorter than the skip offset
    /// aborts the whole search; nothing gathered so far is returned.
    pub fn search(
        &self,
        dataset: &Dataset,
        mode: SearchMode,
        query: &str,
    ) -> Result<Vec<Match>, SearchError> {
        let mut found = Vec::new();
        if self.max_results == 0 {
            return Ok(found);
        }

        for row in dataset.records() {
            let record = row?;
            if record.field_count() < self.skip_columns {
                return Err(SearchError::MalformedRow {
                    line: record.line(),
                    fields: record.field_count(),
                    expected: self.skip_columns,
                });
            }
            if !matches(mode, &record, query) {
                continue;
            }

            found.push(Match {
                name: record.name().to_string(),
                group: record.group().to_string(),
                attendance: record.attendance(self.skip_columns),
            });
            if found.len() == self.max_results {
                break;
            }
        }

        Ok(found)
    }

    /// `search` with the failure logged and flattened into "no matches",
    /// which is how users see it.
    pub fn search_or_empty(&self, dataset: &Dataset, mode: SearchMode, query: &str) -> Vec<Match> {
        self.search(dataset, mode, query).unwrap_or_else(|e| {
            error!(mode = %mode, query = query, error = %e, "Search in CSV failed");
            Vec::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "\
Anna Ivanova,M01,1,f,cur,pas,hea,x,,x
Ivan Annenkov,M01-2,1,f,cur,pas,hea,,,x
Petr Sidorov,221,2,f,cur,pas,hea,x,x,x
";

    fn engine() -> SearchEngine {
        SearchEngine::new(7, 30)
    }

    fn dataset(csv: &str) -> Dataset {
        Dataset::new(csv.as_bytes().to_vec())
    }

    #[test]
    fn test_name_search_is_case_insensitive_substring() {
        let found = engine()
            .search(&dataset(SHEET), SearchMode::Name, "ann")
            .unwrap();
        let names: Vec<&str> = found.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Anna Ivanova", "Ivan Annenkov"]);
    }

    #[test]
    fn test_group_search_is_exact() {
        let found = engine()
            .search(&dataset(SHEET), SearchMode::Group, "M01")
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].group, "M01");

        let none = engine()
            .search(&dataset(SHEET), SearchMode::Group, "m01")
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_attendance_is_counted_after_offset() {
        let found = engine()
            .search(&dataset(SHEET), SearchMode::Group, "221")
            .unwrap();
        assert_eq!(
            found,
            vec![Match {
                name: "Petr Sidorov".to_string(),
                group: "221".to_string(),
                attendance: 3,
            }]
        );

        let anna = engine()
            .search(&dataset(SHEET), SearchMode::Name, "Anna Ivanova")
            .unwrap();
        assert_eq!(anna[0].attendance, 2);
    }

    #[test]
    fn test_results_are_capped_in_row_order() {
        let mut csv = String::new();
        for i in 0..50 {
            csv.push_str(&format!("Student {},G1,a,b,c,d,e,x\n", i));
        }
        let engine = SearchEngine::new(7, 30);
        let found = engine.search(&dataset(&csv), SearchMode::Group, "G1").unwrap();
        assert_eq!(found.len(), engine.max_results());
        assert_eq!(found[0].name, "Student 0");
        assert_eq!(found[29].name, "Student 29");
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let found = engine()
            .search(&dataset(SHEET), SearchMode::Name, "Zzz")
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_short_row_aborts_whole_search() {
        let csv = format!("{}Broken,221\n", SHEET);
        let err = engine()
            .search(&dataset(&csv), SearchMode::Group, "221")
            .unwrap_err();
        match err {
            SearchError::MalformedRow { line, fields, expected } => {
                assert_eq!(line, 4);
                assert_eq!(fields, 2);
                assert_eq!(expected, 7);
            }
            other => panic!("unexpected error: {other}"),
        }

        // Earlier matches are discarded too
        assert!(engine()
            .search_or_empty(&dataset(&csv), SearchMode::Group, "221")
            .is_empty());
    }

    #[test]
    fn test_blank_line_aborts_whole_search() {
        let csv = "\
Anna Ivanova,M01,1,f,cur,pas,hea,x,,x

Petr Sidorov,221,2,f,cur,pas,hea,x,x,x
";
        let err = engine()
            .search(&dataset(csv), SearchMode::Group, "221")
            .unwrap_err();
        assert!(matches!(
            err,
            SearchError::MalformedRow { line: 2, fields: 0, expected: 7 }
        ));
    }

    #[test]
    fn test_scan_stops_at_cap_before_bad_rows() {
        let csv = format!("{}Broken\n", SHEET);
        let engine = SearchEngine::new(7, 1);
        let found = engine.search(&dataset(&csv), SearchMode::Name, "ann").unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_header_row_is_searched_like_data() {
        let csv = format!("Name,Group,a,b,c,d,e,Visit 1\n{}", SHEET);
        let found = engine()
            .search(&dataset(&csv), SearchMode::Name, "name")
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].attendance, 1);
    }

    #[test]
    fn test_empty_dataset_yields_nothing() {
        let found = engine()
            .search(&Dataset::empty(), SearchMode::Name, "ann")
            .unwrap();
        assert!(found.is_empty());
    }
}

//! vmstat output classifier.
//!
//! vmstat prints a one-time banner, a one-time column header, and then one
//! numeric row per reporting interval:
//!
//! ```text
//! procs -----------memory---------- ---swap-- -----io---- -system-- ------cpu-----
//!  r  b   swpd   free   buff  cache   si   so    bi    bo   in   cs us sy id wa
//!  1  0      0 102400  20480 512000    0    0     2     3  100  200  5  2 90  3
//! ```
//!
//! The classifier is keyed only by line position: line 0 must look like the
//! banner, line 1 like the header, everything after like a data row. The
//! banner wording varies across vmstat versions and locales, so a banner
//! mismatch is cosmetic; a header mismatch means the column layout may have
//! drifted and is reported at error level, but neither stops collection.

use regex::Regex;

use crate::probe::ProbePoint;

/// Number of numeric fields extracted from each data row.
pub const FIELD_COUNT: usize = 16;

/// Expected banner shape. Dashes around the section labels vary by version.
const BANNER_RE: &str = r"^\s*procs -*memory-* -*swap-* -*io-* -*system-* -*cpu-*\s*$";

/// Expected header: 16 fixed column tokens, optional trailing `st` column
/// (steal time, present on virtualized hosts).
const HEADER_RE: &str = r"^\s*r\s+b\s+swpd\s+free\s+buff\s+cache\s+si\s+so\s+bi\s+bo\s+in\s+cs\s+us\s+sy\s+id\s+wa\s*(st\s*)?$";

/// Outcome of classifying one line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// Line 0 matched the banner.
    Banner,
    /// Line 0 did not look like a vmstat banner (cosmetic, warning-level).
    BannerMismatch,
    /// Line 1 matched the column header.
    Header,
    /// Line 1 did not match the expected columns; field positions of the
    /// following rows may be wrong (error-level, collection continues).
    HeaderMismatch,
    /// A data row parsed into a point.
    Point(ProbePoint),
    /// A data row failed the pattern or integer parse; no point produced.
    RowMismatch,
}

/// Position-keyed classifier for a single vmstat output stream.
///
/// Owns the line counter; feed lines strictly in arrival order. One
/// classifier serves one probe run and is never shared across threads.
pub struct LineClassifier {
    banner: Regex,
    header: Regex,
    row: Regex,
    line_num: u64,
}

impl LineClassifier {
    pub fn new() -> Self {
        Self {
            banner: Regex::new(BANNER_RE).expect("banner pattern"),
            header: Regex::new(HEADER_RE).expect("header pattern"),
            row: Regex::new(&row_pattern()).expect("row pattern"),
            line_num: 0,
        }
    }

    /// The header layout expected on line 1, for diagnostics.
    pub fn expected_header(&self) -> &'static str {
        HEADER_RE
    }

    /// Classifies the next line of the stream.
    ///
    /// Data rows are timestamped here, at parse time, not when the tool
    /// emitted them.
    pub fn classify(&mut self, line: &str) -> LineOutcome {
        let n = self.line_num;
        self.line_num += 1;

        if n == 0 {
            if self.banner.is_match(line) {
                LineOutcome::Banner
            } else {
                LineOutcome::BannerMismatch
            }
        } else if n == 1 {
            if self.header.is_match(line) {
                LineOutcome::Header
            } else {
                LineOutcome::HeaderMismatch
            }
        } else {
            match self.parse_row(line) {
                Some(values) => LineOutcome::Point(ProbePoint::now(values)),
                None => LineOutcome::RowMismatch,
            }
        }
    }

    /// Number of lines observed so far.
    pub fn lines_seen(&self) -> u64 {
        self.line_num
    }

    /// Extracts the 16 numeric fields of a data row, discarding the
    /// optional 17th (steal) column. Returns `None` on pattern mismatch or
    /// if any token fails the integer parse.
    fn parse_row(&self, line: &str) -> Option<Vec<u64>> {
        let caps = self.row.captures(line)?;
        let mut values = Vec::with_capacity(FIELD_COUNT);
        for i in 1..=FIELD_COUNT {
            values.push(caps.get(i)?.as_str().parse().ok()?);
        }
        Some(values)
    }
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the data-row pattern: 16 captured integer tokens plus an optional
/// uncaptured-by-use 17th.
fn row_pattern() -> String {
    let mut re = String::from(r"^\s*");
    for i in 0..FIELD_COUNT {
        re.push_str(r"(\d+)");
        if i < FIELD_COUNT - 1 {
            re.push_str(r"\s+");
        } else {
            re.push_str(r"\s*");
        }
    }
    re.push_str(r"(\d+)?\s*$");
    re
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANNER: &str =
        "   procs -----------memory---------- ---swap-- -----io---- -system-- ------cpu-----";
    const HEADER: &str =
        " r  b   swpd   free   buff  cache   si   so    bi    bo   in   cs us sy id wa";
    const ROW: &str =
        " 1  0      0 102400  20480 512000    0    0     2     3  100  200  5  2 90  3";

    #[test]
    fn test_well_formed_stream() {
        let mut c = LineClassifier::new();
        assert_eq!(c.classify(BANNER), LineOutcome::Banner);
        assert_eq!(c.classify(HEADER), LineOutcome::Header);

        match c.classify(ROW) {
            LineOutcome::Point(pnt) => {
                assert_eq!(
                    pnt.values,
                    vec![1, 0, 0, 102400, 20480, 512000, 0, 0, 2, 3, 100, 200, 5, 2, 90, 3]
                );
            }
            other => panic!("expected a point, got {:?}", other),
        }
        assert_eq!(c.lines_seen(), 3);
    }

    #[test]
    fn test_garbage_data_row() {
        let mut c = LineClassifier::new();
        c.classify(BANNER);
        c.classify(HEADER);
        assert_eq!(c.classify("garbage line"), LineOutcome::RowMismatch);
        // Collection continues: the next row still parses.
        assert!(matches!(c.classify(ROW), LineOutcome::Point(_)));
    }

    #[test]
    fn test_unexpected_banner_is_nonfatal() {
        let mut c = LineClassifier::new();
        assert_eq!(
            c.classify("some unrelated text"),
            LineOutcome::BannerMismatch
        );
        // Header and data lines still parse normally afterwards.
        assert_eq!(c.classify(HEADER), LineOutcome::Header);
        assert!(matches!(c.classify(ROW), LineOutcome::Point(_)));
    }

    #[test]
    fn test_data_shaped_line_at_position_zero_is_a_banner_mismatch() {
        // Position, not content, decides the line class.
        let mut c = LineClassifier::new();
        assert_eq!(c.classify(ROW), LineOutcome::BannerMismatch);
    }

    #[test]
    fn test_header_mismatch() {
        let mut c = LineClassifier::new();
        c.classify(BANNER);
        assert_eq!(
            c.classify(" r  b   swpd   free   buff  cache"),
            LineOutcome::HeaderMismatch
        );
        // Severity-escalated but non-fatal.
        assert!(matches!(c.classify(ROW), LineOutcome::Point(_)));
    }

    #[test]
    fn test_header_with_steal_column() {
        let mut c = LineClassifier::new();
        c.classify(BANNER);
        let header_st =
            " r  b   swpd   free   buff  cache   si   so    bi    bo   in   cs us sy id wa st";
        assert_eq!(c.classify(header_st), LineOutcome::Header);
    }

    #[test]
    fn test_row_with_steal_column_is_truncated_to_16_values() {
        let mut c = LineClassifier::new();
        c.classify(BANNER);
        c.classify(HEADER);
        let row_st = " 1  0      0 102400  20480 512000    0    0     2     3  100  200  5  2 90  3  0";
        match c.classify(row_st) {
            LineOutcome::Point(pnt) => {
                assert_eq!(pnt.values.len(), FIELD_COUNT);
                assert_eq!(pnt.values[15], 3);
            }
            other => panic!("expected a point, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_line_is_a_mismatch_at_any_position() {
        let mut c = LineClassifier::new();
        assert_eq!(c.classify(""), LineOutcome::BannerMismatch);
        assert_eq!(c.classify(""), LineOutcome::HeaderMismatch);
        assert_eq!(c.classify(""), LineOutcome::RowMismatch);
    }

    #[test]
    fn test_wrong_field_count() {
        let mut c = LineClassifier::new();
        c.classify(BANNER);
        c.classify(HEADER);
        assert_eq!(c.classify(" 1  0  2  3"), LineOutcome::RowMismatch);
    }

    #[test]
    fn test_non_numeric_token() {
        let mut c = LineClassifier::new();
        c.classify(BANNER);
        c.classify(HEADER);
        let row = " 1  x      0 102400  20480 512000    0    0     2     3  100  200  5  2 90  3";
        assert_eq!(c.classify(row), LineOutcome::RowMismatch);
    }

    #[test]
    fn test_overflowing_token_is_a_parse_failure() {
        let mut c = LineClassifier::new();
        c.classify(BANNER);
        c.classify(HEADER);
        // 21 digits: passes the pattern, overflows u64.
        let row = " 111111111111111111111  0      0 102400  20480 512000    0    0     2     3  100  200  5  2 90  3";
        assert_eq!(c.classify(row), LineOutcome::RowMismatch);
    }

    #[test]
    fn test_point_timestamp_is_assigned_at_parse_time() {
        let mut c = LineClassifier::new();
        c.classify(BANNER);
        c.classify(HEADER);
        let before = chrono::Utc::now().timestamp_millis();
        let LineOutcome::Point(pnt) = c.classify(ROW) else {
            panic!("expected a point");
        };
        assert!(pnt.time_ms >= before);
    }
}

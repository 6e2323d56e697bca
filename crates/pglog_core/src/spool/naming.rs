//! Segment file naming.

use crate::event::Timestamp;
use crate::{SEGMENT_PREFIX, SEGMENT_SUFFIX};
use std::path::{Path, PathBuf};

/// `strftime` pattern for the timestamp part of a segment name.
pub const SEGMENT_TIME_FORMAT: &str = "%Y-%m-%d_%H%M%S";

/// Builds the path of a segment created at `stamp`.
///
/// Names look like `pglog-2021-01-01_000000.dat`. A non-zero `sequence`
/// disambiguates segments created within the same second:
/// `pglog-2021-01-01_000000_0000000001.dat`. The sequence is padded to the
/// width of `u32::MAX`, so sequenced names sort after the unsequenced one,
/// in sequence order, and before the next second.
#[must_use]
pub fn segment_file_name(dir: &Path, stamp: &Timestamp, sequence: u32) -> PathBuf {
    let stamp = stamp.format(SEGMENT_TIME_FORMAT);
    let name = if sequence == 0 {
        format!("{SEGMENT_PREFIX}-{stamp}{SEGMENT_SUFFIX}")
    } else {
        format!("{SEGMENT_PREFIX}-{stamp}_{sequence:010}{SEGMENT_SUFFIX}")
    };
    dir.join(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn name_layout() {
        let stamp = DateTime::parse_from_rfc3339("2021-01-02T03:04:05+00:00").unwrap();
        assert_eq!(
            segment_file_name(Path::new("/spool"), &stamp, 0),
            PathBuf::from("/spool/pglog-2021-01-02_030405.dat")
        );
        assert_eq!(
            segment_file_name(Path::new("/spool"), &stamp, 2),
            PathBuf::from("/spool/pglog-2021-01-02_030405_0000000002.dat")
        );
    }

    #[test]
    fn names_sort_chronologically() {
        let early = DateTime::parse_from_rfc3339("2021-01-01T23:59:59+00:00").unwrap();
        let late = DateTime::parse_from_rfc3339("2021-01-02T00:00:00+00:00").unwrap();
        let dir = Path::new("d");
        assert!(segment_file_name(dir, &early, 0) < segment_file_name(dir, &early, 1));
        assert!(segment_file_name(dir, &early, 9) < segment_file_name(dir, &early, 10));
        assert!(segment_file_name(dir, &early, 999) < segment_file_name(dir, &early, 1000));
        assert!(
            segment_file_name(dir, &early, u32::MAX - 1) < segment_file_name(dir, &early, u32::MAX)
        );
        assert!(segment_file_name(dir, &early, u32::MAX) < segment_file_name(dir, &late, 0));
    }
}

// tests/property/window_test.rs

//! Extractor containment: for any well-formed log and any window, the output
//! is a contiguous slice of the input with no line duplicated or reordered.

use chrono::{TimeZone, Utc};
use hbreport::core::logtime::dump_log_window;
use hbreport::core::utils::tempfiles;
use proptest::prelude::*;

const BASE_EPOCH: i64 = 1_485_424_800; // 2017-01-26T10:00:00Z

fn stamped_log(count: usize, step: i64) -> Vec<String> {
    (0..count)
        .map(|i| {
            let ts = Utc
                .timestamp_opt(BASE_EPOCH + i as i64 * step, 0)
                .unwrap()
                .to_rfc3339();
            format!("{ts} host daemon: line {i}")
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 50,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_output_is_contiguous_slice(
        count in 2usize..80,
        from_off in 0i64..5000,
        len in 0i64..5000,
    ) {
        tokio_test::block_on(async {
            tempfiles::init().unwrap();
            let lines = stamped_log(count, 60);
            let dir = tempfile::tempdir().unwrap();
            let log = dir.path().join("cluster.log");
            tokio::fs::write(&log, format!("{}\n", lines.join("\n"))).await.unwrap();

            let from = (BASE_EPOCH + from_off) as f64;
            let to = from + len as f64;
            let out = dump_log_window(&log, from, to).await.unwrap();
            let out_lines: Vec<&str> = out.lines().collect();

            // Every output line is an input line, at most once.
            for line in &out_lines {
                assert_eq!(lines.iter().filter(|l| l == line).count(), 1);
            }
            // And they form a contiguous slice in input order.
            if let Some(first) = out_lines.first() {
                let start = lines.iter().position(|l| l == first).unwrap();
                for (offset, line) in out_lines.iter().enumerate() {
                    assert_eq!(&lines[start + offset], line);
                }
            }
        });
    }

    #[test]
    fn test_full_range_reproduces_file(count in 2usize..60) {
        tokio_test::block_on(async {
            tempfiles::init().unwrap();
            let lines = stamped_log(count, 60);
            let content = format!("{}\n", lines.join("\n"));
            let dir = tempfile::tempdir().unwrap();
            let log = dir.path().join("cluster.log");
            tokio::fs::write(&log, &content).await.unwrap();

            let from = BASE_EPOCH as f64;
            let to = (BASE_EPOCH + (count as i64 - 1) * 60) as f64;
            let out = dump_log_window(&log, from, to).await.unwrap();
            assert_eq!(out, content);
        });
    }
}

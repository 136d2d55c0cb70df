#[cfg(test)]
mod tests {
    use dnsload_driver::split::{convert_ranking, find_shard, list_shards, split_ranking};
    use std::fs;
    use std::path::{Path, PathBuf};

    fn setup_test_dir(path: &str) -> PathBuf {
        let dir = PathBuf::from(path);
        fs::remove_dir_all(&dir).ok();
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_ranking(dir: &Path, rows: &[&str]) -> PathBuf {
        let path = dir.join("ranking.csv");
        fs::write(&path, rows.join("\n")).unwrap();
        path
    }

    #[test]
    fn test_two_rows_shard_size_one() {
        let dir = setup_test_dir("/tmp/dnsload-split-two-rows");
        let input = write_ranking(&dir, &["1,example.com", "2,test.org"]);
        let out = dir.join("shards");

        let summary = split_ranking(&input, &out, 1, 1_000_000).unwrap();

        assert_eq!(summary.domains, 2);
        assert_eq!(summary.files.len(), 2);
        assert_eq!(
            summary.files[0].file_name().unwrap().to_str().unwrap(),
            "domains_1_1_to_1.csv"
        );
        assert_eq!(
            summary.files[1].file_name().unwrap().to_str().unwrap(),
            "domains_2_2_to_2.csv"
        );
        assert_eq!(fs::read_to_string(&summary.files[0]).unwrap(), "example.com A\n");
        assert_eq!(fs::read_to_string(&summary.files[1]).unwrap(), "test.org A\n");
    }

    #[test]
    fn test_skips_malformed_rows() {
        let dir = setup_test_dir("/tmp/dnsload-split-malformed");
        let input = write_ranking(&dir, &["no-comma-here", "3,", "1,example.com"]);
        let out = dir.join("shards");

        let summary = split_ranking(&input, &out, 10, 1_000_000).unwrap();

        assert_eq!(summary.domains, 1);
        assert_eq!(summary.files.len(), 1);
        assert_eq!(fs::read_to_string(&summary.files[0]).unwrap(), "example.com A\n");
    }

    #[test]
    fn test_max_domains_cap() {
        let dir = setup_test_dir("/tmp/dnsload-split-cap");
        let rows: Vec<String> = (1..=5).map(|i| format!("{},site{}.com", i, i)).collect();
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        let input = write_ranking(&dir, &rows);
        let out = dir.join("shards");

        let summary = split_ranking(&input, &out, 2, 3).unwrap();

        // min(total_valid_rows, max_domains) records overall
        assert_eq!(summary.domains, 3);
        assert_eq!(summary.files.len(), 2);
        assert_eq!(
            summary.files[0].file_name().unwrap().to_str().unwrap(),
            "domains_1_1_to_2.csv"
        );
        assert_eq!(
            summary.files[1].file_name().unwrap().to_str().unwrap(),
            "domains_2_3_to_3.csv"
        );
    }

    #[test]
    fn test_shard_partition_and_line_format() {
        let dir = setup_test_dir("/tmp/dnsload-split-partition");
        let rows: Vec<String> = (1..=5).map(|i| format!("{},site{}.com", i, i)).collect();
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        let input = write_ranking(&dir, &rows);
        let out = dir.join("shards");

        let summary = split_ranking(&input, &out, 2, 1_000_000).unwrap();

        assert_eq!(summary.files.len(), 3);
        let mut total_lines = 0;
        for (i, file) in summary.files.iter().enumerate() {
            let content = fs::read_to_string(file).unwrap();
            let lines: Vec<&str> = content.lines().collect();
            // full shards of 2, last shard smaller
            if i < 2 {
                assert_eq!(lines.len(), 2);
            } else {
                assert_eq!(lines.len(), 1);
            }
            for line in &lines {
                let mut parts = line.split_whitespace();
                assert!(parts.next().unwrap().contains("site"));
                assert_eq!(parts.next().unwrap(), "A");
                assert!(parts.next().is_none());
            }
            total_lines += lines.len();
        }
        assert_eq!(total_lines, summary.domains);
    }

    #[test]
    fn test_zero_shard_size_is_rejected() {
        let dir = setup_test_dir("/tmp/dnsload-split-zero");
        let input = write_ranking(&dir, &["1,example.com"]);

        let err = split_ranking(&input, &dir.join("shards"), 0, 100).unwrap_err();
        assert!(err.to_string().contains("shard size"));
    }

    #[test]
    fn test_missing_input_is_fatal() {
        let dir = setup_test_dir("/tmp/dnsload-split-missing");
        let result = split_ranking(
            &dir.join("does-not-exist.csv"),
            &dir.join("shards"),
            10,
            100,
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("not found"), "unexpected error: {}", err);
    }

    #[test]
    fn test_convert_ranking_whole_file() {
        let dir = setup_test_dir("/tmp/dnsload-convert");
        let input = write_ranking(&dir, &["1,example.com", "bad-row", "2,test.org"]);
        let output = dir.join("resperf_domains.txt");

        let count = convert_ranking(&input, &output).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "example.com A\ntest.org A\n"
        );
    }

    #[test]
    fn test_find_and_list_shards() {
        let dir = setup_test_dir("/tmp/dnsload-shard-lookup");
        let rows: Vec<String> = (1..=4).map(|i| format!("{},site{}.com", i, i)).collect();
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        let input = write_ranking(&dir, &rows);
        let out = dir.join("shards");
        split_ranking(&input, &out, 2, 1_000_000).unwrap();

        let found = find_shard(&out, 2).unwrap().unwrap();
        assert_eq!(
            found.file_name().unwrap().to_str().unwrap(),
            "domains_2_3_to_4.csv"
        );
        assert!(find_shard(&out, 9).unwrap().is_none());
        // missing directory is "not found", not an I/O error
        assert!(find_shard(&dir.join("nope"), 1).unwrap().is_none());

        let shards = list_shards(&out);
        assert_eq!(shards.len(), 2);
        assert!(shards[0] < shards[1]);
        assert!(list_shards(&dir.join("nope")).is_empty());
    }
}

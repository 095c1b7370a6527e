//! End-to-end runs of the filter pipeline over temp files.

use std::fs;
use std::path::Path;

use blocklist_filter::{run, FilterConfig, FilterError};
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write fixture");
    path
}

fn config(dir: &TempDir, batch_size: usize) -> FilterConfig {
    FilterConfig {
        exclusion_path: dir.path().join("blackList_exportado.csv"),
        blocklist_path: dir.path().join("Blocklist.csv"),
        output_path: dir.path().join("import_block_final.csv"),
        batch_size,
        ..FilterConfig::default()
    }
}

fn output_values(path: &Path) -> (Vec<String>, Vec<String>) {
    let mut reader = csv::Reader::from_path(path).expect("Failed to open output");
    let headers = reader
        .headers()
        .expect("Failed to read headers")
        .iter()
        .map(|s| s.to_string())
        .collect();
    let values = reader
        .records()
        .map(|r| r.expect("Failed to read record")[0].to_string())
        .collect();
    (headers, values)
}

fn blocklist_with(numbers: &[&str]) -> String {
    let mut content = String::from("ID,TELEFONE,ORIGEM\n");
    for (i, number) in numbers.iter().enumerate() {
        content.push_str(&format!("{},{},\"Campanha, {}\"\n", i, number, i));
    }
    content
}

#[test]
fn test_documented_example() {
    let dir = TempDir::new().unwrap();
    write(&dir, "blackList_exportado.csv", "111;Fulano\n");
    write(&dir, "Blocklist.csv", &blocklist_with(&["111", "222", "111", "333"]));

    let cfg = config(&dir, 1_000_000);
    run(&cfg).expect("run failed");

    assert_eq!(
        fs::read_to_string(&cfg.output_path).unwrap(),
        "TELEFONE\n222\n333\n"
    );
}

#[test]
fn test_batch_size_does_not_change_output() {
    let numbers: Vec<String> = (0..37).map(|i| format!("1199999{:04}", i % 23)).collect();
    let refs: Vec<&str> = numbers.iter().map(|s| s.as_str()).collect();
    let exclusions = "11999990003;a\n11999990010;b\n 11999990017 ;c\n";

    let mut outputs = Vec::new();
    for batch_size in [1, 2, 5, 36, 37, 1000] {
        let dir = TempDir::new().unwrap();
        write(&dir, "blackList_exportado.csv", exclusions);
        write(&dir, "Blocklist.csv", &blocklist_with(&refs));

        let cfg = config(&dir, batch_size);
        run(&cfg).expect("run failed");
        outputs.push(fs::read_to_string(&cfg.output_path).unwrap());
    }

    for output in &outputs[1..] {
        assert_eq!(output, &outputs[0]);
    }
}

#[test]
fn test_membership_property_and_single_header() {
    let dir = TempDir::new().unwrap();
    let input = ["5", "1", "2", "3", "1", "4", "5", "6", "2"];
    write(&dir, "blackList_exportado.csv", "1;x\n5;y\n");
    write(&dir, "Blocklist.csv", &blocklist_with(&input));

    let cfg = config(&dir, 2);
    run(&cfg).unwrap();

    let (headers, values) = output_values(&cfg.output_path);
    assert_eq!(headers, vec!["TELEFONE"]);

    let expected: Vec<&str> = input
        .iter()
        .copied()
        .filter(|n| *n != "1" && *n != "5")
        .collect();
    assert_eq!(values, expected);

    let content = fs::read_to_string(&cfg.output_path).unwrap();
    assert_eq!(content.matches("TELEFONE").count(), 1);
    assert!(content.starts_with("TELEFONE\n"));
}

#[test]
fn test_missing_exclusion_file_passes_everything() {
    let dir = TempDir::new().unwrap();
    write(&dir, "Blocklist.csv", &blocklist_with(&["111", "222", "111"]));

    let cfg = config(&dir, 2);
    let summary = run(&cfg).unwrap();

    assert_eq!(summary.exclusion_keys, 0);
    let (_, values) = output_values(&cfg.output_path);
    assert_eq!(values, vec!["111", "222", "111"]);
}

#[test]
fn test_empty_exclusion_file_matches_input_column() {
    let dir = TempDir::new().unwrap();
    write(&dir, "blackList_exportado.csv", "\n\n");
    write(&dir, "Blocklist.csv", "TELEFONE,NOME\n0011,a\n22,b\n");

    let cfg = config(&dir, 1);
    run(&cfg).unwrap();

    assert_eq!(
        fs::read_to_string(&cfg.output_path).unwrap(),
        "TELEFONE\n0011\n22\n"
    );
}

#[test]
fn test_everything_excluded_yields_empty_output() {
    let dir = TempDir::new().unwrap();
    write(&dir, "blackList_exportado.csv", "111\n");
    write(&dir, "Blocklist.csv", "TELEFONE\n111\n111\n");
    write(&dir, "import_block_final.csv", "TELEFONE\nstale\n");

    let cfg = config(&dir, 1);
    let summary = run(&cfg).unwrap();

    assert!(!summary.header_written);
    assert_eq!(fs::read_to_string(&cfg.output_path).unwrap(), "");
}

#[test]
fn test_parse_error_keeps_flushed_batches() {
    let dir = TempDir::new().unwrap();
    write(&dir, "blackList_exportado.csv", "");
    let path = dir.path().join("Blocklist.csv");
    fs::write(&path, b"TELEFONE\n111\n222\n\xff\n333\n").unwrap();

    let cfg = config(&dir, 2);
    let result = run(&cfg);

    assert!(matches!(result, Err(FilterError::CsvRead(_))));
    assert_eq!(
        fs::read_to_string(&cfg.output_path).unwrap(),
        "TELEFONE\n111\n222\n"
    );
}

#[test]
fn test_atomic_mode_keeps_previous_output_on_error() {
    let dir = TempDir::new().unwrap();
    write(&dir, "blackList_exportado.csv", "");
    write(&dir, "import_block_final.csv", "TELEFONE\nprevious\n");
    let path = dir.path().join("Blocklist.csv");
    fs::write(&path, b"TELEFONE\n111\n222\n\xff\n333\n").unwrap();

    let cfg = FilterConfig {
        atomic_output: true,
        ..config(&dir, 2)
    };
    assert!(run(&cfg).is_err());

    assert_eq!(
        fs::read_to_string(&cfg.output_path).unwrap(),
        "TELEFONE\nprevious\n"
    );
    // Only the three fixtures remain; the temp file was removed.
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 3);
}

#[test]
fn test_second_run_overwrites_output() {
    let dir = TempDir::new().unwrap();
    write(&dir, "blackList_exportado.csv", "");
    write(&dir, "Blocklist.csv", "TELEFONE\n111\n");

    let cfg = config(&dir, 10);
    run(&cfg).unwrap();
    run(&cfg).unwrap();

    assert_eq!(
        fs::read_to_string(&cfg.output_path).unwrap(),
        "TELEFONE\n111\n"
    );
}

#[test]
fn test_missing_key_column_does_not_create_output() {
    let dir = TempDir::new().unwrap();
    write(&dir, "Blocklist.csv", "PHONE\n111\n");

    let cfg = config(&dir, 10);
    assert!(matches!(
        run(&cfg),
        Err(FilterError::MissingColumn { .. })
    ));
    assert!(!cfg.output_path.exists());
}

#[test]
fn test_output_alias_of_blocklist_is_rejected_and_input_kept() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    let numbers: Vec<String> = (0..5_000).map(|i| format!("1198888{:04}", i)).collect();
    let refs: Vec<&str> = numbers.iter().map(|s| s.as_str()).collect();
    let original = blocklist_with(&refs);
    let blocklist = write(&dir, "Blocklist.csv", &original);

    let cfg = FilterConfig {
        output_path: dir.path().join("sub").join("..").join("Blocklist.csv"),
        ..config(&dir, 100)
    };

    assert!(matches!(run(&cfg), Err(FilterError::InvalidConfig(_))));
    assert_eq!(fs::read_to_string(&blocklist).unwrap(), original);
}

#[test]
fn test_long_row_halts_run() {
    let dir = TempDir::new().unwrap();
    write(&dir, "Blocklist.csv", "ID,TELEFONE\n1,111\n2,222,extra,fields\n\n3,333\n");

    let cfg = config(&dir, 1);
    assert!(matches!(run(&cfg), Err(FilterError::CsvRead(_))));

    // The batch flushed before the bad row stays; nothing after it is written.
    assert_eq!(
        fs::read_to_string(&cfg.output_path).unwrap(),
        "TELEFONE\n111\n"
    );
}

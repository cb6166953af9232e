#![no_main]
use libfuzzer_sys::fuzz_target;

/// Fuzz tabular BOM parsing.
///
/// Feeds arbitrary text through header detection and every table shape
/// parser (level-indexed, number pairs, name pairs).
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let aliases = bom_tools::tabular::TabularAliases::default();
        if let Ok(table) = bom_tools::tabular::read_csv_str("fuzz", s, &aliases) {
            let parsed = bom_tools::tabular::parse_tables([&table], &aliases);
            let _ = bom_tools::tabular::CrossReferenceIndex::build([&table], &aliases);
            assert!(parsed.stats.rows_read <= table.rows.len());
        }
    }
});

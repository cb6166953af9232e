#![no_main]
use libfuzzer_sys::fuzz_target;

/// Fuzz structure flattening.
///
/// Any JSON document must flatten without panicking, however deeply nested
/// or oddly shaped its children lists are.
fuzz_target!(|data: &[u8]| {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) {
        let aliases = bom_tools::structure::StructureAliases::default();
        let flat = bom_tools::structure::flatten(&value, Some("ROOT"), &aliases);
        let _ = bom_tools::structure::has_nested_children(&value, &aliases);
        assert!(flat.edges.iter().all(|e| !e.is_self_loop()));
    }
});

#![no_main]

use libfuzzer_sys::fuzz_target;
use runtime_overrides::server::ServerRuntimeConfigOverlay;
use runtime_overrides::{DocumentFormat, parse_overlay};

fuzz_target!(|data: &[u8]| {
    // Every format should return Result, never panic, including on bad UTF-8
    for format in [DocumentFormat::Json, DocumentFormat::Yaml, DocumentFormat::Toml] {
        if let Err(err) = parse_overlay::<ServerRuntimeConfigOverlay>(data, format) {
            // Rendering the diagnostic must not panic either (spans stay in bounds)
            let _ = format!("{:?}", runtime_overrides::miette::Report::new(err));
        }
    }

    // Misspelled keys next to arbitrary values
    let content = String::from_utf8_lossy(data);
    let docs = [
        format!("autoschema_enbaled: {content}"),
        format!("maximum_allowed_collections_count: {content}"),
        format!("{content}: true"),
    ];
    for doc in &docs {
        let _ = parse_overlay::<ServerRuntimeConfigOverlay>(doc.as_bytes(), DocumentFormat::Yaml);
    }
});

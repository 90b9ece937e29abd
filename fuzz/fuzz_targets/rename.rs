#![no_main]

use libfuzzer_sys::fuzz_target;
use cxxsr_core::{ItaniumDemangler, RenameConfig, SymbolRenamer};
use cxxsr_demangle::demangle_with_tokens;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);

    let mut renamer = SymbolRenamer::new(ItaniumDemangler, RenameConfig::default());
    for line in text.lines().take(64) {
        renamer.add_line(line);
    }
    let renamed = renamer.finish();

    for symbol in &renamed.symbols {
        if symbol.error.is_none() {
            // A complete rewrite must stay demangleable.
            assert!(
                demangle_with_tokens(&symbol.rewritten).is_some(),
                "{} -> {}",
                symbol.original,
                symbol.rewritten
            );
        }
    }
});

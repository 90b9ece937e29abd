//! Batch renaming of a stream of mangled symbols.
//!
//! Symbols are accumulated first, because a substitute can only be allocated
//! once every identifier of the run is known. The output order is the order
//! in which distinct lines were first accepted.

use std::io::{BufRead, Write};

use cxxsr_demangle::Demangled;
use indexmap::IndexMap;

use crate::allocator::{HashAllocator, RenameTable};
use crate::collector::IdentifierSet;
use crate::config::RenameConfig;
use crate::error::{Result, RewriteError};
use crate::substitutor::rewrite;

/// Turns a mangled name into its display form and identifier tokens.
pub trait Demangler {
    /// Returns None for names that cannot be demangled.
    fn demangle(&self, mangled: &str) -> Option<Demangled>;
}

/// The Itanium C++ ABI demangler from `cxxsr-demangle`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItaniumDemangler;

impl Demangler for ItaniumDemangler {
    fn demangle(&self, mangled: &str) -> Option<Demangled> {
        cxxsr_demangle::demangle_with_tokens(mangled)
    }
}

impl<F> Demangler for F
where
    F: Fn(&str) -> Option<Demangled>,
{
    fn demangle(&self, mangled: &str) -> Option<Demangled> {
        self(mangled)
    }
}

/// Counters describing one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenameStats {
    /// Non-empty input lines.
    pub lines: usize,
    /// Distinct lines that demangled successfully.
    pub accepted: usize,
    /// Lines repeating an already accepted symbol.
    pub duplicates: usize,
    /// Lines the demangler could not handle.
    pub rejected: usize,
    /// Accepted symbols whose rewrite stopped early.
    pub misaligned: usize,
    /// Distinct renamed identifiers.
    pub identifiers: usize,
}

/// One accepted symbol after renaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamedSymbol {
    pub original: String,
    pub demangled: String,
    pub rewritten: String,
    pub error: Option<RewriteError>,
}

impl RenamedSymbol {
    /// Write the `# <demangled>` and `<original> <rewritten>` lines.
    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "# {}", self.demangled)?;
        writeln!(out, "{} {}", self.original, self.rewritten)
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RenameOutput {
    pub table: RenameTable,
    pub symbols: Vec<RenamedSymbol>,
    pub stats: RenameStats,
}

impl RenameOutput {
    /// Write all symbols in output order.
    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        for symbol in &self.symbols {
            symbol.write_to(out)?;
        }
        Ok(())
    }
}

/// Accumulates symbols, then renames them all at once.
pub struct SymbolRenamer<D> {
    demangler: D,
    config: RenameConfig,
    symbols: IndexMap<String, Demangled>,
    stats: RenameStats,
}

impl<D: Demangler> SymbolRenamer<D> {
    pub fn new(demangler: D, config: RenameConfig) -> Self {
        Self {
            demangler,
            config,
            symbols: IndexMap::new(),
            stats: RenameStats::default(),
        }
    }

    /// Offer one input line. Returns true if it was accepted as a new symbol.
    pub fn add_line(&mut self, line: &str) -> bool {
        let line = line.trim_end_matches(&['\r', '\n'][..]);
        if line.is_empty() {
            return false;
        }
        self.stats.lines += 1;

        if self.symbols.contains_key(line) {
            self.stats.duplicates += 1;
            tracing::debug!(symbol = line, "duplicate symbol ignored");
            return false;
        }

        match self.demangler.demangle(line) {
            Some(demangled) => {
                self.symbols.insert(line.to_string(), demangled);
                self.stats.accepted += 1;
                true
            }
            None => {
                self.stats.rejected += 1;
                tracing::debug!(symbol = line, "not demangleable, skipped");
                false
            }
        }
    }

    /// Number of symbols accepted so far.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Allocate substitutes for every collected identifier and rewrite every
    /// accepted symbol.
    pub fn finish(self) -> RenameOutput {
        let identifiers = IdentifierSet::collect(self.symbols.values());
        let table = HashAllocator::new(&self.config).allocate(&identifiers);
        let mut stats = self.stats;
        stats.identifiers = table.len();

        let symbols: Vec<RenamedSymbol> = self
            .symbols
            .into_iter()
            .map(|(original, demangled)| {
                let result = rewrite(&original, &demangled.tokens, &table);
                if let Some(error) = &result.error {
                    stats.misaligned += 1;
                    tracing::warn!(symbol = %original, %error, "token list does not match symbol text");
                }
                RenamedSymbol {
                    original,
                    demangled: demangled.display,
                    rewritten: result.text,
                    error: result.error,
                }
            })
            .collect();

        tracing::info!(
            lines = stats.lines,
            accepted = stats.accepted,
            duplicates = stats.duplicates,
            rejected = stats.rejected,
            misaligned = stats.misaligned,
            identifiers = stats.identifiers,
            "renaming finished"
        );

        RenameOutput {
            table,
            symbols,
            stats,
        }
    }
}

/// Read symbols from `input`, rename them, and write the result to `output`.
pub fn rename_stream<R: BufRead, W: Write>(
    input: R,
    output: &mut W,
    config: &RenameConfig,
) -> Result<RenameOutput> {
    config.validate()?;
    let mut renamer = SymbolRenamer::new(ItaniumDemangler, config.clone());
    for line in input.lines() {
        renamer.add_line(&line?);
    }
    let renamed = renamer.finish();
    renamed.write_to(output)?;
    Ok(renamed)
}

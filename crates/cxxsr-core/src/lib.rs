//! # cxxsr-core
//!
//! Deterministic renaming of the identifiers embedded in mangled C++ symbol
//! names.
//!
//! The pipeline runs in one direction:
//!
//! 1. a [`Demangler`] turns every input symbol into its display form and the
//!    ordered identifier tokens it contains,
//! 2. [`IdentifierSet`] gathers the distinct renameable identifiers,
//! 3. [`HashAllocator`] assigns each one a unique substitute name,
//! 4. [`rewrite`] replays each symbol's tokens to splice the substitutes in.
//!
//! # Example
//!
//! ```
//! use cxxsr_core::{rename_stream, RenameConfig};
//!
//! let mut out = Vec::new();
//! let renamed = rename_stream("_Z3fooi\n".as_bytes(), &mut out, &RenameConfig::default()).unwrap();
//!
//! let foo = renamed.table.encoded("foo").unwrap();
//! assert_eq!(
//!     String::from_utf8(out).unwrap(),
//!     format!("# foo(int)\n_Z3fooi _Z{}i\n", foo)
//! );
//! ```

pub mod allocator;
pub mod collector;
pub mod config;
pub mod error;
pub mod renamer;
pub mod substitutor;

pub use allocator::{salted_hash, HashAllocator, RenameTable};
pub use collector::{is_renameable, IdentifierSet};
pub use config::{RenameConfig, COLLISION_HEADROOM, DEFAULT_PREFIX};
pub use error::{ConfigError, Error, Result, RewriteError};
pub use renamer::{
    rename_stream, Demangler, ItaniumDemangler, RenameOutput, RenameStats, RenamedSymbol,
    SymbolRenamer,
};
pub use substitutor::{rewrite, Rewrite};

pub use cxxsr_demangle::{Demangled, Token};

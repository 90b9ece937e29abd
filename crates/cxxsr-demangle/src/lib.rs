//! # cxxsr-demangle
//!
//! Itanium C++ ABI demangling for the symbol renamer.
//!
//! Besides the human-readable form of a symbol, the demangler reports every
//! source-level identifier it consumed while parsing, in the order those
//! identifiers appear inside the mangled string. Repeated identifiers are
//! reported once per occurrence; identifiers that belong to the toolchain
//! rather than the programmer are flagged as reserved.
//!
//! ```
//! use cxxsr_demangle::demangle_with_tokens;
//!
//! let demangled = demangle_with_tokens("_ZN3foo3barEi").unwrap();
//! assert_eq!(demangled.display, "foo::bar(int)");
//! let names: Vec<_> = demangled.tokens.iter().map(|t| t.text.as_str()).collect();
//! assert_eq!(names, ["foo", "bar"]);
//! ```

mod itanium;

/// Identifiers starting with this marker are reserved for the implementation.
pub const RESERVED_PREFIX: &str = "__";

/// An identifier as it occurs inside a mangled name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    /// The identifier text, without its length prefix.
    pub text: String,
    /// Reserved identifiers must never be renamed.
    pub reserved: bool,
    /// Byte offset of the length field in the mangled name, when known.
    pub offset: Option<usize>,
}

impl Token {
    /// Create a token, flagging it reserved when it carries the reserved prefix.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let reserved = is_reserved_identifier(&text);
        Self {
            text,
            reserved,
            offset: None,
        }
    }

    /// Create a token that is always treated as reserved.
    pub fn reserved(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reserved: true,
            offset: None,
        }
    }

    /// Pin the token to the position of its length field.
    pub fn at(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// The `<length><identifier>` field this token occupies in a mangled name.
    pub fn envelope(&self) -> String {
        length_prefixed(&self.text)
    }
}

/// The result of demangling a single symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demangled {
    /// Human-readable rendering, e.g. `foo::bar(int)`.
    pub display: String,
    /// Identifiers in left-to-right order of occurrence, duplicates included.
    pub tokens: Vec<Token>,
}

/// Returns true for identifiers using the implementation-reserved `__` prefix.
pub fn is_reserved_identifier(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}

/// Encode an identifier the way the Itanium ABI encodes a `<source-name>`.
pub fn length_prefixed(identifier: &str) -> String {
    format!("{}{}", identifier.len(), identifier)
}

/// Demangle a symbol and report the identifiers it is built from.
///
/// Returns None if the symbol is not mangled or uses an unsupported
/// construct.
pub fn demangle_with_tokens(name: &str) -> Option<Demangled> {
    itanium::parse(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demangle(name: &str) -> Option<String> {
        demangle_with_tokens(name).map(|d| d.display)
    }

    fn texts(d: &Demangled) -> Vec<&str> {
        d.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_simple_function() {
        let d = demangle_with_tokens("_Z3fooi").unwrap();
        assert_eq!(d.display, "foo(int)");
        assert_eq!(texts(&d), ["foo"]);
        assert!(!d.tokens[0].reserved);
    }

    #[test]
    fn test_void_params() {
        assert_eq!(demangle("_Z4mainv"), Some("main()".to_string()));
    }

    #[test]
    fn test_data_symbol() {
        assert_eq!(demangle("_ZN3foo5countE"), Some("foo::count".to_string()));
    }

    #[test]
    fn test_repeated_identifier() {
        let d = demangle_with_tokens("_ZN3baz3bazEv").unwrap();
        assert_eq!(d.display, "baz::baz()");
        assert_eq!(texts(&d), ["baz", "baz"]);
    }

    #[test]
    fn test_const_method() {
        assert_eq!(
            demangle("_ZNK3Foo3getEv"),
            Some("Foo::get() const".to_string())
        );
    }

    #[test]
    fn test_ctor_and_dtor() {
        assert_eq!(demangle("_ZN3FooC1Ev"), Some("Foo::Foo()".to_string()));
        assert_eq!(demangle("_ZN3FooD2Ev"), Some("Foo::~Foo()".to_string()));
    }

    #[test]
    fn test_copy_ctor_uses_substitution() {
        let d = demangle_with_tokens("_ZN5Outer5InnerC2ERKS0_").unwrap();
        assert_eq!(d.display, "Outer::Inner::Inner(Outer::Inner const&)");
        assert_eq!(texts(&d), ["Outer", "Inner"]);
    }

    #[test]
    fn test_pointer_to_const_char() {
        assert_eq!(demangle("_Z3bazPKc"), Some("baz(char const*)".to_string()));
    }

    #[test]
    fn test_function_template() {
        assert_eq!(demangle("_Z1fIiEvT_"), Some("void f<int>(int)".to_string()));
        assert_eq!(
            demangle("_Z3maxIiET_S0_S0_"),
            Some("int max<int>(int, int)".to_string())
        );
    }

    #[test]
    fn test_std_template() {
        assert_eq!(
            demangle("_ZSt4swapIiEvRT_S1_"),
            Some("void std::swap<int>(int&, int&)".to_string())
        );
    }

    #[test]
    fn test_std_abbreviation() {
        let d = demangle_with_tokens("_Z5printRKSs").unwrap();
        assert_eq!(d.display, "print(std::string const&)");
        assert_eq!(texts(&d), ["print"]);
    }

    #[test]
    fn test_function_pointer_param() {
        assert_eq!(
            demangle("_Z8registerPFviE"),
            Some("register(void (*)(int))".to_string())
        );
    }

    #[test]
    fn test_member_function_pointer() {
        assert_eq!(
            demangle("_Z4bindM3FooKFvvE"),
            Some("bind(void (Foo::*)() const)".to_string())
        );
    }

    #[test]
    fn test_array_reference() {
        assert_eq!(demangle("_Z3sumRA4_i"), Some("sum(int (&) [4])".to_string()));
    }

    #[test]
    fn test_local_name() {
        let d = demangle_with_tokens("_ZZ4mainvE5count").unwrap();
        assert_eq!(d.display, "main()::count");
        assert_eq!(texts(&d), ["main", "count"]);
    }

    #[test]
    fn test_special_names() {
        assert_eq!(demangle("_ZTV3Foo"), Some("vtable for Foo".to_string()));
        assert_eq!(demangle("_ZTI3Foo"), Some("typeinfo for Foo".to_string()));
        assert_eq!(
            demangle("_ZGVZ4mainvE1x"),
            Some("guard variable for main()::x".to_string())
        );
        assert_eq!(
            demangle("_ZThn8_N3Foo3runEv"),
            Some("non-virtual thunk to Foo::run()".to_string())
        );
    }

    #[test]
    fn test_operator_names() {
        assert_eq!(
            demangle("_ZN3VecplERKS_"),
            Some("Vec::operator+(Vec const&)".to_string())
        );
        assert_eq!(
            demangle("_ZN3FoocviEv"),
            Some("Foo::operator int()".to_string())
        );
    }

    #[test]
    fn test_template_literal_argument() {
        assert_eq!(
            demangle("_Z5arrayILi4EEvv"),
            Some("void array<4>()".to_string())
        );
        assert_eq!(
            demangle("_Z4flagILb1EEvv"),
            Some("void flag<true>()".to_string())
        );
        assert_eq!(
            demangle("_ZN3FooILi2EE3getEv"),
            Some("Foo<2>::get()".to_string())
        );
        assert_eq!(
            demangle("_Z3powILin12EEvv"),
            Some("void pow<-12>()".to_string())
        );
        assert_eq!(
            demangle("_Z5scaleILf3f800000EEvv"),
            Some("void scale<(float)3f800000>()".to_string())
        );
    }

    #[test]
    fn test_std_array_size() {
        let d = demangle_with_tokens("_ZNSt5arrayIiLm4EE4sizeEv").unwrap();
        assert_eq!(d.display, "std::array<int, 4ul>::size()");
        assert_eq!(texts(&d), ["array", "size"]);
    }

    #[test]
    fn test_reserved_tokens_are_flagged() {
        let d = demangle_with_tokens("_ZN9__gnu_cxx13new_allocatorIcE8allocateEm").unwrap();
        assert_eq!(
            d.display,
            "__gnu_cxx::new_allocator<char>::allocate(unsigned long)"
        );
        assert_eq!(texts(&d), ["__gnu_cxx", "new_allocator", "allocate"]);
        assert!(d.tokens[0].reserved);
        assert!(!d.tokens[1].reserved);
    }

    #[test]
    fn test_anonymous_namespace_is_reserved() {
        let d = demangle_with_tokens("_ZN12_GLOBAL__N_13fooEv").unwrap();
        assert_eq!(d.display, "(anonymous namespace)::foo()");
        assert_eq!(texts(&d), ["_GLOBAL__N_1", "foo"]);
        assert!(d.tokens[0].reserved);
    }

    #[test]
    fn test_abi_tag_is_reserved() {
        let d = demangle_with_tokens("_Z5helloB5cxx11v").unwrap();
        assert_eq!(d.display, "hello[abi:cxx11]()");
        assert_eq!(texts(&d), ["hello", "cxx11"]);
        assert!(d.tokens[1].reserved);
    }

    #[test]
    fn test_lambda() {
        assert_eq!(
            demangle("_ZZ4mainvENKUliE_clEi"),
            Some("main()::{lambda(int)#1}::operator()(int) const".to_string())
        );
    }

    #[test]
    fn test_clone_suffix() {
        assert_eq!(
            demangle("_Z3fooi.cold"),
            Some("foo(int) [clone .cold]".to_string())
        );
    }

    #[test]
    fn test_macho_prefix() {
        assert_eq!(demangle("__Z3fooi"), Some("foo(int)".to_string()));
    }

    #[test]
    fn test_non_mangled() {
        assert_eq!(demangle("printf"), None);
        assert_eq!(demangle("main"), None);
        assert_eq!(demangle("_Z"), None);
        assert_eq!(demangle("_Z3fo"), None);
        assert_eq!(demangle("_Z3fooi!"), None);
    }

    #[test]
    fn test_token_offsets_skip_back_references() {
        // `S2_` is followed by `m`, which looks like the field `2_m`.
        let d = demangle_with_tokens("_Z1f1A1B1C1DS2_m2_m").unwrap();
        assert_eq!(d.display, "f(A, B, C, D, D, unsigned long, _m)");
        assert_eq!(texts(&d), ["f", "A", "B", "C", "D", "_m"]);
        let offsets: Vec<_> = d.tokens.iter().map(|t| t.offset).collect();
        assert_eq!(
            offsets,
            [Some(2), Some(4), Some(6), Some(8), Some(10), Some(16)]
        );
    }

    #[test]
    fn test_token_envelope() {
        assert_eq!(Token::new("foo").envelope(), "3foo");
        assert_eq!(Token::new("foo").offset, None);
        assert_eq!(Token::new("foo").at(2).offset, Some(2));
        assert!(Token::new("__x").reserved);
        assert!(Token::reserved("cxx11").reserved);
        assert!(!Token::new("_x").reserved);
    }
}

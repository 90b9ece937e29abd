//! Itanium C++ ABI demangler.
//!
//! A recursive-descent parser over the mangled bytes. Rendering happens while
//! parsing: every production returns its display text, and the substitution
//! table stores already-rendered types. Source names are recorded as tokens
//! in the order they are consumed, which is their textual order.

use crate::{is_reserved_identifier, Demangled, Token};

/// Nesting limit for recursive productions.
const MAX_DEPTH: u32 = 256;

const ANONYMOUS_NAMESPACE: &str = "_GLOBAL__N";

/// Demangle an Itanium C++ ABI symbol.
///
/// Symbols start with `_Z` (or `__Z` on Mach-O) followed by an encoding and
/// an optional vendor clone suffix.
pub(crate) fn parse(name: &str) -> Option<Demangled> {
    let start = if name.starts_with("_Z") {
        2
    } else if name.starts_with("__Z") {
        3
    } else {
        return None;
    };

    let mut parser = Parser::new(name, start);
    let mut display = parser.encoding()?;

    if parser.pos < name.len() {
        let rest = &name[parser.pos..];
        if !rest.starts_with('.') || rest.len() == 1 {
            return None;
        }
        display.push_str(&format!(" [clone {}]", rest));
    }

    Some(Demangled {
        display,
        tokens: parser.tokens,
    })
}

/// A rendered type.
///
/// Types with a declarator part (functions, arrays) are split around the
/// point where pointer and reference symbols must be inserted: the full
/// rendering is always `head + tail`.
#[derive(Debug, Clone, Default)]
struct Ty {
    head: String,
    tail: String,
    /// The declarator group is already parenthesized.
    open: bool,
    /// Function type; cv-qualifiers attach after the parameter list.
    func: bool,
}

impl Ty {
    fn named(name: impl Into<String>) -> Self {
        Self {
            head: name.into(),
            ..Self::default()
        }
    }

    fn render(&self) -> String {
        format!("{}{}", self.head, self.tail)
    }

    /// Apply a declarator symbol such as `*`, `&` or `Foo::*`.
    fn wrap(&self, symbol: &str) -> Self {
        if self.tail.is_empty() || self.open {
            return Self {
                head: format!("{}{}", self.head, symbol),
                ..self.clone()
            };
        }
        let sep = if self.head.ends_with(' ') { "" } else { " " };
        Self {
            head: format!("{}{}({}", self.head, sep, symbol),
            tail: format!("){}", self.tail),
            open: true,
            func: self.func,
        }
    }

    fn qualify(&self, quals: &str) -> Self {
        if self.func && !self.open {
            Self {
                tail: format!("{}{}", self.tail, quals),
                ..self.clone()
            }
        } else if !self.tail.is_empty() && !self.open {
            Self {
                head: format!("{}{}", self.head, quals),
                ..self.clone()
            }
        } else {
            self.wrap(quals)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameKind {
    Plain,
    /// Constructors, destructors and conversion operators have no return type.
    NoReturn,
}

#[derive(Debug, Clone)]
struct Name {
    display: String,
    is_template: bool,
    kind: NameKind,
    /// Trailing method qualifiers, e.g. ` const &`.
    qualifiers: String,
}

impl Name {
    fn plain(display: String) -> Self {
        Self {
            display,
            is_template: false,
            kind: NameKind::Plain,
            qualifiers: String::new(),
        }
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: u32,
    subs: Vec<Ty>,
    template_args: Vec<Ty>,
    tokens: Vec<Token>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, pos: usize) -> Self {
        Self {
            input,
            pos,
            depth: 0,
            subs: Vec::new(),
            template_args: Vec::new(),
            tokens: Vec::new(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: u8) -> Option<()> {
        self.eat(c).then_some(())
    }

    fn guarded<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        if self.depth >= MAX_DEPTH {
            return None;
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn number(&mut self) -> Option<u64> {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        if start == self.pos {
            return None;
        }
        self.input[start..self.pos].parse().ok()
    }

    fn signed_number(&mut self) -> Option<i64> {
        let negative = self.eat(b'n');
        let value = i64::try_from(self.number()?).ok()?;
        Some(if negative { -value } else { value })
    }

    /// `_` is index 0, `<base-36 digits>_` is the value plus one.
    fn seq_id(&mut self) -> Option<usize> {
        if self.eat(b'_') {
            return Some(0);
        }
        let mut value: usize = 0;
        loop {
            let c = self.peek()?;
            let digit = match c {
                b'0'..=b'9' => c - b'0',
                b'A'..=b'Z' => c - b'A' + 10,
                b'_' => break,
                _ => return None,
            };
            value = value.checked_mul(36)?.checked_add(usize::from(digit))?;
            self.pos += 1;
        }
        self.pos += 1;
        value.checked_add(1)
    }

    fn discriminator(&mut self) -> Option<()> {
        if self.peek() != Some(b'_') {
            return Some(());
        }
        self.pos += 1;
        if self.eat(b'_') {
            self.number()?;
            self.expect(b'_')
        } else {
            self.number().map(|_| ())
        }
    }

    fn at_encoding_end(&self) -> bool {
        matches!(self.peek(), None | Some(b'E') | Some(b'.'))
    }

    fn source_name(&mut self, force_reserved: bool) -> Option<String> {
        let offset = self.pos;
        let len = usize::try_from(self.number()?).ok()?;
        let end = self.pos.checked_add(len)?;
        let text = self.input.get(self.pos..end)?;
        if text.is_empty() {
            return None;
        }
        self.pos = end;

        let anonymous = text.starts_with(ANONYMOUS_NAMESPACE);
        self.tokens.push(Token {
            text: text.to_string(),
            reserved: force_reserved || anonymous || is_reserved_identifier(text),
            offset: Some(offset),
        });

        if anonymous {
            Some("(anonymous namespace)".to_string())
        } else {
            Some(text.to_string())
        }
    }

    fn encoding(&mut self) -> Option<String> {
        self.guarded(|p| p.encoding_inner())
    }

    fn encoding_inner(&mut self) -> Option<String> {
        match (self.peek()?, self.peek_at(1)) {
            (b'T', _) | (b'G', Some(b'V' | b'R')) => return self.special_name(),
            _ => {}
        }

        let name = self.name(true)?;
        if self.at_encoding_end() {
            return Some(name.display);
        }

        let ret = if name.is_template && name.kind == NameKind::Plain {
            Some(self.ty()?)
        } else {
            None
        };
        let params = self.bare_params()?;

        let mut out = String::new();
        if let Some(ret) = ret {
            out.push_str(&ret.render());
            out.push(' ');
        }
        out.push_str(&name.display);
        out.push_str(&params);
        out.push_str(&name.qualifiers);
        Some(out)
    }

    fn bare_params(&mut self) -> Option<String> {
        if self.peek() == Some(b'v') && matches!(self.peek_at(1), None | Some(b'E' | b'.')) {
            self.pos += 1;
            return Some("()".to_string());
        }
        let mut params = Vec::new();
        while !self.at_encoding_end() {
            params.push(self.ty()?.render());
        }
        if params.is_empty() {
            return None;
        }
        Some(format!("({})", params.join(", ")))
    }

    fn special_name(&mut self) -> Option<String> {
        let (first, second) = (self.peek()?, self.peek_at(1)?);
        self.pos += 2;
        match (first, second) {
            (b'T', b'V') => Some(format!("vtable for {}", self.ty()?.render())),
            (b'T', b'T') => Some(format!("VTT for {}", self.ty()?.render())),
            (b'T', b'I') => Some(format!("typeinfo for {}", self.ty()?.render())),
            (b'T', b'S') => Some(format!("typeinfo name for {}", self.ty()?.render())),
            (b'T', b'h') => {
                self.signed_number()?;
                self.expect(b'_')?;
                Some(format!("non-virtual thunk to {}", self.encoding()?))
            }
            (b'T', b'v') => {
                self.signed_number()?;
                self.expect(b'_')?;
                self.signed_number()?;
                self.expect(b'_')?;
                Some(format!("virtual thunk to {}", self.encoding()?))
            }
            (b'T', b'c') => {
                self.call_offset()?;
                self.call_offset()?;
                Some(format!("covariant return thunk to {}", self.encoding()?))
            }
            (b'T', b'W') => Some(format!("TLS wrapper function for {}", self.name(false)?.display)),
            (b'T', b'H') => Some(format!("TLS init function for {}", self.name(false)?.display)),
            (b'T', b'C') => {
                let derived = self.ty()?;
                self.signed_number()?;
                self.expect(b'_')?;
                let base = self.ty()?;
                Some(format!(
                    "construction vtable for {}-in-{}",
                    base.render(),
                    derived.render()
                ))
            }
            (b'G', b'V') => Some(format!("guard variable for {}", self.name(false)?.display)),
            (b'G', b'R') => {
                let name = self.name(false)?;
                let index = if self.at_encoding_end() { 0 } else { self.seq_id()? };
                Some(format!("reference temporary #{} for {}", index, name.display))
            }
            _ => None,
        }
    }

    fn call_offset(&mut self) -> Option<()> {
        match self.peek()? {
            b'h' => {
                self.pos += 1;
                self.signed_number()?;
                self.expect(b'_')
            }
            b'v' => {
                self.pos += 1;
                self.signed_number()?;
                self.expect(b'_')?;
                self.signed_number()?;
                self.expect(b'_')
            }
            _ => None,
        }
    }

    /// Parse a `<name>`. `record` marks the name of the encoding itself, whose
    /// template arguments are what `T_` refers to in the signature.
    fn name(&mut self, record: bool) -> Option<Name> {
        self.guarded(|p| p.name_inner(record))
    }

    fn name_inner(&mut self, record: bool) -> Option<Name> {
        match (self.peek()?, self.peek_at(1)) {
            (b'N', _) => self.nested_name(record),
            (b'Z', _) => self.local_name(record),
            (b'S', Some(b't')) => {
                self.pos += 2;
                let (unqualified, kind) = self.unqualified_name("")?;
                let display = format!("std::{}", unqualified);
                self.maybe_template(display, kind, record)
            }
            (b'S', _) => {
                let sub = self.substitution()?;
                if self.peek() != Some(b'I') {
                    return None;
                }
                let args = self.template_args(record)?;
                Some(Name {
                    display: format!("{}{}", sub.render(), args),
                    is_template: true,
                    kind: NameKind::Plain,
                    qualifiers: String::new(),
                })
            }
            _ => {
                let (display, kind) = self.unqualified_name("")?;
                self.maybe_template(display, kind, record)
            }
        }
    }

    fn maybe_template(&mut self, display: String, kind: NameKind, record: bool) -> Option<Name> {
        if self.peek() != Some(b'I') {
            return Some(Name {
                kind,
                ..Name::plain(display)
            });
        }
        self.subs.push(Ty::named(display.clone()));
        let args = self.template_args(record)?;
        Some(Name {
            display: format!("{}{}", display, args),
            is_template: true,
            kind,
            qualifiers: String::new(),
        })
    }

    fn nested_name(&mut self, record: bool) -> Option<Name> {
        self.expect(b'N')?;

        let mut cv = Vec::new();
        if self.eat(b'r') {
            cv.push(" restrict");
        }
        if self.eat(b'V') {
            cv.push(" volatile");
        }
        if self.eat(b'K') {
            cv.push(" const");
        }
        // Reverse to match the conventional `const volatile` order.
        cv.reverse();
        let mut qualifiers: String = cv.concat();
        if self.eat(b'R') {
            qualifiers.push_str(" &");
        } else if self.eat(b'O') {
            qualifiers.push_str(" &&");
        }

        let mut current = String::new();
        let mut is_template = false;
        let mut kind = NameKind::Plain;

        loop {
            let candidate = match (self.peek()?, self.peek_at(1)) {
                (b'E', _) => {
                    self.pos += 1;
                    break;
                }
                (b'S', Some(b't')) if current.is_empty() => {
                    self.pos += 2;
                    current = "std".to_string();
                    false
                }
                (b'S', _) => {
                    current = self.substitution()?.render();
                    is_template = false;
                    false
                }
                (b'T', _) => {
                    current = self.template_param()?.render();
                    is_template = false;
                    true
                }
                (b'I', _) => {
                    if current.is_empty() {
                        return None;
                    }
                    let args = self.template_args(record)?;
                    current.push_str(&args);
                    is_template = true;
                    true
                }
                (b'M', _) => {
                    self.pos += 1;
                    false
                }
                (b'D', Some(b't' | b'T')) => return None,
                _ => {
                    let (unqualified, k) = self.unqualified_name(&current)?;
                    current = if current.is_empty() {
                        unqualified
                    } else {
                        format!("{}::{}", current, unqualified)
                    };
                    kind = k;
                    is_template = false;
                    true
                }
            };
            if candidate && self.peek() != Some(b'E') {
                self.subs.push(Ty::named(current.clone()));
            }
        }

        if current.is_empty() {
            return None;
        }
        Some(Name {
            display: current,
            is_template,
            kind,
            qualifiers,
        })
    }

    fn local_name(&mut self, record: bool) -> Option<Name> {
        self.expect(b'Z')?;
        let function = self.encoding()?;
        self.expect(b'E')?;

        if self.eat(b's') {
            self.discriminator()?;
            return Some(Name::plain(format!("{}::string literal", function)));
        }
        if self.eat(b'd') {
            if self.peek() != Some(b'_') {
                self.number()?;
            }
            self.expect(b'_')?;
        }

        let entity = self.name(record)?;
        self.discriminator()?;
        Some(Name {
            display: format!("{}::{}", function, entity.display),
            ..entity
        })
    }

    /// Parse an `<unqualified-name>`. `enclosing` is the scope it appears in,
    /// needed to spell constructor and destructor names.
    fn unqualified_name(&mut self, enclosing: &str) -> Option<(String, NameKind)> {
        let (mut display, kind) = match (self.peek()?, self.peek_at(1)) {
            (b'0'..=b'9', _) => (self.source_name(false)?, NameKind::Plain),
            (b'C', _) => {
                self.pos += 1;
                let inheriting = self.eat(b'I');
                match self.peek()? {
                    b'1'..=b'5' => self.pos += 1,
                    _ => return None,
                }
                if inheriting {
                    self.ty()?;
                }
                (base_name(enclosing)?, NameKind::NoReturn)
            }
            (b'D', Some(b'0' | b'1' | b'2' | b'4' | b'5')) => {
                self.pos += 2;
                (format!("~{}", base_name(enclosing)?), NameKind::NoReturn)
            }
            (b'D', Some(b'C')) => {
                self.pos += 2;
                let mut names = Vec::new();
                while !self.eat(b'E') {
                    names.push(self.source_name(false)?);
                }
                if names.is_empty() {
                    return None;
                }
                (format!("[{}]", names.join(", ")), NameKind::Plain)
            }
            (b'U', Some(b't')) => {
                self.pos += 2;
                let index = self.closure_index()?;
                (format!("{{unnamed type#{}}}", index), NameKind::Plain)
            }
            (b'U', Some(b'l')) => {
                self.pos += 2;
                let params = if self.peek() == Some(b'v') && self.peek_at(1) == Some(b'E') {
                    self.pos += 1;
                    String::new()
                } else {
                    let mut params = Vec::new();
                    while self.peek() != Some(b'E') {
                        params.push(self.ty()?.render());
                    }
                    params.join(", ")
                };
                self.expect(b'E')?;
                let index = self.closure_index()?;
                (format!("{{lambda({})#{}}}", params, index), NameKind::Plain)
            }
            (b'L', _) => {
                self.pos += 1;
                let name = self.source_name(false)?;
                self.discriminator()?;
                (name, NameKind::Plain)
            }
            (b'a'..=b'z', _) => self.operator_name()?,
            _ => return None,
        };

        while self.peek() == Some(b'B') {
            self.pos += 1;
            let tag = self.source_name(true)?;
            display.push_str(&format!("[abi:{}]", tag));
        }
        Some((display, kind))
    }

    fn closure_index(&mut self) -> Option<u64> {
        let index = if self.peek() == Some(b'_') {
            1
        } else {
            self.number()?.checked_add(2)?
        };
        self.expect(b'_')?;
        Some(index)
    }

    fn operator_name(&mut self) -> Option<(String, NameKind)> {
        let code = [self.peek()?, self.peek_at(1)?];
        self.pos += 2;
        match &code {
            b"cv" => {
                let target = self.ty()?;
                return Some((format!("operator {}", target.render()), NameKind::NoReturn));
            }
            b"li" => {
                let suffix = self.source_name(false)?;
                return Some((format!("operator\"\" {}", suffix), NameKind::Plain));
            }
            [b'v', b'0'..=b'9'] => {
                let name = self.source_name(true)?;
                return Some((format!("operator {}", name), NameKind::Plain));
            }
            _ => {}
        }
        let symbol = OPERATORS
            .iter()
            .find(|(mangled, _)| mangled.as_bytes() == code)
            .map(|(_, symbol)| *symbol)?;
        let sep = if symbol.starts_with(|c: char| c.is_ascii_alphabetic()) {
            " "
        } else {
            ""
        };
        Some((format!("operator{}{}", sep, symbol), NameKind::Plain))
    }

    fn template_args(&mut self, record: bool) -> Option<String> {
        self.expect(b'I')?;
        let mut args = Vec::new();
        while !self.eat(b'E') {
            args.push(self.template_arg()?);
        }
        let rendered = args.iter().map(Ty::render).collect::<Vec<_>>().join(", ");
        if record {
            self.template_args = args;
        }
        Some(format!("<{}>", rendered))
    }

    fn template_arg(&mut self) -> Option<Ty> {
        self.guarded(|p| match p.peek()? {
            b'L' => p.literal(),
            b'J' => {
                p.pos += 1;
                let mut items = Vec::new();
                while !p.eat(b'E') {
                    items.push(p.template_arg()?.render());
                }
                Some(Ty::named(items.join(", ")))
            }
            b'X' => None,
            _ => p.ty(),
        })
    }

    fn literal(&mut self) -> Option<Ty> {
        self.expect(b'L')?;
        if self.peek() == Some(b'_') && self.peek_at(1) == Some(b'Z') {
            self.pos += 2;
        } else if self.peek() == Some(b'Z') {
            self.pos += 1;
        } else {
            return self.literal_value();
        }
        let external = self.encoding()?;
        self.expect(b'E')?;
        Some(Ty::named(external))
    }

    fn literal_value(&mut self) -> Option<Ty> {
        let ty = self.ty()?.render();
        let negative = self.eat(b'n');
        // Floating-point values are encoded as lowercase hex, everything else
        // as decimal.
        let float = is_floating_point(&ty);
        let start = self.pos;
        while let Some(c) = self.peek() {
            let accepted = c.is_ascii_digit() || (float && matches!(c, b'a'..=b'f'));
            if !accepted {
                break;
            }
            self.pos += 1;
        }
        let digits = &self.input[start..self.pos];
        self.expect(b'E')?;

        let value = format!("{}{}", if negative { "-" } else { "" }, digits);
        let rendered = match ty.as_str() {
            "bool" if digits == "0" => "false".to_string(),
            "bool" if digits == "1" => "true".to_string(),
            "decltype(nullptr)" if digits.is_empty() => "nullptr".to_string(),
            "int" => value,
            "unsigned int" => format!("{}u", value),
            "long" => format!("{}l", value),
            "unsigned long" => format!("{}ul", value),
            "long long" => format!("{}ll", value),
            "unsigned long long" => format!("{}ull", value),
            _ if digits.is_empty() => return None,
            _ => format!("({}){}", ty, value),
        };
        Some(Ty::named(rendered))
    }

    fn template_param(&mut self) -> Option<Ty> {
        self.expect(b'T')?;
        let index = self.seq_id()?;
        self.template_args.get(index).cloned()
    }

    fn substitution(&mut self) -> Option<Ty> {
        self.expect(b'S')?;
        let abbreviation = match self.peek()? {
            b'a' => Some("std::allocator"),
            b'b' => Some("std::basic_string"),
            b's' => Some("std::string"),
            b'i' => Some("std::istream"),
            b'o' => Some("std::ostream"),
            b'd' => Some("std::iostream"),
            _ => None,
        };
        if let Some(name) = abbreviation {
            self.pos += 1;
            return Some(Ty::named(name));
        }
        let index = self.seq_id()?;
        self.subs.get(index).cloned()
    }

    fn ty(&mut self) -> Option<Ty> {
        self.guarded(|p| p.ty_inner())
    }

    fn ty_inner(&mut self) -> Option<Ty> {
        let c = self.peek()?;
        if let Some(builtin) = builtin_type(c) {
            self.pos += 1;
            return Some(Ty::named(builtin));
        }

        let ty = match (c, self.peek_at(1)) {
            (b'r' | b'V' | b'K', _) => {
                let mut quals = Vec::new();
                if self.eat(b'r') {
                    quals.push(" restrict");
                }
                if self.eat(b'V') {
                    quals.push(" volatile");
                }
                if self.eat(b'K') {
                    quals.push(" const");
                }
                quals.reverse();
                self.ty()?.qualify(&quals.concat())
            }
            (b'P', _) => {
                self.pos += 1;
                self.ty()?.wrap("*")
            }
            (b'R', _) => {
                self.pos += 1;
                self.ty()?.wrap("&")
            }
            (b'O', _) => {
                self.pos += 1;
                self.ty()?.wrap("&&")
            }
            (b'C', _) => {
                self.pos += 1;
                Ty::named(format!("{} _Complex", self.ty()?.render()))
            }
            (b'G', _) => {
                self.pos += 1;
                Ty::named(format!("{} _Imaginary", self.ty()?.render()))
            }
            (b'F', _) => self.function_type()?,
            (b'A', _) => self.array_type()?,
            (b'M', _) => {
                self.pos += 1;
                let class = self.ty()?.render();
                let member = self.ty()?;
                if member.func {
                    member.wrap(&format!("{}::*", class))
                } else {
                    Ty::named(format!("{} {}::*", member.render(), class))
                }
            }
            (b'T', Some(b's' | b'u' | b'e')) => {
                self.pos += 2;
                Ty::named(self.name(false)?.display)
            }
            (b'T', _) => {
                let param = self.template_param()?;
                if self.peek() == Some(b'I') {
                    self.subs.push(param.clone());
                    let args = self.template_args(false)?;
                    Ty::named(format!("{}{}", param.render(), args))
                } else {
                    param
                }
            }
            (b'S', Some(b't')) => Ty::named(self.name(false)?.display),
            (b'S', _) => {
                let sub = self.substitution()?;
                if self.peek() != Some(b'I') {
                    return Some(sub);
                }
                let args = self.template_args(false)?;
                Ty::named(format!("{}{}", sub.render(), args))
            }
            (b'D', Some(b'p')) => {
                self.pos += 2;
                Ty::named(format!("{}...", self.ty()?.render()))
            }
            (b'D', Some(b'v')) => {
                self.pos += 2;
                let lanes = self.number()?;
                self.expect(b'_')?;
                Ty::named(format!("{} __vector({})", self.ty()?.render(), lanes))
            }
            (b'D', Some(b'F')) => {
                self.pos += 2;
                let bits = self.number()?;
                self.expect(b'_')?;
                return Some(Ty::named(format!("_Float{}", bits)));
            }
            (b'D', Some(second)) => {
                let builtin = extended_builtin_type(second)?;
                self.pos += 2;
                return Some(Ty::named(builtin));
            }
            (b'u', _) => {
                self.pos += 1;
                Ty::named(self.source_name(true)?)
            }
            (b'0'..=b'9' | b'N' | b'Z', _) => Ty::named(self.name(false)?.display),
            _ => return None,
        };

        self.subs.push(ty.clone());
        Some(ty)
    }

    fn function_type(&mut self) -> Option<Ty> {
        self.expect(b'F')?;
        self.eat(b'Y');
        let ret = self.ty()?;

        let mut params = Vec::new();
        if self.peek() == Some(b'v') && self.peek_at(1) == Some(b'E') {
            self.pos += 1;
        } else {
            loop {
                match (self.peek()?, self.peek_at(1)) {
                    (b'E', _) | (b'R' | b'O', Some(b'E')) => break,
                    _ => params.push(self.ty()?.render()),
                }
            }
        }

        let ref_qualifier = if self.eat(b'R') {
            " &"
        } else if self.eat(b'O') {
            " &&"
        } else {
            ""
        };
        self.expect(b'E')?;

        Some(Ty {
            head: format!("{} ", ret.render()),
            tail: format!("({}){}", params.join(", "), ref_qualifier),
            open: false,
            func: true,
        })
    }

    fn array_type(&mut self) -> Option<Ty> {
        self.expect(b'A')?;
        let dimension = if matches!(self.peek(), Some(b'0'..=b'9')) {
            self.number()?.to_string()
        } else {
            String::new()
        };
        self.expect(b'_')?;
        let element = self.ty()?;
        Some(Ty {
            head: element.render(),
            tail: format!(" [{}]", dimension),
            open: false,
            func: false,
        })
    }
}

/// The last component of a scope, without template arguments.
fn is_floating_point(ty: &str) -> bool {
    matches!(ty, "float" | "double" | "long double" | "__float128" | "half")
        || ty.starts_with("_Float")
}

fn base_name(scope: &str) -> Option<String> {
    let mut end = scope.len();
    if scope.ends_with('>') {
        let mut depth = 0usize;
        for (i, c) in scope.char_indices().rev() {
            match c {
                '>' => depth += 1,
                '<' => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        end = i;
                        break;
                    }
                }
                _ => {}
            }
        }
    }
    let trimmed = &scope[..end];
    let name = trimmed.rsplit("::").next()?;
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn builtin_type(c: u8) -> Option<&'static str> {
    Some(match c {
        b'v' => "void",
        b'w' => "wchar_t",
        b'b' => "bool",
        b'c' => "char",
        b'a' => "signed char",
        b'h' => "unsigned char",
        b's' => "short",
        b't' => "unsigned short",
        b'i' => "int",
        b'j' => "unsigned int",
        b'l' => "long",
        b'm' => "unsigned long",
        b'x' => "long long",
        b'y' => "unsigned long long",
        b'n' => "__int128",
        b'o' => "unsigned __int128",
        b'f' => "float",
        b'd' => "double",
        b'e' => "long double",
        b'g' => "__float128",
        b'z' => "...",
        _ => return None,
    })
}

/// Builtins spelled `D<c>`.
fn extended_builtin_type(c: u8) -> Option<&'static str> {
    Some(match c {
        b'd' => "decimal64",
        b'e' => "decimal128",
        b'f' => "decimal32",
        b'h' => "half",
        b'i' => "char32_t",
        b's' => "char16_t",
        b'u' => "char8_t",
        b'a' => "auto",
        b'c' => "decltype(auto)",
        b'n' => "decltype(nullptr)",
        _ => return None,
    })
}

const OPERATORS: &[(&str, &str)] = &[
    ("nw", "new"),
    ("na", "new[]"),
    ("dl", "delete"),
    ("da", "delete[]"),
    ("aw", "co_await"),
    ("ps", "+"),
    ("ng", "-"),
    ("ad", "&"),
    ("de", "*"),
    ("co", "~"),
    ("pl", "+"),
    ("mi", "-"),
    ("ml", "*"),
    ("dv", "/"),
    ("rm", "%"),
    ("an", "&"),
    ("or", "|"),
    ("eo", "^"),
    ("aS", "="),
    ("pL", "+="),
    ("mI", "-="),
    ("mL", "*="),
    ("dV", "/="),
    ("rM", "%="),
    ("aN", "&="),
    ("oR", "|="),
    ("eO", "^="),
    ("ls", "<<"),
    ("rs", ">>"),
    ("lS", "<<="),
    ("rS", ">>="),
    ("eq", "=="),
    ("ne", "!="),
    ("lt", "<"),
    ("gt", ">"),
    ("le", "<="),
    ("ge", ">="),
    ("ss", "<=>"),
    ("nt", "!"),
    ("aa", "&&"),
    ("oo", "||"),
    ("pp", "++"),
    ("mm", "--"),
    ("cm", ","),
    ("pm", "->*"),
    ("pt", "->"),
    ("cl", "()"),
    ("ix", "[]"),
    ("qu", "?"),
];

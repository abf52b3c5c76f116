//! Recursive-descent reader for entity headers.
//!
//! The reader walks the token stream of one file, skipping context clauses
//! and anything it does not need, and extracts:
//!
//! - the generic and port clauses of the (single) entity declaration,
//! - `constant` declarations of the architecture declarative part and of
//!   package headers.
//!
//! Reading stops at the architecture's `begin`. Any malformed construct in
//! the parts it reads aborts with an [`AnalysisError`]; nothing is guessed.

use crate::decl::*;
use crate::error::AnalysisError;
use crate::token::{Token, VhdlToken};
use asterics_common::{Interner, Span};
use std::path::Path;

type ReadResult<T> = Result<T, AnalysisError>;

/// Reader state over one token stream.
pub struct EntityReader<'src> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'src str,
    path: &'src Path,
    interner: &'src Interner,
}

impl<'src> EntityReader<'src> {
    /// Creates a reader. `tokens` must end with [`VhdlToken::Eof`].
    pub fn new(
        tokens: Vec<Token>,
        source: &'src str,
        path: &'src Path,
        interner: &'src Interner,
    ) -> Self {
        Self {
            tokens,
            pos: 0,
            source,
            path,
            interner,
        }
    }

    // ------------------------------------------------------------------
    // Primitives
    // ------------------------------------------------------------------

    fn current(&self) -> VhdlToken {
        self.tokens[self.pos].kind
    }

    fn current_span(&self) -> Span {
        self.tokens[self.pos].span
    }

    fn peek_kind(&self, offset: usize) -> VhdlToken {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        self.tokens[idx].kind
    }

    fn prev_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    fn text(&self, token: Token) -> &'src str {
        &self.source[token.span.start as usize..token.span.end as usize]
    }

    fn at(&self, kind: VhdlToken) -> bool {
        self.current() == kind
    }

    fn advance(&mut self) {
        if !self.at(VhdlToken::Eof) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: VhdlToken) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error_at(&self, span: Span, detail: impl Into<String>) -> AnalysisError {
        AnalysisError {
            file: self.path.to_path_buf(),
            detail: detail.into(),
            span,
        }
    }

    fn error_here(&self, detail: impl Into<String>) -> AnalysisError {
        let detail = detail.into();
        if self.at(VhdlToken::Eof) {
            self.error_at(self.current_span(), format!("{detail}, found end of file"))
        } else {
            let found = self.text(self.tokens[self.pos]);
            self.error_at(self.current_span(), format!("{detail}, found '{found}'"))
        }
    }

    fn expect(&mut self, kind: VhdlToken, what: &str) -> ReadResult<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error_here(format!("expected {what}")))
        }
    }

    fn expect_ident(&mut self, what: &str) -> ReadResult<&'src str> {
        if self.at(VhdlToken::Identifier) {
            let text = self.text(self.tokens[self.pos]);
            self.advance();
            Ok(text)
        } else {
            Err(self.error_here(format!("expected {what}")))
        }
    }

    /// Skips to just past the next `;` outside parentheses.
    fn skip_statement(&mut self) {
        let mut depth = 0usize;
        while !self.at(VhdlToken::Eof) {
            match self.current() {
                VhdlToken::LeftParen => depth += 1,
                VhdlToken::RightParen => depth = depth.saturating_sub(1),
                VhdlToken::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// Collects tokens up to (not including) one of `stops` at parenthesis
    /// depth zero.
    fn take_until(&mut self, stops: &[VhdlToken], what: &str) -> ReadResult<Vec<Token>> {
        let start = self.current_span();
        let mut depth = 0usize;
        let mut taken = Vec::new();
        loop {
            let kind = self.current();
            if kind == VhdlToken::Eof {
                return Err(self.error_at(start, format!("unterminated {what}")));
            }
            if depth == 0 && stops.contains(&kind) {
                return Ok(taken);
            }
            match kind {
                VhdlToken::LeftParen => depth += 1,
                VhdlToken::RightParen if depth == 0 => {
                    return Err(self.error_here(format!("unbalanced ')' in {what}")));
                }
                VhdlToken::RightParen => depth -= 1,
                _ => {}
            }
            taken.push(self.tokens[self.pos]);
            self.advance();
        }
    }

    /// Collects the tokens inside a parenthesized group whose `(` was just
    /// consumed, and consumes the matching `)`.
    fn take_group(&mut self, open: Span) -> ReadResult<Vec<Token>> {
        let mut depth = 0usize;
        let mut taken = Vec::new();
        loop {
            match self.current() {
                VhdlToken::Eof => return Err(self.error_at(open, "unterminated '('")),
                VhdlToken::LeftParen => depth += 1,
                VhdlToken::RightParen if depth == 0 => {
                    self.advance();
                    return Ok(taken);
                }
                VhdlToken::RightParen => depth -= 1,
                _ => {}
            }
            taken.push(self.tokens[self.pos]);
            self.advance();
        }
    }

    // ------------------------------------------------------------------
    // Design file
    // ------------------------------------------------------------------

    /// Reads the whole file.
    pub fn read_design_file(&mut self) -> ReadResult<EntityDecl> {
        let mut entity: Option<EntityDecl> = None;
        let mut constants = Vec::new();
        loop {
            match self.current() {
                VhdlToken::Eof => break,
                VhdlToken::Entity => {
                    let span = self.current_span();
                    let decl = self.read_entity()?;
                    if entity.is_some() {
                        return Err(self.error_at(span, "more than one entity declaration in file"));
                    }
                    entity = Some(decl);
                }
                VhdlToken::Architecture => {
                    self.read_architecture(&mut constants)?;
                    break;
                }
                VhdlToken::Package if self.peek_kind(1) == VhdlToken::Body => break,
                VhdlToken::Package => self.read_package(&mut constants)?,
                _ => self.skip_statement(),
            }
        }
        let mut entity =
            entity.ok_or_else(|| self.error_at(self.current_span(), "no entity declaration found"))?;
        entity.constants = constants;
        Ok(entity)
    }

    fn read_entity(&mut self) -> ReadResult<EntityDecl> {
        let start = self.current_span();
        self.expect(VhdlToken::Entity, "'entity'")?;
        let name_text = self.expect_ident("entity name")?;
        let name = self.interner.intern_lower(name_text);
        self.expect(VhdlToken::Is, "'is' after entity name")?;

        let mut generics = Vec::new();
        if self.eat(VhdlToken::Generic) {
            generics = self.read_generic_clause()?;
            self.expect(VhdlToken::Semicolon, "';' after generic clause")?;
        }
        let mut ports = Vec::new();
        if self.eat(VhdlToken::Port) {
            ports = self.read_port_clause()?;
            self.expect(VhdlToken::Semicolon, "';' after port clause")?;
        }

        if !self.at(VhdlToken::End) {
            return Err(self.error_here(format!("expected 'end' of entity '{name_text}'")));
        }
        self.advance();
        self.eat(VhdlToken::Entity);
        if self.at(VhdlToken::Identifier) {
            let label = self.text(self.tokens[self.pos]);
            if !label.eq_ignore_ascii_case(name_text) {
                return Err(self.error_here(format!(
                    "end label does not match entity '{name_text}'"
                )));
            }
            self.advance();
        }
        self.expect(VhdlToken::Semicolon, "';' after entity declaration")?;

        Ok(EntityDecl {
            name,
            generics,
            ports,
            constants: Vec::new(),
            span: start.merge(self.prev_span()),
        })
    }

    fn read_architecture(&mut self, constants: &mut Vec<ConstantDecl>) -> ReadResult<()> {
        let start = self.current_span();
        self.expect(VhdlToken::Architecture, "'architecture'")?;
        self.expect_ident("architecture name")?;
        self.expect(VhdlToken::Of, "'of'")?;
        self.expect_ident("entity name")?;
        self.expect(VhdlToken::Is, "'is'")?;
        loop {
            match self.current() {
                VhdlToken::Begin => {
                    self.advance();
                    return Ok(());
                }
                VhdlToken::Constant => constants.extend(self.read_constant(true)?),
                VhdlToken::Eof => {
                    return Err(self.error_at(start, "unterminated architecture declarative part"))
                }
                _ => self.skip_statement(),
            }
        }
    }

    fn read_package(&mut self, constants: &mut Vec<ConstantDecl>) -> ReadResult<()> {
        let start = self.current_span();
        self.expect(VhdlToken::Package, "'package'")?;
        self.expect_ident("package name")?;
        self.expect(VhdlToken::Is, "'is'")?;
        loop {
            match self.current() {
                VhdlToken::End if !self.at_nested_end() => {
                    self.skip_statement();
                    return Ok(());
                }
                VhdlToken::Constant => constants.extend(self.read_constant(false)?),
                VhdlToken::Eof => return Err(self.error_at(start, "unterminated package")),
                _ => self.skip_statement(),
            }
        }
    }

    /// `end record;`, `end component;` and friends close a nested
    /// declaration, not the enclosing unit.
    fn at_nested_end(&self) -> bool {
        let next = self.tokens[(self.pos + 1).min(self.tokens.len() - 1)];
        next.kind == VhdlToken::Identifier
            && ["record", "component", "protected", "units"]
                .iter()
                .any(|w| self.text(next).eq_ignore_ascii_case(w))
    }

    // ------------------------------------------------------------------
    // Interface lists
    // ------------------------------------------------------------------

    /// Reads `( item {; item} )` after `generic`.
    pub fn read_generic_clause(&mut self) -> ReadResult<Vec<GenericDecl>> {
        self.expect(VhdlToken::LeftParen, "'(' after 'generic'")?;
        let mut generics = Vec::new();
        loop {
            let start = self.current_span();
            self.eat(VhdlToken::Constant);
            if self.at(VhdlToken::Type) {
                return Err(self.error_here("type generics are not supported"));
            }
            let names = self.read_names()?;
            self.expect(VhdlToken::Colon, "':' in generic declaration")?;
            let data_type = self.read_type_mark()?;
            self.read_constraint()?;
            let default = self.read_default()?;
            let span = start.merge(self.prev_span());
            generics.extend(names.into_iter().map(|n| GenericDecl {
                name: self.interner.intern_upper(n),
                data_type: data_type.clone(),
                default: default.clone(),
                span,
            }));
            if self.list_done("generic clause")? {
                return Ok(generics);
            }
        }
    }

    /// Reads `( item {; item} )` after `port`.
    pub fn read_port_clause(&mut self) -> ReadResult<Vec<PortDecl>> {
        self.expect(VhdlToken::LeftParen, "'(' after 'port'")?;
        let mut ports = Vec::new();
        loop {
            let start = self.current_span();
            self.eat(VhdlToken::Signal);
            let names = self.read_names()?;
            self.expect(VhdlToken::Colon, "':' in port declaration")?;
            let mode = match self.current() {
                VhdlToken::In => PortMode::In,
                VhdlToken::Out | VhdlToken::Buffer => PortMode::Out,
                VhdlToken::Inout => PortMode::InOut,
                VhdlToken::Linkage => {
                    return Err(self.error_here("linkage ports are not supported"))
                }
                _ => return Err(self.error_here("expected port direction")),
            };
            self.advance();
            let data_type = self.read_type_mark()?;
            let ranges = self.read_constraint()?;
            let default = self.read_default()?;
            let span = start.merge(self.prev_span());
            ports.extend(names.into_iter().map(|n| PortDecl {
                name: self.interner.intern_lower(n),
                mode,
                data_type: data_type.clone(),
                ranges: ranges.clone(),
                default: default.clone(),
                span,
            }));
            if self.list_done("port clause")? {
                return Ok(ports);
            }
        }
    }

    /// After an item: `;` continues the list, `)` (or `; )`) ends it.
    fn list_done(&mut self, what: &str) -> ReadResult<bool> {
        if self.eat(VhdlToken::Semicolon) {
            return Ok(self.eat(VhdlToken::RightParen));
        }
        if self.eat(VhdlToken::RightParen) {
            return Ok(true);
        }
        Err(self.error_here(format!("expected ';' or ')' in {what}")))
    }

    fn read_names(&mut self) -> ReadResult<Vec<&'src str>> {
        let mut names = vec![self.expect_ident("name")?];
        while self.eat(VhdlToken::Comma) {
            names.push(self.expect_ident("name after ','")?);
        }
        Ok(names)
    }

    fn read_type_mark(&mut self) -> ReadResult<String> {
        let mut mark = self.expect_ident("type name")?.to_ascii_lowercase();
        while self.at(VhdlToken::Dot) {
            self.advance();
            mark.push('.');
            mark.push_str(&self.expect_ident("name after '.'")?.to_ascii_lowercase());
        }
        Ok(mark)
    }

    fn read_default(&mut self) -> ReadResult<Option<String>> {
        if !self.eat(VhdlToken::ColonEquals) {
            return Ok(None);
        }
        let span = self.current_span();
        let tokens = self.take_until(
            &[VhdlToken::Semicolon, VhdlToken::RightParen],
            "default value",
        )?;
        if tokens.is_empty() {
            return Err(self.error_at(span, "missing default value after ':='"));
        }
        Ok(Some(self.render(&tokens)))
    }

    /// Reads an optional index constraint: `(r {, r})`, repeated for arrays
    /// of arrays, or `range l to r`.
    fn read_constraint(&mut self) -> ReadResult<Vec<RangeDecl>> {
        let mut ranges = Vec::new();
        if self.at(VhdlToken::Range) {
            let span = self.current_span();
            self.advance();
            let tokens = self.take_until(
                &[
                    VhdlToken::Semicolon,
                    VhdlToken::RightParen,
                    VhdlToken::ColonEquals,
                ],
                "range constraint",
            )?;
            ranges.push(self.range_from(&tokens, span)?);
            return Ok(ranges);
        }
        while self.at(VhdlToken::LeftParen) {
            let open = self.current_span();
            self.advance();
            let inner = self.take_group(open)?;
            for segment in split_top_level(&inner) {
                ranges.push(self.range_from(segment, open)?);
            }
        }
        Ok(ranges)
    }

    fn range_from(&self, tokens: &[Token], context: Span) -> ReadResult<RangeDecl> {
        let span = match (tokens.first(), tokens.last()) {
            (Some(first), Some(last)) => first.span.merge(last.span),
            _ => return Err(self.error_at(context, "empty range")),
        };
        let mut depth = 0usize;
        let mut split = None;
        for (i, token) in tokens.iter().enumerate() {
            match token.kind {
                VhdlToken::LeftParen => depth += 1,
                VhdlToken::RightParen => depth = depth.saturating_sub(1),
                VhdlToken::To | VhdlToken::Downto if depth == 0 => {
                    split = Some(i);
                    break;
                }
                _ => {}
            }
        }
        let Some(i) = split else {
            return Err(self.error_at(
                span,
                format!("expected 'to' or 'downto' in range '{}'", self.render(tokens)),
            ));
        };
        let (left, right) = (&tokens[..i], &tokens[i + 1..]);
        if left.is_empty() || right.is_empty() {
            return Err(self.error_at(span, "missing range bound"));
        }
        let dir = if tokens[i].kind == VhdlToken::To {
            RangeDir::To
        } else {
            RangeDir::Downto
        };
        Ok(RangeDecl {
            left: self.bound_from(left),
            dir,
            right: self.bound_from(right),
        })
    }

    fn bound_from(&self, tokens: &[Token]) -> BoundDecl {
        let literal = match tokens {
            [t] if t.kind == VhdlToken::IntLiteral => parse_int_literal(self.text(*t)),
            [m, t] if m.kind == VhdlToken::Minus && t.kind == VhdlToken::IntLiteral => {
                parse_int_literal(self.text(*t)).map(|v| -v)
            }
            _ => None,
        };
        match literal {
            Some(v) => BoundDecl::Int(v),
            None => BoundDecl::Expr(self.render(tokens)),
        }
    }

    fn read_constant(&mut self, require_value: bool) -> ReadResult<Vec<ConstantDecl>> {
        let start = self.current_span();
        self.expect(VhdlToken::Constant, "'constant'")?;
        let names = self.read_names()?;
        self.expect(VhdlToken::Colon, "':' in constant declaration")?;
        let data_type = self.read_type_mark()?;
        let ranges = self.read_constraint()?;
        if !self.eat(VhdlToken::ColonEquals) {
            if require_value {
                return Err(self.error_here(format!("expected ':=' for constant '{}'", names[0])));
            }
            // Deferred constant of a package header.
            self.expect(VhdlToken::Semicolon, "';' after constant declaration")?;
            return Ok(Vec::new());
        }
        let value_span = self.current_span();
        let tokens = self.take_until(&[VhdlToken::Semicolon], "constant declaration")?;
        if tokens.is_empty() {
            return Err(self.error_at(value_span, "missing constant value after ':='"));
        }
        let value = self.render(&tokens);
        self.expect(VhdlToken::Semicolon, "';' after constant declaration")?;
        let span = start.merge(self.prev_span());
        Ok(names
            .into_iter()
            .map(|n| ConstantDecl {
                name: self.interner.intern_lower(n),
                data_type: data_type.clone(),
                ranges: ranges.clone(),
                value: value.clone(),
                span,
            })
            .collect())
    }

    /// Renders tokens as normalized expression text: single spaces between
    /// tokens, none inside parentheses or before commas, words upper-cased.
    fn render(&self, tokens: &[Token]) -> String {
        let mut out = String::new();
        let mut prev: Option<VhdlToken> = None;
        for token in tokens {
            if let Some(p) = prev {
                let tight = p == VhdlToken::LeftParen
                    || p == VhdlToken::Tick
                    || token.kind == VhdlToken::RightParen
                    || token.kind == VhdlToken::Comma
                    || token.kind == VhdlToken::Tick
                    || (token.kind == VhdlToken::LeftParen && p.is_word());
                if !tight {
                    out.push(' ');
                }
            }
            let text = self.text(*token);
            if token.kind.is_word() {
                out.push_str(&text.to_ascii_uppercase());
            } else {
                out.push_str(text);
            }
            prev = Some(token.kind);
        }
        out
    }
}

/// Splits a token list at commas outside parentheses.
fn split_top_level(tokens: &[Token]) -> Vec<&[Token]> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            VhdlToken::LeftParen => depth += 1,
            VhdlToken::RightParen => depth = depth.saturating_sub(1),
            VhdlToken::Comma if depth == 0 => {
                segments.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&tokens[start..]);
    segments
}

/// Parses a decimal or based (`16#FF#`) integer literal, ignoring `_`.
fn parse_int_literal(text: &str) -> Option<i64> {
    let clean: String = text.chars().filter(|c| *c != '_').collect();
    if let Some((base, rest)) = clean.split_once('#') {
        let digits = rest.strip_suffix('#')?;
        let radix: u32 = base.parse().ok()?;
        if !(2..=16).contains(&radix) {
            return None;
        }
        return i64::from_str_radix(digits, radix).ok();
    }
    if clean.contains(['e', 'E']) {
        return None;
    }
    clean.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use asterics_common::FileId;

    fn read(source: &str) -> (Result<EntityDecl, AnalysisError>, Interner) {
        let interner = Interner::new();
        let path = Path::new("test.vhd");
        let result = lex(source, FileId::from_raw(0), path).and_then(|tokens| {
            EntityReader::new(tokens, source, path, &interner).read_design_file()
        });
        (result, interner)
    }

    fn read_ok(source: &str) -> (EntityDecl, Interner) {
        let (result, interner) = read(source);
        (result.unwrap(), interner)
    }

    fn read_err(source: &str) -> AnalysisError {
        read(source).0.unwrap_err()
    }

    #[test]
    fn minimal_entity() {
        let (e, i) = read_ok("entity Top is end entity top;");
        assert_eq!(i.resolve(e.name), "top");
        assert!(e.generics.is_empty());
        assert!(e.ports.is_empty());
    }

    #[test]
    fn context_clauses_skipped() {
        let (e, i) = read_ok(
            "library ieee;\nuse ieee.std_logic_1164.all;\nentity a is port (clk : in std_logic); end a;",
        );
        assert_eq!(i.resolve(e.name), "a");
        assert_eq!(e.ports.len(), 1);
    }

    #[test]
    fn generics_uppercased_with_defaults() {
        let (e, i) = read_ok(
            "entity g is generic (data_width : integer := 8; Mode : string := \"fast\"; N : natural); end;",
        );
        assert_eq!(e.generics.len(), 3);
        assert_eq!(i.resolve(e.generics[0].name), "DATA_WIDTH");
        assert_eq!(e.generics[0].default.as_deref(), Some("8"));
        assert_eq!(i.resolve(e.generics[1].name), "MODE");
        assert_eq!(e.generics[1].default.as_deref(), Some("\"fast\""));
        assert_eq!(e.generics[2].default, None);
        assert_eq!(e.generics[2].data_type, "natural");
    }

    #[test]
    fn symbolic_and_literal_widths() {
        let (e, _) = read_ok(
            "entity w is generic (W : integer := 8); port (d : in std_logic_vector(w-1 downto 0); a : out unsigned(0 to 7)); end w;",
        );
        assert_eq!(
            e.ports[0].ranges,
            vec![RangeDecl {
                left: BoundDecl::Expr("W - 1".into()),
                dir: RangeDir::Downto,
                right: BoundDecl::Int(0),
            }]
        );
        assert_eq!(
            e.ports[1].ranges,
            vec![RangeDecl {
                left: BoundDecl::Int(0),
                dir: RangeDir::To,
                right: BoundDecl::Int(7),
            }]
        );
        assert_eq!(e.ports[1].mode, PortMode::Out);
    }

    #[test]
    fn composite_widths_split_on_top_level_commas() {
        let (e, _) = read_ok(
            "entity c is port (m : in t_matrix(max(A, B) - 1 downto 0, 0 to log2_ceil(C)); q : in t_arr(0 to 3)(7 downto 0)); end;",
        );
        let ranges = &e.ports[0].ranges;
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].left, BoundDecl::Expr("MAX(A, B) - 1".into()));
        assert_eq!(ranges[1].right, BoundDecl::Expr("LOG2_CEIL(C)".into()));
        assert_eq!(e.ports[1].ranges.len(), 2);
    }

    #[test]
    fn integer_range_constraint() {
        let (e, _) = read_ok("entity r is port (x : in integer range 0 to 255); end;");
        assert_eq!(e.ports[0].data_type, "integer");
        assert_eq!(e.ports[0].ranges[0].right, BoundDecl::Int(255));
    }

    #[test]
    fn multi_name_ports() {
        let (e, i) = read_ok("entity m is port (a, b : inout std_logic := 'Z'); end;");
        assert_eq!(e.ports.len(), 2);
        assert_eq!(i.resolve(e.ports[1].name), "b");
        assert_eq!(e.ports[1].mode, PortMode::InOut);
        assert_eq!(e.ports[1].default.as_deref(), Some("'Z'"));
    }

    #[test]
    fn architecture_constants_until_begin() {
        let (e, i) = read_ok(
            "entity k is end;\narchitecture rtl of k is\n  signal s : std_logic;\n  constant c_slave_reg_count : integer := reg_count + 1;\n  component x is port (a : in std_logic); end component;\nbegin\n  constant_after_begin : process begin end process;\nend;",
        );
        assert_eq!(e.constants.len(), 1);
        assert_eq!(i.resolve(e.constants[0].name), "c_slave_reg_count");
        assert_eq!(e.constants[0].value, "REG_COUNT + 1");
    }

    #[test]
    fn package_constants_and_deferred() {
        let (e, _) = read_ok(
            "package p is\n type r is record a : integer; end record;\n constant c_a : integer := 4;\n constant c_d : integer;\nend package;\nentity k is end;",
        );
        assert_eq!(e.constants.len(), 1);
        assert_eq!(e.constants[0].value, "4");
    }

    #[test]
    fn based_and_negative_literals() {
        assert_eq!(parse_int_literal("16#FF#"), Some(255));
        assert_eq!(parse_int_literal("1_000"), Some(1000));
        assert_eq!(parse_int_literal("1e3"), None);
        let (e, _) = read_ok("entity n is port (x : in t(-1 to 2)); end;");
        assert_eq!(e.ports[0].ranges[0].left, BoundDecl::Int(-1));
    }

    #[test]
    fn missing_direction_fails() {
        let err = read_err("entity a is port (x : std_logic); end;");
        assert!(err.detail.starts_with("expected port direction"), "{}", err.detail);
        assert_eq!(err.file, Path::new("test.vhd"));
    }

    #[test]
    fn unterminated_port_clause_fails() {
        let err = read_err("entity a is port (x : in std_logic_vector(7 downto 0)");
        assert!(err.detail.contains("end of file"), "{}", err.detail);
    }

    #[test]
    fn range_without_direction_fails() {
        let err = read_err("entity a is port (x : in std_logic_vector(7 0)); end;");
        assert_eq!(err.detail, "expected 'to' or 'downto' in range '7 0'");
    }

    #[test]
    fn unbalanced_parenthesis_fails() {
        let err = read_err("entity a is port (x : in t(7 downto 0); end;");
        assert!(err.detail.contains("'('") || err.detail.contains("expected"), "{}", err.detail);
    }

    #[test]
    fn no_entity_fails() {
        let err = read_err("library ieee; use ieee.std_logic_1164.all;");
        assert_eq!(err.detail, "no entity declaration found");
    }

    #[test]
    fn two_entities_fail() {
        let err = read_err("entity a is end; entity b is end;");
        assert_eq!(err.detail, "more than one entity declaration in file");
    }

    #[test]
    fn mismatched_end_label_fails() {
        let err = read_err("entity a is end entity b;");
        assert!(err.detail.starts_with("end label does not match"));
    }

    #[test]
    fn architecture_constant_without_value_fails() {
        let err = read_err("entity a is end;\narchitecture r of a is constant c : integer; begin end;");
        assert!(err.detail.starts_with("expected ':=' for constant 'c'"));
    }
}

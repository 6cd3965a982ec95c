//! Parser state - declaration parsing methods

use enumlint_common::Span;
use smallvec::SmallVec;

use super::state::{MODIFIERS, ParserState};
use crate::ast::{
    Annotation, AnnotationArgument, ConstDeclaration, EnumDeclaration, EnumId, EnumMember, Expr,
    ExprKind, Initializer, Name, QualifiedName, UsingAlias,
};
use crate::scanner::SyntaxKind;

impl<'a> ParserState<'a> {
    // =========================================================================
    // Items
    // =========================================================================

    /// Parse items until end of file, or until the closing brace of the
    /// current block when `in_block` is set.
    pub(crate) fn parse_items(&mut self, in_block: bool) {
        let mut pending_attributes: Vec<Annotation> = Vec::new();

        loop {
            match self.token() {
                SyntaxKind::EndOfFileToken => {
                    if in_block {
                        self.error_at_current("'}' expected.");
                    }
                    return;
                }
                SyntaxKind::CloseBraceToken => {
                    self.next_token();
                    if in_block {
                        return;
                    }
                    pending_attributes.clear();
                }
                SyntaxKind::OpenBracketToken => {
                    let mut attributes = self.parse_attribute_list();
                    pending_attributes.append(&mut attributes);
                }
                SyntaxKind::OpenBraceToken => {
                    self.skip_balanced();
                    pending_attributes.clear();
                }
                SyntaxKind::Identifier => {
                    let text = self.token_text();
                    match text {
                        "enum" => {
                            let attributes = std::mem::take(&mut pending_attributes);
                            self.parse_enum_declaration(attributes);
                        }
                        "namespace" => {
                            pending_attributes.clear();
                            self.parse_namespace_declaration();
                        }
                        "class" | "struct" | "interface" | "record" => {
                            pending_attributes.clear();
                            self.parse_type_declaration();
                        }
                        "const" => {
                            pending_attributes.clear();
                            self.parse_const_declaration();
                        }
                        "using" => {
                            pending_attributes.clear();
                            self.parse_using_directive();
                        }
                        "global" if self.look_ahead_text(1) == "using" => self.next_token(),
                        _ if MODIFIERS.contains(&text) => self.next_token(),
                        _ => {
                            pending_attributes.clear();
                            self.skip_member();
                        }
                    }
                }
                _ => {
                    pending_attributes.clear();
                    self.skip_member();
                }
            }
        }
    }

    /// Skip a member this parser does not model: a field, property, method,
    /// operator, delegate, event or stray statement.
    fn skip_member(&mut self) {
        let start = self.token_pos();
        loop {
            match self.token() {
                SyntaxKind::EndOfFileToken | SyntaxKind::CloseBraceToken => break,
                SyntaxKind::SemicolonToken => {
                    self.next_token();
                    break;
                }
                SyntaxKind::OpenBraceToken => {
                    self.skip_balanced();
                    // Property initializers: `int P { get; } = 3;`
                    if !self.is_token(SyntaxKind::EqualsToken) {
                        break;
                    }
                }
                SyntaxKind::OpenParenToken | SyntaxKind::OpenBracketToken => self.skip_balanced(),
                _ => self.next_token(),
            }
        }
        // Always make progress, even on a lone unexpected token.
        if self.token_pos() == start && !self.is_token(SyntaxKind::EndOfFileToken) {
            self.next_token();
        }
    }

    // =========================================================================
    // Containers
    // =========================================================================

    fn parse_namespace_declaration(&mut self) {
        self.next_token(); // namespace
        let Some(name) = self.parse_qualified_name() else {
            self.error_at_current("Identifier expected.");
            self.skip_member();
            return;
        };
        let segments: Vec<String> = name.texts().map(str::to_string).collect();

        if self.parse_optional(SyntaxKind::SemicolonToken) {
            // File-scoped namespace: applies to the rest of the file.
            self.container.extend(segments);
            return;
        }
        if !self.parse_expected(SyntaxKind::OpenBraceToken, "{") {
            self.skip_member();
            return;
        }

        let depth = self.container.len();
        self.container.extend(segments);
        self.parse_items(true);
        self.container.truncate(depth);
    }

    /// `class`, `struct`, `interface` and `record` declarations. The header
    /// (type parameters, base list, constraints, primary constructor) is
    /// skipped; the body is scanned for nested declarations.
    fn parse_type_declaration(&mut self) {
        let keyword = self.token_text();
        self.next_token();
        if keyword == "record" && (self.is_identifier_text("struct") || self.is_identifier_text("class"))
        {
            self.next_token();
        }

        let name = if self.is_token(SyntaxKind::Identifier) {
            let name = self.parse_name();
            Some(name.text)
        } else {
            None
        };

        loop {
            match self.token() {
                SyntaxKind::OpenBraceToken => break,
                SyntaxKind::SemicolonToken => {
                    self.next_token();
                    return;
                }
                SyntaxKind::EndOfFileToken | SyntaxKind::CloseBraceToken => return,
                SyntaxKind::OpenParenToken | SyntaxKind::OpenBracketToken => self.skip_balanced(),
                _ => self.next_token(),
            }
        }

        self.next_token(); // {
        let pushed = name.is_some();
        if let Some(name) = name {
            self.container.push(name);
        }
        self.parse_items(true);
        if pushed {
            self.container.pop();
        }
    }

    fn parse_using_directive(&mut self) {
        self.next_token(); // using

        let is_alias = self.is_token(SyntaxKind::Identifier)
            && self.look_ahead(1) == SyntaxKind::EqualsToken
            && self.token_text() != "static";
        if !is_alias {
            // Namespace imports, `using static`, and using statements.
            self.skip_member();
            return;
        }

        let alias = self.parse_name().text;
        self.next_token(); // =
        match self.parse_qualified_name() {
            Some(target) => {
                let target: Vec<String> = target.texts().map(str::to_string).collect();
                self.aliases.insert(alias.clone(), target.clone());
                self.file.usings.push(UsingAlias { alias, target });
            }
            None => self.error_at_current("Identifier expected."),
        }
        self.skip_member();
    }

    // =========================================================================
    // Names
    // =========================================================================

    /// Parse the identifier at the current token. Verbatim identifiers lose their `@`.
    pub(crate) fn parse_name(&mut self) -> Name {
        let token = self.current();
        let text = self.token_text();
        self.next_token();
        Name {
            text: text.strip_prefix('@').unwrap_or(text).to_string(),
            span: token.span,
        }
    }

    /// `A.B.C`, `global::A.B`, `Alias::B`.
    pub(crate) fn parse_qualified_name(&mut self) -> Option<QualifiedName> {
        if !self.is_token(SyntaxKind::Identifier) {
            return None;
        }
        let mut global = false;
        let mut segments: SmallVec<[Name; 2]> = SmallVec::new();

        if self.token_text() == "global" && self.look_ahead(1) == SyntaxKind::ColonColonToken {
            global = true;
            self.next_token();
            self.next_token();
            if !self.is_token(SyntaxKind::Identifier) {
                self.error_at_current("Identifier expected.");
                return None;
            }
        }

        segments.push(self.parse_name());
        while matches!(
            self.token(),
            SyntaxKind::DotToken | SyntaxKind::ColonColonToken
        ) && self.look_ahead(1) == SyntaxKind::Identifier
        {
            self.next_token();
            segments.push(self.parse_name());
        }

        Some(QualifiedName { segments, global })
    }

    /// Substitute a leading `using` alias.
    fn resolve_alias(&self, name: &QualifiedName) -> Vec<String> {
        let mut texts = name.texts();
        let Some(first) = texts.next() else {
            return Vec::new();
        };
        let head = match self.aliases.get(first) {
            Some(target) if !name.global => target.clone(),
            _ => vec![first.to_string()],
        };
        head.into_iter().chain(texts.map(str::to_string)).collect()
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// `[target: A, B(args)]`
    pub(crate) fn parse_attribute_list(&mut self) -> Vec<Annotation> {
        let open = self.current().span;
        self.next_token(); // [

        let target = if self.is_token(SyntaxKind::Identifier)
            && self.look_ahead(1) == SyntaxKind::ColonToken
        {
            let target = self.parse_name().text;
            self.next_token(); // :
            Some(target)
        } else {
            None
        };

        let mut attributes = Vec::new();
        loop {
            if self.parse_optional(SyntaxKind::CloseBracketToken) {
                break;
            }
            let Some(attribute) = self.parse_attribute(target.clone(), open.start) else {
                // Not an attribute list after all (e.g. an indexer or array
                // rank in a skipped member); drop the run.
                self.skip_until(&[SyntaxKind::CloseBracketToken]);
                self.parse_optional(SyntaxKind::CloseBracketToken);
                return Vec::new();
            };
            attributes.push(attribute);

            if self.parse_optional(SyntaxKind::CommaToken) {
                continue;
            }
            if !self.is_token(SyntaxKind::CloseBracketToken) {
                self.error_at_current("']' expected.");
                self.skip_until(&[SyntaxKind::CloseBracketToken]);
                self.parse_optional(SyntaxKind::CloseBracketToken);
                break;
            }
        }

        tracing::trace!(
            file = %self.file_name,
            start = open.start,
            count = attributes.len(),
            "parsed attribute list"
        );
        attributes
    }

    fn parse_attribute(&mut self, target: Option<String>, list_start: u32) -> Option<Annotation> {
        let name = self.parse_qualified_name()?;
        let start = name.span().start;

        // Generic attributes: `[Marker<int>]`
        if self.is_token(SyntaxKind::LessThanToken) {
            self.skip_until(&[
                SyntaxKind::GreaterThanToken,
                SyntaxKind::CloseBracketToken,
                SyntaxKind::OpenParenToken,
            ]);
            self.parse_optional(SyntaxKind::GreaterThanToken);
        }

        let mut arguments = Vec::new();
        if self.parse_optional(SyntaxKind::OpenParenToken) {
            while !self.is_token(SyntaxKind::CloseParenToken) {
                if matches!(
                    self.token(),
                    SyntaxKind::EndOfFileToken
                        | SyntaxKind::CloseBracketToken
                        | SyntaxKind::CloseBraceToken
                ) {
                    self.error_at_current("')' expected.");
                    break;
                }
                arguments.push(self.parse_attribute_argument());
                if !self.parse_optional(SyntaxKind::CommaToken) {
                    break;
                }
            }
            self.parse_expected(SyntaxKind::CloseParenToken, ")");
        }

        let resolved = self.resolve_alias(&name);
        Some(Annotation {
            name,
            resolved,
            target,
            arguments,
            list_start,
            span: Span::new(start, self.prev_token_end()),
        })
    }

    fn parse_attribute_argument(&mut self) -> AnnotationArgument {
        let named = self.is_token(SyntaxKind::Identifier)
            && matches!(
                self.look_ahead(1),
                SyntaxKind::EqualsToken | SyntaxKind::ColonToken
            );
        let name = if named {
            let name = self.parse_name();
            self.next_token(); // = or :
            Some(name)
        } else {
            None
        };

        let value = self.parse_complete_expression(&[
            SyntaxKind::CommaToken,
            SyntaxKind::CloseParenToken,
            SyntaxKind::CloseBracketToken,
        ]);
        AnnotationArgument { name, value }
    }

    // =========================================================================
    // Enums
    // =========================================================================

    fn parse_enum_declaration(&mut self, attributes: Vec<Annotation>) {
        let keyword_span = self.current().span;
        let start = attributes
            .first()
            .map_or(keyword_span.start, |attr| attr.list_start.min(keyword_span.start));
        self.next_token(); // enum

        if !self.is_token(SyntaxKind::Identifier) {
            self.error_at_current("Identifier expected.");
            self.skip_member();
            return;
        }
        let name = self.parse_name();

        let base_type = if self.parse_optional(SyntaxKind::ColonToken) {
            match self.parse_qualified_name() {
                Some(base) => Some(base.dotted()),
                None => {
                    self.error_at_current("Type expected.");
                    None
                }
            }
        } else {
            None
        };

        if !self.parse_expected(SyntaxKind::OpenBraceToken, "{") {
            self.skip_member();
            return;
        }

        let members = self.parse_enum_members();
        let id = EnumId(self.file.enums.len() as u32);
        let span = Span::new(start, self.prev_token_end());
        let conditional = self.has_conditional_directive_in(span);
        self.file.enums.push(EnumDeclaration {
            id,
            name,
            container: self.container.clone(),
            attributes,
            base_type,
            members,
            conditional,
            span,
        });
    }

    /// Members up to and including the closing brace.
    fn parse_enum_members(&mut self) -> Vec<EnumMember> {
        let mut members = Vec::new();
        let mut attributes: Vec<Annotation> = Vec::new();

        loop {
            match self.token() {
                SyntaxKind::CloseBraceToken => {
                    self.next_token();
                    return members;
                }
                SyntaxKind::EndOfFileToken => {
                    self.error_at_current("'}' expected.");
                    return members;
                }
                SyntaxKind::OpenBracketToken => {
                    let mut parsed = self.parse_attribute_list();
                    attributes.append(&mut parsed);
                }
                SyntaxKind::Identifier => {
                    let member_attributes = std::mem::take(&mut attributes);
                    members.push(self.parse_enum_member(member_attributes));

                    if self.parse_optional(SyntaxKind::CommaToken) {
                        continue;
                    }
                    if !self.is_token(SyntaxKind::CloseBraceToken) {
                        self.error_at_current("',' expected.");
                        self.skip_until(&[SyntaxKind::CommaToken]);
                        self.parse_optional(SyntaxKind::CommaToken);
                    }
                }
                _ => {
                    attributes.clear();
                    self.error_at_current("Enum member expected.");
                    self.skip_until(&[SyntaxKind::CommaToken]);
                    self.parse_optional(SyntaxKind::CommaToken);
                }
            }
        }
    }

    fn parse_enum_member(&mut self, attributes: Vec<Annotation>) -> EnumMember {
        let name = self.parse_name();
        let start = attributes
            .first()
            .map_or(name.span.start, |attr| attr.list_start.min(name.span.start));

        let initializer = if self.is_token(SyntaxKind::EqualsToken) {
            let equals_span = self.current().span;
            self.next_token();
            let value = self.parse_complete_expression(&[SyntaxKind::CommaToken]);
            Some(Initializer { equals_span, value })
        } else {
            None
        };

        let end = initializer
            .as_ref()
            .map_or(name.span.end, |init| init.value.span.end.max(init.equals_span.end));
        EnumMember {
            name,
            attributes,
            initializer,
            span: Span::new(start, end),
        }
    }

    // =========================================================================
    // Constants
    // =========================================================================

    /// `const int A = 1, B = A + 1;`
    fn parse_const_declaration(&mut self) {
        let start = self.token_pos();
        self.next_token(); // const

        // The type runs up to the first `Identifier =`.
        let type_start = self.token_pos();
        let mut type_end = type_start;
        while !(self.is_token(SyntaxKind::Identifier)
            && self.look_ahead(1) == SyntaxKind::EqualsToken)
        {
            match self.token() {
                SyntaxKind::EndOfFileToken
                | SyntaxKind::CloseBraceToken
                | SyntaxKind::SemicolonToken
                | SyntaxKind::OpenBraceToken => {
                    self.error_at_current("Identifier expected.");
                    self.skip_member();
                    return;
                }
                _ => {
                    type_end = self.current().span.end;
                    self.next_token();
                }
            }
        }
        let type_name = self.source[type_start as usize..type_end as usize]
            .split_whitespace()
            .collect::<String>();

        loop {
            let name = self.parse_name();
            self.next_token(); // =
            let value = self.parse_complete_expression(&[
                SyntaxKind::CommaToken,
                SyntaxKind::SemicolonToken,
            ]);
            self.file.constants.push(ConstDeclaration {
                name,
                container: self.container.clone(),
                type_name: type_name.clone(),
                span: Span::new(start, value.span.end),
                value,
            });

            if self.parse_optional(SyntaxKind::CommaToken)
                && self.is_token(SyntaxKind::Identifier)
                && self.look_ahead(1) == SyntaxKind::EqualsToken
            {
                continue;
            }
            break;
        }
        if !self.parse_optional(SyntaxKind::SemicolonToken) {
            self.error_at_current("';' expected.");
            self.skip_member();
        }
    }

    /// Parse an expression that must end at one of `terminators` (or a closing
    /// brace). Trailing syntax the expression grammar does not model turns the
    /// whole expression into `Unsupported` and is skipped silently.
    fn parse_complete_expression(&mut self, terminators: &[SyntaxKind]) -> Expr {
        let start = self.token_pos();
        let expr = self.parse_expression();
        let at_terminator = self.is_token(SyntaxKind::CloseBraceToken)
            || self.is_token(SyntaxKind::EndOfFileToken)
            || terminators.contains(&self.token());
        if at_terminator || expr.is_error() {
            if !at_terminator {
                self.skip_until(terminators);
            }
            return expr;
        }

        self.skip_until(terminators);
        Expr::new(
            ExprKind::Unsupported,
            Span::new(start, self.prev_token_end()),
        )
    }
}

use crate::unicode::{is_css_whitespace, UnicodeChar};
use corecss_shared::byte_stream::Character::Ch;
use corecss_shared::byte_stream::{ByteStream, Character, Location, LocationHandler, Stream};
use std::fmt;

pub type Number = f32;

#[derive(Debug, PartialEq, Clone)]
pub enum TokenType {
    /// An `ATKEYWORD` token. The value does not include the `@` marker.
    AtKeyword(String),
    Ident(String),
    /// A `HASH` token. The value does not include the `#` marker.
    Hash(String),
    Number(Number),
    Percentage(Number),
    Dimension {
        value: Number,
        unit: String,
    },
    /// A `URI` token, `url(...)` with the url itself as value
    Url(String),
    BadUrl(String),
    /// A `UNICODE-RANGE` token. The value does not include the `u+` prefix.
    UnicodeRange(String),
    /// A `STRING` token. The value does not include the quotes.
    QuotedString(String),
    /// An unterminated string; this token always indicates a parse error.
    BadString(String),
    Whitespace,
    /// Any single character that is not part of another token
    Delim(char),
    Colon,
    Semicolon,
    /// `<!--`
    Cdo,
    /// `-->`
    Cdc,
    /// A `{` as produced by the flat tokenizer. Grouping turns it into a `Block`.
    LCurly,
    /// A `(` as produced by the flat tokenizer. Grouping turns it into a `Paren`.
    LParen,
    /// A `[` as produced by the flat tokenizer. Grouping turns it into a `Bracket`.
    LBracket,
    /// A `name(` as produced by the flat tokenizer. Grouping turns it into a `FunctionCall`.
    Function(String),
    RCurly,
    RParen,
    RBracket,
    /// `{ ... }` container
    Block(Vec<Token>),
    /// `( ... )` container
    Paren(Vec<Token>),
    /// `[ ... ]` container
    Bracket(Vec<Token>),
    /// `name( ... )` container
    FunctionCall { name: String, content: Vec<Token> },
    /// Synthetic container holding the selector tokens of a rule set
    Selector(Vec<Token>),
    /// Synthetic container holding the value tokens of a declaration
    Values(Vec<Token>),
}

impl TokenType {
    /// Returns the name of the token type as used in error messages
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            TokenType::AtKeyword(_) => "ATKEYWORD",
            TokenType::Ident(_) => "IDENT",
            TokenType::Hash(_) => "HASH",
            TokenType::Number(_) => "NUMBER",
            TokenType::Percentage(_) => "PERCENTAGE",
            TokenType::Dimension { .. } => "DIMENSION",
            TokenType::Url(_) => "URI",
            TokenType::BadUrl(_) => "BAD_URI",
            TokenType::UnicodeRange(_) => "UNICODE-RANGE",
            TokenType::QuotedString(_) => "STRING",
            TokenType::BadString(_) => "BAD_STRING",
            TokenType::Whitespace => "S",
            TokenType::Delim(_) => "DELIM",
            TokenType::Colon => ":",
            TokenType::Semicolon => ";",
            TokenType::Cdo => "CDO",
            TokenType::Cdc => "CDC",
            TokenType::LCurly | TokenType::Block(_) => "{",
            TokenType::LParen | TokenType::Paren(_) => "(",
            TokenType::LBracket | TokenType::Bracket(_) => "[",
            TokenType::Function(_) | TokenType::FunctionCall { .. } => "FUNCTION",
            TokenType::RCurly => "}",
            TokenType::RParen => ")",
            TokenType::RBracket => "]",
            TokenType::Selector(_) => "SELECTOR",
            TokenType::Values(_) => "VALUES",
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Token {
    /// Type of the token
    pub token_type: TokenType,
    /// Location of the first character of the token
    pub location: Location,
    /// Source text of the token. For containers this is only the opening text (`{`, `rgb(`).
    pub raw: String,
}

impl Token {
    /// Returns a new token for the given type on the given location
    #[must_use]
    pub fn new(token_type: TokenType, location: Location, raw: &str) -> Token {
        Token {
            token_type,
            location,
            raw: raw.to_string(),
        }
    }

    /// Bundles selector tokens in a synthetic container
    #[must_use]
    pub fn new_selector(content: Vec<Token>, location: Location) -> Token {
        Token::new(TokenType::Selector(content), location, "")
    }

    /// Bundles value tokens in a synthetic container
    #[must_use]
    pub fn new_values(content: Vec<Token>, location: Location) -> Token {
        Token::new(TokenType::Values(content), location, "")
    }

    /// Name of the token type, see [`TokenType::type_name`]
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.token_type.type_name()
    }

    #[must_use]
    pub fn line(&self) -> usize {
        self.location.line
    }

    #[must_use]
    pub fn column(&self) -> usize {
        self.location.column
    }

    /// Children of a container token. Empty for any other token.
    #[must_use]
    pub fn content(&self) -> &[Token] {
        match &self.token_type {
            TokenType::Block(content)
            | TokenType::Paren(content)
            | TokenType::Bracket(content)
            | TokenType::Selector(content)
            | TokenType::Values(content)
            | TokenType::FunctionCall { content, .. } => content,
            _ => &[],
        }
    }

    /// Takes the children out of a container token. Empty for any other token.
    #[must_use]
    pub fn into_content(self) -> Vec<Token> {
        match self.token_type {
            TokenType::Block(content)
            | TokenType::Paren(content)
            | TokenType::Bracket(content)
            | TokenType::Selector(content)
            | TokenType::Values(content)
            | TokenType::FunctionCall { content, .. } => content,
            _ => Vec::new(),
        }
    }

    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(
            self.token_type,
            TokenType::Block(_)
                | TokenType::Paren(_)
                | TokenType::Bracket(_)
                | TokenType::Selector(_)
                | TokenType::Values(_)
                | TokenType::FunctionCall { .. }
        )
    }

    #[must_use]
    pub fn is_whitespace(&self) -> bool {
        matches!(self.token_type, TokenType::Whitespace)
    }

    /// Renders the token as it was found in the source. Containers render their opening text,
    /// their content and the closing delimiter.
    #[must_use]
    pub fn as_css(&self) -> String {
        if !self.is_container() {
            return self.raw.clone();
        }

        let closing = match self.token_type {
            TokenType::Block(_) => "}",
            TokenType::Paren(_) | TokenType::FunctionCall { .. } => ")",
            TokenType::Bracket(_) => "]",
            _ => "",
        };

        let mut css = self.raw.clone();
        for token in self.content() {
            css.push_str(&token.as_css());
        }
        css.push_str(closing);
        css
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_css())
    }
}

/// CSS Tokenizer for the CSS 2.1 core syntax, see
/// <https://www.w3.org/TR/CSS21/syndata.html#tokenization>.
///
/// Produces a flat token stream: comments are dropped, and `{`, `(`, `[` and functions are
/// returned as opening tokens. Use [`tokenize_grouped`] to nest them into containers.
pub struct Tokenizer<'stream> {
    stream: &'stream mut ByteStream,
    /// Keeps track of the line and column of the next character
    location: LocationHandler,
    /// Source text of the token currently being consumed
    raw: String,
}

impl<'stream> Tokenizer<'stream> {
    /// Creates a new tokenizer with the given stream that starts on the given location. This does
    /// not have to be 1/1, but can be any location.
    pub fn new(stream: &'stream mut ByteStream, location: Location) -> Self {
        Self {
            stream,
            location: LocationHandler::new(location),
            raw: String::new(),
        }
    }

    /// Returns the location of the next character, taking the start location into account
    #[must_use]
    pub fn current_location(&self) -> Location {
        self.location.current()
    }

    /// Consumes the next token, or returns `None` at the end of the stream
    pub fn consume_token(&mut self) -> Option<Token> {
        while self.look_ahead_slice(2) == "/*" {
            self.consume_comment();
        }

        self.raw.clear();
        let loc = self.current_location();

        let token_type = match self.current_char() {
            Character::StreamEnd | Character::StreamEmpty => return None,
            Character::Surrogate(_) => {
                self.next_char();
                TokenType::Delim(UnicodeChar::REPLACEMENT_CHARACTER)
            }
            Ch(c) if is_css_whitespace(c) => {
                self.consume_whitespace();
                TokenType::Whitespace
            }
            Ch('"' | '\'') => self.consume_string_token(),
            Ch('#') => {
                // consume '#'
                self.next_char();

                if self.is_name_char(self.current_char()) || self.is_start_of_escape(0) {
                    TokenType::Hash(self.consume_name())
                } else {
                    TokenType::Delim('#')
                }
            }
            Ch(c @ ('{' | '}' | '(' | ')' | '[' | ']' | ':' | ';')) => {
                self.next_char();
                match c {
                    '{' => TokenType::LCurly,
                    '}' => TokenType::RCurly,
                    '(' => TokenType::LParen,
                    ')' => TokenType::RParen,
                    '[' => TokenType::LBracket,
                    ']' => TokenType::RBracket,
                    ':' => TokenType::Colon,
                    _ => TokenType::Semicolon,
                }
            }
            Ch('.') if self.stream.look_ahead(1).is_numeric() => self.consume_numeric_token(),
            Ch('-') if self.look_ahead_slice(3) == "-->" => {
                self.consume_chars(3);
                TokenType::Cdc
            }
            Ch('-') if self.would_start_ident(0) => self.consume_ident_like_seq(),
            Ch('<') if self.look_ahead_slice(4) == "<!--" => {
                self.consume_chars(4);
                TokenType::Cdo
            }
            Ch('@') => {
                // consume '@'
                self.next_char();

                if self.would_start_ident(0) {
                    TokenType::AtKeyword(self.consume_name())
                } else {
                    TokenType::Delim('@')
                }
            }
            Ch('\\') if self.is_start_of_escape(0) => self.consume_ident_like_seq(),
            Ch('u' | 'U') if self.is_start_of_unicode_range() => self.consume_unicode_range(),
            Ch(c) if c.is_ascii_digit() => self.consume_numeric_token(),
            Ch(c) if is_ident_start(c) => self.consume_ident_like_seq(),
            Ch(c) => {
                self.next_char();
                TokenType::Delim(c)
            }
        };

        let token = Token::new(token_type, loc, &self.raw);
        log::trace!("{:?}", token);

        Some(token)
    }

    /// Consumes a `/* ... */` comment. An unterminated comment runs to the end of the stream.
    fn consume_comment(&mut self) {
        // consume '/*'
        self.consume_chars(2);

        while self.look_ahead_slice(2) != "*/" && !self.stream.eof() {
            self.next_char();
        }

        // consume '*/'
        self.consume_chars(2);
    }

    /// Returns either a `NUMBER`, `PERCENTAGE` or `DIMENSION` token
    fn consume_numeric_token(&mut self) -> TokenType {
        let value = self.consume_number();

        if self.would_start_ident(0) {
            let unit = self.consume_name();
            return TokenType::Dimension { value, unit };
        }

        if self.current_char() == Ch('%') {
            // consume '%'
            self.next_char();
            return TokenType::Percentage(value);
        }

        TokenType::Number(value)
    }

    /// Consumes `[0-9]*\.[0-9]+|[0-9]+`. Signs are not part of a number in the core syntax.
    fn consume_number(&mut self) -> Number {
        let mut value = self.consume_digits();

        if self.current_char() == Ch('.') && self.stream.look_ahead(1).is_numeric() {
            // consume '.'
            self.next_char();
            value.push('.');
            value.push_str(&self.consume_digits());
        }

        value.parse().unwrap_or_default()
    }

    /// Returns either a `STRING` or a `BAD_STRING` token. The quote character decides the end
    /// of the string.
    fn consume_string_token(&mut self) -> TokenType {
        // consume string starting: (') or (")
        let ending = self.next_char();
        let mut value = String::new();

        loop {
            let current = self.current_char();

            if current == ending {
                // consume string ending
                self.next_char();
                return TokenType::QuotedString(value);
            }

            if matches!(current, Character::StreamEnd | Character::StreamEmpty) {
                return TokenType::QuotedString(value);
            }

            // newline: parser error, the newline is not part of the string
            if current == Ch('\n') {
                return TokenType::BadString(value);
            }

            if current == Ch('\\') {
                match self.stream.look_ahead(1) {
                    Ch('\n') => {
                        // escaped newline continues the string
                        self.consume_chars(2);
                        continue;
                    }
                    Character::StreamEnd | Character::StreamEmpty => {
                        self.next_char();
                        continue;
                    }
                    _ => {
                        value.push(self.consume_escaped_token());
                        continue;
                    }
                }
            }

            value.push(self.next_char().into());
        }
    }

    /// Returns an `IDENT`, `FUNCTION`, `URI` or `BAD_URI` token
    fn consume_ident_like_seq(&mut self) -> TokenType {
        let value = self.consume_name();

        if self.current_char() != Ch('(') {
            return TokenType::Ident(value);
        }

        // consume '('
        self.next_char();

        if value.eq_ignore_ascii_case("url") {
            return self.consume_url();
        }

        TokenType::Function(value)
    }

    /// Consumes the remainder of a `url(`, both the quoted and the unquoted form
    fn consume_url(&mut self) -> TokenType {
        self.consume_whitespace();

        if matches!(self.current_char(), Ch('"' | '\'')) {
            let url = match self.consume_string_token() {
                TokenType::QuotedString(url) => url,
                TokenType::BadString(url) => {
                    self.consume_remnants_of_bad_url();
                    return TokenType::BadUrl(url);
                }
                _ => String::new(),
            };

            self.consume_whitespace();
            if self.current_char() == Ch(')') {
                self.next_char();
                return TokenType::Url(url);
            }

            self.consume_remnants_of_bad_url();
            return TokenType::BadUrl(url);
        }

        let mut url = String::new();
        loop {
            match self.current_char() {
                Ch(')') => {
                    // consume ')'
                    self.next_char();
                    return TokenType::Url(url);
                }
                Character::StreamEnd | Character::StreamEmpty => return TokenType::Url(url),
                Ch(c) if is_css_whitespace(c) => {
                    self.consume_whitespace();
                    if matches!(
                        self.current_char(),
                        Ch(')') | Character::StreamEnd | Character::StreamEmpty
                    ) {
                        continue;
                    }

                    self.consume_remnants_of_bad_url();
                    return TokenType::BadUrl(url);
                }
                Ch('"' | '\'' | '(') => {
                    self.consume_remnants_of_bad_url();
                    return TokenType::BadUrl(url);
                }
                _ if self.is_non_printable_char() => {
                    self.consume_remnants_of_bad_url();
                    return TokenType::BadUrl(url);
                }
                Ch('\\') if self.is_start_of_escape(0) => url.push(self.consume_escaped_token()),
                _ => url.push(self.next_char().into()),
            }
        }
    }

    /// Consumes enough of the input to reach a point where normal tokenizing can resume
    /// after a bad url.
    fn consume_remnants_of_bad_url(&mut self) {
        loop {
            match self.current_char() {
                Ch(')') => {
                    self.next_char();
                    break;
                }
                Character::StreamEnd | Character::StreamEmpty => break,
                _ if self.is_start_of_escape(0) => {
                    self.consume_escaped_token();
                }
                _ => {
                    self.next_char();
                }
            }
        }
    }

    /// Consumes `u+` followed by up to six hex digits or `?`, and an optional `-` with a
    /// second bound.
    fn consume_unicode_range(&mut self) -> TokenType {
        // consume 'u+'
        self.consume_chars(2);

        let mut value = String::new();
        while value.len() < 6
            && matches!(self.current_char(), Ch(c) if c.is_ascii_hexdigit() || c == '?')
        {
            value.push(self.next_char().into());
        }

        if !value.contains('?')
            && self.current_char() == Ch('-')
            && self.stream.look_ahead(1).is_hex_digit()
        {
            value.push(self.next_char().into());

            let mut digits = 0;
            while digits < 6 && self.current_char().is_hex_digit() {
                value.push(self.next_char().into());
                digits += 1;
            }
        }

        TokenType::UnicodeRange(value)
    }

    /// Consumes an escape (the backslash included) and returns the character it stands for
    fn consume_escaped_token(&mut self) -> char {
        // consume '\'
        self.next_char();

        if !self.current_char().is_hex_digit() {
            return match self.next_char() {
                Ch(c) => c,
                _ => UnicodeChar::REPLACEMENT_CHARACTER,
            };
        }

        let mut value = String::new();
        while value.len() < 6 && self.current_char().is_hex_digit() {
            value.push(self.next_char().into());
        }

        // a single white space after a hex escape belongs to the escape
        if matches!(self.current_char(), Ch(c) if is_css_whitespace(c)) {
            self.next_char();
        }

        match u32::from_str_radix(&value, 16).ok().and_then(char::from_u32) {
            Some(c) if c != UnicodeChar::NULL && c <= UnicodeChar::MAX_ALLOWED => c,
            _ => UnicodeChar::REPLACEMENT_CHARACTER,
        }
    }

    /// Consumes a name: ident characters and escapes. The caller checks that the stream
    /// actually starts with a valid name.
    fn consume_name(&mut self) -> String {
        let mut value = String::new();

        loop {
            if self.is_start_of_escape(0) {
                value.push(self.consume_escaped_token());
                continue;
            }

            if !self.is_name_char(self.current_char()) {
                break;
            }

            value.push(self.next_char().into());
        }

        value
    }

    fn consume_digits(&mut self) -> String {
        let mut value = String::new();

        while self.current_char().is_numeric() {
            value.push(self.next_char().into());
        }

        value
    }

    fn consume_chars(&mut self, len: usize) {
        for _ in 0..len {
            self.next_char();
        }
    }

    fn consume_whitespace(&mut self) {
        while matches!(self.current_char(), Ch(c) if is_css_whitespace(c)) {
            self.next_char();
        }
    }

    fn is_name_char(&self, c: Character) -> bool {
        matches!(c, Ch(c) if is_ident_start(c) || c.is_ascii_digit() || c == '-')
    }

    fn is_non_printable_char(&self) -> bool {
        matches!(
            self.current_char(),
            Ch('\u{0000}'..='\u{0008}' | '\u{000B}' | '\u{000E}'..='\u{001F}' | '\u{007F}')
        )
    }

    fn is_start_of_escape(&self, start: usize) -> bool {
        self.stream.look_ahead(start) == Ch('\\')
            && !matches!(
                self.stream.look_ahead(start + 1),
                Ch('\n') | Character::StreamEnd | Character::StreamEmpty
            )
    }

    /// Checks if the next characters would start an identifier: an optional `-` followed by a
    /// name start character or an escape.
    fn would_start_ident(&self, start: usize) -> bool {
        match self.stream.look_ahead(start) {
            Ch('-') => {
                let second = self.stream.look_ahead(start + 1);
                matches!(second, Ch(c) if is_ident_start(c) || c == '-')
                    || self.is_start_of_escape(start + 1)
            }
            Ch('\\') => self.is_start_of_escape(start),
            Ch(c) => is_ident_start(c),
            _ => false,
        }
    }

    fn is_start_of_unicode_range(&self) -> bool {
        self.stream.look_ahead(1) == Ch('+')
            && matches!(self.stream.look_ahead(2), Ch(c) if c.is_ascii_hexdigit() || c == '?')
    }

    fn current_char(&self) -> Character {
        self.stream.look_ahead(0)
    }

    fn next_char(&mut self) -> Character {
        let c = self.stream.read_and_next();

        match c {
            Ch(ch) => self.raw.push(ch),
            Character::Surrogate(_) => self.raw.push(UnicodeChar::REPLACEMENT_CHARACTER),
            Character::StreamEnd | Character::StreamEmpty => return c,
        }
        self.location.inc(c);

        c
    }

    fn look_ahead_slice(&self, len: usize) -> String {
        let mut s = String::new();

        for i in 0..len {
            match self.stream.look_ahead(i) {
                Ch(c) => s.push(c),
                _ => break,
            }
        }

        s
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.consume_token()
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || !c.is_ascii() || c == '_'
}

/// Tokenizes the given string into a flat token list, starting at the given location
#[must_use]
pub fn tokenize_flat(data: &str, location: Location) -> Vec<Token> {
    let mut stream = ByteStream::default();
    stream.read_from_str(data);
    stream.close();

    Tokenizer::new(&mut stream, location).collect()
}

/// Tokenizes the given string and nests the tokens into containers
#[must_use]
pub fn tokenize_str(data: &str, location: Location) -> Vec<Token> {
    tokenize_grouped(tokenize_flat(data, location))
}

/// An opened container that is waiting for its closing token
struct OpenContainer {
    opener: Token,
    content: Vec<Token>,
}

impl OpenContainer {
    fn is_closed_by(&self, token_type: &TokenType) -> bool {
        matches!(
            (&self.opener.token_type, token_type),
            (TokenType::LCurly, TokenType::RCurly)
                | (TokenType::LParen | TokenType::Function(_), TokenType::RParen)
                | (TokenType::LBracket, TokenType::RBracket)
        )
    }

    fn finish(self) -> Token {
        let token_type = match self.opener.token_type {
            TokenType::LCurly => TokenType::Block(self.content),
            TokenType::LBracket => TokenType::Bracket(self.content),
            TokenType::Function(name) => TokenType::FunctionCall {
                name,
                content: self.content,
            },
            _ => TokenType::Paren(self.content),
        };

        Token {
            token_type,
            location: self.opener.location,
            raw: self.opener.raw,
        }
    }
}

/// Nests a flat token stream: `{`, `(`, `[` and functions become container tokens holding
/// everything up to their matching closer.
///
/// A closer that does not match the innermost open container stays a plain token in the
/// current content. Containers that are still open at the end of the stream are closed.
pub fn tokenize_grouped<I>(tokens: I) -> Vec<Token>
where
    I: IntoIterator<Item = Token>,
{
    let mut root = Vec::new();
    let mut stack: Vec<OpenContainer> = Vec::new();

    for token in tokens {
        match token.token_type {
            TokenType::LCurly
            | TokenType::LParen
            | TokenType::LBracket
            | TokenType::Function(_) => {
                stack.push(OpenContainer {
                    opener: token,
                    content: Vec::new(),
                });
            }
            TokenType::RCurly | TokenType::RParen | TokenType::RBracket
                if stack.last().is_some_and(|open| open.is_closed_by(&token.token_type)) =>
            {
                if let Some(open) = stack.pop() {
                    push_token(&mut stack, &mut root, open.finish());
                }
            }
            _ => push_token(&mut stack, &mut root, token),
        }
    }

    while let Some(open) = stack.pop() {
        log::trace!("closing unterminated {} at end of input", open.opener.type_name());
        push_token(&mut stack, &mut root, open.finish());
    }

    root
}

fn push_token(stack: &mut [OpenContainer], root: &mut Vec<Token>, token: Token) {
    match stack.last_mut() {
        Some(open) => open.content.push(token),
        None => root.push(token),
    }
}

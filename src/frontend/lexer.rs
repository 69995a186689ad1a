use crate::frontend::position::Position;
use crate::frontend::token::Token;
use crate::frontend::token_type::{TokenType, lookup_ident};

/// The script lexer
#[derive(Debug, Clone)]
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    read_position: usize,
    current_char: Option<char>,
    line: usize,
    column: usize,
    /// Position where an unterminated `--[[` comment started
    unterminated_block_comment_pos: Option<Position>,
}

impl Lexer {
    pub fn new(input: impl Into<String>) -> Self {
        let mut lexer = Self {
            input: input.into().chars().collect(),
            position: 0,
            read_position: 0,
            current_char: None,
            line: 1,
            column: 0,
            unterminated_block_comment_pos: None,
        };
        lexer.read_char();
        lexer
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Token {
        self.skip_ignorable();

        if let Some(error_pos) = self.unterminated_block_comment_pos.take() {
            return Token::new(
                TokenType::UnterminatedString,
                "--[[",
                error_pos.line,
                error_pos.column,
            );
        }

        let line = self.line;
        let col = self.column;

        let token = match self.current_char {
            // Two- and three-character operators
            Some('=') if self.peek_char() == Some('=') => {
                self.read_char();
                Token::new(TokenType::Eq, "==", line, col)
            }
            Some('~') if self.peek_char() == Some('=') => {
                self.read_char();
                Token::new(TokenType::NotEq, "~=", line, col)
            }
            Some('<') if self.peek_char() == Some('=') => {
                self.read_char();
                Token::new(TokenType::Lte, "<=", line, col)
            }
            Some('>') if self.peek_char() == Some('=') => {
                self.read_char();
                Token::new(TokenType::Gte, ">=", line, col)
            }
            Some('.') if self.peek_char() == Some('.') && self.peek_n(2) == Some('.') => {
                self.read_char();
                self.read_char();
                Token::new(TokenType::Ellipsis, "...", line, col)
            }
            Some('.') if self.peek_char() == Some('.') => {
                self.read_char();
                Token::new(TokenType::Concat, "..", line, col)
            }
            Some('.') if self.peek_char().is_some_and(|c| c.is_ascii_digit()) => {
                let (num, token_type) = self.read_number();
                return Token::new(token_type, num, line, col);
            }
            Some('[') if matches!(self.peek_char(), Some('[') | Some('=')) => {
                return match self.read_long_bracket() {
                    Some(text) => Token::new(TokenType::String, text, line, col),
                    None => Token::new(TokenType::UnterminatedString, "[[", line, col),
                };
            }
            // Single-character operators and delimiters
            Some('=') => Token::new(TokenType::Assign, "=", line, col),
            Some('+') => Token::new(TokenType::Plus, "+", line, col),
            Some('-') => Token::new(TokenType::Minus, "-", line, col),
            Some('*') => Token::new(TokenType::Asterisk, "*", line, col),
            Some('/') => Token::new(TokenType::Slash, "/", line, col),
            Some('%') => Token::new(TokenType::Percent, "%", line, col),
            Some('^') => Token::new(TokenType::Caret, "^", line, col),
            Some('#') => Token::new(TokenType::Hash, "#", line, col),
            Some('<') => Token::new(TokenType::Lt, "<", line, col),
            Some('>') => Token::new(TokenType::Gt, ">", line, col),
            Some('(') => Token::new(TokenType::LParen, "(", line, col),
            Some(')') => Token::new(TokenType::RParen, ")", line, col),
            Some('{') => Token::new(TokenType::LBrace, "{", line, col),
            Some('}') => Token::new(TokenType::RBrace, "}", line, col),
            Some('[') => Token::new(TokenType::LBracket, "[", line, col),
            Some(']') => Token::new(TokenType::RBracket, "]", line, col),
            Some(',') => Token::new(TokenType::Comma, ",", line, col),
            Some(';') => Token::new(TokenType::Semicolon, ";", line, col),
            Some(':') => Token::new(TokenType::Colon, ":", line, col),
            Some('.') => Token::new(TokenType::Dot, ".", line, col),

            // String literals
            Some(quote @ ('"' | '\'')) => {
                return match self.read_string(quote) {
                    Ok(text) => Token::new(TokenType::String, text, line, col),
                    Err(StringFault::Unfinished(partial)) => {
                        Token::new(TokenType::UnterminatedString, partial, line, col)
                    }
                    Err(StringFault::EscapeTooLarge(source)) => {
                        Token::new(TokenType::EscapeTooLarge, source, line, col)
                    }
                };
            }

            // End of file
            None => Token::new(TokenType::Eof, "", line, col),

            // Identifiers and keywords
            Some(ch) if is_letter(ch) => {
                let ident = self.read_identifier();
                let token_type = lookup_ident(&ident);
                return Token::new(token_type, ident, line, col);
            }

            // Numbers
            Some(ch) if ch.is_ascii_digit() => {
                let (num, token_type) = self.read_number();
                return Token::new(token_type, num, line, col);
            }

            // Illegal character
            Some(ch) => Token::new(TokenType::Illegal, ch.to_string(), line, col),
        };

        self.read_char();
        token
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.token_type == TokenType::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn read_char(&mut self) {
        // Column tracks the position of current_char, not the next char
        if self.current_char == Some('\n') {
            self.line += 1;
            self.column = 0;
        } else if self.current_char.is_some() {
            self.column += 1;
        }

        self.current_char = self.input.get(self.read_position).copied();
        self.position = self.read_position;
        self.read_position += 1;
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.read_position).copied()
    }

    fn peek_n(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    fn skip_ignorable(&mut self) {
        loop {
            while matches!(self.current_char, Some(' ' | '\t' | '\r' | '\n')) {
                self.read_char();
            }

            if self.current_char == Some('-') && self.peek_char() == Some('-') {
                let start = Position::new(self.line, self.column);
                self.read_char();
                self.read_char();

                if self.current_char == Some('[')
                    && matches!(self.peek_char(), Some('[') | Some('='))
                {
                    if self.read_long_bracket().is_none() {
                        self.unterminated_block_comment_pos = Some(start);
                        return;
                    }
                    continue;
                }

                while self.current_char.is_some() && self.current_char != Some('\n') {
                    self.read_char();
                }
                continue;
            }

            break;
        }
    }

    fn read_identifier(&mut self) -> String {
        let start = self.position;
        while self.current_char.is_some_and(|c| is_letter(c) || c.is_ascii_digit()) {
            self.read_char();
        }
        self.input[start..self.position].iter().collect()
    }

    /// Reads a numeral: a run of digits and dots, an optional exponent
    /// sign, then any letters glued to it. Text that does not form a number
    /// (`1..2`, `3x`, `0x`) comes back as `MalformedNumber`.
    fn read_number(&mut self) -> (String, TokenType) {
        let start = self.position;

        while self.current_char.is_some_and(|c| c.is_ascii_digit() || c == '.') {
            self.read_char();
        }
        if matches!(self.current_char, Some('e' | 'E')) {
            self.read_char();
            if matches!(self.current_char, Some('+' | '-')) {
                self.read_char();
            }
        }
        while self.current_char.is_some_and(|c| is_letter(c) || c.is_ascii_digit()) {
            self.read_char();
        }

        let literal: String = self.input[start..self.position].iter().collect();
        let token_type = classify_numeral(&literal);
        (literal, token_type)
    }

    /// Reads a quoted string.
    fn read_string(&mut self, quote: char) -> Result<String, StringFault> {
        let start = self.position;
        let mut out = String::new();
        self.read_char(); // opening quote

        loop {
            match self.current_char {
                None | Some('\n') => return Err(StringFault::Unfinished(out)),
                Some(c) if c == quote => {
                    self.read_char();
                    return Ok(out);
                }
                Some('\\') => {
                    self.read_char();
                    match self.current_char {
                        Some('n') => out.push('\n'),
                        Some('t') => out.push('\t'),
                        Some('r') => out.push('\r'),
                        Some('a') => out.push('\u{7}'),
                        Some('b') => out.push('\u{8}'),
                        Some('f') => out.push('\u{c}'),
                        Some('v') => out.push('\u{b}'),
                        Some('\\') => out.push('\\'),
                        Some('"') => out.push('"'),
                        Some('\'') => out.push('\''),
                        Some('\n') => out.push('\n'),
                        Some(d) if d.is_ascii_digit() => {
                            let mut code = 0u32;
                            let mut digits = 0;
                            while digits < 3 {
                                let Some(digit) = self.current_char.and_then(|c| c.to_digit(10))
                                else {
                                    break;
                                };
                                code = code * 10 + digit;
                                digits += 1;
                                self.read_char();
                            }
                            let Ok(byte) = u8::try_from(code) else {
                                let source = self.input[start..self.position].iter().collect();
                                return Err(StringFault::EscapeTooLarge(source));
                            };
                            out.push(char::from(byte));
                            continue;
                        }
                        Some(other) => {
                            out.push('\\');
                            out.push(other);
                        }
                        None => return Err(StringFault::Unfinished(out)),
                    }
                    self.read_char();
                }
                Some(c) => {
                    out.push(c);
                    self.read_char();
                }
            }
        }
    }

    /// Reads `[[...]]` / `[==[...]==]`. Returns `None` when the closing bracket is missing.
    fn read_long_bracket(&mut self) -> Option<String> {
        self.read_char(); // '['
        let mut level = 0;
        while self.current_char == Some('=') {
            level += 1;
            self.read_char();
        }
        if self.current_char != Some('[') {
            return None;
        }
        self.read_char();

        // A newline right after the opening bracket is skipped
        if self.current_char == Some('\n') {
            self.read_char();
        }

        let mut out = String::new();
        loop {
            match self.current_char {
                None => return None,
                Some(']') => {
                    let save = out.len();
                    out.push(']');
                    self.read_char();
                    let mut closing = 0;
                    while self.current_char == Some('=') {
                        closing += 1;
                        out.push('=');
                        self.read_char();
                    }
                    if closing == level && self.current_char == Some(']') {
                        self.read_char();
                        out.truncate(save);
                        return Some(out);
                    }
                }
                Some(c) => {
                    out.push(c);
                    self.read_char();
                }
            }
        }
    }
}

/// Why a quoted string could not be read.
enum StringFault {
    /// The line or input ended first; carries the text read so far.
    Unfinished(String),
    /// A `\ddd` escape above 255; carries the source up to the escape.
    EscapeTooLarge(String),
}

fn classify_numeral(literal: &str) -> TokenType {
    if let Some(digits) = literal
        .strip_prefix("0x")
        .or_else(|| literal.strip_prefix("0X"))
    {
        return if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit()) {
            TokenType::Int
        } else {
            TokenType::MalformedNumber
        };
    }

    let (mantissa, exponent) = match literal.find(['e', 'E']) {
        Some(i) => (&literal[..i], Some(&literal[i + 1..])),
        None => (literal, None),
    };
    let mantissa_ok = mantissa.chars().filter(|&c| c == '.').count() <= 1
        && mantissa.chars().any(|c| c.is_ascii_digit())
        && mantissa.chars().all(|c| c.is_ascii_digit() || c == '.');
    let exponent_ok = exponent.is_none_or(|e| {
        let digits = e.strip_prefix(['+', '-']).unwrap_or(e);
        !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
    });

    if !mantissa_ok || !exponent_ok {
        TokenType::MalformedNumber
    } else if exponent.is_some() || mantissa.contains('.') {
        TokenType::Float
    } else {
        TokenType::Int
    }
}

fn is_letter(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(input: &str) -> Vec<TokenType> {
        Lexer::new(input)
            .tokenize()
            .into_iter()
            .map(|t| t.token_type)
            .collect()
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            types("a .. b ~= c <= d"),
            vec![
                TokenType::Ident,
                TokenType::Concat,
                TokenType::Ident,
                TokenType::NotEq,
                TokenType::Ident,
                TokenType::Lte,
                TokenType::Ident,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = Lexer::new("42 3.5 1e3 0xff .5").tokenize();
        let kinds: Vec<_> = tokens
            .iter()
            .map(|t| (t.token_type, t.literal.as_str()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (TokenType::Int, "42"),
                (TokenType::Float, "3.5"),
                (TokenType::Float, "1e3"),
                (TokenType::Int, "0xff"),
                (TokenType::Float, ".5"),
                (TokenType::Eof, ""),
            ]
        );
    }

    #[test]
    fn test_malformed_numbers() {
        let tokens = Lexer::new("1..2 3x 0x 1e 2.5.1 0x1F 1e+5 3.").tokenize();
        let kinds: Vec<_> = tokens
            .iter()
            .map(|t| (t.token_type, t.literal.as_str()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (TokenType::MalformedNumber, "1..2"),
                (TokenType::MalformedNumber, "3x"),
                (TokenType::MalformedNumber, "0x"),
                (TokenType::MalformedNumber, "1e"),
                (TokenType::MalformedNumber, "2.5.1"),
                (TokenType::Int, "0x1F"),
                (TokenType::Float, "1e+5"),
                (TokenType::Float, "3."),
                (TokenType::Eof, ""),
            ]
        );
        assert_eq!(
            types("1 .. 2"),
            vec![
                TokenType::Int,
                TokenType::Concat,
                TokenType::Int,
                TokenType::Eof
            ]
        );
    }

    #[test]
    fn test_decimal_escapes() {
        let tokens = Lexer::new(r#"'\65\0669' '\255'"#).tokenize();
        assert_eq!(tokens[0].literal, "AB9");
        assert_eq!(tokens[1].literal, "\u{ff}");

        let token = Lexer::new(r"'\9999'").next_token();
        assert_eq!(token.token_type, TokenType::EscapeTooLarge);
        assert_eq!(token.literal, r"'\999");

        let token = Lexer::new(r#""\300""#).next_token();
        assert_eq!(token.token_type, TokenType::EscapeTooLarge);
    }

    #[test]
    fn test_strings_and_escapes() {
        let tokens = Lexer::new(r#"'a\tb' "q\"" [[long
text]]"#)
        .tokenize();
        assert_eq!(tokens[0].literal, "a\tb");
        assert_eq!(tokens[1].literal, "q\"");
        assert_eq!(tokens[2].literal, "long\ntext");
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            types("-- line\nx --[[ block\n comment ]] y"),
            vec![TokenType::Ident, TokenType::Ident, TokenType::Eof]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let tokens = Lexer::new("'abc").tokenize();
        assert_eq!(tokens[0].token_type, TokenType::UnterminatedString);
        assert_eq!(tokens[0].literal, "abc");
    }

    #[test]
    fn test_line_tracking() {
        let tokens = Lexer::new("a\n  b").tokenize();
        assert_eq!(tokens[1].position, Position::new(2, 2));
    }
}

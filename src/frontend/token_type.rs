use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    // Special
    Illegal,
    Eof,
    UnterminatedString,
    MalformedNumber,
    EscapeTooLarge,

    // Identifiers and literals
    Ident,
    Int,
    Float,
    String,

    // Arithmetic Operators
    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    Caret,
    Hash,
    Concat,
    Ellipsis,

    // Comparison Operators
    Lt,
    Gt,
    Lte,
    Gte,
    Eq,
    NotEq,

    // Assignment
    Assign,

    // Delimiters
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Dot,
    Colon,

    // Keywords
    And,
    Break,
    Do,
    Else,
    Elseif,
    End,
    False,
    For,
    Function,
    If,
    In,
    Local,
    Nil,
    Not,
    Or,
    Repeat,
    Return,
    Then,
    True,
    Until,
    While,
}

impl TokenType {
    /// Tokens that close a block.
    pub fn ends_block(self) -> bool {
        matches!(
            self,
            TokenType::End
                | TokenType::Else
                | TokenType::Elseif
                | TokenType::Until
                | TokenType::Eof
        )
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            // Special
            TokenType::Illegal => "ILLEGAL",
            TokenType::Eof => "EOF",
            TokenType::UnterminatedString => "UNTERMINATED_STRING",
            TokenType::MalformedNumber => "MALFORMED_NUMBER",
            TokenType::EscapeTooLarge => "ESCAPE_TOO_LARGE",

            // Identifiers and literals
            TokenType::Ident => "IDENT",
            TokenType::Int => "INT",
            TokenType::Float => "FLOAT",
            TokenType::String => "STRING",

            // Arithmetic Operators
            TokenType::Plus => "+",
            TokenType::Minus => "-",
            TokenType::Asterisk => "*",
            TokenType::Slash => "/",
            TokenType::Percent => "%",
            TokenType::Caret => "^",
            TokenType::Hash => "#",
            TokenType::Concat => "..",
            TokenType::Ellipsis => "...",

            // Comparison Operators
            TokenType::Lt => "<",
            TokenType::Gt => ">",
            TokenType::Lte => "<=",
            TokenType::Gte => ">=",
            TokenType::Eq => "==",
            TokenType::NotEq => "~=",

            // Assignment
            TokenType::Assign => "=",

            // Delimiters
            TokenType::LParen => "(",
            TokenType::RParen => ")",
            TokenType::LBrace => "{",
            TokenType::RBrace => "}",
            TokenType::LBracket => "[",
            TokenType::RBracket => "]",
            TokenType::Comma => ",",
            TokenType::Semicolon => ";",
            TokenType::Dot => ".",
            TokenType::Colon => ":",

            // Keywords
            TokenType::And => "and",
            TokenType::Break => "break",
            TokenType::Do => "do",
            TokenType::Else => "else",
            TokenType::Elseif => "elseif",
            TokenType::End => "end",
            TokenType::False => "false",
            TokenType::For => "for",
            TokenType::Function => "function",
            TokenType::If => "if",
            TokenType::In => "in",
            TokenType::Local => "local",
            TokenType::Nil => "nil",
            TokenType::Not => "not",
            TokenType::Or => "or",
            TokenType::Repeat => "repeat",
            TokenType::Return => "return",
            TokenType::Then => "then",
            TokenType::True => "true",
            TokenType::Until => "until",
            TokenType::While => "while",
        };
        write!(f, "{}", s)
    }
}

pub fn lookup_ident(ident: &str) -> TokenType {
    match ident {
        "and" => TokenType::And,
        "break" => TokenType::Break,
        "do" => TokenType::Do,
        "else" => TokenType::Else,
        "elseif" => TokenType::Elseif,
        "end" => TokenType::End,
        "false" => TokenType::False,
        "for" => TokenType::For,
        "function" => TokenType::Function,
        "if" => TokenType::If,
        "in" => TokenType::In,
        "local" => TokenType::Local,
        "nil" => TokenType::Nil,
        "not" => TokenType::Not,
        "or" => TokenType::Or,
        "repeat" => TokenType::Repeat,
        "return" => TokenType::Return,
        "then" => TokenType::Then,
        "true" => TokenType::True,
        "until" => TokenType::Until,
        "while" => TokenType::While,
        _ => TokenType::Ident,
    }
}

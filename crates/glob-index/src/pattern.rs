/// One element of a parsed glob pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Literal(char),
    /// `?`
    AnyChar,
    /// `*`
    AnyRun,
    /// `%`
    Digit,
    /// `%*`
    DigitRun,
}

impl Token {
    /// Whether the token can match without consuming a character.
    pub fn matches_empty(self) -> bool {
        matches!(self, Token::AnyRun | Token::DigitRun)
    }

    /// Whether the token can consume `c`.
    pub fn accepts(self, c: char) -> bool {
        match self {
            Token::Literal(l) => l == c,
            Token::AnyChar | Token::AnyRun => true,
            Token::Digit | Token::DigitRun => c.is_ascii_digit(),
        }
    }
}

/// Split `pattern` into tokens. A trailing lone `\` is taken literally.
pub fn parse_pattern(pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        let token = match c {
            '\\' => Token::Literal(chars.next().unwrap_or('\\')),
            '?' => Token::AnyChar,
            '*' => Token::AnyRun,
            '%' if chars.peek() == Some(&'*') => {
                chars.next();
                Token::DigitRun
            }
            '%' => Token::Digit,
            c => Token::Literal(c),
        };
        tokens.push(token);
    }
    tokens
}

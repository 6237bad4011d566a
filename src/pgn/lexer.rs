use crate::annotation::Nag;
use crate::error::{NotationError, NotationResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind<'a> {
    Tag { key: String, value: String },
    MoveNumber { number: u32, black: bool },
    /// Move text, possibly with glued judgment punctuation (`Nf3!?`)
    San(&'a str),
    Nag(u8),
    /// Standalone glyph such as `!`, `+-` or `=`
    Glyph(&'a str),
    Comment(&'a str),
    Open,
    Close,
    Result(&'a str),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub offset: usize,
}

pub const RESULTS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

/// Tag names are non-empty runs of ASCII alphanumerics or `_`.
pub fn is_tag_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '{' | '}' | '[' | ']' | ';' | '$')
}

fn is_glyph_char(c: char) -> bool {
    matches!(c, '!' | '?' | '+' | '-' | '=' | '∞' | '±' | '∓' | '⩲' | '⩱' | '□')
}

pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self { Self { src, pos: 0 } }

    fn rest(&self) -> &'a str { &self.src[self.pos..] }

    fn peek(&self) -> Option<char> { self.rest().chars().next() }

    fn at_line_start(&self) -> bool { self.pos == 0 || self.src[..self.pos].ends_with('\n') }

    fn skip_to_eol(&mut self) -> &'a str {
        let rest = self.rest();
        let end = rest.find('\n').unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    fn word(&mut self) -> &'a str {
        let rest = self.rest();
        let end = rest.find(is_delimiter).unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    pub fn next_token(&mut self) -> NotationResult<Option<Token<'a>>> {
        loop {
            let Some(c) = self.peek() else { return Ok(None) };
            if c.is_whitespace() { self.pos += c.len_utf8(); continue; }
            // Escape lines are ignored entirely
            if c == '%' && self.at_line_start() { self.skip_to_eol(); continue; }
            break;
        }
        let offset = self.pos;
        let rest = self.rest();
        let c = rest.chars().next().unwrap_or(' ');
        let kind = match c {
            '{' => {
                let end = rest.find('}').ok_or(NotationError::UnterminatedComment { offset })?;
                self.pos += end + 1;
                TokenKind::Comment(&rest[1..end])
            }
            ';' => {
                self.pos += 1;
                TokenKind::Comment(self.skip_to_eol())
            }
            '(' => { self.pos += 1; TokenKind::Open }
            ')' => { self.pos += 1; TokenKind::Close }
            '[' => self.tag(offset)?,
            ']' | '}' => return Err(NotationError::UnexpectedToken { offset, token: c.to_string() }),
            '$' => {
                self.pos += 1;
                let digits = self.word();
                let n = digits.parse::<u8>().map_err(|_| NotationError::UnexpectedToken { offset, token: format!("${digits}") })?;
                TokenKind::Nag(n)
            }
            _ => self.word_token(offset)?,
        };
        Ok(Some(Token { kind, offset }))
    }

    fn word_token(&mut self, offset: usize) -> NotationResult<TokenKind<'a>> {
        let start = self.pos;
        let word = self.word();
        if RESULTS.contains(&word) { return Ok(TokenKind::Result(word)); }
        if word.starts_with("0-0") { return Ok(TokenKind::San(word)); }
        if word.starts_with(|c: char| c.is_ascii_digit()) {
            let digits = word.find(|c: char| !c.is_ascii_digit()).unwrap_or(word.len());
            let dots = word[digits..].chars().take_while(|c| *c == '.').count();
            let number = word[..digits].parse::<u32>().map_err(|_| NotationError::UnexpectedToken { offset, token: word.to_string() })?;
            // Re-lex whatever is glued after the number ("1.e4")
            self.pos = start + digits + dots;
            return Ok(TokenKind::MoveNumber { number, black: dots >= 3 });
        }
        if word.chars().all(is_glyph_char) || Nag::from_symbol(word).is_some() {
            return Ok(TokenKind::Glyph(word));
        }
        if word.is_empty() {
            return Err(NotationError::UnexpectedToken { offset, token: self.rest().chars().take(1).collect() });
        }
        Ok(TokenKind::San(word))
    }

    fn tag(&mut self, offset: usize) -> NotationResult<TokenKind<'a>> {
        let bad = |lexer: &Lexer<'a>| NotationError::BadTag {
            offset,
            line: lexer.src[offset..].lines().next().unwrap_or("").to_string(),
        };
        let body = &self.rest()[1..];
        let key_len = body.find(|c: char| c.is_whitespace() || c == '"' || c == ']').unwrap_or(body.len());
        let key = &body[..key_len];
        if !is_tag_key(key) { return Err(bad(self)); }
        let after_key = body[key_len..].trim_start();
        let Some(quoted) = after_key.strip_prefix('"') else { return Err(bad(self)) };

        let mut value = String::new();
        let mut chars = quoted.char_indices();
        let mut close = None;
        while let Some((i, ch)) = chars.next() {
            match ch {
                '\\' => match chars.next() { Some((_, esc)) => value.push(esc), None => break },
                '"' => { close = Some(i); break; }
                '\n' => break,
                _ => value.push(ch),
            }
        }
        let Some(close) = close else { return Err(bad(self)) };
        let tail = quoted[close + 1..].trim_start_matches([' ', '\t']);
        if !tail.starts_with(']') { return Err(bad(self)); }
        let consumed = self.rest().len() - tail.len() + 1;
        self.pos += consumed;
        Ok(TokenKind::Tag { key: key.to_string(), value })
    }
}

pub fn tokenize(src: &str) -> NotationResult<Vec<Token<'_>>> {
    let mut lexer = Lexer::new(src);
    let mut out = Vec::new();
    while let Some(tok) = lexer.next_token()? { out.push(tok); }
    Ok(out)
}

//! Rule expression parser.
//!
//! Recursive descent over the closed expression grammar:
//!
//! ```text
//! expr       := and_expr ("or" and_expr)*
//! and_expr   := primary ("and" primary)*
//! primary    := "(" expr ")" | comparison
//! comparison := operand (cmp_op operand)*
//! operand    := NUMBER | STRING | "True" | "False" | IDENT
//! cmp_op     := ">" | ">=" | "<" | "<=" | "==" | "!="
//! ```
//!
//! Column labels from the source sheet are recognised as identifiers even when
//! they contain spaces or punctuation ("MACD Histogramm"). At each operand
//! position the known labels are tried longest first and must end on a word
//! boundary, so "RSI" never swallows the front of "RSI 4H".

use crate::domain::column::ColumnMapping;
use crate::domain::error::ParseError;
use crate::domain::expr::{CompareOp, Expr, Operand};
use crate::domain::value::parse_number;

const RESERVED: &[&str] = &[
    "and", "or", "not", "in", "is", "if", "else", "lambda", "import", "for", "None",
];

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

struct Parser<'a, 'm> {
    input: &'a str,
    pos: usize,
    /// (original label, normalized identifier), longest label first.
    labels: Vec<(&'m str, &'m str)>,
}

impl<'a, 'm> Parser<'a, 'm> {
    fn new(input: &'a str, mapping: &'m ColumnMapping) -> Self {
        let mut labels: Vec<(&'m str, &'m str)> = mapping
            .entries()
            .iter()
            .map(|(o, n)| (o.as_str(), n.as_str()))
            .filter(|(o, _)| is_resolvable_label(o))
            .collect();
        labels.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self {
            input,
            pos: 0,
            labels,
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn expect_char(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(ch) => Err(ParseError {
                message: format!("expected '{}', found '{}'", expected, ch),
                position: self.pos,
            }),
            None => Err(ParseError {
                message: format!("expected '{}', found end of input", expected),
                position: self.pos,
            }),
        }
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        let remaining = self.remaining();
        remaining.starts_with(keyword)
            && !remaining[keyword.len()..]
                .chars()
                .next()
                .is_some_and(is_word_char)
    }

    fn consume_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    fn peek_word(&self) -> String {
        let word: String = self
            .remaining()
            .chars()
            .take_while(|c| is_word_char(*c))
            .collect();
        if word.is_empty() {
            self.peek()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "end of input".to_string())
        } else {
            word
        }
    }

    fn error(&self, message: String) -> ParseError {
        ParseError {
            message,
            position: self.pos,
        }
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        let start = self.pos;
        let mut digits = 0;
        let mut has_dot = false;

        // Unary minus may be separated from its number: "RSI > - 1".
        let negative = self.peek() == Some('-');
        if negative {
            self.advance();
            self.skip_whitespace();
        }
        let number_start = self.pos;

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.advance();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        if digits == 0 {
            return Err(ParseError {
                message: "expected number".to_string(),
                position: start,
            });
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let mark = self.pos;
            self.advance();
            if matches!(self.peek(), Some('+' | '-')) {
                self.advance();
            }
            let exp_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
            if self.pos == exp_start {
                self.pos = mark;
            }
        }

        // A keyword may follow a number directly: "RSI>30and x<1".
        let keyword_follows = self.peek_keyword("and") || self.peek_keyword("or");
        if self.peek().is_some_and(is_word_char) && !keyword_follows {
            return Err(self.error(format!(
                "invalid number: {}{}",
                &self.input[start..self.pos],
                self.peek_word()
            )));
        }

        let num_str = &self.input[number_start..self.pos];
        num_str
            .parse::<f64>()
            .map(|n| if negative { -n } else { n })
            .map_err(|_| ParseError {
                message: format!("invalid number: {}", &self.input[start..self.pos]),
                position: start,
            })
    }

    fn parse_string(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        let quote = self.advance().unwrap_or('"');
        let mut out = String::new();

        loop {
            match self.advance() {
                None => {
                    return Err(ParseError {
                        message: "unterminated string literal".to_string(),
                        position: start,
                    });
                }
                Some(ch) if ch == quote => return Ok(out),
                Some('\\') => match self.advance() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(other) => out.push(other),
                    None => {
                        return Err(ParseError {
                            message: "unterminated string literal".to_string(),
                            position: start,
                        });
                    }
                },
                Some(ch) => out.push(ch),
            }
        }
    }

    fn try_label(&mut self) -> Option<Operand> {
        let remaining = self.remaining();
        let (label, normalized) = self.labels.iter().copied().find(|(label, _)| {
            remaining.starts_with(label) && ends_on_boundary(label, &remaining[label.len()..])
        })?;
        self.pos += label.len();
        Some(Operand::Variable(normalized.to_string()))
    }

    fn parse_operand(&mut self) -> Result<Operand, ParseError> {
        self.skip_whitespace();

        let Some(ch) = self.peek() else {
            return Err(self.error("expected operand, found end of input".to_string()));
        };

        if let Some(operand) = self.try_label() {
            return Ok(operand);
        }

        if ch.is_ascii_digit() || ch == '.' || ch == '-' {
            return self.parse_number().map(Operand::Number);
        }

        if ch == '"' || ch == '\'' {
            return self.parse_string().map(Operand::Text);
        }

        if ch.is_ascii_alphabetic() || ch == '_' {
            let start = self.pos;
            let word = self.peek_word();
            if RESERVED.contains(&word.as_str()) {
                return Err(self.error(format!("expected operand, found keyword '{}'", word)));
            }
            self.pos += word.len();

            match self.peek() {
                Some('(') => {
                    return Err(ParseError {
                        message: format!("function calls are not allowed: '{}('", word),
                        position: start,
                    });
                }
                Some('.') => {
                    return Err(ParseError {
                        message: format!("attribute access is not allowed: '{}.'", word),
                        position: start,
                    });
                }
                Some('[') => {
                    return Err(ParseError {
                        message: format!("indexing is not allowed: '{}['", word),
                        position: start,
                    });
                }
                _ => {}
            }

            return Ok(match word.as_str() {
                "True" => Operand::Bool(true),
                "False" => Operand::Bool(false),
                _ => Operand::Variable(word),
            });
        }

        Err(self.error(format!("expected operand, found '{}'", self.peek_word())))
    }

    fn consume_compare_op(&mut self) -> Option<CompareOp> {
        self.skip_whitespace();
        let remaining = self.remaining();
        let (op, len) = if remaining.starts_with(">=") {
            (CompareOp::Ge, 2)
        } else if remaining.starts_with("<=") {
            (CompareOp::Le, 2)
        } else if remaining.starts_with("==") {
            (CompareOp::Eq, 2)
        } else if remaining.starts_with("!=") {
            (CompareOp::Ne, 2)
        } else if remaining.starts_with('>') {
            (CompareOp::Gt, 1)
        } else if remaining.starts_with('<') {
            (CompareOp::Lt, 1)
        } else {
            return None;
        };
        self.pos += len;
        Some(op)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_operand()?;
        let mut rest = Vec::new();

        while let Some(op) = self.consume_compare_op() {
            rest.push((op, self.parse_operand()?));
        }

        if rest.is_empty() {
            Ok(Expr::Operand(first))
        } else {
            Ok(Expr::Compare { first, rest })
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        self.skip_whitespace();

        if self.peek() == Some('(') {
            self.advance();
            let inner = self.parse_or()?;
            self.expect_char(')')?;

            let mark = self.pos;
            if self.consume_compare_op().is_some() {
                return Err(ParseError {
                    message: "a parenthesized expression cannot be compared".to_string(),
                    position: mark,
                });
            }
            self.pos = mark;
            return Ok(inner);
        }

        self.parse_comparison()
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut items = vec![self.parse_primary()?];
        loop {
            self.skip_whitespace();
            if self.consume_keyword("and") {
                items.push(self.parse_primary()?);
            } else {
                break;
            }
        }
        Ok(collapse(items, Expr::And))
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut items = vec![self.parse_and()?];
        loop {
            self.skip_whitespace();
            if self.consume_keyword("or") {
                items.push(self.parse_and()?);
            } else {
                break;
            }
        }
        Ok(collapse(items, Expr::Or))
    }

    fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_or()?;
        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(ParseError {
                message: format!("unexpected input after expression: '{}'", self.remaining()),
                position: self.pos,
            });
        }
        Ok(expr)
    }
}

fn collapse(mut items: Vec<Expr>, wrap: fn(Vec<Expr>) -> Expr) -> Expr {
    if items.len() == 1 {
        items.remove(0)
    } else {
        wrap(items)
    }
}

/// Labels that could be mistaken for literals or keywords are left to the
/// ordinary lexer.
fn is_resolvable_label(label: &str) -> bool {
    !label.is_empty()
        && label.trim() == label
        && parse_number(label).is_none()
        && !RESERVED.contains(&label)
        && label != "True"
        && label != "False"
}

fn ends_on_boundary(label: &str, after: &str) -> bool {
    let last_is_word = label.chars().last().is_some_and(is_word_char);
    !(last_is_word && after.chars().next().is_some_and(is_word_char))
}

/// Parses an expression written against the labels in `mapping`.
pub fn parse(input: &str, mapping: &ColumnMapping) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(input, mapping);
    parser.parse()
}

/// Parses an expression that only uses plain identifiers.
pub fn parse_plain(input: &str) -> Result<Expr, ParseError> {
    parse(input, &ColumnMapping::default())
}

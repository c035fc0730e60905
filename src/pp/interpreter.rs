//! `#if` / `#elif` expression evaluation.
//!
//! Operates on tokens after `defined` operators were replaced and macros were
//! expanded; identifiers still left over evaluate to 0.

use crate::pp::pp_lexer::{PPToken, PPTokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InvalidExpression;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PPBinaryOp {
    LogicOr,
    LogicAnd,
    BitOr,
    BitXor,
    BitAnd,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    LShift,
    RShift,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PPUnaryOp {
    Plus,
    Minus,
    BitNot,
    LogicNot,
}

#[derive(Debug)]
pub(crate) enum PPExpr {
    Number(i64),
    Binary(PPBinaryOp, Box<PPExpr>, Box<PPExpr>),
    Unary(PPUnaryOp, Box<PPExpr>),
    Conditional(Box<PPExpr>, Box<PPExpr>, Box<PPExpr>),
}

impl PPExpr {
    pub(crate) fn evaluate(&self) -> Result<i64, InvalidExpression> {
        match self {
            PPExpr::Number(n) => Ok(*n),
            PPExpr::Binary(PPBinaryOp::LogicAnd, left, right) => {
                if left.evaluate()? == 0 {
                    Ok(0)
                } else {
                    Ok((right.evaluate()? != 0) as i64)
                }
            }
            PPExpr::Binary(PPBinaryOp::LogicOr, left, right) => {
                if left.evaluate()? != 0 {
                    Ok(1)
                } else {
                    Ok((right.evaluate()? != 0) as i64)
                }
            }
            PPExpr::Binary(op, left, right) => {
                let l = left.evaluate()?;
                let r = right.evaluate()?;
                let value = match op {
                    PPBinaryOp::BitOr => l | r,
                    PPBinaryOp::BitXor => l ^ r,
                    PPBinaryOp::BitAnd => l & r,
                    PPBinaryOp::Equal => (l == r) as i64,
                    PPBinaryOp::NotEqual => (l != r) as i64,
                    PPBinaryOp::Less => (l < r) as i64,
                    PPBinaryOp::LessEqual => (l <= r) as i64,
                    PPBinaryOp::Greater => (l > r) as i64,
                    PPBinaryOp::GreaterEqual => (l >= r) as i64,
                    PPBinaryOp::LShift => l.wrapping_shl(r as u32),
                    PPBinaryOp::RShift => l.wrapping_shr(r as u32),
                    PPBinaryOp::Add => l.wrapping_add(r),
                    PPBinaryOp::Sub => l.wrapping_sub(r),
                    PPBinaryOp::Mul => l.wrapping_mul(r),
                    PPBinaryOp::Div => {
                        if r == 0 {
                            return Err(InvalidExpression);
                        }
                        l.wrapping_div(r)
                    }
                    PPBinaryOp::Mod => {
                        if r == 0 {
                            return Err(InvalidExpression);
                        }
                        l.wrapping_rem(r)
                    }
                    PPBinaryOp::LogicAnd | PPBinaryOp::LogicOr => return Err(InvalidExpression),
                };
                Ok(value)
            }
            PPExpr::Unary(op, operand) => {
                let o = operand.evaluate()?;
                Ok(match op {
                    PPUnaryOp::Plus => o,
                    PPUnaryOp::Minus => o.wrapping_neg(),
                    PPUnaryOp::BitNot => !o,
                    PPUnaryOp::LogicNot => (o == 0) as i64,
                })
            }
            PPExpr::Conditional(cond, then_e, else_e) => {
                if cond.evaluate()? != 0 {
                    then_e.evaluate()
                } else {
                    else_e.evaluate()
                }
            }
        }
    }
}

/// Expression interpreter for preprocessor arithmetic
pub(crate) struct Interpreter<'a> {
    tokens: &'a [PPToken],
    pos: usize,
    cpp: bool,
}

impl<'a> Interpreter<'a> {
    pub(crate) fn new(tokens: &'a [PPToken], cpp: bool) -> Self {
        Interpreter { tokens, pos: 0, cpp }
    }

    /// Parse and evaluate the whole token list
    pub(crate) fn evaluate(mut self) -> Result<i64, InvalidExpression> {
        let expr = self.parse_expression()?;
        if self.pos != self.tokens.len() {
            return Err(InvalidExpression);
        }
        expr.evaluate()
    }

    fn peek(&self) -> Option<PPTokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    pub(crate) fn parse_expression(&mut self) -> Result<PPExpr, InvalidExpression> {
        self.parse_conditional()
    }

    fn parse_conditional(&mut self) -> Result<PPExpr, InvalidExpression> {
        let cond = self.parse_binary(0)?;
        if self.peek() == Some(PPTokenKind::Question) {
            self.pos += 1;
            let then_e = self.parse_conditional()?;
            if self.peek() != Some(PPTokenKind::Colon) {
                return Err(InvalidExpression);
            }
            self.pos += 1;
            let else_e = self.parse_conditional()?;
            return Ok(PPExpr::Conditional(Box::new(cond), Box::new(then_e), Box::new(else_e)));
        }
        Ok(cond)
    }

    fn binary_op(kind: PPTokenKind) -> Option<(PPBinaryOp, u8)> {
        let op = match kind {
            PPTokenKind::LogicOr => (PPBinaryOp::LogicOr, 1),
            PPTokenKind::LogicAnd => (PPBinaryOp::LogicAnd, 2),
            PPTokenKind::Or => (PPBinaryOp::BitOr, 3),
            PPTokenKind::Xor => (PPBinaryOp::BitXor, 4),
            PPTokenKind::And => (PPBinaryOp::BitAnd, 5),
            PPTokenKind::Equal => (PPBinaryOp::Equal, 6),
            PPTokenKind::NotEqual => (PPBinaryOp::NotEqual, 6),
            PPTokenKind::Less => (PPBinaryOp::Less, 7),
            PPTokenKind::LessEqual => (PPBinaryOp::LessEqual, 7),
            PPTokenKind::Greater => (PPBinaryOp::Greater, 7),
            PPTokenKind::GreaterEqual => (PPBinaryOp::GreaterEqual, 7),
            PPTokenKind::LeftShift => (PPBinaryOp::LShift, 8),
            PPTokenKind::RightShift => (PPBinaryOp::RShift, 8),
            PPTokenKind::Plus => (PPBinaryOp::Add, 9),
            PPTokenKind::Minus => (PPBinaryOp::Sub, 9),
            PPTokenKind::Star => (PPBinaryOp::Mul, 10),
            PPTokenKind::Slash => (PPBinaryOp::Div, 10),
            PPTokenKind::Percent => (PPBinaryOp::Mod, 10),
            _ => return None,
        };
        Some(op)
    }

    /// Precedence climbing over the left-associative binary operators
    fn parse_binary(&mut self, min_prec: u8) -> Result<PPExpr, InvalidExpression> {
        let mut left = self.parse_unary()?;
        while let Some((op, prec)) = self.peek().and_then(Self::binary_op) {
            if prec <= min_prec {
                break;
            }
            self.pos += 1;
            let right = self.parse_binary(prec)?;
            left = PPExpr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<PPExpr, InvalidExpression> {
        let op = match self.peek() {
            Some(PPTokenKind::Plus) => PPUnaryOp::Plus,
            Some(PPTokenKind::Minus) => PPUnaryOp::Minus,
            Some(PPTokenKind::Tilde) => PPUnaryOp::BitNot,
            Some(PPTokenKind::Not) => PPUnaryOp::LogicNot,
            _ => return self.parse_primary(),
        };
        self.pos += 1;
        let operand = self.parse_unary()?;
        Ok(PPExpr::Unary(op, Box::new(operand)))
    }

    fn parse_primary(&mut self) -> Result<PPExpr, InvalidExpression> {
        let token = self.tokens.get(self.pos).ok_or(InvalidExpression)?;
        self.pos += 1;
        match token.kind {
            PPTokenKind::Number(sym) => parse_integer(sym.as_str()).map(PPExpr::Number),
            PPTokenKind::CharLiteral(sym) => parse_char_value(sym.as_str()).map(PPExpr::Number),
            PPTokenKind::Identifier(sym) => {
                let value = if self.cpp && sym.as_str() == "true" { 1 } else { 0 };
                Ok(PPExpr::Number(value))
            }
            PPTokenKind::LeftParen => {
                let result = self.parse_expression()?;
                if self.peek() != Some(PPTokenKind::RightParen) {
                    return Err(InvalidExpression);
                }
                self.pos += 1;
                Ok(result)
            }
            _ => Err(InvalidExpression),
        }
    }
}

/// Integer literal value; suffixes are ignored
pub(crate) fn parse_integer(text: &str) -> Result<i64, InvalidExpression> {
    let digits = text
        .trim_end_matches(['u', 'U', 'l', 'L'])
        .replace('\'', "");
    let parsed = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        u64::from_str_radix(bin, 2)
    } else if digits.len() > 1 && digits.starts_with('0') {
        u64::from_str_radix(&digits[1..], 8)
    } else {
        digits.parse::<u64>()
    };
    parsed.map(|v| v as i64).map_err(|_| InvalidExpression)
}

/// Value of a character constant such as `'a'`, `'\n'` or `L'\x41'`
pub(crate) fn parse_char_value(text: &str) -> Result<i64, InvalidExpression> {
    let start = text.find('\'').ok_or(InvalidExpression)?;
    let body = text[start + 1..].strip_suffix('\'').ok_or(InvalidExpression)?;
    let mut chars = body.chars();
    let value = match chars.next().ok_or(InvalidExpression)? {
        '\\' => match chars.next().ok_or(InvalidExpression)? {
            'n' => 10,
            't' => 9,
            'r' => 13,
            '0'..='7' => {
                let octal: String = body[1..].chars().take_while(|c| c.is_digit(8)).collect();
                i64::from_str_radix(&octal, 8).map_err(|_| InvalidExpression)?
            }
            'x' => {
                let hex: String = chars.take_while(|c| c.is_ascii_hexdigit()).collect();
                i64::from_str_radix(&hex, 16).map_err(|_| InvalidExpression)?
            }
            'a' => 7,
            'b' => 8,
            'f' => 12,
            'v' => 11,
            other => other as i64,
        },
        c => c as i64,
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang_options::LangOptions;
    use crate::pp::pp_lexer::tokenize_all;
    use crate::source_manager::SourceId;
    use std::sync::Arc;

    fn eval(src: &str) -> Result<i64, InvalidExpression> {
        let tokens = tokenize_all(SourceId::from_index(0), Arc::from(src), LangOptions::c());
        Interpreter::new(&tokens, false).evaluate()
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(eval("1 + 2 * 3"), Ok(7));
        assert_eq!(eval("10 - 4 - 3"), Ok(3));
        assert_eq!(eval("1 << 2 == 4 && 3 > 2"), Ok(1));
        assert_eq!(eval("0 ? 1 : 2 ? 3 : 4"), Ok(3));
    }

    #[test]
    fn literals_and_identifiers() {
        assert_eq!(eval("0x10 + 010 + 1UL"), Ok(25));
        assert_eq!(eval("'A' == 65"), Ok(1));
        assert_eq!(eval("'\\n'"), Ok(10));
        assert_eq!(eval("UNKNOWN + 1"), Ok(1));
    }

    #[test]
    fn errors() {
        assert_eq!(eval("1 / 0"), Err(InvalidExpression));
        assert_eq!(eval("(1"), Err(InvalidExpression));
        assert_eq!(eval("1 2"), Err(InvalidExpression));
    }
}

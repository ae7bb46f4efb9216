//! Lexer for node lines of an interference listing.

// A node line looks like `4 --> 1 7 9`: a process id, the arrow marker,
// then zero or more conflicting neighbor ids. Header lines are split on
// their colon in parse.rs and never reach this lexer.

use enum_as_inner::EnumAsInner;
use logos::{Lexer, Logos};
use strum_macros::AsRefStr;

fn from_num(lex: &mut Lexer<Token>) -> Result<u32, String> {
  let slice = lex.slice();
  match slice.parse::<u32>() {
    Ok(n) => Ok(n),
    Err(e) => Err(format!("id {} out of range: {:?}", slice, e)),
  }
}

#[derive(Clone, Copy, Logos, Debug, PartialEq, AsRefStr, EnumAsInner)]
pub enum Token {
  #[regex(r"[0-9]+", from_num)]
  Num(u32),

  #[token("-->")]
  Arrow,

  #[error]
  #[regex(r"[ \t\r\f]+", logos::skip)]
  Error,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_lex_node_line() {
    let tokens: Vec<Token> = Token::lexer("4 --> 1 7 9").collect();
    assert_eq!(
      tokens,
      vec![
        Token::Num(4),
        Token::Arrow,
        Token::Num(1),
        Token::Num(7),
        Token::Num(9)
      ]
    );
  }

  #[test]
  fn test_lex_isolated_node() {
    let tokens: Vec<Token> = Token::lexer("12 -->").collect();
    assert_eq!(tokens, vec![Token::Num(12), Token::Arrow]);
  }

  #[test]
  fn test_lex_bad_token() {
    let tokens: Vec<Token> = Token::lexer("1 --> x").collect();
    assert_eq!(tokens, vec![Token::Num(1), Token::Arrow, Token::Error]);
  }

  #[test]
  fn test_lex_overflowing_id() {
    // does not fit in u32, surfaces as an error token rather than wrapping
    let tokens: Vec<Token> = Token::lexer("99999999999").collect();
    assert_eq!(tokens, vec![Token::Error]);
  }
}

use std::iter::Peekable;
use std::str::{FromStr, SplitWhitespace};

/// Whitespace-separated token stream shared by the plan and count readers.
pub(crate) struct Tokens<'a> {
  inner: Peekable<SplitWhitespace<'a>>,
  position: usize,
}

impl<'a> Tokens<'a> {
  pub(crate) fn new(text: &'a str) -> Self {
    Tokens { inner: text.split_whitespace().peekable(), position: 0 }
  }

  pub(crate) fn is_exhausted(&mut self) -> bool {
    self.inner.peek().is_none()
  }

  /// Reads the next token as `T`, describing the expected field on failure.
  pub(crate) fn next_value<T: FromStr>(&mut self, what: &str) -> Result<T, String> {
    let position = self.position;
    let token = self
      .inner
      .next()
      .ok_or_else(|| format!("expected {} at token {}, found end of input", what, position))?;
    self.position += 1;
    token
      .parse()
      .map_err(|_| format!("expected {} at token {}, found `{}`", what, position, token))
  }

  /// Reads a `0`/`1`-style flag: only `1` is true.
  pub(crate) fn next_flag(&mut self, what: &str) -> Result<bool, String> {
    Ok(self.next_value::<u64>(what)? == 1)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reports_position_and_field() {
    let mut t = Tokens::new("4 x");
    assert_eq!(t.next_value::<usize>("node count"), Ok(4));
    let err = t.next_value::<usize>("edge count").unwrap_err();
    assert!(err.contains("edge count"));
    assert!(err.contains("token 1"));
    assert!(err.contains("`x`"));
    assert!(t.is_exhausted());
    assert!(t.next_value::<usize>("anything").unwrap_err().contains("end of input"));
  }

  #[test]
  fn flags_only_accept_one_as_true() {
    let mut t = Tokens::new("1 0 2");
    assert_eq!(t.next_flag("a"), Ok(true));
    assert_eq!(t.next_flag("b"), Ok(false));
    assert_eq!(t.next_flag("c"), Ok(false));
  }
}

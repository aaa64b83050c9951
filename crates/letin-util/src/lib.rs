//! Shared error-formatting helpers used by every `letin-*` crate.
//!
//! Each crate in the workspace defines its own `thiserror`-derived error enum plus a
//! `Result<T>` alias; this crate holds only what's common to all of them so none of
//! them needs to reinvent it.

/// Render a chain of [`std::error::Error::source`] links as `": "`-joined text, the
/// way a CLI driver reports a failure to a terminal.
pub fn display_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut cur = err.source();
    while let Some(source) = cur {
        out.push_str(": ");
        out.push_str(&source.to_string());
        cur = source.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("outer")]
    struct Outer(#[source] Inner);

    #[derive(Debug, Error)]
    #[error("inner")]
    struct Inner;

    #[test]
    fn chains_source_errors() {
        let err = Outer(Inner);
        assert_eq!(display_chain(&err), "outer: inner");
    }
}

//! Script parsing for body extraction and output validation.
//!
//! Backed by `swc` when the `swc` feature is enabled. Without it every call
//! returns [`ParseError::Unavailable`], which callers treat as "skip this
//! step" rather than as a failure.

use std::ops::Range;

/// Why a parse did not produce a usable tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// No parser is compiled in.
    #[error("no script parser available")]
    Unavailable,

    /// The text is not a valid script.
    #[error("{message}")]
    Syntax {
        /// Parser message, prefixed with `line:column` when known.
        message: String,
    },
}

/// Finds the body of the first top-level immediately-invoked function.
///
/// Looks at top-level expression statements whose expression is a call with
/// a function expression (or block-bodied arrow) callee, unwrapping
/// parentheses around the callee. Returns the byte range of the text
/// between the body's braces, or `None` if no statement has that shape.
pub fn iife_body_span(source: &str) -> Result<Option<Range<usize>>, ParseError> {
    imp::iife_body_span(source)
}

/// Checks that `source` parses as a classic (non-module) script.
pub fn check_syntax(source: &str) -> Result<(), ParseError> {
    imp::check_syntax(source)
}

#[cfg(feature = "swc")]
mod imp {
    use std::ops::Range;

    use swc_core::common::sync::Lrc;
    use swc_core::common::{FileName, SourceFile, SourceMap, Spanned};
    use swc_core::ecma::ast::{BlockStmt, BlockStmtOrExpr, Callee, EsVersion, Expr, Script, Stmt};
    use swc_core::ecma::parser::error::Error;
    use swc_core::ecma::parser::lexer::Lexer;
    use swc_core::ecma::parser::{EsSyntax, Parser, StringInput, Syntax};

    use super::ParseError;

    pub(super) fn iife_body_span(source: &str) -> Result<Option<Range<usize>>, ParseError> {
        let (fm, script) = parse_script(source)?;
        let start = fm.start_pos.0;

        for stmt in &script.body {
            let Stmt::Expr(expr_stmt) = stmt else {
                continue;
            };
            let Expr::Call(call) = &*expr_stmt.expr else {
                continue;
            };
            let Callee::Expr(callee) = &call.callee else {
                continue;
            };
            if let Some(block) = function_block(callee) {
                let lo = (block.span.lo.0 - start) as usize;
                let hi = (block.span.hi.0 - start) as usize;
                // The block span covers both braces.
                if hi >= lo + 2 && hi <= source.len() {
                    return Ok(Some(lo + 1..hi - 1));
                }
            }
        }
        Ok(None)
    }

    pub(super) fn check_syntax(source: &str) -> Result<(), ParseError> {
        parse_script(source).map(|_| ())
    }

    fn function_block(expr: &Expr) -> Option<&BlockStmt> {
        match expr {
            Expr::Fn(f) => f.function.body.as_ref(),
            Expr::Arrow(arrow) => match &*arrow.body {
                BlockStmtOrExpr::BlockStmt(block) => Some(block),
                BlockStmtOrExpr::Expr(_) => None,
            },
            Expr::Paren(paren) => function_block(&paren.expr),
            _ => None,
        }
    }

    fn parse_script(source: &str) -> Result<(Lrc<SourceFile>, Script), ParseError> {
        let cm: Lrc<SourceMap> = Default::default();
        let fm = cm.new_source_file(FileName::Anon.into(), source.to_string());
        let lexer = Lexer::new(
            Syntax::Es(EsSyntax::default()),
            EsVersion::Es2022,
            StringInput::from(&*fm),
            None,
        );
        let mut parser = Parser::new_from(lexer);

        let script = parser
            .parse_script()
            .map_err(|err| syntax_error(&cm, err))?;
        if let Some(err) = parser.take_errors().into_iter().next() {
            return Err(syntax_error(&cm, err));
        }
        Ok((fm, script))
    }

    fn syntax_error(cm: &SourceMap, err: Error) -> ParseError {
        let loc = cm.lookup_char_pos(err.span().lo);
        ParseError::Syntax {
            message: format!("{}:{}: {}", loc.line, loc.col_display + 1, err.kind().msg()),
        }
    }
}

#[cfg(not(feature = "swc"))]
mod imp {
    use std::ops::Range;

    use super::ParseError;

    pub(super) fn iife_body_span(_source: &str) -> Result<Option<Range<usize>>, ParseError> {
        Err(ParseError::Unavailable)
    }

    pub(super) fn check_syntax(_source: &str) -> Result<(), ParseError> {
        Err(ParseError::Unavailable)
    }
}

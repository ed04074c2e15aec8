use super::{blocking, Minifier, MinifyError};
use cssparser::{ParseError, ParseErrorKind, Parser, ParserInput, Token};
use futures::future::BoxFuture;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};

pub struct CssMinifier;

impl Minifier for CssMinifier {
    fn minify(&self, source: String) -> BoxFuture<'static, Result<String, MinifyError>> {
        blocking(move || minify_css(&source))
    }
}

/// Parse, compact and print a stylesheet. Parse errors are not recovered from, so
/// malformed input fails instead of being silently dropped.
pub fn minify_css(source: &str) -> Result<String, MinifyError> {
    check_structure(source)?;

    let mut sheet = StyleSheet::parse(source, ParserOptions::default())
        .map_err(|e| MinifyError::CssParse(e.to_string()))?;

    sheet
        .minify(MinifyOptions::default())
        .map_err(|e| MinifyError::CssMinify(e.to_string()))?;

    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            ..Default::default()
        })
        .map_err(|e| MinifyError::CssPrint(e.to_string()))?;

    tracing::debug!(
        input_bytes = source.len(),
        output_bytes = printed.code.len(),
        "css minified"
    );
    Ok(printed.code)
}

/// Reject input lightningcss would accept leniently: blocks still open at end of input
/// and declarations with no value.
fn check_structure(source: &str) -> Result<(), MinifyError> {
    let mut input = ParserInput::new(source);
    let mut parser = Parser::new(&mut input);
    scan(&mut parser).map_err(|e| {
        let reason = match e.kind {
            ParseErrorKind::Custom(msg) => msg,
            ParseErrorKind::Basic(basic) => format!("{basic:?}"),
        };
        MinifyError::CssParse(format!(
            "{reason} at line {}, column {}",
            e.location.line + 1,
            e.location.column
        ))
    })
}

fn scan<'i>(input: &mut Parser<'i, '_>) -> Result<(), ParseError<'i, String>> {
    // `Some(custom)` when the previous token was an identifier.
    let mut last_ident: Option<bool> = None;
    // Set after `property:` until a value token shows up.
    let mut awaiting_value = false;

    loop {
        let start = input.position();
        let token = match input.next() {
            Ok(t) => t.clone(),
            Err(_) => break,
        };
        let closer = match &token {
            Token::CurlyBracketBlock => Some('}'),
            Token::SquareBracketBlock => Some(']'),
            Token::ParenthesisBlock | Token::Function(_) => Some(')'),
            _ => None,
        };

        match token {
            Token::Ident(ref name) => {
                last_ident = Some(name.starts_with("--"));
                awaiting_value = false;
                continue;
            }
            Token::Colon => {
                // Custom properties may legally be empty.
                awaiting_value = last_ident == Some(false);
            }
            Token::Semicolon => {
                if awaiting_value {
                    return Err(input.new_custom_error("declaration has no value".to_string()));
                }
            }
            _ => awaiting_value = false,
        }
        last_ident = None;

        if let Some(closer) = closer {
            input.parse_nested_block(|nested| scan(nested))?;
            if !input.slice_from(start).ends_with(closer) {
                return Err(input.new_custom_error(format!("missing closing `{closer}`")));
            }
        }
    }

    if awaiting_value {
        return Err(input.new_custom_error("declaration has no value".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_insignificant_whitespace() {
        assert_eq!(minify_css("a{color:red;  }").unwrap(), "a{color:red}");
    }

    #[test]
    fn merges_and_shortens() {
        let input = concat!(
            ".foo {\n",
            "  color: #ff0000;\n",
            "  margin: 0px 0px 0px 0px;\n",
            "}\n",
            "/* trailing comment */\n"
        );
        let out = minify_css(input).unwrap();
        assert!(out.len() < input.len());
        assert!(out.starts_with(".foo{"));
        assert!(!out.contains("comment"));
    }

    #[test]
    fn rejects_unterminated_declaration() {
        let err = minify_css("a{color:").unwrap_err();
        assert!(matches!(err, MinifyError::CssParse(_)), "{err}");
    }

    #[test]
    fn rejects_unclosed_blocks() {
        for input in ["a{color:red", "a{", "@media (min-width: 600px {a{color:red}}", "a[href{}"] {
            let err = minify_css(input).unwrap_err();
            assert!(matches!(err, MinifyError::CssParse(_)), "{input}: {err}");
        }
    }

    #[test]
    fn rejects_empty_value() {
        assert!(matches!(
            minify_css("a{color:;margin:0}"),
            Err(MinifyError::CssParse(_))
        ));
        assert!(matches!(minify_css("a{color:}"), Err(MinifyError::CssParse(_))));
    }

    #[test]
    fn accepts_selectors_with_colons_and_functions() {
        let out = minify_css("a:hover, li:not(.x)::before { color: rgb(0, 0, 0); }").unwrap();
        assert!(out.contains(":hover"));
        assert!(minify_css("@media (min-width: 600px) { a { color: red } }").is_ok());
    }

    #[test]
    fn rejects_invalid_selector() {
        let err = minify_css("a..b { color: red }").unwrap_err();
        assert!(matches!(err, MinifyError::CssParse(_)));
    }
}

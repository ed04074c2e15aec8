use super::{blocking, Minifier, MinifyError};
use futures::future::BoxFuture;
use ::minify_js::{Session, TopLevelMode};

pub struct JsMinifier;

impl Minifier for JsMinifier {
    fn minify(&self, source: String) -> BoxFuture<'static, Result<String, MinifyError>> {
        blocking(move || minify_js(&source))
    }
}

/// Minify a script in global mode, so top-level names stay reachable from other scripts.
pub fn minify_js(source: &str) -> Result<String, MinifyError> {
    let session = Session::new();
    let mut out = Vec::with_capacity(source.len());
    ::minify_js::minify(&session, TopLevelMode::Global, source.as_bytes(), &mut out)
        .map_err(|e| MinifyError::JsSyntax(format!("{e:?}")))?;

    let code = String::from_utf8(out).map_err(|e| MinifyError::JsSyntax(e.to_string()))?;
    tracing::debug!(
        input_bytes = source.len(),
        output_bytes = code.len(),
        "js minified"
    );
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compacts_function() {
        let input = "function f(){ console.log( 'x' ) }";
        let out = minify_js(input).unwrap();
        assert!(out.len() < input.len(), "{out}");
        assert!(out.contains("console.log"));
    }

    #[test]
    fn rejects_unbalanced_braces() {
        let err = minify_js("function f( { return 1;").unwrap_err();
        assert!(matches!(err, MinifyError::JsSyntax(_)));
    }
}

//! Minification backends.
//!
//! The controller only sees the [`Minifier`] trait; the real implementations hand the
//! source to `lightningcss` or `minify-js` on Tokio's blocking pool.

mod css;
mod js;

pub use css::CssMinifier;
pub use js::JsMinifier;

use crate::model::Variant;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MinifyError {
    #[error("parse error: {0}")]
    CssParse(String),
    #[error("minify error: {0}")]
    CssMinify(String),
    #[error("print error: {0}")]
    CssPrint(String),
    #[error("syntax error: {0}")]
    JsSyntax(String),
    #[error("minifier task failed: {0}")]
    Join(String),
}

/// An opaque, possibly slow minification service.
pub trait Minifier: Send + Sync {
    fn minify(&self, source: String) -> BoxFuture<'static, Result<String, MinifyError>>;
}

/// Pick the backend for a tool variant.
pub fn for_variant(variant: Variant) -> Arc<dyn Minifier> {
    match variant {
        Variant::Css => Arc::new(CssMinifier),
        Variant::Js => Arc::new(JsMinifier),
    }
}

/// Run a CPU-bound minify on the blocking pool so the controller loop keeps ticking.
fn blocking<F>(f: F) -> BoxFuture<'static, Result<String, MinifyError>>
where
    F: FnOnce() -> Result<String, MinifyError> + Send + 'static,
{
    async move {
        tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| MinifyError::Join(e.to_string()))?
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn for_variant_dispatches_to_backend() {
        let css = for_variant(Variant::Css)
            .minify("a { color: red; }".into())
            .await
            .unwrap();
        assert_eq!(css, "a{color:red}");

        let js = for_variant(Variant::Js)
            .minify("let  answer = 42 ;".into())
            .await
            .unwrap();
        assert!(js.len() < "let  answer = 42 ;".len());
    }
}

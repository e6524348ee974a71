/// A parsed `${key}` or `${key:default}` expression
///
/// The key ends at the first `:`, so the default may itself be an expression:
/// `${app.title:${APP_NAME:Beanstalk}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyExpr<'a> {
    pub key: &'a str,
    pub default: Option<&'a str>,
}

impl<'a> PropertyExpr<'a> {
    /// `None` if `expression` is a plain key or a plain value
    pub fn parse(expression: &'a str) -> Option<Self> {
        let inner = expression.strip_prefix("${")?.strip_suffix('}')?;
        let expr = match inner.split_once(':') {
            Some((key, default)) => PropertyExpr {
                key,
                default: Some(default),
            },
            None => PropertyExpr {
                key: inner,
                default: None,
            },
        };
        Some(expr)
    }
}

use serde_json::Value;

use crate::error::FormatError;
use crate::expr::{EncodeCtx, Expression};
use crate::set::SetCache;
use crate::ProtocolFamily;

/// A nftables firewall rule: identifying metadata plus the ordered
/// expression sequence the kernel evaluates against each packet. The
/// expression order is significant and is preserved verbatim by both
/// output dialects.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rule {
    pub family: ProtocolFamily,
    pub table: String,
    pub chain: String,
    pub handle: u64,
    pub userdata: Option<Vec<u8>>,
    pub expressions: Vec<Expression>,
}

/// Userdata TLV tag carrying a rule comment.
const UDATA_TYPE_COMMENT: u8 = 0;

impl Rule {
    pub fn new(family: ProtocolFamily, table: impl Into<String>, chain: impl Into<String>) -> Self {
        Rule {
            family,
            table: table.into(),
            chain: chain.into(),
            ..Default::default()
        }
    }

    pub fn with_expressions(mut self, expressions: Vec<Expression>) -> Self {
        self.expressions = expressions;
        self
    }

    /// Renders the rule body as one line of nft syntax. The line carries
    /// neither the comment nor the handle; the ruleset presentation layer
    /// appends those.
    pub fn format(&self, sets: &SetCache) -> Result<String, FormatError> {
        format_statements(&self.expressions, self, sets)
    }

    /// Renders the rule body as the statement array of `nft --json`.
    pub fn to_json(&self, sets: &SetCache) -> Result<Vec<Value>, FormatError> {
        json_statements(&self.expressions, self, sets)
    }

    /// The comment attached to the rule, if its userdata blob carries one.
    /// Userdata is a sequence of (type, length, value) triples.
    pub fn comment(&self) -> Option<String> {
        let data = self.userdata.as_deref()?;
        let mut rest = data;
        while rest.len() >= 2 {
            let (typ, len) = (rest[0], rest[1] as usize);
            let value = rest.get(2..2 + len)?;
            if typ == UDATA_TYPE_COMMENT {
                let comment = value.split(|b| *b == 0).next()?;
                return String::from_utf8(comment.to_vec()).ok();
            }
            rest = &rest[2 + len..];
        }
        None
    }
}

/// The text-side driver: walks the expressions in order, lets each encoder
/// either update the context or emit a node, and joins the rendered nodes
/// with single spaces. Also serves dynset's nested statement lists, which
/// format against a fresh register file but the same rule identity.
pub(crate) fn format_statements(
    exprs: &[Expression],
    rule: &Rule,
    sets: &SetCache,
) -> Result<String, FormatError> {
    let mut ctx = EncodeCtx::new(rule, sets);
    let mut rendered = Vec::with_capacity(exprs.len());
    for expr in exprs {
        match expr.encode_text(&mut ctx) {
            Ok(Some(node)) => {
                let text = node.to_string();
                if !text.is_empty() {
                    rendered.push(text);
                }
            }
            Ok(None) => {}
            Err(err) => return Err(err.in_expr(expr.name())),
        }
    }
    Ok(rendered.join(" "))
}

/// The JSON-side driver. Null and empty-object fragments are suppressed,
/// mirroring the statements nft --json leaves out.
pub(crate) fn json_statements(
    exprs: &[Expression],
    rule: &Rule,
    sets: &SetCache,
) -> Result<Vec<Value>, FormatError> {
    let mut ctx = EncodeCtx::new(rule, sets);
    let mut out = Vec::with_capacity(exprs.len());
    for expr in exprs {
        match expr.encode_json(&mut ctx) {
            Ok(Some(value)) => {
                let empty = value.is_null()
                    || value.as_object().map(|o| o.is_empty()).unwrap_or(false);
                if !empty {
                    out.push(value);
                }
            }
            Ok(None) => {}
            Err(err) => return Err(err.in_expr(expr.name())),
        }
    }
    Ok(out)
}

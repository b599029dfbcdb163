//! Expression arena.
//!
//! The reader allocates every form it produces here. The runtime only needs
//! two things from an expression: a stable identity ([`ExprId`]) to compare
//! call sites, and a source-like rendering for diagnostics.

use std::fmt::Write as _;

use crate::{ExprId, Name, Span, StringInterner};

/// Shape of an expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExprKind {
    Nil,
    Bool(bool),
    Int(i64),
    Str(String),
    Symbol(Name),
    /// A list form; a call when the head is callable.
    List(Vec<ExprId>),
}

/// An expression node with its source location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

/// Flat storage for expressions, addressed by [`ExprId`].
#[derive(Clone, Debug, Default)]
pub struct ExprArena {
    exprs: Vec<Expr>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an expression and return its id.
    ///
    /// # Panics
    /// Panics if the arena already holds `u32::MAX` expressions (the last
    /// index is reserved for [`ExprId::INVALID`]).
    pub fn alloc(&mut self, kind: ExprKind, span: Span) -> ExprId {
        let index = u32::try_from(self.exprs.len())
            .ok()
            .filter(|&i| i != u32::MAX)
            .unwrap_or_else(|| panic!("expression arena exceeded capacity"));
        self.exprs.push(Expr::new(kind, span));
        ExprId::new(index)
    }

    /// Look up an expression. `None` for `INVALID` or foreign ids.
    pub fn get(&self, id: ExprId) -> Option<&Expr> {
        if !id.is_valid() {
            return None;
        }
        self.exprs.get(id.index())
    }

    /// Source location of an expression, if it exists.
    pub fn span(&self, id: ExprId) -> Option<Span> {
        self.get(id).map(|e| e.span)
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    /// Render an expression in source form, e.g. `(fact (- n 1))`.
    pub fn display(&self, id: ExprId, interner: &StringInterner) -> String {
        let mut out = String::new();
        self.write_expr(&mut out, id, interner);
        out
    }

    fn write_expr(&self, out: &mut String, id: ExprId, interner: &StringInterner) {
        let Some(expr) = self.get(id) else {
            out.push_str("<unknown>");
            return;
        };
        match &expr.kind {
            ExprKind::Nil => out.push_str("nil"),
            ExprKind::Bool(b) => {
                let _ = write!(out, "{b}");
            }
            ExprKind::Int(n) => {
                let _ = write!(out, "{n}");
            }
            ExprKind::Str(s) => {
                let _ = write!(out, "\"{}\"", s.escape_debug());
            }
            ExprKind::Symbol(name) => out.push_str(interner.lookup(*name)),
            ExprKind::List(items) => {
                out.push('(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    self.write_expr(out, *item, interner);
                }
                out.push(')');
            }
        }
    }
}

#[cfg(test)]
mod tests;

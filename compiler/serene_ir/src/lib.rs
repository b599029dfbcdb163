//! Serene IR - identity and source types shared by the Serene runtime.
//!
//! - [`Span`]: byte range of a form in its source
//! - [`Name`] / [`StringInterner`]: interned symbol names
//! - [`ExprId`] / [`ExprArena`]: call-site expressions and their source form
//! - [`FnId`] / [`FnIdAllocator`]: callable identity, assigned at creation

mod expr;
mod expr_id;
mod fn_id;
mod interner;
mod name;
mod span;

pub use expr::{Expr, ExprArena, ExprKind};
pub use expr_id::ExprId;
pub use fn_id::{FnId, FnIdAllocator};
pub use interner::{InternError, StringInterner};
pub use name::Name;
pub use span::Span;

pub use crate::errors::{ErrorKind, SableError, SourceContext};

pub mod ast;
pub mod cli;
pub mod errors;
pub mod loader;
pub mod syntax;

pub mod prelude {
    pub use crate::ast::{AstNode, BinOp, Binding, Expr, Formal, Formals, Span, StrPart};
    pub use crate::errors::{ErrorKind, SableError, SourceContext};
}

use std::collections::HashSet;

use crate::ast::*;
use crate::lexer::{Token, TokenKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Parse error [{line}:{col}]: {msg}")]
    Error {
        msg: String,
        line: usize,
        col: usize,
    },
}

impl ParseError {
    pub fn location(&self) -> (usize, usize) {
        let ParseError::Error { line, col, .. } = self;
        (*line, *col)
    }

    pub fn message(&self) -> String {
        let ParseError::Error { msg, .. } = self;
        msg.clone()
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Stack of binding scopes, used to tell a fresh `name = e` binding
    /// apart from an assignment to an existing one.
    scopes: Vec<HashSet<String>>,
}

mod blocks;
mod core;
mod decls;
mod expr;
mod patterns;
mod types;

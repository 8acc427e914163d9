//! text emission engine
//!
//! an indentation and scope aware pretty-printer shared by the text
//! backends. an instance is owned by exactly one emission and consumed by
//! [`CodeGenerator::into_output`].

use crate::error::Result;

const DEFAULT_INDENT_WIDTH: usize = 2;

/// stateful printer with an indent level and a naming scope stack
#[derive(Debug)]
pub struct CodeGenerator<C> {
    context: C,
    scope_stack: Vec<String>,
    indent_width: usize,
    indent_level: usize,
    start_of_indent_level: bool,
    output: String,
}

impl<C> CodeGenerator<C> {
    pub fn new(context: C) -> Self {
        Self {
            context,
            scope_stack: Vec::new(),
            indent_width: DEFAULT_INDENT_WIDTH,
            indent_level: 0,
            start_of_indent_level: false,
            output: String::new(),
        }
    }

    /// backend data carried alongside the printer
    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_output(self) -> String {
        self.output
    }

    pub fn push_scope(&mut self, name: impl Into<String>) {
        self.scope_stack.push(name.into());
    }

    pub fn pop_scope(&mut self) -> Option<String> {
        self.scope_stack.pop()
    }

    pub fn scope_stack(&self) -> &[String] {
        &self.scope_stack
    }

    /// current scope names joined with `separator`
    pub fn scoped_name(&self, separator: &str) -> String {
        self.scope_stack.join(separator)
    }

    /// run `body` with `name` pushed; the scope is popped on every exit path
    pub fn with_scope<F>(&mut self, name: impl Into<String>, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let depth = self.scope_stack.len();
        self.push_scope(name);
        let result = body(self);
        self.scope_stack.truncate(depth);
        result
    }

    pub fn print(&mut self, text: &str) {
        self.output.push_str(text);
    }

    /// line break, suppressed while the buffer is still empty
    pub fn print_newline(&mut self) {
        if !self.output.is_empty() {
            self.output.push('\n');
            self.start_of_indent_level = false;
        }
    }

    /// line break unless a block was just opened
    pub fn print_newline_if_needed(&mut self) {
        if !self.start_of_indent_level {
            self.print_newline();
        }
    }

    pub fn print_on_newline(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.print_newline();
        self.print_indent();
        self.print(text);
    }

    fn print_indent(&mut self) {
        let width = self.indent_level * self.indent_width;
        self.output.extend(std::iter::repeat(' ').take(width));
    }

    /// run `body` one level deeper; indent and scopes are restored on exit
    pub fn with_indent<F>(&mut self, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let depth = self.scope_stack.len();
        self.indent_level += 1;
        self.start_of_indent_level = true;
        let result = body(self);
        self.indent_level -= 1;
        self.scope_stack.truncate(depth);
        result
    }

    /// `{ ... }` block with the body indented
    pub fn within_block<F>(&mut self, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.within_block_with(" {", "}", body)
    }

    pub fn within_block_with<F>(&mut self, open: &str, close: &str, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.print(open);
        let result = self.with_indent(body);
        self.print_on_newline(close);
        result
    }
}

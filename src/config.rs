//! codegen configuration
//!
//! build a [`CodegenOptions`] with the toggles recognized by the compiler and
//! the backends, then pass it to [`crate::generate_source`].

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// options shared by the compiler and every backend
#[derive(Debug, Clone)]
pub struct CodegenOptions {
    /// insert `__typename` into every non-root selection set
    pub(crate) add_typename: bool,

    /// emit custom scalars under their own name instead of mapping to string
    pub(crate) passthrough_custom_scalars: bool,

    /// prefix applied to passed-through custom scalar names
    pub(crate) custom_scalars_prefix: String,

    /// pascal-case declaration names (typescript)
    pub(crate) pascal_case: bool,

    /// `export interface` instead of `export type` (typescript)
    pub(crate) prefer_interfaces: bool,

    /// compute a stable id per operation
    pub(crate) generate_operation_ids: bool,

    /// where the operation id map is written
    pub(crate) operation_ids_path: Option<PathBuf>,

    /// flatten named fragment spreads into the fields that use them
    pub(crate) merge_in_fields_from_fragment_spreads: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            add_typename: false,
            passthrough_custom_scalars: false,
            custom_scalars_prefix: String::new(),
            pascal_case: false,
            prefer_interfaces: false,
            generate_operation_ids: false,
            operation_ids_path: None,
            merge_in_fields_from_fragment_spreads: true,
        }
    }
}

impl CodegenOptions {
    /// create options with every toggle off
    pub fn new() -> Self {
        Self::default()
    }

    /// force the typename injection pass
    pub fn with_add_typename(mut self, add_typename: bool) -> Self {
        self.add_typename = add_typename;
        self
    }

    /// pass custom scalars through, optionally behind a prefix
    ///
    /// ```
    /// use graphql_typegen::CodegenOptions;
    ///
    /// let options = CodegenOptions::new().with_passthrough_custom_scalars("Custom");
    /// assert!(options.passthrough_custom_scalars());
    /// ```
    pub fn with_passthrough_custom_scalars(mut self, prefix: impl Into<String>) -> Self {
        self.passthrough_custom_scalars = true;
        self.custom_scalars_prefix = prefix.into();
        self
    }

    /// pascal-case generated declaration names
    pub fn with_pascal_case(mut self, pascal_case: bool) -> Self {
        self.pascal_case = pascal_case;
        self
    }

    /// prefer `interface` declarations over type aliases
    pub fn with_prefer_interfaces(mut self, prefer_interfaces: bool) -> Self {
        self.prefer_interfaces = prefer_interfaces;
        self
    }

    /// compute operation ids and write the id map to `path`
    pub fn with_operation_ids(mut self, path: impl Into<PathBuf>) -> Self {
        self.generate_operation_ids = true;
        self.operation_ids_path = Some(path.into());
        self
    }

    /// compute operation ids without writing an id map
    pub fn with_generate_operation_ids(mut self, generate: bool) -> Self {
        self.generate_operation_ids = generate;
        self
    }

    /// keep named fragment spreads out of the fields that use them
    pub fn with_merge_in_fields_from_fragment_spreads(mut self, merge: bool) -> Self {
        self.merge_in_fields_from_fragment_spreads = merge;
        self
    }

    pub fn add_typename(&self) -> bool {
        self.add_typename
    }

    pub fn passthrough_custom_scalars(&self) -> bool {
        self.passthrough_custom_scalars
    }

    pub fn custom_scalars_prefix(&self) -> &str {
        &self.custom_scalars_prefix
    }

    pub fn generate_operation_ids(&self) -> bool {
        self.generate_operation_ids
    }

    pub fn operation_ids_path(&self) -> Option<&Path> {
        self.operation_ids_path.as_deref()
    }

    /// validate option combinations
    pub(crate) fn validate(&self) -> Result<()> {
        if !self.passthrough_custom_scalars && !self.custom_scalars_prefix.is_empty() {
            return Err(Error::Configuration(
                "custom scalars prefix requires passthrough of custom scalars".to_string(),
            ));
        }

        if let Some(path) = &self.operation_ids_path {
            if path.as_os_str().is_empty() {
                return Err(Error::Configuration(
                    "operation ids path cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = CodegenOptions::default();
        assert!(!options.add_typename());
        assert!(!options.generate_operation_ids());
        assert!(options.merge_in_fields_from_fragment_spreads);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_operation_ids_path_enables_ids() {
        let options = CodegenOptions::new().with_operation_ids("ids.json");
        assert!(options.generate_operation_ids());
        assert_eq!(options.operation_ids_path(), Some(Path::new("ids.json")));
    }

    #[test]
    fn test_validation() {
        let mut options = CodegenOptions::new();
        options.custom_scalars_prefix = "Custom".to_string();
        assert!(options.validate().is_err());

        let options = CodegenOptions::new().with_passthrough_custom_scalars("Custom");
        assert!(options.validate().is_ok());

        let options = CodegenOptions::new().with_operation_ids("");
        assert!(options.validate().is_err());
    }
}

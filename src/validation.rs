//! document validation
//!
//! checks a query document against the schema before it is compiled. every
//! failed rule adds a located [`Diagnostic`]; any diagnostic fails the run.

use crate::document::{self, Document, SelectionSet};
use crate::error::{Diagnostic, Error, Result};
use crate::generate::Target;
use crate::resolve::{field_definition, operation_root_type};
use crate::schema::{Schema, TypeDef, TypeRef};
use crate::typename::TYPENAME_FIELD;
use graphql_parser::query::{Definition, Selection, TypeCondition};
use graphql_parser::Pos;
use std::collections::{HashMap, HashSet};

/// validate `document` for generation with `target`
///
/// the swift target inserts `__typename` itself, so selecting it explicitly
/// is rejected there.
pub fn validate_query_document(schema: &Schema, document: &Document, target: Target) -> Result<()> {
    validate(schema, document, target == Target::Swift)
}

pub(crate) fn validate(
    schema: &Schema,
    document: &Document,
    forbid_explicit_typename: bool,
) -> Result<()> {
    let mut validator = Validator::new(schema, document, forbid_explicit_typename);
    validator.check_document(document);

    if validator.diagnostics.is_empty() {
        tracing::debug!(definitions = document.definitions.len(), "document is valid");
        Ok(())
    } else {
        tracing::debug!(count = validator.diagnostics.len(), "document failed validation");
        Err(Error::Validation(validator.diagnostics))
    }
}

struct Validator<'s, 'd> {
    schema: &'s Schema,
    fragment_types: HashMap<&'d str, &'d str>,
    forbid_explicit_typename: bool,
    diagnostics: Vec<Diagnostic>,
}

impl<'s, 'd> Validator<'s, 'd> {
    fn new(schema: &'s Schema, document: &'d Document, forbid_explicit_typename: bool) -> Self {
        let fragment_types = document
            .definitions
            .iter()
            .filter_map(|def| match def {
                Definition::Fragment(fragment) => Some((
                    fragment.name.as_str(),
                    document::type_condition_name(&fragment.type_condition),
                )),
                Definition::Operation(_) => None,
            })
            .collect();

        Self {
            schema,
            fragment_types,
            forbid_explicit_typename,
            diagnostics: Vec::new(),
        }
    }

    fn report(&mut self, message: impl Into<String>, pos: Pos) {
        self.diagnostics.push(Diagnostic::new(message, pos));
    }

    fn check_document(&mut self, document: &Document) {
        let mut operation_names = HashSet::new();
        let mut fragment_names = HashSet::new();

        for definition in &document.definitions {
            match definition {
                Definition::Operation(operation) => {
                    let pos = document::operation_position(operation);
                    match document::operation_name(operation) {
                        None => self.report(
                            "anonymous operations are not supported",
                            pos,
                        ),
                        Some(name) if !operation_names.insert(name.to_string()) => self.report(
                            format!("there can be only one operation named `{name}`"),
                            pos,
                        ),
                        Some(_) => {}
                    }

                    for var in document::variable_definitions(operation) {
                        let type_ref = TypeRef::from(&var.var_type);
                        let base = type_ref.base_name();
                        if !self.schema.type_named(base).is_some_and(TypeDef::is_input) {
                            self.report(
                                format!(
                                    "variable `${}` cannot be non-input type `{type_ref}`",
                                    var.name
                                ),
                                var.position,
                            );
                        }
                    }

                    let kind = document::operation_kind(operation);
                    match operation_root_type(self.schema, kind) {
                        Ok(root) => self.check_selection_set(root, document::selection_set(operation)),
                        Err(_) => self.report(
                            format!("schema is not configured for {kind}s"),
                            pos,
                        ),
                    }
                }
                Definition::Fragment(fragment) => {
                    if !fragment_names.insert(fragment.name.clone()) {
                        self.report(
                            format!("there can be only one fragment named `{}`", fragment.name),
                            fragment.position,
                        );
                    }
                    let condition = document::type_condition_name(&fragment.type_condition);
                    if let Some(parent) = self.composite_condition(condition, fragment.position) {
                        self.check_selection_set(parent, &fragment.selection_set);
                    }
                }
            }
        }
    }

    fn check_selection_set(&mut self, parent: &'s TypeDef, selection_set: &SelectionSet) {
        for selection in &selection_set.items {
            match selection {
                Selection::Field(field) => {
                    if field.alias.as_deref() == Some(TYPENAME_FIELD) {
                        self.report(
                            format!("`{TYPENAME_FIELD}` may not be used as an alias"),
                            field.position,
                        );
                    }
                    if self.forbid_explicit_typename && field.name == TYPENAME_FIELD {
                        self.report(
                            format!(
                                "`{TYPENAME_FIELD}` is added automatically for this target and must not be selected"
                            ),
                            field.position,
                        );
                    }

                    let Some(definition) = field_definition(self.schema, parent, &field.name)
                    else {
                        self.report(
                            format!("cannot query field `{}` on type `{}`", field.name, parent.name),
                            field.position,
                        );
                        continue;
                    };
                    let Some(field_type) = self.schema.type_named(definition.field_type.base_name())
                    else {
                        continue;
                    };

                    let has_selection = !field.selection_set.items.is_empty();
                    if field_type.is_leaf() && has_selection {
                        self.report(
                            format!(
                                "field `{}` must not have a selection since type `{}` has no subfields",
                                field.name, definition.field_type
                            ),
                            field.position,
                        );
                    } else if field_type.is_composite() && !has_selection {
                        self.report(
                            format!(
                                "field `{}` of type `{}` must have a selection of subfields",
                                field.name, definition.field_type
                            ),
                            field.position,
                        );
                    } else if field_type.is_composite() {
                        self.check_selection_set(field_type, &field.selection_set);
                    }
                }
                Selection::InlineFragment(fragment) => {
                    let condition = match &fragment.type_condition {
                        Some(TypeCondition::On(name)) => {
                            match self.composite_condition(name, fragment.position) {
                                Some(condition) => condition,
                                None => continue,
                            }
                        }
                        None => parent,
                    };
                    self.check_spread_possible(parent, condition, "inline fragment", fragment.position);
                    self.check_selection_set(condition, &fragment.selection_set);
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.fragment_name.as_str();
                    let Some(condition) = self.fragment_types.get(name).copied() else {
                        self.report(format!("unknown fragment `{name}`"), spread.position);
                        continue;
                    };
                    let Some(condition) = self.schema.type_named(condition) else {
                        // reported on the fragment definition
                        continue;
                    };
                    let what = format!("fragment `{name}`");
                    self.check_spread_possible(parent, condition, &what, spread.position);
                }
            }
        }
    }

    fn composite_condition(&mut self, name: &str, pos: Pos) -> Option<&'s TypeDef> {
        match self.schema.type_named(name) {
            Some(ty) if ty.is_composite() => Some(ty),
            Some(_) => {
                self.report(
                    format!("fragment cannot condition on non composite type `{name}`"),
                    pos,
                );
                None
            }
            None => {
                self.report(format!("unknown type `{name}`"), pos);
                None
            }
        }
    }

    fn check_spread_possible(&mut self, parent: &TypeDef, condition: &TypeDef, what: &str, pos: Pos) {
        if !condition.is_composite() {
            return;
        }
        let parent_types = self.schema.possible_types(&parent.name);
        let overlaps = self
            .schema
            .possible_types(&condition.name)
            .iter()
            .any(|ty| parent_types.contains(ty));
        if !overlaps {
            self.report(
                format!(
                    "{what} cannot be spread here as objects of type `{}` can never be of type `{}`",
                    parent.name, condition.name
                ),
                pos,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;
    use indoc::indoc;

    fn schema() -> Schema {
        Schema::parse(indoc! {r#"
            type Query { hero(episode: Episode): Character review: Review search: [SearchResult] }
            enum Episode { NEWHOPE EMPIRE JEDI }
            type Review { stars: Int! }
            interface Character { name: String! }
            type Human implements Character { name: String! homePlanet: String }
            type Droid implements Character { name: String! }
            union SearchResult = Human | Droid
        "#})
        .unwrap()
    }

    fn messages(source: &str, target: Target) -> Vec<String> {
        let doc = parse_document(source, None).unwrap();
        match validate_query_document(&schema(), &doc, target) {
            Ok(()) => Vec::new(),
            Err(err) => err.diagnostics().iter().map(|d| d.message.clone()).collect(),
        }
    }

    #[test]
    fn test_valid_document_passes() {
        let found = messages(
            indoc! {r#"
                query Hero($episode: Episode) {
                    hero(episode: $episode) { name ... on Human { homePlanet } ...DroidName }
                    search { __typename ... on Droid { name } }
                }
                fragment DroidName on Droid { name }
            "#},
            Target::TypeScript,
        );
        assert!(found.is_empty(), "{found:?}");
    }

    #[test]
    fn test_anonymous_and_duplicate_operations() {
        let found = messages(
            "{ review { stars } } query A { review { stars } } query A { review { stars } }",
            Target::Json,
        );
        assert_eq!(found.len(), 2);
        assert!(found[0].contains("anonymous"));
        assert!(found[1].contains("only one operation named `A`"));
    }

    #[test]
    fn test_unknown_fields_and_selection_shape() {
        let found = messages(
            "query Q { hero { nope } review search { name } }",
            Target::Json,
        );
        assert_eq!(found.len(), 3, "{found:?}");
        assert!(found[0].contains("cannot query field `nope` on type `Character`"));
        assert!(found[1].contains("must have a selection of subfields"));
        assert!(found[2].contains("cannot query field `name` on type `SearchResult`"));

        let found = messages("query Q { review { stars { x } } }", Target::Json);
        assert!(found[0].contains("must not have a selection"));
    }

    #[test]
    fn test_impossible_and_unknown_spreads() {
        let found = messages(
            indoc! {r#"
                query Q { review { ...HumanName ...Missing ... on Episode { x } } }
                fragment HumanName on Human { name }
            "#},
            Target::Json,
        );
        assert_eq!(found.len(), 3, "{found:?}");
        assert!(found[0].contains("`Review` can never be of type `Human`"));
        assert!(found[1].contains("unknown fragment `Missing`"));
        assert!(found[2].contains("non composite type `Episode`"));
    }

    #[test]
    fn test_variables_and_roots() {
        let found = messages(
            "query Q($c: Character) { review { stars } } mutation M { review { stars } }",
            Target::Json,
        );
        assert_eq!(found.len(), 2, "{found:?}");
        assert!(found[0].contains("non-input type `Character`"));
        assert!(found[1].contains("not configured for mutations"));
    }

    #[test]
    fn test_typename_rules() {
        let source = "query Q { hero { __typename name } }";
        assert!(messages(source, Target::TypeScript).is_empty());
        assert_eq!(messages(source, Target::Swift).len(), 1);

        let found = messages("query Q { hero { __typename: name } }", Target::Flow);
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("alias"));
    }

    #[test]
    fn test_diagnostics_carry_locations() {
        let doc = parse_document("query Q {\n  hero {\n    nope\n  }\n}", None).unwrap();
        let err = validate_query_document(&schema(), &doc, Target::Json).unwrap_err();
        assert!(err.is_validation_error());
        let location = err.diagnostics()[0].locations[0];
        assert_eq!((location.line, location.column), (3, 5));
    }
}

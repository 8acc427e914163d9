//! ir compiler
//!
//! flattens a (validated) document into [`CompilationContext`] records:
//! fragments whose type condition always applies are merged into their
//! parent, every other type condition becomes an [`InlineFragment`] branch.

use crate::config::CodegenOptions;
use crate::document::{self, Document, FragmentDefinition, SelectionSet};
use crate::error::{Error, Result};
use crate::ir::{merge_field, CompilationContext, Field, Fragment, InlineFragment, Operation, Variable};
use crate::resolve::{field_definition, is_type_proper_super_type_of, operation_root_type};
use crate::schema::{Schema, TypeDef, TypeKind, TypeRef};
use graphql_parser::query::{self as ast, Definition, Selection, TypeCondition};
use indexmap::{IndexMap, IndexSet};
use sha2::{Digest, Sha256};

/// compile every operation and fragment of `document`
pub fn compile_to_ir<'s>(
    schema: &'s Schema,
    document: &Document,
    options: &CodegenOptions,
) -> Result<CompilationContext<'s>> {
    let mut compiler = Compiler::new(schema, document, options);

    let mut fragments = IndexMap::new();
    for definition in &document.definitions {
        if let Definition::Fragment(fragment) = definition {
            let compiled = compiler.compile_fragment(definition, fragment)?;
            fragments.insert(compiled.fragment_name.clone(), compiled);
        }
    }

    let mut operations = IndexMap::new();
    for definition in &document.definitions {
        if let Definition::Operation(operation) = definition {
            let compiled = compiler.compile_operation(definition, operation, &fragments)?;
            operations.insert(compiled.operation_name.clone(), compiled);
        }
    }

    tracing::debug!(
        operations = operations.len(),
        fragments = fragments.len(),
        "compiled document to ir"
    );

    Ok(CompilationContext {
        schema,
        operations,
        fragments,
        types_used: compiler.types_used.into_iter().collect(),
    })
}

/// fields gathered for one parent type
#[derive(Debug, Default)]
struct Collected {
    fields: Vec<Field>,
    fragment_spreads: Vec<String>,
}

struct Compiler<'s, 'd> {
    schema: &'s Schema,
    options: &'d CodegenOptions,
    fragment_definitions: IndexMap<&'d str, &'d FragmentDefinition>,
    types_used: IndexSet<String>,
    spread_stack: Vec<String>,
}

impl<'s, 'd> Compiler<'s, 'd> {
    fn new(schema: &'s Schema, document: &'d Document, options: &'d CodegenOptions) -> Self {
        let fragment_definitions = document
            .definitions
            .iter()
            .filter_map(|def| match def {
                Definition::Fragment(fragment) => Some((fragment.name.as_str(), fragment)),
                Definition::Operation(_) => None,
            })
            .collect();

        Self {
            schema,
            options,
            fragment_definitions,
            types_used: IndexSet::new(),
            spread_stack: Vec::new(),
        }
    }

    fn compile_operation(
        &mut self,
        definition: &ast::Definition<'static, String>,
        operation: &document::Operation,
        fragments: &IndexMap<String, Fragment>,
    ) -> Result<Operation> {
        let operation_name = document::operation_name(operation)
            .ok_or_else(|| Error::Compiler("cannot compile an anonymous operation".to_string()))?
            .to_string();
        let operation_type = document::operation_kind(operation);
        let root_type = operation_root_type(self.schema, operation_type)?;

        let mut variables = Vec::new();
        for var in document::variable_definitions(operation) {
            let type_ref = TypeRef::from(&var.var_type);
            self.add_type_used(type_ref.base_name());
            variables.push(Variable {
                name: var.name.clone(),
                type_ref,
            });
        }

        let mut base = Collected::default();
        let mut branches = IndexMap::new();
        self.collect_selection_set(
            root_type,
            document::selection_set(operation),
            false,
            &mut base,
            &mut branches,
        )?;
        if let Some(condition) = branches.keys().next() {
            return Err(Error::Compiler(format!(
                "fragment on `{condition}` cannot be spread at the root of `{operation_name}`"
            )));
        }

        let fragments_referenced = self.fragments_referenced(document::selection_set(operation))?;
        let source = document::print_definition(definition);
        let mut sources = vec![source.clone()];
        for name in &fragments_referenced {
            let fragment = fragments.get(name).ok_or_else(|| unknown_fragment(name))?;
            sources.push(fragment.source.clone());
        }
        let source_with_fragments = sources.join("\n");

        let operation_id = self
            .options
            .generate_operation_ids
            .then(|| hex::encode(Sha256::digest(source_with_fragments.as_bytes())));

        Ok(Operation {
            operation_name,
            operation_type,
            root_type: root_type.name.clone(),
            variables,
            source,
            fields: base.fields,
            fragments_referenced,
            source_with_fragments,
            operation_id,
        })
    }

    fn compile_fragment(
        &mut self,
        definition: &ast::Definition<'static, String>,
        fragment: &FragmentDefinition,
    ) -> Result<Fragment> {
        let type_condition = document::type_condition_name(&fragment.type_condition);
        let parent = self.composite_type(type_condition)?;

        self.spread_stack.push(fragment.name.clone());
        let compiled = self.compile_selection_set(parent, &fragment.selection_set);
        self.spread_stack.pop();
        let (fields, fragment_spreads, inline_fragments) = compiled?;

        Ok(Fragment {
            fragment_name: fragment.name.clone(),
            source: document::print_definition(definition),
            type_condition: type_condition.to_string(),
            possible_types: self
                .schema
                .possible_types(type_condition)
                .into_iter()
                .map(String::from)
                .collect(),
            fields,
            fragment_spreads,
            inline_fragments,
        })
    }

    /// fields, spreads, and type-condition branches of a composite selection
    fn compile_selection_set(
        &mut self,
        parent: &'s TypeDef,
        selection_set: &SelectionSet,
    ) -> Result<(Vec<Field>, Vec<String>, Vec<InlineFragment>)> {
        let mut base = Collected::default();
        let mut branches = IndexMap::new();
        self.collect_selection_set(parent, selection_set, false, &mut base, &mut branches)?;

        let inline_fragments = self.exclusive_branches(parent, &base, branches);
        Ok((base.fields, base.fragment_spreads, inline_fragments))
    }

    /// regroup type-condition branches so every concrete type lands in exactly one
    ///
    /// a concrete type gets the fields of every branch that applies to it. types
    /// sharing the same set of branches form one group, named by the most
    /// specific of those branches, or split per type when none is most specific.
    fn exclusive_branches(
        &self,
        parent: &'s TypeDef,
        base: &Collected,
        branches: IndexMap<String, Collected>,
    ) -> Vec<InlineFragment> {
        let parent_possible = self.schema.possible_types(&parent.name);
        let branches: Vec<(String, Vec<&'s str>, Collected)> = branches
            .into_iter()
            .map(|(type_condition, branch)| {
                let possible = self
                    .schema
                    .possible_types(&type_condition)
                    .into_iter()
                    .filter(|ty| parent_possible.contains(ty))
                    .collect();
                (type_condition, possible, branch)
            })
            .collect();

        let mut applying: IndexMap<&'s str, Vec<usize>> = IndexMap::new();
        for (index, (_, possible, _)) in branches.iter().enumerate() {
            for ty in possible {
                applying.entry(*ty).or_default().push(index);
            }
        }

        let covers = |outer: usize, inner: usize| {
            branches[inner].1.iter().all(|ty| branches[outer].1.contains(ty))
        };
        let mut groups: IndexMap<String, (Vec<usize>, Vec<&'s str>)> = IndexMap::new();
        for (ty, indices) in applying {
            let most_specific = indices
                .iter()
                .copied()
                .find(|&candidate| indices.iter().all(|&other| covers(other, candidate)));
            let name = match most_specific {
                Some(index) => branches[index].0.clone(),
                None => ty.to_string(),
            };
            groups
                .entry(name)
                .or_insert_with(|| (indices, Vec::new()))
                .1
                .push(ty);
        }

        groups
            .into_iter()
            .map(|(type_condition, (indices, possible))| {
                let mut fields = base.fields.clone();
                let mut fragment_spreads: Vec<String> = Vec::new();
                for index in indices {
                    let branch = &branches[index].2;
                    for field in &branch.fields {
                        merge_field(&mut fields, field.clone());
                    }
                    for spread in &branch.fragment_spreads {
                        if !fragment_spreads.contains(spread) {
                            fragment_spreads.push(spread.clone());
                        }
                    }
                }
                InlineFragment {
                    type_condition,
                    possible_types: possible.into_iter().map(String::from).collect(),
                    fields,
                    fragment_spreads,
                }
            })
            .collect()
    }

    fn collect_selection_set(
        &mut self,
        parent: &'s TypeDef,
        selection_set: &SelectionSet,
        conditional: bool,
        target: &mut Collected,
        branches: &mut IndexMap<String, Collected>,
    ) -> Result<()> {
        for selection in &selection_set.items {
            match selection {
                Selection::Field(field) => {
                    let conditional = conditional || has_conditional_directive(&field.directives);
                    let compiled = self.compile_field(parent, field, conditional)?;
                    merge_field(&mut target.fields, compiled);
                }
                Selection::InlineFragment(fragment) => {
                    let condition = match &fragment.type_condition {
                        Some(TypeCondition::On(name)) => self.composite_type(name)?,
                        None => parent,
                    };
                    let conditional =
                        conditional || has_conditional_directive(&fragment.directives);
                    self.collect_fragment(
                        parent,
                        condition,
                        &fragment.selection_set,
                        conditional,
                        target,
                        branches,
                    )?;
                }
                Selection::FragmentSpread(spread) => {
                    let name = &spread.fragment_name;
                    if !target.fragment_spreads.contains(name) {
                        target.fragment_spreads.push(name.clone());
                    }
                    if !self.options.merge_in_fields_from_fragment_spreads {
                        continue;
                    }
                    if self.spread_stack.contains(name) {
                        return Err(Error::Compiler(format!(
                            "fragment `{name}` spreads itself"
                        )));
                    }
                    let definition = *self
                        .fragment_definitions
                        .get(name.as_str())
                        .ok_or_else(|| unknown_fragment(name))?;
                    let condition =
                        self.composite_type(document::type_condition_name(&definition.type_condition))?;
                    let conditional = conditional || has_conditional_directive(&spread.directives);

                    self.spread_stack.push(name.clone());
                    let result = self.collect_fragment(
                        parent,
                        condition,
                        &definition.selection_set,
                        conditional,
                        target,
                        branches,
                    );
                    self.spread_stack.pop();
                    result?;
                }
            }
        }
        Ok(())
    }

    fn collect_fragment(
        &mut self,
        parent: &'s TypeDef,
        condition: &'s TypeDef,
        selection_set: &SelectionSet,
        conditional: bool,
        target: &mut Collected,
        branches: &mut IndexMap<String, Collected>,
    ) -> Result<()> {
        if is_type_proper_super_type_of(self.schema, condition, parent) {
            return self.collect_selection_set(parent, selection_set, conditional, target, branches);
        }

        let mut branch = std::mem::take(branches.entry(condition.name.clone()).or_default());
        let result =
            self.collect_selection_set(condition, selection_set, conditional, &mut branch, branches);
        branches.insert(condition.name.clone(), branch);
        result
    }

    fn compile_field(
        &mut self,
        parent: &'s TypeDef,
        field: &document::Field,
        is_conditional: bool,
    ) -> Result<Field> {
        let definition = field_definition(self.schema, parent, &field.name).ok_or_else(|| {
            Error::Compiler(format!(
                "cannot query field `{}` on type `{}`",
                field.name, parent.name
            ))
        })?;
        let type_ref = definition.field_type.clone();
        let named = self.named_type(type_ref.base_name())?;

        let (fields, fragment_spreads, inline_fragments) = if named.is_composite() {
            self.compile_selection_set(named, &field.selection_set)?
        } else {
            self.add_type_used(&named.name);
            (Vec::new(), Vec::new(), Vec::new())
        };

        Ok(Field {
            response_name: field.alias.clone().unwrap_or_else(|| field.name.clone()),
            field_name: field.name.clone(),
            type_ref,
            description: definition.description.clone(),
            is_conditional,
            fields,
            fragment_spreads,
            inline_fragments,
        })
    }

    /// transitive fragment names spread anywhere below `selection_set`
    fn fragments_referenced(&self, selection_set: &SelectionSet) -> Result<Vec<String>> {
        let mut found = IndexSet::new();
        self.walk_spreads(selection_set, &mut found)?;
        Ok(found.into_iter().collect())
    }

    fn walk_spreads(&self, selection_set: &SelectionSet, found: &mut IndexSet<String>) -> Result<()> {
        for selection in &selection_set.items {
            match selection {
                Selection::Field(field) => self.walk_spreads(&field.selection_set, found)?,
                Selection::InlineFragment(fragment) => {
                    self.walk_spreads(&fragment.selection_set, found)?
                }
                Selection::FragmentSpread(spread) => {
                    if found.insert(spread.fragment_name.clone()) {
                        let definition = self
                            .fragment_definitions
                            .get(spread.fragment_name.as_str())
                            .ok_or_else(|| unknown_fragment(&spread.fragment_name))?;
                        self.walk_spreads(&definition.selection_set, found)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn named_type(&self, name: &str) -> Result<&'s TypeDef> {
        self.schema
            .type_named(name)
            .ok_or_else(|| Error::Compiler(format!("unknown type `{name}`")))
    }

    fn composite_type(&self, name: &str) -> Result<&'s TypeDef> {
        let ty = self.named_type(name)?;
        if !ty.is_composite() {
            return Err(Error::Compiler(format!(
                "type condition `{name}` is not a composite type"
            )));
        }
        Ok(ty)
    }

    fn add_type_used(&mut self, name: &str) {
        let Some(ty) = self.schema.type_named(name) else {
            return;
        };
        let used = match ty.kind {
            TypeKind::Enum | TypeKind::InputObject => true,
            TypeKind::Scalar => !ty.is_built_in_scalar(),
            _ => false,
        };
        if !used || !self.types_used.insert(ty.name.clone()) {
            return;
        }
        if ty.kind == TypeKind::InputObject {
            for field in &ty.input_fields {
                self.add_type_used(field.value_type.base_name());
            }
        }
    }
}

fn unknown_fragment(name: &str) -> Error {
    Error::Compiler(format!("unknown fragment `{name}`"))
}

fn has_conditional_directive(directives: &[ast::Directive<'static, String>]) -> bool {
    directives
        .iter()
        .any(|directive| directive.name == "skip" || directive.name == "include")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;
    use crate::resolve::OperationKind;
    use crate::typename::with_typename_field_added_where_needed;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    const SCHEMA: &str = indoc! {r#"
        type Query {
            hero(episode: Episode): Character
            search(text: String, filter: SearchFilter): [SearchResult]
        }
        enum Episode { NEWHOPE EMPIRE JEDI }
        input SearchFilter { episode: Episode limit: Int }
        interface Character { name: String! friends: [Character] }
        type Human implements Character { name: String! friends: [Character] homePlanet: String }
        type Droid implements Character { name: String! friends: [Character] primaryFunction: String }
        union SearchResult = Human | Droid
    "#};

    fn compile<'s>(
        schema: &'s Schema,
        source: &str,
        options: &CodegenOptions,
    ) -> CompilationContext<'s> {
        let doc = parse_document(source, None).unwrap();
        let doc = with_typename_field_added_where_needed(schema, &doc).unwrap();
        compile_to_ir(schema, &doc, options).unwrap()
    }

    fn names(fields: &[Field]) -> Vec<&str> {
        fields.iter().map(|f| f.response_name.as_str()).collect()
    }

    #[test]
    fn test_interface_branch_becomes_property_set() {
        let schema = Schema::parse(indoc! {r#"
            type Query { hero: Character }
            interface Character { name: String! }
            type Human implements Character { name: String! homePlanet: String }
        "#})
        .unwrap();
        let ctx = compile(
            &schema,
            "query Hero { hero { name ... on Human { homePlanet } } }",
            &CodegenOptions::default(),
        );

        let hero = &ctx.operations["Hero"].fields[0];
        assert_eq!(names(&hero.fields), vec!["__typename", "name"]);

        let sets = hero.property_sets(ctx.schema);
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].type_condition, Some("Human"));
        assert_eq!(names(sets[0].fields), vec!["__typename", "name", "homePlanet"]);
        assert_eq!(sets[1].type_condition, None);
        assert_eq!(names(sets[1].fields), vec!["__typename", "name"]);
    }

    #[test]
    fn test_disjoint_spreads_yield_exclusive_property_sets() {
        let schema = Schema::parse(SCHEMA).unwrap();
        let ctx = compile(
            &schema,
            indoc! {r#"
                query Search {
                    search(text: "r2") {
                        ... on Human { homePlanet }
                        ...DroidFields
                    }
                }
                fragment DroidFields on Droid { primaryFunction }
            "#},
            &CodegenOptions::default(),
        );

        let search = &ctx.operations["Search"].fields[0];
        let sets = search.property_sets(ctx.schema);
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].type_condition, Some("Human"));
        assert_eq!(names(sets[0].fields), vec!["__typename", "homePlanet"]);
        assert_eq!(sets[1].type_condition, Some("Droid"));
        assert_eq!(names(sets[1].fields), vec!["__typename", "primaryFunction"]);
        assert_eq!(search.fragment_spreads, vec!["DroidFields"]);
    }

    #[test]
    fn test_overlapping_conditions_are_regrouped_per_concrete_type() {
        let schema = Schema::parse(SCHEMA).unwrap();
        let ctx = compile(
            &schema,
            "query Search { search { ... on Character { name } ... on Human { homePlanet } } }",
            &CodegenOptions::default(),
        );

        let search = &ctx.operations["Search"].fields[0];
        let sets = search.property_sets(ctx.schema);
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].type_condition, Some("Human"));
        assert_eq!(names(sets[0].fields), vec!["__typename", "name", "homePlanet"]);
        assert_eq!(sets[1].type_condition, Some("Character"));
        assert_eq!(names(sets[1].fields), vec!["__typename", "name"]);

        assert_eq!(search.inline_fragments[0].possible_types, vec!["Human"]);
        assert_eq!(search.inline_fragments[1].possible_types, vec!["Droid"]);
    }

    #[test]
    fn test_unrelated_overlapping_interfaces_split_by_type() {
        let schema = Schema::parse(indoc! {r#"
            type Query { node: Node }
            interface Node { id: ID! }
            interface Named { name: String }
            interface Aged { age: Int }
            type Person implements Node & Named & Aged { id: ID! name: String age: Int }
            type Pet implements Node & Named { id: ID! name: String }
            type Robot implements Node & Aged { id: ID! age: Int }
        "#})
        .unwrap();
        let ctx = compile(
            &schema,
            "query N { node { ... on Named { name } ... on Aged { age } } }",
            &CodegenOptions::default(),
        );

        let node = &ctx.operations["N"].fields[0];
        let conditions: Vec<&str> = node
            .inline_fragments
            .iter()
            .map(|fragment| fragment.type_condition.as_str())
            .collect();
        assert_eq!(conditions, vec!["Person", "Named", "Aged"]);
        assert_eq!(names(&node.inline_fragments[0].fields), vec!["__typename", "name", "age"]);
        assert_eq!(node.inline_fragments[1].possible_types, vec!["Pet"]);
        assert_eq!(node.inline_fragments[2].possible_types, vec!["Robot"]);
    }

    #[test]
    fn test_supertype_fragments_merge_into_parent() {
        let schema = Schema::parse(SCHEMA).unwrap();
        let ctx = compile(
            &schema,
            indoc! {r#"
                query Hero { hero { ...CharacterName ... on Character { friends { name } } } }
                fragment CharacterName on Character { name }
            "#},
            &CodegenOptions::default(),
        );

        let hero = &ctx.operations["Hero"].fields[0];
        assert_eq!(names(&hero.fields), vec!["__typename", "name", "friends"]);
        assert!(hero.inline_fragments.is_empty());
        assert!(hero.property_sets(ctx.schema).is_empty());
    }

    #[test]
    fn test_operation_metadata() {
        let schema = Schema::parse(SCHEMA).unwrap();
        let ctx = compile(
            &schema,
            indoc! {r#"
                query Search($filter: SearchFilter) {
                    search(filter: $filter) { ...HumanFields }
                }
                fragment HumanFields on Human { name @include(if: true) }
            "#},
            &CodegenOptions::new().with_generate_operation_ids(true),
        );

        let op = &ctx.operations["Search"];
        assert_eq!(op.operation_type, OperationKind::Query);
        assert_eq!(op.root_type, "Query");
        assert_eq!(op.variables[0].type_ref.to_string(), "SearchFilter");
        assert_eq!(op.fragments_referenced, vec!["HumanFields"]);
        assert!(op.source_with_fragments.starts_with(&op.source));
        assert!(op.source_with_fragments.ends_with(&ctx.fragments["HumanFields"].source));

        let id = op.operation_id.as_deref().unwrap();
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));

        assert_eq!(ctx.types_used, vec!["SearchFilter", "Episode"]);

        let human = &op.fields[0].inline_fragments[0];
        assert!(human.fields.iter().any(|f| f.field_name == "name" && f.is_conditional));
    }

    #[test]
    fn test_aliases_become_response_names() {
        let schema = Schema::parse(SCHEMA).unwrap();
        let ctx = compile(
            &schema,
            "query Heroes { empire: hero(episode: EMPIRE) { name } jedi: hero(episode: JEDI) { name } }",
            &CodegenOptions::default(),
        );
        let fields = &ctx.operations["Heroes"].fields;
        assert_eq!(names(fields), vec!["empire", "jedi"]);
        assert_eq!(fields[0].field_name, "hero");
        assert!(ctx.operations["Heroes"].operation_id.is_none());
    }

    #[test]
    fn test_unmerged_spreads_are_only_referenced() {
        let schema = Schema::parse(SCHEMA).unwrap();
        let ctx = compile(
            &schema,
            indoc! {r#"
                query Hero { hero { ...CharacterName } }
                fragment CharacterName on Character { name }
            "#},
            &CodegenOptions::new().with_merge_in_fields_from_fragment_spreads(false),
        );
        let hero = &ctx.operations["Hero"].fields[0];
        assert_eq!(names(&hero.fields), vec!["__typename"]);
        assert_eq!(hero.fragment_spreads, vec!["CharacterName"]);
        assert_eq!(names(&ctx.fragments["CharacterName"].fields), vec!["__typename", "name"]);
    }

    #[test]
    fn test_unknown_field_is_compiler_error() {
        let schema = Schema::parse(SCHEMA).unwrap();
        let doc = parse_document("query Bad { hero { nope } }", None).unwrap();
        let err = compile_to_ir(&schema, &doc, &CodegenOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Compiler(_)));
    }

    #[test]
    fn test_fragment_cycle_is_compiler_error() {
        let schema = Schema::parse(SCHEMA).unwrap();
        let doc = parse_document(
            "query Hero { hero { ...A } } fragment A on Character { ...B } fragment B on Character { ...A }",
            None,
        )
        .unwrap();
        let err = compile_to_ir(&schema, &doc, &CodegenOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Compiler(_)));
    }
}

use formloom_core::ModuleName;
use formloom_domain::{
    FieldDefinition, FieldDefinitionInput, FieldType, IssueKind, ModuleHierarchy, NodeKey,
    RelationshipType,
};
use proptest::prelude::*;

use super::HierarchyBuilder;

fn module() -> ModuleName {
    ModuleName::new("intake").unwrap_or_else(|_| unreachable!())
}

fn field(id: &str, parent_id: Option<&str>, field_type: FieldType, order: i32) -> FieldDefinition {
    let mut input = FieldDefinitionInput::new(id, field_type);
    input.parent_id = parent_id.map(str::to_owned);
    input.order = order;
    FieldDefinition::new(input).unwrap_or_else(|_| unreachable!())
}

fn id_of(hierarchy: &ModuleHierarchy, key: NodeKey) -> &str {
    hierarchy.node(key).map_or("", |node| node.id())
}

fn root_ids(hierarchy: &ModuleHierarchy) -> Vec<&str> {
    hierarchy
        .roots()
        .iter()
        .map(|key| id_of(hierarchy, *key))
        .collect()
}

fn assert_consistent(hierarchy: &ModuleHierarchy) {
    for (key, node) in hierarchy.nodes() {
        assert!(!hierarchy.ancestors(key).contains(&key));
        match node.parent() {
            Some(parent) => {
                assert_eq!(hierarchy.depth(key), hierarchy.depth(parent) + 1);
                assert_eq!(
                    hierarchy.path(key),
                    format!("{}.{}", hierarchy.path(parent), node.id())
                );
                assert_eq!(node.definition().parent_id(), Some(id_of(hierarchy, parent)));
                assert!(hierarchy.children_of(parent).contains(&key));
            }
            None => {
                assert_eq!(hierarchy.depth(key), 0);
                assert_eq!(hierarchy.path(key), node.id());
                assert_eq!(node.definition().parent_id(), None);
                assert!(hierarchy.roots().contains(&key));
            }
        }
    }
}

#[test]
fn missing_parent_becomes_root_with_warning() {
    let fields = vec![
        field("a", None, FieldType::Section, 0),
        field("b", Some("missing"), FieldType::TextBox, 1),
    ];

    let (hierarchy, report) = HierarchyBuilder::default().build(module(), &fields);

    assert_eq!(root_ids(&hierarchy), vec!["a", "b"]);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].message().contains("'b'"));
    assert_eq!(report.warnings[0].kind(), IssueKind::MissingParent);
    assert_eq!(report.fixed_count, 1);
    assert!(report.is_successful());
}

#[test]
fn circular_pair_becomes_two_roots() {
    let fields = vec![
        field("x", Some("y"), FieldType::Group, 0),
        field("y", Some("x"), FieldType::Group, 0),
    ];

    let (hierarchy, report) = HierarchyBuilder::default().build(module(), &fields);

    assert_eq!(root_ids(&hierarchy), vec!["x", "y"]);
    assert!(!report.is_successful());
    assert!(
        report
            .errors
            .iter()
            .any(|issue| issue.message().contains("circular reference"))
    );
    assert!(report.fixed_count >= 1);
    assert_consistent(&hierarchy);
}

#[test]
fn field_hanging_off_a_cycle_keeps_its_parent() {
    let fields = vec![
        field("x", Some("y"), FieldType::Group, 0),
        field("y", Some("x"), FieldType::Group, 0),
        field("z", Some("x"), FieldType::TextBox, 0),
    ];

    let (hierarchy, report) = HierarchyBuilder::default().build(module(), &fields);

    let z = hierarchy.get("z").unwrap_or_else(|| unreachable!());
    assert_eq!(z.definition().parent_id(), Some("x"));
    assert_eq!(report.errors.len(), 2);
    assert_eq!(report.max_depth(), 1);
}

#[test]
fn self_parent_is_circular() {
    let fields = vec![field("loop", Some("loop"), FieldType::Group, 0)];

    let (hierarchy, report) = HierarchyBuilder::default().build(module(), &fields);

    assert_eq!(root_ids(&hierarchy), vec!["loop"]);
    assert_eq!(report.errors[0].kind(), IssueKind::CircularReference);
}

#[test]
fn siblings_and_roots_follow_order_values() {
    let fields = vec![
        field("late", None, FieldType::Section, 9),
        field("early", None, FieldType::Section, 1),
        field("second", Some("early"), FieldType::TextBox, 2),
        field("first", Some("early"), FieldType::TextBox, 1),
    ];

    let (hierarchy, report) = HierarchyBuilder::default().build(module(), &fields);

    assert_eq!(root_ids(&hierarchy), vec!["early", "late"]);
    let early = hierarchy.get("early").unwrap_or_else(|| unreachable!());
    let children: Vec<&str> = early
        .children()
        .iter()
        .map(|key| id_of(&hierarchy, *key))
        .collect();
    assert_eq!(children, vec!["first", "second"]);
    assert_eq!(report.max_depth(), 1);
    assert!(report.warnings.is_empty());
}

#[test]
fn duplicate_identifiers_keep_first_definition() {
    let fields = vec![
        field("a", None, FieldType::Section, 0),
        field("a", None, FieldType::TextBox, 0),
    ];

    let (hierarchy, report) = HierarchyBuilder::default().build(module(), &fields);

    assert_eq!(hierarchy.len(), 1);
    let a = hierarchy.get("a").unwrap_or_else(|| unreachable!());
    assert_eq!(a.definition().field_type(), FieldType::Section);
    assert_eq!(report.errors[0].kind(), IssueKind::DuplicateIdentifier);
}

#[test]
fn incompatible_relationships_only_warn() {
    let mut input = FieldDefinitionInput::new("city", FieldType::TextBox);
    input.parent_id = Some("contact".to_owned());
    input.relationship_type = Some(RelationshipType::Cascade);
    let fields = vec![
        field("contact", None, FieldType::Section, 0),
        FieldDefinition::new(input).unwrap_or_else(|_| unreachable!()),
        field("name", None, FieldType::TextBox, 1),
        field("nickname", Some("name"), FieldType::TextBox, 0),
    ];

    let (hierarchy, report) = HierarchyBuilder::default().build(module(), &fields);

    assert!(report.is_successful());
    let kinds: Vec<IssueKind> = report.warnings.iter().map(|issue| issue.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            IssueKind::IncompatibleRelationship,
            IssueKind::ParentCannotHaveChildren
        ]
    );
    assert_eq!(root_ids(&hierarchy), vec!["contact", "name"]);
}

#[test]
fn empty_input_builds_empty_hierarchy() {
    let (hierarchy, report) = HierarchyBuilder::default().build(module(), &[]);
    assert!(hierarchy.is_empty());
    assert_eq!(report.max_depth(), 0);
    assert!(report.is_successful());
}

#[test]
fn complexity_score_reflects_built_structure() {
    let mut conditional = FieldDefinitionInput::new("decision", FieldType::Conditional);
    conditional.parent_id = Some("page".to_owned());
    let fields = vec![
        field("page", None, FieldType::Section, 0),
        field("other", None, FieldType::Section, 1),
        FieldDefinition::new(conditional).unwrap_or_else(|_| unreachable!()),
        field("reason", Some("decision"), FieldType::TextArea, 0),
        field("note", Some("other"), FieldType::TextBox, 0),
    ];

    let (_, report) = HierarchyBuilder::default().build(module(), &fields);

    assert!((report.metrics.complexity_score - 20.0).abs() < 1e-9);
}

const FIELD_TYPES: [FieldType; 4] = [
    FieldType::Section,
    FieldType::Conditional,
    FieldType::DropDown,
    FieldType::TextBox,
];

/// Parent choices: `None`, an index into the list (possibly itself), or a missing id.
fn arb_fields() -> impl Strategy<Value = Vec<FieldDefinition>> {
    (1usize..24).prop_flat_map(|count| {
        prop::collection::vec(
            (
                prop_oneof![
                    Just(None),
                    (0..count).prop_map(Some),
                    Just(Some(usize::MAX)),
                ],
                0usize..FIELD_TYPES.len(),
                -3i32..3,
            ),
            count,
        )
        .prop_map(|links| {
            links
                .into_iter()
                .enumerate()
                .map(|(position, (parent, type_index, order))| {
                    let parent_id = parent.map(|parent| {
                        if parent == usize::MAX {
                            "missing".to_owned()
                        } else {
                            format!("f{parent}")
                        }
                    });
                    field(
                        &format!("f{position}"),
                        parent_id.as_deref(),
                        FIELD_TYPES[type_index],
                        order,
                    )
                })
                .collect()
        })
    })
}

fn shape(hierarchy: &ModuleHierarchy) -> Vec<(String, Option<String>, Vec<String>)> {
    let id = |key: NodeKey| id_of(hierarchy, key).to_owned();
    hierarchy
        .pre_order()
        .into_iter()
        .map(|key| {
            (
                id(key),
                hierarchy.parent_of(key).map(id),
                hierarchy.children_of(key).iter().copied().map(id).collect(),
            )
        })
        .collect()
}

proptest! {
    #[test]
    fn built_hierarchies_are_cycle_free_and_consistent(fields in arb_fields()) {
        let (hierarchy, report) = HierarchyBuilder::default().build(module(), &fields);

        prop_assert_eq!(hierarchy.len(), fields.len());
        prop_assert_eq!(hierarchy.pre_order().len(), fields.len());
        prop_assert_eq!(report.metrics.total_fields, fields.len());
        assert_consistent(&hierarchy);
    }

    #[test]
    fn rebuilding_flattened_output_is_idempotent(fields in arb_fields()) {
        let builder = HierarchyBuilder::default();
        let (first, _) = builder.build(module(), &fields);
        let (second, report) = builder.build(module(), &first.flatten());

        prop_assert_eq!(shape(&first), shape(&second));
        prop_assert!(report.is_successful());
        prop_assert_eq!(report.fixed_count, 0);
    }
}

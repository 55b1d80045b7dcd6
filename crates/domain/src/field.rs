use std::collections::HashMap;
use std::str::FromStr;

use formloom_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::field_option::FieldOption;
use crate::hierarchy::PATH_SEPARATOR;
use crate::relationship::RelationshipType;

/// Supported form designer field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Single-line text input.
    TextBox,
    /// Multi-line text input.
    TextArea,
    /// Numeric input.
    Number,
    /// Date picker.
    Date,
    /// Single boolean check box.
    CheckBox,
    /// Single-select drop-down list.
    DropDown,
    /// Single-select radio button group.
    RadioGroup,
    /// Multi-select check box list.
    CheckBoxList,
    /// File upload input.
    FileUpload,
    /// Static text label.
    Label,
    /// Layout section.
    Section,
    /// Layout tab.
    Tab,
    /// Layout panel.
    Panel,
    /// Generic grouping container.
    Group,
    /// Repeating group of child fields.
    Repeater,
    /// Decision node whose children are shown conditionally.
    Conditional,
}

impl FieldType {
    /// Every supported field type, in declaration order.
    pub const ALL: [Self; 16] = [
        Self::TextBox,
        Self::TextArea,
        Self::Number,
        Self::Date,
        Self::CheckBox,
        Self::DropDown,
        Self::RadioGroup,
        Self::CheckBoxList,
        Self::FileUpload,
        Self::Label,
        Self::Section,
        Self::Tab,
        Self::Panel,
        Self::Group,
        Self::Repeater,
        Self::Conditional,
    ];

    /// Returns a stable storage value for the field type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextBox => "text_box",
            Self::TextArea => "text_area",
            Self::Number => "number",
            Self::Date => "date",
            Self::CheckBox => "check_box",
            Self::DropDown => "drop_down",
            Self::RadioGroup => "radio_group",
            Self::CheckBoxList => "check_box_list",
            Self::FileUpload => "file_upload",
            Self::Label => "label",
            Self::Section => "section",
            Self::Tab => "tab",
            Self::Panel => "panel",
            Self::Group => "group",
            Self::Repeater => "repeater",
            Self::Conditional => "conditional",
        }
    }

    /// Returns whether the type is a pure layout container.
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Self::Section | Self::Tab | Self::Panel | Self::Group | Self::Repeater
        )
    }

    /// Returns whether the type offers a set of selectable options.
    #[must_use]
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            Self::CheckBox | Self::DropDown | Self::RadioGroup | Self::CheckBoxList
        )
    }

    /// Returns whether fields of this type may have child fields.
    #[must_use]
    pub fn can_have_children(&self) -> bool {
        self.is_container() || self.is_choice() || matches!(self, Self::Conditional)
    }
}

impl FromStr for FieldType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field_type| field_type.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown field type '{value}'")))
    }
}

/// Comparison operator used by visibility conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    /// Trigger value equals the configured value.
    Equals,
    /// Trigger value differs from the configured value.
    NotEquals,
    /// Trigger field has no value.
    IsEmpty,
    /// Trigger field has any value.
    IsNotEmpty,
}

impl ConditionOperator {
    fn requires_value(self) -> bool {
        matches!(self, Self::Equals | Self::NotEquals)
    }
}

/// Rule that shows a field only when another field satisfies a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "VisibilityConditionRecord")]
pub struct VisibilityCondition {
    trigger_field_id: NonEmptyString,
    operator: ConditionOperator,
    value: Option<String>,
}

#[derive(Deserialize)]
struct VisibilityConditionRecord {
    trigger_field_id: String,
    operator: ConditionOperator,
    #[serde(default)]
    value: Option<String>,
}

impl TryFrom<VisibilityConditionRecord> for VisibilityCondition {
    type Error = AppError;

    fn try_from(record: VisibilityConditionRecord) -> Result<Self, Self::Error> {
        Self::new(record.trigger_field_id, record.operator, record.value)
    }
}

impl VisibilityCondition {
    /// Creates a validated visibility condition.
    pub fn new(
        trigger_field_id: impl Into<String>,
        operator: ConditionOperator,
        value: Option<String>,
    ) -> AppResult<Self> {
        match (operator.requires_value(), value.is_some()) {
            (true, false) => {
                return Err(AppError::Validation(
                    "equals/not_equals conditions require a value".to_owned(),
                ));
            }
            (false, true) => {
                return Err(AppError::Validation(
                    "is_empty/is_not_empty conditions do not accept a value".to_owned(),
                ));
            }
            _ => {}
        }

        Ok(Self {
            trigger_field_id: NonEmptyString::new(trigger_field_id)?,
            operator,
            value,
        })
    }

    /// Returns the identifier of the field whose value drives this condition.
    #[must_use]
    pub fn trigger_field_id(&self) -> &str {
        self.trigger_field_id.as_str()
    }

    /// Returns the comparison operator.
    #[must_use]
    pub fn operator(&self) -> ConditionOperator {
        self.operator
    }

    /// Returns the comparison value.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// Value validation constraints for an input field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationConstraints {
    /// Whether a value is mandatory.
    #[serde(default)]
    pub required: bool,
    /// Minimum accepted text length.
    #[serde(default)]
    pub min_length: Option<u32>,
    /// Maximum accepted text length.
    #[serde(default)]
    pub max_length: Option<u32>,
}

impl ValidationConstraints {
    fn validate(&self) -> AppResult<()> {
        if let (Some(min_length), Some(max_length)) = (self.min_length, self.max_length)
            && min_length > max_length
        {
            return Err(AppError::Validation(format!(
                "min_length '{min_length}' must not exceed max_length '{max_length}'"
            )));
        }

        Ok(())
    }
}

/// Accessibility hints rendered alongside a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessibilityMetadata {
    /// Screen reader label.
    #[serde(default)]
    pub aria_label: Option<String>,
    /// Assistive help text.
    #[serde(default)]
    pub help_text: Option<String>,
}

/// Input payload used to construct a validated field definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinitionInput {
    /// Identifier unique within the module.
    pub id: String,
    /// Field type tag.
    pub field_type: FieldType,
    /// User-facing label.
    pub display_name: Option<String>,
    /// Identifier of the parent field.
    pub parent_id: Option<String>,
    /// Why this field is nested under its parent.
    pub relationship_type: Option<RelationshipType>,
    /// Sibling display order.
    pub order: i32,
    /// Optional conditional visibility rule.
    pub visibility_condition: Option<VisibilityCondition>,
    /// Fields whose state depends on this field.
    pub dependent_field_ids: Vec<String>,
    /// Field that validates this field's value.
    pub validating_field_id: Option<String>,
    /// Value validation constraints.
    pub validation: ValidationConstraints,
    /// Accessibility metadata.
    pub accessibility: Option<AccessibilityMetadata>,
    /// Static inline options.
    pub options: Vec<FieldOption>,
    /// External CodeSet reference.
    pub code_set_id: Option<String>,
}

impl FieldDefinitionInput {
    /// Creates an input with only identity and type populated.
    #[must_use]
    pub fn new(id: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: id.into(),
            field_type,
            display_name: None,
            parent_id: None,
            relationship_type: None,
            order: 0,
            visibility_condition: None,
            dependent_field_ids: Vec::new(),
            validating_field_id: None,
            validation: ValidationConstraints::default(),
            accessibility: None,
            options: Vec::new(),
            code_set_id: None,
        }
    }
}

/// Immutable schema record for one field of a module.
///
/// Deserialized documents go through [`FieldDefinition::new`], so stored and
/// constructed definitions follow the same rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FieldDefinitionRecord")]
pub struct FieldDefinition {
    id: NonEmptyString,
    field_type: FieldType,
    display_name: Option<String>,
    parent_id: Option<NonEmptyString>,
    relationship_type: Option<RelationshipType>,
    order: i32,
    visibility_condition: Option<VisibilityCondition>,
    dependent_field_ids: Vec<NonEmptyString>,
    validating_field_id: Option<NonEmptyString>,
    validation: ValidationConstraints,
    accessibility: Option<AccessibilityMetadata>,
    options: Vec<FieldOption>,
    code_set_id: Option<NonEmptyString>,
}

#[derive(Deserialize)]
struct FieldDefinitionRecord {
    id: String,
    field_type: FieldType,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    relationship_type: Option<RelationshipType>,
    #[serde(default)]
    order: i32,
    #[serde(default)]
    visibility_condition: Option<VisibilityCondition>,
    #[serde(default)]
    dependent_field_ids: Vec<String>,
    #[serde(default)]
    validating_field_id: Option<String>,
    #[serde(default)]
    validation: ValidationConstraints,
    #[serde(default)]
    accessibility: Option<AccessibilityMetadata>,
    #[serde(default)]
    options: Vec<FieldOption>,
    #[serde(default)]
    code_set_id: Option<String>,
}

impl TryFrom<FieldDefinitionRecord> for FieldDefinition {
    type Error = AppError;

    fn try_from(record: FieldDefinitionRecord) -> Result<Self, Self::Error> {
        Self::new(FieldDefinitionInput {
            id: record.id,
            field_type: record.field_type,
            display_name: record.display_name,
            parent_id: record.parent_id,
            relationship_type: record.relationship_type,
            order: record.order,
            visibility_condition: record.visibility_condition,
            dependent_field_ids: record.dependent_field_ids,
            validating_field_id: record.validating_field_id,
            validation: record.validation,
            accessibility: record.accessibility,
            options: record.options,
            code_set_id: record.code_set_id,
        })
    }
}

impl FieldDefinition {
    /// Creates a validated field definition.
    ///
    /// Blank parent, validating-field and CodeSet identifiers are treated as absent.
    /// Identifiers may not contain [`PATH_SEPARATOR`], which joins them into paths.
    /// Structural problems such as unknown or circular parents are not checked here;
    /// they belong to the hierarchy as a whole.
    pub fn new(input: FieldDefinitionInput) -> AppResult<Self> {
        let FieldDefinitionInput {
            id,
            field_type,
            display_name,
            parent_id,
            relationship_type,
            order,
            visibility_condition,
            dependent_field_ids,
            validating_field_id,
            validation,
            accessibility,
            options,
            code_set_id,
        } = input;

        validation.validate()?;

        let id = NonEmptyString::new(id.trim())?;
        if id.as_str().contains(PATH_SEPARATOR) {
            return Err(AppError::Validation(format!(
                "field id '{id}' must not contain '{PATH_SEPARATOR}'"
            )));
        }
        let dependent_field_ids = dependent_field_ids
            .into_iter()
            .map(|value| NonEmptyString::new(value.trim()))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self {
            id,
            field_type,
            display_name: normalize_optional(display_name),
            parent_id: optional_identifier(parent_id),
            relationship_type,
            order,
            visibility_condition,
            dependent_field_ids,
            validating_field_id: optional_identifier(validating_field_id),
            validation,
            accessibility,
            options,
            code_set_id: optional_identifier(code_set_id),
        })
    }

    /// Returns the field identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the field type.
    #[must_use]
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Returns the display name, falling back to the identifier.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(self.id.as_str())
    }

    /// Returns the stored parent identifier.
    #[must_use]
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_ref().map(NonEmptyString::as_str)
    }

    /// Returns the relationship type tag.
    #[must_use]
    pub fn relationship_type(&self) -> Option<RelationshipType> {
        self.relationship_type
    }

    /// Returns the sibling order.
    #[must_use]
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Returns the visibility condition.
    #[must_use]
    pub fn visibility_condition(&self) -> Option<&VisibilityCondition> {
        self.visibility_condition.as_ref()
    }

    /// Returns identifiers of fields depending on this field.
    pub fn dependent_field_ids(&self) -> impl Iterator<Item = &str> {
        self.dependent_field_ids.iter().map(NonEmptyString::as_str)
    }

    /// Returns the validating field identifier.
    #[must_use]
    pub fn validating_field_id(&self) -> Option<&str> {
        self.validating_field_id.as_ref().map(NonEmptyString::as_str)
    }

    /// Returns validation constraints.
    #[must_use]
    pub fn validation(&self) -> &ValidationConstraints {
        &self.validation
    }

    /// Returns accessibility metadata.
    #[must_use]
    pub fn accessibility(&self) -> Option<&AccessibilityMetadata> {
        self.accessibility.as_ref()
    }

    /// Returns static inline options.
    #[must_use]
    pub fn options(&self) -> &[FieldOption] {
        &self.options
    }

    /// Returns the CodeSet reference.
    #[must_use]
    pub fn code_set_id(&self) -> Option<&str> {
        self.code_set_id.as_ref().map(NonEmptyString::as_str)
    }

    /// Returns whether visibility of this field depends on a condition.
    #[must_use]
    pub fn is_conditional(&self) -> bool {
        self.field_type == FieldType::Conditional || self.visibility_condition.is_some()
    }

    /// Returns every field identifier this field refers to besides its parent.
    pub fn cross_references(&self) -> impl Iterator<Item = &str> {
        self.visibility_condition
            .iter()
            .map(VisibilityCondition::trigger_field_id)
            .chain(self.dependent_field_ids())
            .chain(self.validating_field_id())
    }

    /// Returns a copy with a different identifier.
    #[must_use]
    pub fn with_id(&self, id: NonEmptyString) -> Self {
        Self {
            id,
            ..self.clone()
        }
    }

    /// Returns a copy with a different parent identifier.
    #[must_use]
    pub fn with_parent_id(&self, parent_id: Option<NonEmptyString>) -> Self {
        Self {
            parent_id,
            ..self.clone()
        }
    }

    /// Returns a copy with a different relationship type.
    #[must_use]
    pub fn with_relationship_type(&self, relationship_type: Option<RelationshipType>) -> Self {
        Self {
            relationship_type,
            ..self.clone()
        }
    }

    /// Returns a copy with a different sibling order.
    #[must_use]
    pub fn with_order(&self, order: i32) -> Self {
        Self {
            order,
            ..self.clone()
        }
    }

    /// Returns a copy whose cross references are rewritten through `remapping`.
    ///
    /// Identifiers missing from the table are kept as they are.
    #[must_use]
    pub fn with_remapped_references(&self, remapping: &HashMap<String, NonEmptyString>) -> Self {
        let remap = |value: &NonEmptyString| {
            remapping
                .get(value.as_str())
                .cloned()
                .unwrap_or_else(|| value.clone())
        };

        Self {
            visibility_condition: self.visibility_condition.as_ref().map(|condition| {
                VisibilityCondition {
                    trigger_field_id: remap(&condition.trigger_field_id),
                    ..condition.clone()
                }
            }),
            dependent_field_ids: self.dependent_field_ids.iter().map(remap).collect(),
            validating_field_id: self.validating_field_id.as_ref().map(remap),
            ..self.clone()
        }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim().to_owned();
        (!trimmed.is_empty()).then_some(trimmed)
    })
}

fn optional_identifier(value: Option<String>) -> Option<NonEmptyString> {
    normalize_optional(value).and_then(|value| NonEmptyString::new(value).ok())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::str::FromStr;

    use formloom_core::NonEmptyString;

    use super::{
        ConditionOperator, FieldDefinition, FieldDefinitionInput, FieldType,
        ValidationConstraints, VisibilityCondition,
    };

    #[test]
    fn field_type_round_trips_storage_value() {
        for field_type in FieldType::ALL {
            let parsed = FieldType::from_str(field_type.as_str());
            assert!(matches!(parsed, Ok(value) if value == field_type));
        }
        assert!(FieldType::from_str("carousel").is_err());
    }

    #[test]
    fn plain_inputs_cannot_have_children() {
        assert!(!FieldType::TextBox.can_have_children());
        assert!(!FieldType::Label.can_have_children());
        assert!(FieldType::Section.can_have_children());
        assert!(FieldType::DropDown.can_have_children());
        assert!(FieldType::Conditional.can_have_children());
    }

    #[test]
    fn blank_parent_identifier_is_treated_as_root() {
        let mut input = FieldDefinitionInput::new("name", FieldType::TextBox);
        input.parent_id = Some("   ".to_owned());
        let field = FieldDefinition::new(input).unwrap_or_else(|_| unreachable!());
        assert_eq!(field.parent_id(), None);
    }

    #[test]
    fn field_rejects_inverted_length_constraints() {
        let mut input = FieldDefinitionInput::new("name", FieldType::TextBox);
        input.validation = ValidationConstraints {
            required: true,
            min_length: Some(10),
            max_length: Some(2),
        };
        assert!(FieldDefinition::new(input).is_err());
    }

    #[test]
    fn equals_condition_requires_value() {
        assert!(VisibilityCondition::new("status", ConditionOperator::Equals, None).is_err());
        assert!(
            VisibilityCondition::new("status", ConditionOperator::IsEmpty, Some("x".to_owned()))
                .is_err()
        );
    }

    #[test]
    fn remapping_rewrites_only_known_references() {
        let mut input = FieldDefinitionInput::new("city", FieldType::DropDown);
        input.visibility_condition = Some(
            VisibilityCondition::new("country", ConditionOperator::IsNotEmpty, None)
                .unwrap_or_else(|_| unreachable!()),
        );
        input.dependent_field_ids = vec!["district".to_owned(), "outside".to_owned()];
        input.validating_field_id = Some("postal".to_owned());
        let field = FieldDefinition::new(input).unwrap_or_else(|_| unreachable!());

        let remapping = HashMap::from([
            (
                "country".to_owned(),
                NonEmptyString::new("country_copy").unwrap_or_else(|_| unreachable!()),
            ),
            (
                "district".to_owned(),
                NonEmptyString::new("district_copy").unwrap_or_else(|_| unreachable!()),
            ),
        ]);
        let remapped = field.with_remapped_references(&remapping);

        let references: Vec<&str> = remapped.cross_references().collect();
        assert_eq!(
            references,
            vec!["country_copy", "district_copy", "outside", "postal"]
        );
    }

    #[test]
    fn identifiers_cannot_contain_path_separator() {
        let input = FieldDefinitionInput::new("contact.email", FieldType::TextBox);
        assert!(FieldDefinition::new(input).is_err());
    }

    #[test]
    fn json_definition_follows_constructor_rules() {
        let field: FieldDefinition = serde_json::from_str(
            r#"{"id":"  padded ","field_type":"text_box","parent_id":"","code_set_id":" "}"#,
        )
        .unwrap_or_else(|_| unreachable!());
        assert_eq!(field.id(), "padded");
        assert_eq!(field.parent_id(), None);
        assert_eq!(field.code_set_id(), None);

        let dotted = serde_json::from_str::<FieldDefinition>(
            r#"{"id":"a.b","field_type":"text_box"}"#,
        );
        assert!(dotted.is_err());
        let valueless = serde_json::from_str::<FieldDefinition>(
            r#"{"id":"city","field_type":"text_box",
                "visibility_condition":{"trigger_field_id":"country","operator":"equals"}}"#,
        );
        assert!(valueless.is_err());
    }

    #[test]
    fn deserializes_minimal_json_definition() {
        let field: FieldDefinition = serde_json::from_str(
            r#"{"id":"email","field_type":"text_box","parent_id":"contact"}"#,
        )
        .unwrap_or_else(|_| unreachable!());
        assert_eq!(field.parent_id(), Some("contact"));
        assert_eq!(field.order(), 0);
        assert_eq!(field.display_name(), "email");
    }
}

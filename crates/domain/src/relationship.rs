use std::str::FromStr;

use formloom_core::AppError;
use serde::{Deserialize, Serialize};

use crate::field::FieldType;

/// Why a child field is nested under its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    /// Child is laid out inside a container.
    GroupContainer,
    /// Child is shown only when the parent's decision allows it.
    ConditionalShow,
    /// Child options are filtered by the parent's selection.
    Cascade,
    /// Child participates in the parent's cross-field validation.
    Validation,
}

impl RelationshipType {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GroupContainer => "group_container",
            Self::ConditionalShow => "conditional_show",
            Self::Cascade => "cascade",
            Self::Validation => "validation",
        }
    }

    /// Returns whether this relationship makes sense between the given types.
    #[must_use]
    pub fn is_compatible_with(&self, parent_type: FieldType, child_type: FieldType) -> bool {
        match self {
            Self::GroupContainer => parent_type.is_container(),
            Self::ConditionalShow => parent_type == FieldType::Conditional || parent_type.is_choice(),
            Self::Cascade => parent_type.is_choice() && child_type.is_choice(),
            Self::Validation => parent_type.can_have_children(),
        }
    }

    /// Suggests a relationship type for a parent/child pair.
    ///
    /// Pairs without a specific mapping fall back to [`RelationshipType::GroupContainer`].
    #[must_use]
    pub fn suggest(
        parent_type: FieldType,
        child_type: FieldType,
        child_has_condition: bool,
    ) -> Self {
        if parent_type == FieldType::Conditional {
            return Self::ConditionalShow;
        }

        if parent_type.is_choice() {
            if child_type.is_choice() && !child_has_condition {
                return Self::Cascade;
            }
            return Self::ConditionalShow;
        }

        Self::GroupContainer
    }
}

impl FromStr for RelationshipType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "group_container" => Ok(Self::GroupContainer),
            "conditional_show" => Ok(Self::ConditionalShow),
            "cascade" => Ok(Self::Cascade),
            "validation" => Ok(Self::Validation),
            _ => Err(AppError::Validation(format!(
                "unknown relationship type '{value}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RelationshipType;
    use crate::FieldType;

    #[test]
    fn cascade_requires_choice_on_both_sides() {
        let cascade = RelationshipType::Cascade;
        assert!(cascade.is_compatible_with(FieldType::DropDown, FieldType::DropDown));
        assert!(!cascade.is_compatible_with(FieldType::DropDown, FieldType::TextBox));
        assert!(!cascade.is_compatible_with(FieldType::Section, FieldType::DropDown));
    }

    #[test]
    fn group_container_requires_container_parent() {
        assert!(
            RelationshipType::GroupContainer.is_compatible_with(FieldType::Tab, FieldType::Number)
        );
        assert!(
            !RelationshipType::GroupContainer
                .is_compatible_with(FieldType::Conditional, FieldType::Number)
        );
    }

    #[test]
    fn suggestion_covers_known_pairs() {
        assert_eq!(
            RelationshipType::suggest(FieldType::Conditional, FieldType::TextBox, false),
            RelationshipType::ConditionalShow
        );
        assert_eq!(
            RelationshipType::suggest(FieldType::DropDown, FieldType::RadioGroup, false),
            RelationshipType::Cascade
        );
        assert_eq!(
            RelationshipType::suggest(FieldType::RadioGroup, FieldType::TextArea, false),
            RelationshipType::ConditionalShow
        );
        assert_eq!(
            RelationshipType::suggest(FieldType::DropDown, FieldType::DropDown, true),
            RelationshipType::ConditionalShow
        );
        assert_eq!(
            RelationshipType::suggest(FieldType::Section, FieldType::TextArea, true),
            RelationshipType::GroupContainer
        );
    }

    #[test]
    fn unmapped_pairs_default_to_group_container() {
        assert_eq!(
            RelationshipType::suggest(FieldType::TextBox, FieldType::Number, false),
            RelationshipType::GroupContainer
        );
    }

    #[test]
    fn suggestions_for_capable_parents_are_compatible() {
        for parent in FieldType::ALL {
            if !parent.can_have_children() {
                continue;
            }
            for child in FieldType::ALL {
                for has_condition in [false, true] {
                    let suggested = RelationshipType::suggest(parent, child, has_condition);
                    assert!(
                        suggested.is_compatible_with(parent, child),
                        "{parent:?} -> {child:?} suggested {suggested:?}"
                    );
                }
            }
        }
    }
}

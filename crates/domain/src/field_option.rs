use std::collections::BTreeMap;

use formloom_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::field::FieldDefinition;

/// Language used when a label is missing for the requested language.
pub const DEFAULT_LANGUAGE: &str = "en";

/// One selectable option of a choice field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    value: NonEmptyString,
    #[serde(default)]
    display_text: BTreeMap<String, String>,
}

impl FieldOption {
    /// Creates a validated option with labels keyed by language code.
    pub fn new(
        value: impl Into<String>,
        display_text: BTreeMap<String, String>,
    ) -> AppResult<Self> {
        let mut normalized = BTreeMap::new();
        for (language, text) in display_text {
            let language = language.trim().to_ascii_lowercase();
            if language.is_empty() {
                return Err(AppError::Validation(
                    "option display text language must not be empty".to_owned(),
                ));
            }
            normalized.insert(language, text);
        }

        Ok(Self {
            value: NonEmptyString::new(value)?,
            display_text: normalized,
        })
    }

    /// Creates an option with a single label in the default language.
    pub fn labeled(value: impl Into<String>, label: impl Into<String>) -> AppResult<Self> {
        Self::new(
            value,
            BTreeMap::from([(DEFAULT_LANGUAGE.to_owned(), label.into())]),
        )
    }

    /// Returns the stored option value.
    #[must_use]
    pub fn value(&self) -> &str {
        self.value.as_str()
    }

    /// Returns labels keyed by language code.
    #[must_use]
    pub fn display_text(&self) -> &BTreeMap<String, String> {
        &self.display_text
    }

    /// Returns the label for a language, falling back to the default language and then the value.
    #[must_use]
    pub fn label_for(&self, language: &str) -> &str {
        self.display_text
            .get(language.to_ascii_lowercase().as_str())
            .or_else(|| self.display_text.get(DEFAULT_LANGUAGE))
            .map(String::as_str)
            .unwrap_or(self.value.as_str())
    }
}

/// Selects the effective option list of a field.
///
/// Options resolved from a CodeSet take precedence over the static inline options
/// whenever they are present and non-empty.
#[must_use]
pub fn resolve_options<'a>(
    field: &'a FieldDefinition,
    resolved: Option<&'a [FieldOption]>,
) -> &'a [FieldOption] {
    match resolved {
        Some(options) if !options.is_empty() => options,
        _ => field.options(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{FieldOption, resolve_options};
    use crate::{FieldDefinition, FieldDefinitionInput, FieldType};

    fn option(value: &str) -> FieldOption {
        FieldOption::labeled(value, value.to_uppercase()).unwrap_or_else(|_| unreachable!())
    }

    fn province_field(options: Vec<FieldOption>) -> FieldDefinition {
        let mut input = FieldDefinitionInput::new("province", FieldType::DropDown);
        input.options = options;
        input.code_set_id = Some("canadian_provinces".to_owned());
        FieldDefinition::new(input).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn resolved_options_override_static_options() {
        let field = province_field(vec![option("on")]);
        let resolved = vec![option("qc"), option("bc")];

        let effective = resolve_options(&field, Some(resolved.as_slice()));

        let values: Vec<&str> = effective.iter().map(FieldOption::value).collect();
        assert_eq!(values, vec!["qc", "bc"]);
    }

    #[test]
    fn static_options_are_used_without_resolution() {
        let field = province_field(vec![option("on")]);
        assert_eq!(resolve_options(&field, None).len(), 1);
        assert_eq!(resolve_options(&field, Some(&[][..])).len(), 1);
    }

    #[test]
    fn no_options_resolve_to_empty_list() {
        let field = province_field(Vec::new());
        assert!(resolve_options(&field, None).is_empty());
    }

    #[test]
    fn label_falls_back_to_default_language_then_value() {
        let option = FieldOption::new(
            "on",
            BTreeMap::from([
                ("EN".to_owned(), "Ontario".to_owned()),
                ("fr".to_owned(), "Ontario (fr)".to_owned()),
            ]),
        )
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(option.label_for("fr"), "Ontario (fr)");
        assert_eq!(option.label_for("de"), "Ontario");

        let bare = FieldOption::new("yt", BTreeMap::new()).unwrap_or_else(|_| unreachable!());
        assert_eq!(bare.label_for("fr"), "yt");
    }
}

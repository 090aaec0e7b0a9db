//! Validation of submitted question and choice text.
//!
//! Both creation pages share [`QuestionForm`]; they differ only in how choices
//! are entered, which [`ChoiceEntry`] captures as a tagged variant.

use std::collections::{BTreeMap, HashMap};

use crate::error::{self, ValidationError};

pub const MAX_TEXT_LEN: usize = 200;
pub const MIN_CHOICES: usize = 2;
pub const EXTRA_CHOICES: usize = 3;
pub const MAX_CHOICE_FORMS: usize = 1000;
pub const CHOICES_PREFIX: &str = "choices";

pub type FormData = HashMap<String, String>;

/// Errors keyed by field name, plus errors that belong to the form as a whole.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<ValidationError>>,
    non_field: Vec<ValidationError>,
}

impl FormErrors {
    pub fn add(&mut self, field: impl Into<String>, error: ValidationError) {
        self.fields.entry(field.into()).or_default().push(error);
    }

    pub fn add_non_field(&mut self, error: ValidationError) {
        self.non_field.push(error);
    }

    pub fn field(&self, name: &str) -> &[ValidationError] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn non_field(&self) -> &[ValidationError] {
        &self.non_field
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }
}

fn clean_text(raw: &str) -> Result<String, ValidationError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(error::field_required());
    }
    let len = text.chars().count();
    if len > MAX_TEXT_LEN {
        return Err(error::field_too_long(MAX_TEXT_LEN, len));
    }
    Ok(text.to_owned())
}

fn value(data: &FormData, key: &str) -> String {
    data.get(key).cloned().unwrap_or_default()
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuestionForm {
    pub question_text: String,
}

impl QuestionForm {
    pub const FIELD: &'static str = "question_text";

    pub fn from_data(data: &FormData) -> QuestionForm {
        QuestionForm {
            question_text: value(data, Self::FIELD),
        }
    }

    fn clean(&self, errors: &mut FormErrors) -> Option<String> {
        clean_text(&self.question_text)
            .map_err(|err| errors.add(Self::FIELD, err))
            .ok()
    }
}

/// One textarea, one choice per line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BulkChoiceForm {
    pub choices_text: String,
}

impl BulkChoiceForm {
    pub const FIELD: &'static str = "choices_text";

    pub fn from_data(data: &FormData) -> BulkChoiceForm {
        BulkChoiceForm {
            choices_text: value(data, Self::FIELD),
        }
    }

    fn clean(&self, errors: &mut FormErrors) -> Option<Vec<String>> {
        if self.choices_text.trim().is_empty() {
            errors.add(Self::FIELD, error::field_required());
            return None;
        }

        let mut valid = true;
        for (i, line) in self.choices_text.lines().map(str::trim).enumerate() {
            let len = line.chars().count();
            if len > MAX_TEXT_LEN {
                errors.add(Self::FIELD, error::line_too_long(i + 1, MAX_TEXT_LEN, len));
                valid = false;
            }
        }

        valid.then(|| choice_lines(&self.choices_text))
    }
}

/// Splits textarea content into trimmed, non-empty lines.
pub fn choice_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// A repeatable set of single-choice fields, named `choices-<i>-choice_text`
/// and counted by the `choices-TOTAL_FORMS` field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChoiceFormSet {
    pub forms: Vec<String>,
    management_valid: bool,
}

impl ChoiceFormSet {
    pub fn blank() -> ChoiceFormSet {
        ChoiceFormSet {
            forms: vec![String::new(); MIN_CHOICES + EXTRA_CHOICES],
            management_valid: true,
        }
    }

    pub fn total_forms_field() -> String {
        format!("{CHOICES_PREFIX}-TOTAL_FORMS")
    }

    pub fn field_name(index: usize) -> String {
        format!("{CHOICES_PREFIX}-{index}-choice_text")
    }

    pub fn from_data(data: &FormData) -> ChoiceFormSet {
        let total = data
            .get(&Self::total_forms_field())
            .and_then(|raw| raw.trim().parse::<usize>().ok());

        match total {
            Some(total) => ChoiceFormSet {
                forms: (0..total.min(MAX_CHOICE_FORMS))
                    .map(|i| value(data, &Self::field_name(i)))
                    .collect(),
                management_valid: true,
            },
            None => ChoiceFormSet {
                management_valid: false,
                ..ChoiceFormSet::blank()
            },
        }
    }

    fn clean(&self, errors: &mut FormErrors) -> Option<Vec<String>> {
        if !self.management_valid {
            errors.add_non_field(error::management_form_invalid());
            return None;
        }

        let mut choices = vec![];
        let mut valid = true;
        for (i, raw) in self.forms.iter().enumerate() {
            // only the extra slots past the required ones may stay empty
            if raw.trim().is_empty() && i >= MIN_CHOICES {
                continue;
            }
            match clean_text(raw) {
                Ok(text) => choices.push(text),
                Err(err) => {
                    errors.add(Self::field_name(i), err);
                    valid = false;
                }
            }
        }

        if valid && choices.len() < MIN_CHOICES {
            errors.add_non_field(error::too_few_choices(MIN_CHOICES));
            valid = false;
        }

        valid.then_some(choices)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChoiceEntry {
    Bulk(BulkChoiceForm),
    Fields(ChoiceFormSet),
}

/// Raw input of either creation page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateQuestionForm {
    pub question: QuestionForm,
    pub choices: ChoiceEntry,
}

/// Input that passed validation and can be persisted as-is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateQuestion {
    pub question_text: String,
    pub choices: Vec<String>,
}

impl CreateQuestionForm {
    pub fn blank_simple() -> CreateQuestionForm {
        CreateQuestionForm {
            question: QuestionForm::default(),
            choices: ChoiceEntry::Bulk(BulkChoiceForm::default()),
        }
    }

    pub fn blank_advanced() -> CreateQuestionForm {
        CreateQuestionForm {
            question: QuestionForm::default(),
            choices: ChoiceEntry::Fields(ChoiceFormSet::blank()),
        }
    }

    pub fn simple(data: &FormData) -> CreateQuestionForm {
        CreateQuestionForm {
            question: QuestionForm::from_data(data),
            choices: ChoiceEntry::Bulk(BulkChoiceForm::from_data(data)),
        }
    }

    pub fn advanced(data: &FormData) -> CreateQuestionForm {
        CreateQuestionForm {
            question: QuestionForm::from_data(data),
            choices: ChoiceEntry::Fields(ChoiceFormSet::from_data(data)),
        }
    }

    pub fn validate(&self) -> Result<CreateQuestion, FormErrors> {
        let mut errors = FormErrors::default();
        let question_text = self.question.clean(&mut errors);
        let choices = match &self.choices {
            ChoiceEntry::Bulk(form) => form.clean(&mut errors),
            ChoiceEntry::Fields(formset) => formset.clean(&mut errors),
        };

        match (question_text, choices) {
            (Some(question_text), Some(choices)) if errors.is_empty() => {
                Ok(CreateQuestion { question_text, choices })
            }
            _ => Err(errors),
        }
    }
}

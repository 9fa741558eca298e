//! Per-kind answer validation. Each choice variant carries its own option
//! list, resolved from the question's metadata at dispatch time, so a single
//! pattern-matched predicate covers every kind.

use std::sync::LazyLock;

use regex::Regex;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::Date;

use crate::forms::{Question, QuestionKind};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").expect("email pattern")
});

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

const ALLOWED_FILE_EXTENSIONS: [&str; 4] = [".jpg", ".png", ".pdf", ".txt"];

const DROPDOWN_OPTIONS: [&str; 3] = ["uno", "dos", "tres"];

#[derive(Clone, Debug, PartialEq)]
pub enum AnswerValidator {
    Text,
    TextLong,
    TextShort,
    TextEmail,
    Radio { options: Vec<String> },
    Select { options: Vec<String> },
    Checkbox { options: Vec<String> },
    Boolean,
    File,
    Dropdown,
    Date,
}

impl AnswerValidator {
    /// Validator for a question, with choice kinds bound to that question's
    /// own option list.
    pub fn for_question(question: &Question) -> Self {
        match question.kind {
            QuestionKind::Text => Self::Text,
            QuestionKind::TextLong => Self::TextLong,
            QuestionKind::TextShort => Self::TextShort,
            QuestionKind::TextEmail => Self::TextEmail,
            QuestionKind::Radio => Self::Radio {
                options: question.options(),
            },
            QuestionKind::Select => Self::Select {
                options: question.options(),
            },
            QuestionKind::Checkbox => Self::Checkbox {
                options: question.options(),
            },
            QuestionKind::Boolean => Self::Boolean,
            QuestionKind::File => Self::File,
            QuestionKind::Dropdown => Self::Dropdown,
            QuestionKind::Date => Self::Date,
        }
    }

    pub fn is_valid(&self, value: &str) -> bool {
        match self {
            Self::Text => !value.trim().is_empty(),
            Self::TextLong => value.trim().len() > 20,
            Self::TextShort => !value.trim().is_empty() && value.len() <= 50,
            Self::TextEmail => EMAIL_PATTERN.is_match(value),
            Self::Radio { options } | Self::Select { options } => {
                options.iter().any(|option| option == value)
            }
            Self::Checkbox { options } => value
                .split(',')
                .all(|member| options.iter().any(|option| option == member.trim())),
            Self::Boolean => value == "true" || value == "false",
            Self::File => {
                let lowered = value.to_ascii_lowercase();
                ALLOWED_FILE_EXTENSIONS
                    .iter()
                    .any(|extension| lowered.ends_with(extension))
            }
            Self::Dropdown => DROPDOWN_OPTIONS.iter().any(|option| *option == value),
            Self::Date => Date::parse(value, DATE_FORMAT).is_ok(),
        }
    }

    /// Human-readable rule description, appended to invalid-answer messages.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Text => "Generic text (not empty)",
            Self::TextLong => "Long text (> 20 chars)",
            Self::TextShort => "Short text (< 50 chars)",
            Self::TextEmail => "Email (valid format)",
            Self::Radio { .. } => "Radio (value must be one of the question options)",
            Self::Select { .. } => "Select (value must be one of the question options)",
            Self::Checkbox { .. } => {
                "Checkbox (multiple values separated by comma, all must be valid)"
            }
            Self::Boolean => "Boolean (true or false)",
            Self::File => "File (valid extension)",
            Self::Dropdown => "Dropdown (fixed option set)",
            Self::Date => "Date (YYYY-MM-DD)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use serde_json::json;

    fn question(kind: QuestionKind, options: Option<serde_json::Value>) -> Question {
        let mut metadata = HashMap::new();
        if let Some(options) = options {
            metadata.insert("options".to_string(), options);
        }
        Question {
            id: "q1".to_string(),
            title: "Question".to_string(),
            description: String::new(),
            kind,
            required: true,
            section: String::new(),
            metadata,
        }
    }

    #[test]
    fn text_rejects_whitespace_only() {
        assert!(AnswerValidator::Text.is_valid("hello"));
        assert!(!AnswerValidator::Text.is_valid("   "));
    }

    #[test]
    fn text_long_needs_more_than_twenty_chars() {
        assert!(!AnswerValidator::TextLong.is_valid("short answer"));
        assert!(AnswerValidator::TextLong.is_valid("a sufficiently long answer text"));
    }

    #[test]
    fn text_short_caps_at_fifty_chars() {
        assert!(AnswerValidator::TextShort.is_valid("compact"));
        assert!(!AnswerValidator::TextShort.is_valid(&"x".repeat(51)));
        assert!(!AnswerValidator::TextShort.is_valid(""));
    }

    #[test]
    fn email_pattern_accepts_plain_addresses() {
        assert!(AnswerValidator::TextEmail.is_valid("user.name+tag@example.co"));
        assert!(!AnswerValidator::TextEmail.is_valid("not-an-email"));
        assert!(!AnswerValidator::TextEmail.is_valid("missing@tld"));
    }

    #[test]
    fn radio_checks_question_options() {
        let validator =
            AnswerValidator::for_question(&question(QuestionKind::Radio, Some(json!(["yes", "no"]))));
        assert!(validator.is_valid("yes"));
        assert!(!validator.is_valid("maybe"));
    }

    #[test]
    fn radio_without_options_rejects_everything() {
        let validator = AnswerValidator::for_question(&question(QuestionKind::Radio, None));
        assert!(!validator.is_valid("yes"));
    }

    #[test]
    fn checkbox_requires_every_member_valid() {
        let validator = AnswerValidator::for_question(&question(
            QuestionKind::Checkbox,
            Some(json!(["red", "green", "blue"])),
        ));
        assert!(validator.is_valid("red,blue"));
        assert!(validator.is_valid("red, green"));
        assert!(!validator.is_valid("red,yellow"));
        assert!(!validator.is_valid(""));
    }

    #[test]
    fn boolean_accepts_literals_only() {
        assert!(AnswerValidator::Boolean.is_valid("true"));
        assert!(AnswerValidator::Boolean.is_valid("false"));
        assert!(!AnswerValidator::Boolean.is_valid("True"));
    }

    #[test]
    fn file_checks_extension_allow_list() {
        assert!(AnswerValidator::File.is_valid("report.PDF"));
        assert!(AnswerValidator::File.is_valid("photo.jpg"));
        assert!(!AnswerValidator::File.is_valid("archive.zip"));
        assert!(!AnswerValidator::File.is_valid("noextension"));
    }

    #[test]
    fn dropdown_uses_fixed_options() {
        assert!(AnswerValidator::Dropdown.is_valid("dos"));
        assert!(!AnswerValidator::Dropdown.is_valid("cuatro"));
    }

    #[test]
    fn date_parses_iso_calendar_dates() {
        assert!(AnswerValidator::Date.is_valid("2024-02-29"));
        assert!(!AnswerValidator::Date.is_valid("2023-02-29"));
        assert!(!AnswerValidator::Date.is_valid("29/02/2024"));
    }
}

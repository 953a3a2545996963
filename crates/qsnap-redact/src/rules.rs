/// Class carried by answer slots that get masked.
pub const DEFAULT_ANSWER_SLOT_CLASS: &str = "quizPutTag";

/// Literal written into masked answer slots.
pub const DEFAULT_MASKED_LITERAL: &str = "***";

/// Attribution notice hidden from every capture.
pub const DEFAULT_ATTRIBUTION_TEXT: &str =
    "声明：本试题解析著作权属菁优网所有，未经书面同意，不得复制发布。";

/// Markers the redactor matches against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactionRules {
    pub answer_slot_class: String,
    pub masked_literal: String,
    pub attribution_text: String,
}

impl Default for RedactionRules {
    fn default() -> Self {
        Self {
            answer_slot_class: DEFAULT_ANSWER_SLOT_CLASS.to_string(),
            masked_literal: DEFAULT_MASKED_LITERAL.to_string(),
            attribution_text: DEFAULT_ATTRIBUTION_TEXT.to_string(),
        }
    }
}

//! Prompt assembly for test-case generation
//!
//! The instruction block fixes the output contract: a bare JSON array whose
//! objects carry exactly the fields in [`COLUMN_ORDER`]. The parser in
//! [`crate::generation`] depends on it.

use crate::design::SimplifiedDesign;
use crate::record::COLUMN_ORDER;

/// Knobs for the instruction block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOptions {
    /// Approximate number of test cases to ask for
    pub target_cases: usize,
    /// Natural language for the free-text fields
    pub answer_language: String,
}

impl Default for PromptOptions {
    fn default() -> Self {
        PromptOptions {
            target_cases: 10,
            answer_language: "Traditional Chinese".to_string(),
        }
    }
}

/// Builds generation prompts from a design tree and retrieved knowledge.
#[derive(Debug, Clone, Default)]
pub struct PromptAssembler {
    options: PromptOptions,
}

impl PromptAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: PromptOptions) -> Self {
        PromptAssembler { options }
    }

    pub fn options(&self) -> &PromptOptions {
        &self.options
    }

    /// Assemble the full prompt. `documents` are included verbatim, in the
    /// given order; with none, the reference section is left out entirely.
    pub fn assemble(&self, design: &SimplifiedDesign, documents: &[String]) -> String {
        let design_json = design.to_pretty_json().unwrap_or_default();

        let mut prompt = String::new();
        prompt.push_str("You are a senior software test engineer.\n");
        prompt.push_str(
            "Your task is to write professional integration test cases from the structured \
             information of a Figma design provided below.\n\n",
        );

        prompt.push_str("## Figma design structure\n\n```json\n");
        prompt.push_str(&design_json);
        prompt.push_str("\n```\n\n");

        if !documents.is_empty() {
            prompt.push_str("## Reference knowledge\n\n");
            prompt.push_str(
                "Related notes from the team knowledge base, most relevant first. \
                 Use them where they apply to this design.\n\n",
            );
            for (i, document) in documents.iter().enumerate() {
                prompt.push_str(&format!("### Document {}\n\n{}\n\n", i + 1, document));
            }
        }

        prompt.push_str(&self.instructions());
        prompt
    }

    fn instructions(&self) -> String {
        let fields = COLUMN_ORDER
            .iter()
            .map(|field| format!("\"{}\"", field))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "## Instructions\n\n\
             1. Understand the design: analyse the JSON above and identify what each page \
             (CANVAS/FRAME) is for and which elements (COMPONENT, INSTANCE, TEXT) it contains.\n\
             2. Infer the flows: from page and element names, infer what the user does. A page \
             named \"Login Page\" with \"Username\" and \"Password\" inputs and a \"Login\" button \
             is a login flow.\n\
             3. Write the test cases: produce about {target} functional test cases covering those flows.\n\
             4. Output format: reply with a JSON array and nothing else, no explanation before or \
             after it. Each element is one test case object with exactly these string fields: {fields}.\n\n\
             Example:\n\n\
             ```json\n{example}\n```\n\n\
             Write every field value in {language}.\n",
            target = self.options.target_cases,
            fields = fields,
            example = EXAMPLE_RECORD,
            language = self.options.answer_language,
        )
    }
}

const EXAMPLE_RECORD: &str = r#"[
  {
    "Test Case ID": "TC-001",
    "Test Suite": "User login",
    "Test Section": "Successful login",
    "Priority": "P1",
    "Test Category": "Functional",
    "Precondition": "The user is on the login page and has a valid account.",
    "Test Step": "1. Enter a valid user name in 'Username'.\n2. Enter the matching password in 'Password'.\n3. Click 'Login'.",
    "Expect Result": "Credentials are accepted and the user lands on the home page."
  }
]"#;

/// Assemble with default options.
pub fn assemble(design: &SimplifiedDesign, documents: &[String]) -> String {
    PromptAssembler::new().assemble(design, documents)
}

//! Generated test-case record

use serde::{Deserialize, Serialize};

/// Wire names of the record fields, in export column order.
pub const COLUMN_ORDER: [&str; 8] = [
    "Test Case ID",
    "Test Suite",
    "Test Section",
    "Priority",
    "Test Category",
    "Precondition",
    "Test Step",
    "Expect Result",
];

/// One functional test case as produced by the generation model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseRecord {
    #[serde(rename = "Test Case ID")]
    pub test_case_id: String,
    #[serde(rename = "Test Suite")]
    pub test_suite: String,
    #[serde(rename = "Test Section")]
    pub test_section: String,
    #[serde(rename = "Priority")]
    pub priority: String,
    #[serde(rename = "Test Category")]
    pub test_category: String,
    #[serde(rename = "Precondition")]
    pub precondition: String,
    #[serde(rename = "Test Step")]
    pub test_step: String,
    #[serde(rename = "Expect Result")]
    pub expect_result: String,
}

impl TestCaseRecord {
    /// Field values in [`COLUMN_ORDER`].
    pub fn values(&self) -> [&str; 8] {
        [
            self.test_case_id.as_str(),
            self.test_suite.as_str(),
            self.test_section.as_str(),
            self.priority.as_str(),
            self.test_category.as_str(),
            self.precondition.as_str(),
            self.test_step.as_str(),
            self.expect_result.as_str(),
        ]
    }
}

//! Test Case Model
//!
//! Normalizes a problem's declared input fields plus its expected output into
//! an ordered, editable list of cases.
//!
//! **Ownership rules:**
//! - Teacher-provided cases (`is_user_added == false`) are never mutated or deleted
//! - Hidden teacher cases never enter the list at all
//! - User-added cases live only until the problem changes
//!
//! Edits against a teacher case come back as `CaseEditError::NotPermitted`.
//! Callers sitting on the UI boundary drop that error silently.

use codelab_common::types::{InputField, ProblemSchema};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec;
use crate::error::CaseEditError;

const IMPLICIT_INPUT_FIELD: &str = "input";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseField {
    pub label: String,
    pub value: String,
}

impl CaseField {
    fn new(label: &str, value: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            value: value.into(),
        }
    }
}

/// One editable case. `inputs` covers every declared input field followed by
/// the trailing output field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: u32,
    pub is_user_added: bool,
    pub inputs: Vec<CaseField>,
}

impl TestCase {
    pub fn editable(&self) -> bool {
        self.is_user_added
    }

    /// Input field values, output excluded
    pub fn input_values(&self) -> Vec<&str> {
        let split = self.inputs.len().saturating_sub(1);
        self.inputs[..split].iter().map(|f| f.value.as_str()).collect()
    }

    pub fn output_value(&self) -> &str {
        self.inputs.last().map(|f| f.value.as_str()).unwrap_or("")
    }
}

/// Ordered case list plus the active-case pointer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestCaseSet {
    fields: Vec<InputField>,
    output_label: String,
    cases: Vec<TestCase>,
    active: usize,
}

impl TestCaseSet {
    /// Materialize the visible teacher cases of `schema`.
    ///
    /// With no visible cases, one empty user-editable case is synthesized so
    /// the learner always has something to fill in. A schema declaring no
    /// input fields gets one implicit `input` field holding the raw string.
    pub fn from_problem(schema: &ProblemSchema) -> Self {
        let mut set = Self {
            fields: declared_fields(schema),
            output_label: schema.output_label.clone(),
            cases: Vec::new(),
            active: 0,
        };

        let field_count = set.fields.len();
        for (idx, tc) in schema.test_cases.iter().filter(|tc| !tc.is_hidden).enumerate() {
            let values = codec::decode(&tc.input, field_count);
            let mut inputs: Vec<CaseField> = set
                .fields
                .iter()
                .zip(values)
                .map(|(field, value)| CaseField::new(&field.label, value))
                .collect();
            inputs.push(CaseField::new(&set.output_label, tc.output.trim()));

            set.cases.push(TestCase {
                id: (idx + 1) as u32,
                is_user_added: false,
                inputs,
            });
        }

        if set.cases.is_empty() {
            let blank = set.blank_case(1);
            set.cases.push(blank);
        }

        set
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    /// Number of input fields per case, output excluded
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_case(&self) -> Option<&TestCase> {
        self.cases.get(self.active)
    }

    pub fn set_active(&mut self, index: usize) -> Result<(), CaseEditError> {
        if index >= self.cases.len() {
            return Err(CaseEditError::CaseOutOfRange(index));
        }
        self.active = index;
        Ok(())
    }

    /// Append an empty user case and make it active. Returns its index.
    pub fn add_case(&mut self) -> usize {
        let next_id = self.cases.iter().map(|c| c.id).max().map_or(1, |max| max + 1);
        let case = self.blank_case(next_id);
        self.cases.push(case);
        self.active = self.cases.len() - 1;
        self.active
    }

    pub fn update_field(
        &mut self,
        case_index: usize,
        field_index: usize,
        value: impl Into<String>,
    ) -> Result<(), CaseEditError> {
        let case = self
            .cases
            .get_mut(case_index)
            .ok_or(CaseEditError::CaseOutOfRange(case_index))?;

        if !case.editable() {
            debug!(case_id = case.id, field_index, "Rejected edit on teacher-provided case");
            return Err(CaseEditError::NotPermitted);
        }

        let field = case
            .inputs
            .get_mut(field_index)
            .ok_or(CaseEditError::FieldOutOfRange(field_index))?;
        field.value = value.into();
        Ok(())
    }

    /// Remove a user case. The active pointer shifts left when the removed
    /// case sat at or before it, and is clamped into range.
    pub fn delete_case(&mut self, case_index: usize) -> Result<TestCase, CaseEditError> {
        let case = self
            .cases
            .get(case_index)
            .ok_or(CaseEditError::CaseOutOfRange(case_index))?;

        if !case.editable() {
            debug!(case_id = case.id, "Rejected delete of teacher-provided case");
            return Err(CaseEditError::NotPermitted);
        }

        let removed = self.cases.remove(case_index);

        if case_index <= self.active {
            self.active = self.active.saturating_sub(1);
        }
        self.active = self.active.min(self.cases.len().saturating_sub(1));

        Ok(removed)
    }

    fn blank_case(&self, id: u32) -> TestCase {
        let mut inputs: Vec<CaseField> = self
            .fields
            .iter()
            .map(|field| CaseField::new(&field.label, ""))
            .collect();
        inputs.push(CaseField::new(&self.output_label, ""));

        TestCase {
            id,
            is_user_added: true,
            inputs,
        }
    }
}

fn declared_fields(schema: &ProblemSchema) -> Vec<InputField> {
    if !schema.input_fields.is_empty() {
        return schema.input_fields.clone();
    }
    vec![InputField {
        name: IMPLICIT_INPUT_FIELD.to_string(),
        label: IMPLICIT_INPUT_FIELD.to_string(),
    }]
}

#![allow(clippy::result_large_err)]

//! Source templates for user-edited formula executors. The configuration UI
//! asks for a starting point per formula; the generated code targets the
//! same `FormulaExecutor` trait the builtins implement.

use crate::core::error::AppError;

pub struct ExecutorTemplateGenerator;

impl ExecutorTemplateGenerator {
    /// Template for a known formula shape, or a generic skeleton for
    /// anything else.
    pub fn generate(formula_name: &str) -> Result<String, AppError> {
        if formula_name.trim().is_empty() {
            return Err(AppError::validation("formula name cannot be empty"));
        }
        Ok(match formula_name {
            "TEXT_JOIN" => Self::text_join_template(),
            "DIVIDE" => Self::divide_template(),
            other => Self::generic_template(other, &["input_column"]),
        })
    }

    /// Generic single-output skeleton with validation stubs for the given
    /// parameter names.
    pub fn generic_template(formula_name: &str, parameters: &[&str]) -> String {
        let struct_name = struct_name_for(formula_name);
        let output_column = format!("{}_result", formula_name.to_lowercase());

        let required = parameters
            .iter()
            .map(|p| format!("        params::require_present(params, &[\"{}\"])?;", p))
            .collect::<Vec<_>>()
            .join("\n");
        let extraction = parameters
            .iter()
            .map(|p| {
                format!(
                    "        let {} = params::require_str(parameters, \"{}\")?;",
                    p, p
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"use crate::core::dataset::coerce::to_text;
use crate::core::dataset::Row;
use crate::core::error::AppError;
use crate::core::formula::executor::FormulaExecutor;
use crate::core::formula::params;
use serde_json::Value;
use std::collections::HashMap;

pub struct {struct_name};

impl FormulaExecutor for {struct_name} {{
    fn name(&self) -> &'static str {{
        "{formula_name}"
    }}

    fn validate_parameters(&self, params: &HashMap<String, Value>) -> Result<(), AppError> {{
{required}
        Ok(())
    }}

    fn execute(
        &self,
        rows: &[Row],
        parameters: &HashMap<String, Value>,
    ) -> Result<Vec<Row>, AppError> {{
{extraction}

        Ok(rows
            .iter()
            .map(|row| {{
                let mut new_row = row.clone();
                // TODO: replace with the {formula_name} transformation
                let text = row.get({first}).map(to_text).unwrap_or_default();
                new_row.insert("{output_column}".to_string(), Value::String(text));
                new_row
            }})
            .collect())
    }}

    fn output_columns(&self, _parameters: &HashMap<String, Value>) -> Vec<String> {{
        vec!["{output_column}".to_string()]
    }}
}}
"#,
            struct_name = struct_name,
            formula_name = formula_name,
            required = required,
            extraction = extraction,
            first = parameters.first().unwrap_or(&"input_column"),
            output_column = output_column,
        )
    }

    fn text_join_template() -> String {
        Self::generic_template("TEXT_JOIN", &["delimiter", "ignore_empty", "text_columns"])
    }

    fn divide_template() -> String {
        Self::generic_template("DIVIDE", &["column1", "column2"])
    }
}

fn struct_name_for(formula_name: &str) -> String {
    let pascal: String = formula_name
        .split('_')
        .map(|part| {
            let lower = part.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    format!("{}Executor", pascal)
}

#![allow(clippy::result_large_err)]

//! Presentation-side formula metadata: what the step editor renders and how
//! ordered step parameters bind onto named executor parameters. Executors
//! never read this during `execute`.

use crate::core::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Widget type for a formula parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterType {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "checkbox")]
    Checkbox,
    #[serde(rename = "single-select")]
    SingleSelect,
    #[serde(rename = "multi-select")]
    MultiSelect,
}

impl ParameterType {
    /// Select widgets pick columns; their values are column references the
    /// workflow validator must check against the available schema.
    pub fn is_column(&self) -> bool {
        matches!(self, ParameterType::SingleSelect | ParameterType::MultiSelect)
    }
}

/// Structural constraints attached to a parameter.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ParameterValidation {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterType,
    pub label: String,
    pub description: String,
    pub required: bool,
    pub default_value: Option<Value>,
    pub options: Option<Vec<String>>,
    pub placeholder: Option<String>,
    pub validation: Option<ParameterValidation>,
}

impl ParameterSpec {
    fn new(
        name: &str,
        kind: ParameterType,
        label: &str,
        description: &str,
        required: bool,
    ) -> Self {
        Self {
            name: name.to_string(),
            kind,
            label: label.to_string(),
            description: description.to_string(),
            required,
            default_value: None,
            options: None,
            placeholder: None,
            validation: None,
        }
    }

    pub fn column(name: &str, label: &str, description: &str) -> Self {
        Self::new(name, ParameterType::SingleSelect, label, description, true)
    }

    pub fn columns(name: &str, label: &str, description: &str) -> Self {
        Self::new(name, ParameterType::MultiSelect, label, description, true)
    }

    pub fn text(name: &str, label: &str, description: &str) -> Self {
        Self::new(name, ParameterType::Text, label, description, true)
    }

    pub fn checkbox(name: &str, label: &str, description: &str, default: bool) -> Self {
        let mut spec = Self::new(name, ParameterType::Checkbox, label, description, true);
        spec.default_value = Some(Value::Bool(default));
        spec
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }
}

/// User-editable formula metadata, as stored by the configuration flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulaConfig {
    pub id: Option<String>,
    pub name: String,
    pub category: String,
    pub description: String,
    pub syntax: String,
    pub tip: Option<String>,
    pub parameters: Vec<ParameterSpec>,
    pub examples: Vec<String>,
    pub is_active: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl FormulaConfig {
    pub fn new(name: &str, category: &str, description: &str, syntax: &str) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: Some(name.to_lowercase()),
            name: name.to_string(),
            category: category.to_string(),
            description: description.to_string(),
            syntax: syntax.to_string(),
            tip: None,
            parameters: Vec::new(),
            examples: Vec::new(),
            is_active: true,
            created_at: Some(now.clone()),
            updated_at: Some(now),
        }
    }

    pub fn with_tip(mut self, tip: &str) -> Self {
        self.tip = Some(tip.to_string());
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<ParameterSpec>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_example(mut self, example: &str) -> Self {
        self.examples.push(example.to_string());
        self
    }
}

/// Reject structurally broken configs before they reach the registry.
pub fn validate_config(config: &FormulaConfig) -> Result<(), AppError> {
    if config.name.trim().is_empty() {
        return Err(AppError::validation("formula name cannot be empty"));
    }
    if config.category.trim().is_empty() {
        return Err(AppError::validation(format!(
            "formula '{}' has an empty category",
            config.name
        )));
    }
    if config.description.trim().is_empty() {
        return Err(AppError::validation(format!(
            "formula '{}' has an empty description",
            config.name
        )));
    }
    let mut multi_seen = false;
    for param in &config.parameters {
        if param.name.trim().is_empty() {
            return Err(AppError::validation(format!(
                "formula '{}' has a parameter with no name",
                config.name
            )));
        }
        if param.label.trim().is_empty() {
            return Err(AppError::validation(format!(
                "parameter '{}' of formula '{}' has no label",
                param.name, config.name
            )));
        }
        // Ordered step parameters bind positionally; a multi-select absorbs
        // everything after it, so it must come last.
        if multi_seen {
            return Err(AppError::validation(format!(
                "formula '{}': only the final parameter may be multi-select",
                config.name
            )));
        }
        if param.kind == ParameterType::MultiSelect {
            multi_seen = true;
        }
        if let Some(validation) = &param.validation {
            if let Some(pattern) = &validation.pattern {
                regex::Regex::new(pattern).map_err(|e| {
                    AppError::validation(format!(
                        "parameter '{}' of formula '{}' has an invalid pattern: {}",
                        param.name, config.name, e
                    ))
                })?;
            }
        }
    }
    Ok(())
}

/// The builtin catalog: one config per shipped executor.
pub fn default_configs() -> Vec<FormulaConfig> {
    vec![
        // Text & String
        FormulaConfig::new(
            "UPPER",
            "Text & String",
            "Converts text to uppercase.",
            "UPPER [text_columns...]",
        )
        .with_tip("Select one or more text columns to convert to uppercase")
        .with_parameters(vec![ParameterSpec::columns(
            "text_columns",
            "Text Columns",
            "Columns containing text to convert",
        )])
        .with_example("UPPER [Name]"),
        FormulaConfig::new(
            "LOWER",
            "Text & String",
            "Converts text to lowercase.",
            "LOWER [text_columns...]",
        )
        .with_tip("Select one or more text columns to convert to lowercase")
        .with_parameters(vec![ParameterSpec::columns(
            "text_columns",
            "Text Columns",
            "Columns containing text to convert",
        )])
        .with_example("LOWER [Name]"),
        FormulaConfig::new(
            "TRIM",
            "Text & String",
            "Removes leading and trailing whitespace.",
            "TRIM [text_columns...]",
        )
        .with_parameters(vec![ParameterSpec::columns(
            "text_columns",
            "Text Columns",
            "Columns containing text to trim",
        )])
        .with_example("TRIM [Name]"),
        FormulaConfig::new(
            "PROPER_CASE",
            "Text & String",
            "Capitalizes the first letter of each word.",
            "PROPER_CASE [text_columns...]",
        )
        .with_parameters(vec![ParameterSpec::columns(
            "text_columns",
            "Text Columns",
            "Columns containing text to capitalize",
        )])
        .with_example("PROPER_CASE [Name]"),
        FormulaConfig::new(
            "TEXT_LENGTH",
            "Text & String",
            "Counts the characters in a text value.",
            "TEXT_LENGTH [text_column]",
        )
        .with_parameters(vec![ParameterSpec::column(
            "text_column",
            "Text Column",
            "Column containing text to measure",
        )])
        .with_example("TEXT_LENGTH [Name]"),
        FormulaConfig::new(
            "TEXT_JOIN",
            "Text & String",
            "Joins text values together, with optional delimiter and empty handling.",
            "TEXT_JOIN [delimiter -> ignore_empty -> text1 -> text2 -> ...]",
        )
        .with_tip("Add delimiter (e.g. \", \"), then ignore_empty (TRUE/FALSE), then the text columns to join")
        .with_parameters(vec![
            ParameterSpec::text("delimiter", "Delimiter", "Character(s) placed between joined texts")
                .with_default(Value::String(", ".to_string()))
                .with_placeholder(", "),
            ParameterSpec::checkbox(
                "ignore_empty",
                "Ignore Empty",
                "Skip blank values when joining",
                false,
            ),
            ParameterSpec::columns("text_columns", "Text Columns", "Columns to join together"),
        ])
        .with_example("TEXT_JOIN [\", \" -> TRUE -> City -> State -> Country]"),
        // Mathematical
        FormulaConfig::new(
            "ADD",
            "Mathematical",
            "Adds two numeric values together.",
            "ADD [number1 -> number2]",
        )
        .with_tip("Select two numeric columns to add together")
        .with_parameters(vec![
            ParameterSpec::column("number1", "First Number", "First numeric column to add"),
            ParameterSpec::column("number2", "Second Number", "Second numeric column to add"),
        ])
        .with_example("ADD [Price -> Tax]"),
        FormulaConfig::new(
            "SUBTRACT",
            "Mathematical",
            "Subtracts the second numeric value from the first.",
            "SUBTRACT [column1 -> column2]",
        )
        .with_parameters(vec![
            ParameterSpec::column("column1", "First Number", "Column to subtract from"),
            ParameterSpec::column("column2", "Second Number", "Column to subtract"),
        ])
        .with_example("SUBTRACT [Revenue -> Cost]"),
        FormulaConfig::new(
            "MULTIPLY",
            "Mathematical",
            "Multiplies two numeric values.",
            "MULTIPLY [column1 -> column2]",
        )
        .with_parameters(vec![
            ParameterSpec::column("column1", "First Number", "First numeric column"),
            ParameterSpec::column("column2", "Second Number", "Second numeric column"),
        ])
        .with_example("MULTIPLY [Quantity -> Price]"),
        FormulaConfig::new(
            "DIVIDE",
            "Mathematical",
            "Divides the first numeric value by the second.",
            "DIVIDE [column1 -> column2 -> default?]",
        )
        .with_tip("Optionally supply a default used when the divisor is zero")
        .with_parameters(vec![
            ParameterSpec::column("column1", "Dividend", "Column to divide"),
            ParameterSpec::column("column2", "Divisor", "Column to divide by"),
            ParameterSpec::text("default", "Zero-Divisor Default", "Value returned when the divisor is zero").optional(),
        ])
        .with_example("DIVIDE [Revenue -> Units]"),
        // Statistical
        FormulaConfig::new(
            "SUM",
            "Statistical",
            "Sums numeric values across the selected columns and all rows in scope.",
            "SUM [columns...]",
        )
        .with_parameters(vec![ParameterSpec::columns(
            "columns",
            "Numeric Columns",
            "Columns whose values are summed",
        )])
        .with_example("SUM [Sales]"),
        FormulaConfig::new(
            "COUNT",
            "Statistical",
            "Counts non-empty values in a column.",
            "COUNT [column]",
        )
        .with_parameters(vec![ParameterSpec::column(
            "column",
            "Column",
            "Column whose non-empty values are counted",
        )])
        .with_example("COUNT [OrderId]"),
        FormulaConfig::new(
            "UNIQUE_COUNT",
            "Statistical",
            "Counts distinct values in a column.",
            "UNIQUE_COUNT [column]",
        )
        .with_parameters(vec![ParameterSpec::column(
            "column",
            "Column",
            "Column whose distinct values are counted",
        )])
        .with_example("UNIQUE_COUNT [Customer]"),
        FormulaConfig::new(
            "AVERAGE",
            "Statistical",
            "Averages the numeric values of a column.",
            "AVERAGE [column]",
        )
        .with_parameters(vec![ParameterSpec::column(
            "column",
            "Numeric Column",
            "Column whose values are averaged",
        )])
        .with_example("AVERAGE [Sales]"),
        FormulaConfig::new(
            "CORRELATION",
            "Statistical",
            "Pearson correlation between two numeric columns.",
            "CORRELATION [column1 -> column2]",
        )
        .with_parameters(vec![
            ParameterSpec::column("column1", "First Column", "First numeric column"),
            ParameterSpec::column("column2", "Second Column", "Second numeric column"),
        ])
        .with_example("CORRELATION [Price -> Demand]"),
        // Conditional
        FormulaConfig::new(
            "IF",
            "Conditional",
            "Conditional logic with true/false values.",
            "IF [condition_column -> condition_value -> true_value -> false_value]",
        )
        .with_tip("Click condition column, add comparison value, then true/false values")
        .with_parameters(vec![
            ParameterSpec::column("condition_column", "Condition Column", "Column to check condition"),
            ParameterSpec::text("condition_value", "Compare Value", "Value to compare against")
                .with_placeholder("Value to compare"),
            ParameterSpec::text("true_value", "True Value", "Value if condition is true")
                .with_placeholder("Value if true"),
            ParameterSpec::text("false_value", "False Value", "Value if condition is false")
                .with_placeholder("Value if false"),
        ])
        .with_example("IF [Status -> \"Active\" -> \"Valid\" -> \"Invalid\"]"),
        FormulaConfig::new(
            "SUMIF",
            "Conditional",
            "Per-row sum contribution when a condition matches.",
            "SUMIF [sum_column -> condition_column -> condition_value]",
        )
        .with_parameters(vec![
            ParameterSpec::column("sum_column", "Sum Column", "Column contributing the value"),
            ParameterSpec::column("condition_column", "Condition Column", "Column to check"),
            ParameterSpec::text("condition_value", "Condition Value", "Value the condition column must equal"),
        ])
        .with_example("SUMIF [Sales -> Region -> \"West\"]"),
        FormulaConfig::new(
            "COUNTIF",
            "Conditional",
            "Per-row flag counting rows where a condition matches.",
            "COUNTIF [condition_column -> condition_value]",
        )
        .with_parameters(vec![
            ParameterSpec::column("condition_column", "Condition Column", "Column to check"),
            ParameterSpec::text("condition_value", "Condition Value", "Value the condition column must equal"),
        ])
        .with_example("COUNTIF [Status -> \"Active\"]"),
        // Transformation
        FormulaConfig::new(
            "PIVOT",
            "Transformation",
            "Groups rows by an index column and aggregates a value column.",
            "PIVOT [index_column -> value_column]",
        )
        .with_parameters(vec![
            ParameterSpec::column("index_column", "Index Column", "Column to group by"),
            ParameterSpec::column("value_column", "Value Column", "Numeric column to aggregate"),
        ])
        .with_example("PIVOT [Region -> Sales]"),
        FormulaConfig::new(
            "DEPIVOT",
            "Transformation",
            "Unpivots non-id columns into variable/value rows.",
            "DEPIVOT [id_columns...]",
        )
        .with_parameters(vec![ParameterSpec::columns(
            "id_columns",
            "Id Columns",
            "Columns kept as row identity",
        )])
        .with_example("DEPIVOT [OrderId]"),
        FormulaConfig::new(
            "REMOVE_DUPLICATES",
            "Transformation",
            "Keeps the first row for each distinct key.",
            "REMOVE_DUPLICATES [columns...]",
        )
        .with_parameters(vec![ParameterSpec::columns(
            "columns",
            "Key Columns",
            "Columns forming the deduplication key",
        )])
        .with_example("REMOVE_DUPLICATES [Email]"),
        FormulaConfig::new(
            "FILLNA",
            "Transformation",
            "Replaces null or empty cells in a column with a fixed value.",
            "FILLNA [column -> value]",
        )
        .with_parameters(vec![
            ParameterSpec::column("column", "Column", "Column to fill"),
            ParameterSpec::text("value", "Fill Value", "Replacement for null/empty cells"),
        ])
        .with_example("FILLNA [City -> \"unknown\"]"),
    ]
}

use crate::errors::{TouchPilotError, TouchPilotResult};

/// Behavioural directive placed before the schema in the system message.
pub const DEFAULT_DIRECTIVE: &str = "\
# Role
You are an agent familiar with touchscreen GUI operation on Android. Based on the user's question, \
analyse the GUI elements and layout of the current screen and produce the corresponding operation.

# Task
For the user's question and the current screenshot, output the next operation.

# Rule
- Output compact JSON
- The output must follow the Schema constraints
- Use the previous turns of the conversation to understand the context of the current task";

/// Action schema sent to the decision service, with `thought` required.
/// Embedded at compile time from prompts/action_schema.json.
pub fn action_schema() -> TouchPilotResult<serde_json::Value> {
    let json = include_str!("../../prompts/action_schema.json");
    let mut schema: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| TouchPilotError::Config(format!("Failed to parse action schema: {e}")))?;
    schema["required"] = serde_json::json!(["thought"]);
    Ok(schema)
}

/// Full system message: directive followed by the compact schema.
pub fn system_prompt(directive: Option<&str>) -> TouchPilotResult<String> {
    let schema = serde_json::to_string(&action_schema()?)?;
    let directive = directive.unwrap_or(DEFAULT_DIRECTIVE).trim_end();
    Ok(format!("{directive}\n\n# Schema\n{schema}"))
}

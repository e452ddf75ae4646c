use color_eyre::Result;
use dialoguer::{Confirm, Input, Password};

/// Prompt for a string value with optional default
pub fn prompt_string(prompt: &str, default: Option<&str>) -> Result<String> {
    let mut input_builder = Input::<String>::new().with_prompt(prompt).allow_empty(true);

    if let Some(default_value) = default {
        input_builder = input_builder.default(default_value.to_string());
    }

    input_builder
        .interact_text()
        .map(|s| s.trim().to_string())
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read input: {}", e))
}

/// Masked input; asks twice when `confirm` is set.
pub fn prompt_secret(prompt: &str, confirm: bool) -> Result<String> {
    let mut password_prompt = Password::new().with_prompt(prompt);
    if confirm {
        password_prompt =
            password_prompt.with_confirmation(format!("Confirm {}", prompt), "Values do not match");
    }
    password_prompt
        .interact()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read secret: {}", e))
}

pub fn prompt_yes_no(prompt: &str, default: bool) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read confirmation: {}", e))
}

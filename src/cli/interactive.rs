//! Interactive menu: choose backends, enter a prompt, run a batch, repeat until quit.

use crate::backend::Backend;
use crate::error::ApiError;

/// What the user picked from the backend menu.
#[derive(Debug, Clone)]
pub enum MenuChoice {
    Run(Vec<Backend>),
    Quit,
}

/// Menu entries: one per backend, then "All backends", then "Quit".
pub fn menu_items(backends: &[Backend]) -> Vec<String> {
    let mut items: Vec<String> = backends
        .iter()
        .map(|b| format!("{}. {}", b.identifier, b.display_name))
        .collect();
    items.push("A. All backends".to_string());
    items.push("Q. Quit".to_string());
    items
}

/// Map a menu index back to a selection.
pub fn resolve_choice(index: usize, backends: &[Backend]) -> Result<MenuChoice, ApiError> {
    match index {
        i if i < backends.len() => Ok(MenuChoice::Run(vec![backends[i].clone()])),
        i if i == backends.len() => Ok(MenuChoice::Run(backends.to_vec())),
        i if i == backends.len() + 1 => Ok(MenuChoice::Quit),
        i => Err(ApiError::InvalidRequest(format!(
            "Menu selection {} out of range",
            i
        ))),
    }
}

/// Split a prompt line into prompts. `;` separates several prompts for one batch.
pub fn split_prompts(line: &str) -> Vec<String> {
    line.split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn ask_choice(backends: &[Backend]) -> Result<MenuChoice, ApiError> {
    use dialoguer::Select;

    let selection = Select::new()
        .with_prompt("Select backend(s)")
        .items(&menu_items(backends))
        .default(backends.len())
        .interact()
        .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))?;
    resolve_choice(selection, backends)
}

pub fn ask_prompts() -> Result<Vec<String>, ApiError> {
    use dialoguer::Input;

    let line: String = Input::new()
        .with_prompt("Enter your prompt (use ';' for several)")
        .interact_text()
        .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))?;
    Ok(split_prompts(&line))
}

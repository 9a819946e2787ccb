pub mod fees;
pub mod fixed_payment;
pub mod payment;
pub mod quote;
pub mod simulate;

use serde::de::DeserializeOwned;

use crate::input;

/// Load a typed input from `--input`, falling back to JSON on stdin.
pub(crate) fn read_input<T: DeserializeOwned>(
    path: Option<&str>,
    what: &str,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(input::file::read_input(path)?));
    }
    if let Some(data) = input::stdin::read_stdin()? {
        return Ok(Some(serde_json::from_value(data).map_err(|e| {
            format!("Invalid {what} input on stdin: {e}")
        })?));
    }
    Ok(None)
}

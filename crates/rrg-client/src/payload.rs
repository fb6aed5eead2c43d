//! Request payload input.

use crate::error::AppResult;
use std::io::Read;

/// Read the RRG request document from a file, or from stdin for `-`.
///
/// The content is returned verbatim; it is never parsed or validated.
pub fn read_payload(source: &str) -> AppResult<String> {
    if source == "-" {
        let mut payload = String::new();
        std::io::stdin().read_to_string(&mut payload)?;
        return Ok(payload);
    }

    Ok(std::fs::read_to_string(source)?)
}

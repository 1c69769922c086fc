use std::{fs, path::Path};

use log::info;

use crate::{Error, matching::CorrectionRule};

/// Parse a JSON array of correction rules
///
/// # Errors
///
/// Returns an error on malformed JSON.
pub fn corrections_from_json_str(json: &str) -> Result<Vec<CorrectionRule>, Error> {
    Ok(serde_json::from_str(json)?)
}

/// Load correction rules from a JSON file
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_corrections(path: &Path) -> Result<Vec<CorrectionRule>, Error> {
    let content = fs::read_to_string(path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("Failed to open corrections '{}': {}", path.display(), e),
        )
    })?;
    let rules = corrections_from_json_str(&content)?;
    info!("Loaded {} correction rules from {}", rules.len(), path.display());
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EdgeKey;

    #[test]
    fn parses_rules_with_optional_fields() {
        let rules = corrections_from_json_str(
            r#"[
                { "from": 2094195153, "to": 2094195155,
                  "replacement": { "from": 418336308, "to": 2094195150 } },
                { "from": 2094195157, "to": 2094195159, "osmid": 199419587,
                  "replacement": { "from": 418336300, "to": 418336304, "key": 0 },
                  "collateral": [{ "from": 418336304, "to": 418336308 }] }
            ]"#,
        )
        .unwrap();

        assert_eq!(rules.len(), 2);
        assert!(rules[0].collateral.is_empty());
        assert_eq!(rules[0].osmid, None);
        assert_eq!(rules[1].replacement, EdgeKey::new(418_336_300, 418_336_304, 0));
        assert_eq!(rules[1].collateral, vec![EdgeKey::new(418_336_304, 418_336_308, 0)]);
    }
}

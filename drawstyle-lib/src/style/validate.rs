use lightningcss::rules::CssRule;
use lightningcss::stylesheet::{ParserOptions, StyleSheet};

use crate::error::StyleError;

/// Checks that `selector` parses as the selector list of exactly one style rule.
///
/// Used before a synthesized rule is inserted so a bad selector never reaches
/// the stylesheet on disk.
pub fn validate_selector(selector: &str) -> Result<(), StyleError> {
    let invalid = |message: String| StyleError::InvalidSelector {
        selector: selector.to_owned(),
        message,
    };
    if selector.trim().is_empty() {
        return Err(invalid("empty selector".to_owned()));
    }
    let source = format!("{selector} {{}}");
    let sheet = StyleSheet::parse(&source, ParserOptions::default())
        .map_err(|err| invalid(err.to_string()))?;
    match sheet.rules.0.as_slice() {
        [CssRule::Style(_)] => Ok(()),
        _ => Err(invalid("not a single style rule".to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_engine_selectors() {
        for selector in [
            ".material-brick, .layer-material-brick",
            "text.Room, tspan.Room",
            ".PredefinedType-LINEWORK.dashed.thick",
            "#level-tag > path:nth-of-type(2)",
            "g[ifc\\:guid=\"2O2Fr$t4X7Zf8NOew3FLOH\"]",
        ] {
            assert!(validate_selector(selector).is_ok(), "{selector}");
        }
    }

    #[test]
    fn test_rejects_broken_selectors() {
        for selector in ["", "   ", ".a {} .b", "text.[", ".a,,"] {
            assert!(
                matches!(validate_selector(selector), Err(StyleError::InvalidSelector { .. })),
                "{selector:?}"
            );
        }
    }
}

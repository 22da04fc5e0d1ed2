use serde::Serialize;

use crate::field::Validation;

/// Length bounds read from a validation rule string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LengthLimits {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact: Option<u32>,
}

/// Reads the `rule:` entry out of a pipe-separated rule string.
///
/// `length:3,10` and `between:3,10` give `min`/`max`, or `exact` when both
/// ends match. `min:2` and `max:8` fill the bound they name. For a toggled
/// validation the `then` rules are used.
pub fn length_limits(validation: &Validation, rule: &str) -> LengthLimits {
    let Some(rules) = validation.rules() else {
        return LengthLimits::default();
    };
    let prefix = format!("{rule}:");
    let Some(argument) = rules
        .split('|')
        .find_map(|entry| entry.trim().strip_prefix(prefix.as_str()))
    else {
        return LengthLimits::default();
    };

    match rule {
        "length" | "between" => {
            let mut bounds = argument.split(',').map(|bound| bound.trim().parse::<u32>().ok());
            let min = bounds.next().flatten();
            let max = bounds.next().flatten();
            if min.is_some() && min == max {
                LengthLimits {
                    exact: min,
                    ..LengthLimits::default()
                }
            } else {
                LengthLimits {
                    min,
                    max,
                    exact: None,
                }
            }
        }
        "min" => LengthLimits {
            min: argument.trim().parse().ok(),
            ..LengthLimits::default()
        },
        "max" => LengthLimits {
            max: argument.trim().parse().ok(),
            ..LengthLimits::default()
        },
        _ => LengthLimits::default(),
    }
}

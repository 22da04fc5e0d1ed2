use crate::field::LogicField;
use crate::operator::OperatorCode;

/// Renders condition rows as a sentence using the default English labels.
pub fn describe(conditions: &[LogicField]) -> String {
    describe_with(conditions, |operator| operator.label().to_string())
}

/// Renders condition rows as a sentence, asking `label` for operator wording.
///
/// Rows without a name or operator are skipped.
pub fn describe_with<F>(conditions: &[LogicField], label: F) -> String
where
    F: Fn(OperatorCode) -> String,
{
    conditions
        .iter()
        .filter_map(|condition| {
            let parts = condition
                .alternatives()
                .filter_map(|alt| describe_row(alt, &label))
                .collect::<Vec<_>>();
            (!parts.is_empty()).then(|| parts.join(" or "))
        })
        .collect::<Vec<_>>()
        .join(" and ")
}

fn describe_row<F>(row: &LogicField, label: &F) -> Option<String>
where
    F: Fn(OperatorCode) -> String,
{
    let operator = row.operator?;
    if row.name.is_empty() {
        return None;
    }
    let label = label(operator);
    let text = if !row.values.is_empty() {
        format!("{} {label} [{}]", row.name, row.values.join(", "))
    } else if !row.value.is_empty() {
        format!("{} {label} {}", row.name, row.value)
    } else {
        format!("{} {label}", row.name)
    };
    Some(text)
}

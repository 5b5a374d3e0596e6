use std::collections::HashMap;

/// Label table built up during one pass: name (global, or mangled local) to
/// value. Values are kept wide; width checks happen where they are used.
pub type LabelMap = HashMap<String, i64>;

/// Local labels are written `N$` (gas dollar-local style).
pub fn is_local_label(label: &str) -> bool {
    match label.strip_suffix('$') {
        Some(number) => number.parse::<i64>().is_ok(),
        None => false,
    }
}

/// Effective name of a local label: `scope@N`, where `scope` is the most
/// recently defined global label.
pub fn mangle_local_label(label: &str, scope: &str) -> String {
    format!("{}@{}", scope, &label[..label.len() - 1])
}

// Copyright (C) 2026 marbot contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Rendering of input variables as Terraform command line arguments.

use std::collections::BTreeMap;

use serde_json::Value;

/// Renders `vars` as `-var name=value` argument pairs, ordered by name.
///
/// Top level strings are passed verbatim. Lists and maps use HCL literal
/// syntax, with nested strings quoted.
#[must_use]
pub fn format_var_args(vars: &BTreeMap<String, Value>) -> Vec<String> {
    vars.iter()
        .flat_map(|(name, value)| {
            [
                String::from("-var"),
                format!("{name}={}", to_hcl(value, false)),
            ]
        })
        .collect()
}

fn to_hcl(value: &Value, nested: bool) -> String {
    match value {
        Value::Null => String::from("null"),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if nested => quote(s),
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(|item| to_hcl(item, true)).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(key, item)| format!("{} = {}", quote(key), to_hcl(item, true)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

// JSON string escaping is valid HCL string escaping.
fn quote(s: &str) -> String {
    Value::String(s.to_owned()).to_string()
}

use serde_json::Value;

const BLOCK_NODES: &[&str] = &[
    "paragraph",
    "heading",
    "listItem",
    "codeBlock",
    "blockquote",
    "tableRow",
    "rule",
];

/// Flatten a rich-text field to plain text.
///
/// API v2 delivers wiki markup strings, v3 delivers Atlassian Document Format.
/// Block nodes become separate lines, inline nodes are concatenated.
pub fn rich_text(value: &Value) -> Option<String> {
    let mut out = String::new();
    collect(value, &mut out);
    let text = out.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn collect(value: &Value, out: &mut String) {
    match value {
        Value::String(s) => out.push_str(s),
        Value::Array(nodes) => nodes.iter().for_each(|n| collect(n, out)),
        Value::Object(obj) => {
            let node_type = obj.get("type").and_then(Value::as_str).unwrap_or_default();
            match node_type {
                "text" => {
                    if let Some(text) = obj.get("text").and_then(Value::as_str) {
                        out.push_str(text);
                    }
                }
                "hardBreak" => out.push('\n'),
                "mention" | "emoji" => {
                    if let Some(text) = obj
                        .get("attrs")
                        .and_then(|a| a.get("text"))
                        .and_then(Value::as_str)
                    {
                        out.push_str(text);
                    }
                }
                _ => {
                    if let Some(content) = obj.get("content") {
                        collect(content, out);
                    }
                    if BLOCK_NODES.contains(&node_type) && !out.ends_with('\n') {
                        out.push('\n');
                    }
                }
            }
        }
        _ => {}
    }
}

use std::collections::BTreeMap;

/// Replaces every `{{ name }}` with its entry in `vars`. Placeholders with
/// no entry and unterminated braces are copied through unchanged.
pub(crate) fn render_template(input: &str, vars: &BTreeMap<String, String>) -> String {
    let mut rest = input;
    let mut output = String::with_capacity(input.len());

    loop {
        let Some(start) = rest.find("{{") else {
            output.push_str(rest);
            break;
        };
        let (before, after_start) = rest.split_at(start);
        output.push_str(before);
        let Some(after) = after_start.strip_prefix("{{") else {
            output.push_str(after_start);
            break;
        };
        let Some(end) = after.find("}}") else {
            output.push_str(after_start);
            break;
        };
        let (key_part, after_end) = after.split_at(end);
        match vars.get(key_part.trim()) {
            Some(value) => output.push_str(value),
            None => {
                output.push_str("{{");
                output.push_str(key_part);
                output.push_str("}}");
            }
        }
        rest = match after_end.strip_prefix("}}") {
            Some(remaining) => remaining,
            None => {
                output.push_str(after_end);
                break;
            }
        };
    }

    output
}

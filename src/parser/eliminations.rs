use crate::constants::ELIMINATED_LABEL;

/// Parse the free-text elimination cell into pairing names.
///
/// Commas only separate entries at parenthesis depth zero, so
/// "Rex (E, 10 faults)" stays one entry; the trailing "(...)" annotation is
/// then dropped. Order is kept and duplicates are not removed.
pub fn parse_eliminations(text: &str) -> Vec<String> {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix(ELIMINATED_LABEL) {
        body = rest.trim_start();
    }
    if let Some(rest) = body.strip_prefix(':') {
        body = rest.trim_start();
    }

    let mut entries = Vec::new();
    let mut current = String::new();
    let mut depth: usize = 0;

    for c in body.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                push_entry(&mut entries, &current);
                current.clear();
            }
            _ => current.push(c),
        }
    }
    push_entry(&mut entries, &current);

    entries
}

fn push_entry(entries: &mut Vec<String>, raw: &str) {
    let identity = match raw.find('(') {
        Some(idx) => &raw[..idx],
        None => raw,
    }
    .trim();
    if !identity.is_empty() {
        entries.push(identity.to_string());
    }
}

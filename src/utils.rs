use std::collections::HashMap;

/// Per-key counter, used to generate fresh names like `assign0`, `assign1`, ...
#[derive(Debug, Default, Clone)]
pub struct KeyCounter {
    counts: HashMap<String, usize>,
}

impl KeyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current count for `key`, then increments it.
    pub fn get_incr(&mut self, key: &str) -> usize {
        let count = self.counts.entry(key.to_string()).or_insert(0);
        let res = *count;
        *count += 1;
        res
    }

    /// Fresh name `{key}{count}`.
    pub fn fresh(&mut self, key: &str) -> String {
        format!("{}{}", key, self.get_incr(key))
    }
}

/// Escapes `&`, `<`, `>` and `"` for use inside Graphviz HTML labels.
pub fn html_escape(s: &str) -> String {
    let mut res = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => res.push_str("&amp;"),
            '<' => res.push_str("&lt;"),
            '>' => res.push_str("&gt;"),
            '"' => res.push_str("&quot;"),
            _ => res.push(c),
        }
    }
    res
}

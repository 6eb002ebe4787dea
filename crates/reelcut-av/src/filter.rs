//! Filter-graph construction.
//!
//! FFmpeg `filter_complex` graphs are built as a small AST -- chains of named
//! filters between labeled pads -- and serialized exactly once when the
//! argument list is assembled. Builders can be tested against the structure
//! instead of byte-comparing assembled strings, and user-supplied values
//! (overlay text) are escaped in one place.

/// A single filter stage, e.g. `trim=start=2:end=5`.
#[derive(Debug, Clone)]
pub struct Filter {
    name: String,
    args: Vec<(Option<String>, String)>,
}

impl Filter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl ToString) -> Self {
        self.args.push((None, value.to_string()));
        self
    }

    /// Append a `key=value` argument.
    pub fn named(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.args.push((Some(key.into()), value.to_string()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a named argument's (unescaped) value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(k, _)| k.as_deref() == Some(key))
            .map(|(_, v)| v.as_str())
    }

    fn render(&self) -> String {
        if self.args.is_empty() {
            return self.name.clone();
        }
        let rendered: Vec<String> = self
            .args
            .iter()
            .map(|(key, value)| match key {
                Some(k) => format!("{k}={}", escape_value(value)),
                None => escape_value(value),
            })
            .collect();
        format!("{}={}", self.name, rendered.join(":"))
    }
}

/// A linear chain: input pads, filters applied in order, output pads.
#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    inputs: Vec<String>,
    filters: Vec<Filter>,
    outputs: Vec<String>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an input pad label (without brackets), e.g. `"0:v"` or `"va"`.
    pub fn input(mut self, pad: impl Into<String>) -> Self {
        self.inputs.push(pad.into());
        self
    }

    pub fn filter(mut self, f: Filter) -> Self {
        self.filters.push(f);
        self
    }

    /// Add an output pad label (without brackets).
    pub fn output(mut self, pad: impl Into<String>) -> Self {
        self.outputs.push(pad.into());
        self
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for pad in &self.inputs {
            out.push('[');
            out.push_str(pad);
            out.push(']');
        }
        let stages: Vec<String> = self.filters.iter().map(Filter::render).collect();
        out.push_str(&stages.join(","));
        for pad in &self.outputs {
            out.push('[');
            out.push_str(pad);
            out.push(']');
        }
        out
    }
}

/// A complete `filter_complex` graph: chains joined with `;`.
#[derive(Debug, Clone, Default)]
pub struct FilterGraph {
    chains: Vec<FilterChain>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, chain: FilterChain) -> &mut Self {
        self.chains.push(chain);
        self
    }

    pub fn chains(&self) -> &[FilterChain] {
        &self.chains
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Serialize the graph into the string passed to `-filter_complex`.
    pub fn render(&self) -> String {
        let rendered: Vec<String> = self.chains.iter().map(FilterChain::render).collect();
        rendered.join(";")
    }

    /// Find a filter by name anywhere in the graph (test/debug helper).
    pub fn find(&self, name: &str) -> Option<&Filter> {
        self.chains
            .iter()
            .flat_map(|c| c.filters.iter())
            .find(|f| f.name == name)
    }
}

/// Escape a value for use inside a filter argument.
///
/// The graph parser treats `:` as the argument separator, `,` as the filter
/// separator, `;` as the chain separator, and `[`/`]` as pad labels; `\` and
/// `'` are its quoting characters. All of them are backslash-escaped.
pub fn escape_value(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '\'' | ':' | ';' | ',' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

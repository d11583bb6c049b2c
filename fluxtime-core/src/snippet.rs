//! Snippet Registry
//!
//! Snippets are plain `fn()` items registered with `#[fluxtime::snippet]`.
//! Statement and setup text on the command line is a newline separated list
//! of snippet names, resolved here against the registry.

use crate::timer::TimingError;

/// Name of the built-in no-op snippet
pub const PASS: &str = "pass";

/// Snippet definition registered via `#[fluxtime::snippet]`
#[derive(Debug, Clone)]
pub struct SnippetDef {
    /// Name used on the command line
    pub name: &'static str,
    /// The code to run
    pub func: fn(),
    /// Source file path
    pub file: &'static str,
    /// Source line number
    pub line: u32,
    /// Module path
    pub module_path: &'static str,
}

/// Look up a registered snippet by name
pub fn find_snippet(name: &str) -> Option<&'static SnippetDef> {
    inventory::iter::<SnippetDef>
        .into_iter()
        .find(|def| def.name == name)
}

/// All registered snippets, sorted by name
pub fn registered_snippets() -> Vec<&'static SnippetDef> {
    let mut defs: Vec<_> = inventory::iter::<SnippetDef>.into_iter().collect();
    defs.sort_by_key(|def| def.name);
    defs
}

fn noop() {}

/// A resolved snippet
#[derive(Debug, Clone, Copy, Eq)]
pub struct Snippet {
    /// Snippet name
    pub name: &'static str,
    /// The code to run
    pub func: fn(),
}

impl Snippet {
    /// The built-in no-op
    pub const fn pass() -> Self {
        Self {
            name: PASS,
            func: noop,
        }
    }
}

// Names are unique in the registry, so they identify the code
impl PartialEq for Snippet {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl From<&SnippetDef> for Snippet {
    fn from(def: &SnippetDef) -> Self {
        Self {
            name: def.name,
            func: def.func,
        }
    }
}

/// An ordered sequence of snippets executed as one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    snippets: Vec<Snippet>,
}

impl Statement {
    /// Build a statement from already resolved snippets.
    /// An empty list is the same as [`Statement::pass`].
    pub fn new(snippets: Vec<Snippet>) -> Self {
        if snippets.is_empty() {
            return Self::pass();
        }
        Self { snippets }
    }

    /// A statement that does nothing
    pub fn pass() -> Self {
        Self {
            snippets: vec![Snippet::pass()],
        }
    }

    /// Resolve newline separated snippet names against the registry.
    ///
    /// Blank lines are skipped and surrounding whitespace is ignored. Empty
    /// text resolves to `pass`.
    pub fn resolve(text: &str) -> Result<Self, TimingError> {
        let mut snippets = Vec::new();
        for name in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
            if name == PASS {
                snippets.push(Snippet::pass());
                continue;
            }
            match find_snippet(name) {
                Some(def) => snippets.push(Snippet::from(def)),
                None => {
                    return Err(TimingError::UnknownSnippet {
                        name: name.to_string(),
                        available: registered_snippets()
                            .iter()
                            .map(|def| def.name.to_string())
                            .collect(),
                    });
                }
            }
        }
        Ok(Self::new(snippets))
    }

    /// Resolve several lines, as given by repeated command line flags
    pub fn resolve_lines<S: AsRef<str>>(lines: &[S]) -> Result<Self, TimingError> {
        let text: Vec<&str> = lines.iter().map(AsRef::as_ref).collect();
        Self::resolve(&text.join("\n"))
    }

    /// Snippets in execution order
    pub fn snippets(&self) -> &[Snippet] {
        &self.snippets
    }

    /// Whether the statement does nothing at all
    pub fn is_pass(&self) -> bool {
        self.snippets.iter().all(|snippet| snippet.name == PASS)
    }

    /// Canonical text form, one snippet name per line
    pub fn text(&self) -> String {
        self.snippets
            .iter()
            .map(|snippet| snippet.name)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for Statement {
    fn default() -> Self {
        Self::pass()
    }
}

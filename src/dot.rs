//! CFG to DOT (Graphviz) conversion.
//!
//! The generated graph has one node per program point, labeled with the
//! node name and the statement it executes, and one edge per control-flow
//! edge. Findings produced by the checkers can be overlaid: every node lying
//! on the trace of a finding gets an extra line with the finding message.
//!
//! # Examples
//!
//! ```
//! use absint_rs::cfg::Cfg;
//! use absint_rs::ir::ProgramBuilder;
//!
//! let mut b = ProgramBuilder::new("p");
//! let x = b.var("x", "int");
//! let s = b.read(&x);
//! let program = b.build(vec![s]);
//!
//! let dot = Cfg::build(&program).to_dot(&[]).unwrap();
//! // Write to file and render with: dot -Tpng output.dot -o output.png
//! ```

use std::path::Path;

use crate::cfg::Cfg;
use crate::checkers::Finding;
use crate::utils::html_escape;

/// Configuration options for DOT output generation.
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Shape for plain nodes (default: "box")
    pub node_shape: &'static str,
    /// Shape for the entry node (default: "house")
    pub entry_shape: &'static str,
    /// Shape for widening points (default: "doubleoctagon")
    pub widening_shape: &'static str,
    /// Color of finding annotations (default: "red")
    pub finding_color: &'static str,
    /// Whether to use HTML labels (default: true)
    pub use_html_labels: bool,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            node_shape: "box",
            entry_shape: "house",
            widening_shape: "doubleoctagon",
            finding_color: "red",
            use_html_labels: true,
        }
    }
}

impl Cfg<'_> {
    /// Converts the CFG to DOT format, annotated with `findings`.
    pub fn to_dot(&self, findings: &[Finding]) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(findings, &DotConfig::default())
    }

    /// Converts the CFG to DOT format with custom configuration.
    pub fn to_dot_with_config(&self, findings: &[Finding], config: &DotConfig) -> Result<String, std::fmt::Error> {
        use std::fmt::Write as _;

        let mut dot = String::new();
        writeln!(dot, "digraph \"{}\" {{", self.program().name().replace('"', "\\\""))?;
        writeln!(dot, "node [shape={}];", config.node_shape)?;

        for node in self.nodes() {
            let mut lines = vec![node.name.clone()];
            if let Some(stmt) = node.stmt {
                lines.push(stmt.to_string());
            }
            let notes: Vec<String> = findings
                .iter()
                .filter(|f| f.trace.contains(node.id))
                .map(Finding::message)
                .collect();

            let label = if config.use_html_labels {
                let mut label = format!("<B>{}</B>", html_escape(&lines[0]));
                for line in &lines[1..] {
                    write!(label, "<BR/>{}", html_escape(line))?;
                }
                for note in &notes {
                    write!(label, "<BR/><FONT COLOR=\"{}\">{}</FONT>", config.finding_color, html_escape(note))?;
                }
                format!("<{}>", label)
            } else {
                let text: Vec<String> = lines.iter().chain(&notes).map(|l| l.replace('"', "\\\"")).collect();
                format!("\"{}\"", text.join("\\n"))
            };

            let shape = if node.id == self.entry() {
                config.entry_shape
            } else if node.widening_point {
                config.widening_shape
            } else {
                config.node_shape
            };
            write!(dot, "n{} [label={}", node.id.index(), label)?;
            if shape != config.node_shape {
                write!(dot, ", shape={}", shape)?;
            }
            if !notes.is_empty() {
                write!(dot, ", color={}", config.finding_color)?;
            }
            writeln!(dot, "];")?;
        }

        for &(from, to) in self.edges() {
            writeln!(dot, "n{} -> n{};", from.index(), to.index())?;
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }

    /// Writes the annotated DOT rendering of the CFG to `path`.
    pub fn save_dot(&self, path: impl AsRef<Path>, findings: &[Finding]) -> std::io::Result<()> {
        let dot = self.to_dot(findings).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, dot)
    }
}

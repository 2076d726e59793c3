use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::RenderError;
use crate::renderer::components::XmlWriter;

/// Default nesting limit for a single render
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// User-facing render configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    /// Emit offsets, sizes, endianness, colors, comments and type names.
    /// Also selects the attributed encoding over the flat one.
    pub meta_information: bool,
    pub max_depth: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            meta_information: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl RenderOptions {
    pub fn with_meta_information(mut self, enabled: bool) -> Self {
        self.meta_information = enabled;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parse options from JSON, rejecting unknown keys
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid render options")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read render options {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn encoding(&self) -> Encoding {
        if self.meta_information {
            Encoding::Attributed
        } else {
            Encoding::Flat
        }
    }
}

/// Output encoding. Both share the traversal; only tag shape,
/// escaping and indentation differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Kind-named elements carrying metadata attributes, entity escaping
    Attributed,
    /// Variable-named elements without attributes, percent-encoded text
    Flat,
}

impl Encoding {
    pub fn indent_width(&self) -> usize {
        match self {
            Encoding::Attributed => 2,
            Encoding::Flat => 4,
        }
    }

    /// Depth at which root patterns are written
    pub fn root_depth(&self) -> usize {
        match self {
            Encoding::Attributed => 2,
            Encoding::Flat => 1,
        }
    }
}

/// Per-node rendering state passed down the traversal
#[derive(Debug, Clone, Copy)]
pub struct RenderContext {
    /// Indentation depth, in encoding-specific steps
    pub depth: usize,
    /// Pattern nesting level; roots are level 1
    pub level: usize,
    pub encoding: Encoding,
    pub max_depth: usize,
}

impl RenderContext {
    pub fn new(options: &RenderOptions) -> Self {
        let encoding = options.encoding();
        Self {
            depth: encoding.root_depth(),
            level: 1,
            encoding,
            max_depth: options.max_depth,
        }
    }

    pub fn with_depth(&self, depth: usize) -> Self {
        Self { depth, ..*self }
    }

    /// Context one level further in
    pub fn nested(&self) -> Self {
        self.with_depth(self.depth + 1)
    }

    /// Context for a child pattern written `steps` indent levels further in
    pub fn child(&self, steps: usize) -> Self {
        Self {
            depth: self.depth + steps,
            level: self.level + 1,
            ..*self
        }
    }

    pub fn indent(&self) -> String {
        " ".repeat(self.depth * self.encoding.indent_width())
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new(&RenderOptions::default())
    }
}

/// Core rendering trait for pattern nodes
pub trait Render {
    fn render(&self, context: &RenderContext, writer: &mut XmlWriter) -> Result<(), RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = RenderOptions::default();
        assert!(!options.meta_information);
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(options.encoding(), Encoding::Flat);
    }

    #[test]
    fn test_options_from_json() -> Result<()> {
        let options = RenderOptions::from_json(r#"{ "meta_information": true }"#)?;
        assert!(options.meta_information);
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(options.encoding(), Encoding::Attributed);
        Ok(())
    }

    #[test]
    fn test_options_reject_unknown_fields() {
        let result = RenderOptions::from_json(r#"{ "meta_info": true }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_indentation_per_encoding() {
        let attributed = RenderContext::new(&RenderOptions::default().with_meta_information(true));
        assert_eq!(attributed.indent(), "    ");
        assert_eq!(attributed.nested().indent(), "      ");

        let flat = RenderContext::new(&RenderOptions::default());
        assert_eq!(flat.indent(), "    ");
        assert_eq!(flat.nested().indent(), "        ");
    }

    #[test]
    fn test_child_advances_level_once() {
        let context = RenderContext::new(&RenderOptions::default().with_meta_information(true));
        assert_eq!(context.level, 1);

        let child = context.child(2);
        assert_eq!(child.level, 2);
        assert_eq!(child.depth, context.depth + 2);
        assert_eq!(context.nested().level, 1);
    }
}

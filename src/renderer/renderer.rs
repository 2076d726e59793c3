use tracing::{debug, warn};

use crate::error::RenderError;
use crate::pattern::*;
use crate::renderer::components::*;
use crate::renderer::traits::*;

/// File extension for rendered documents
pub const FILE_EXTENSION: &str = "xml";

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";
const ROOT_ELEMENT: &str = "pattern_language";

/// Renders a pattern document into XML
#[derive(Debug, Clone, Default)]
pub struct XmlRenderer {
    options: RenderOptions,
}

impl XmlRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn render(&self, document: &PatternDocument) -> Result<Vec<u8>, RenderError> {
        self.render_to_string(document).map(String::into_bytes)
    }

    pub fn render_to_string(&self, document: &PatternDocument) -> Result<String, RenderError> {
        let context = RenderContext::new(&self.options);
        let mut writer = XmlWriter::new();

        writer.push_str(XML_DECLARATION);
        writer.push_str("\n");
        writer.push_str(&format!("<{}>\n", ROOT_ELEMENT));

        match context.encoding {
            Encoding::Attributed => {
                let section = context.with_depth(1);
                let field = context.with_depth(2);

                writer.line(&section, "<metadata>");
                writer.line(
                    &field,
                    &format!("<base_address>{:#x}</base_address>", document.region.base_address),
                );
                writer.line(
                    &field,
                    &format!("<data_size>{}</data_size>", document.region.data_size),
                );
                writer.line(&section, "</metadata>");

                writer.line(&section, "<patterns>");
                self.render_roots(&document.patterns, &context, &mut writer)?;
                writer.line(&section, "</patterns>");
            }
            Encoding::Flat => self.render_roots(&document.patterns, &context, &mut writer)?,
        }

        writer.push_str(&format!("</{}>\n", ROOT_ELEMENT));

        let output = writer.finish();
        debug!(
            roots = document.patterns.len(),
            encoding = ?context.encoding,
            bytes = output.len(),
            "rendered pattern document"
        );
        Ok(output)
    }

    fn render_roots(
        &self,
        patterns: &[Pattern],
        context: &RenderContext,
        writer: &mut XmlWriter,
    ) -> Result<(), RenderError> {
        for pattern in patterns {
            if !pattern.global {
                warn!(name = %pattern.variable_name, "skipping non-global root pattern");
                continue;
            }
            pattern.render(context, writer)?;
        }
        Ok(())
    }
}

/// Render a document with the given options
pub fn render(document: &PatternDocument, options: RenderOptions) -> Result<Vec<u8>, RenderError> {
    XmlRenderer::new(options).render(document)
}

pub fn render_to_string(
    document: &PatternDocument,
    options: RenderOptions,
) -> Result<String, RenderError> {
    XmlRenderer::new(options).render_to_string(document)
}

use tracing::trace;

use crate::error::RenderError;
use crate::pattern::*;
use crate::renderer::components::*;
use crate::renderer::traits::*;

/// Wrapper element placed around each child of a keyed container
#[derive(Debug, Clone, Copy)]
enum ChildWrapper {
    Member,
    Field,
}

impl ChildWrapper {
    fn tag(&self) -> &'static str {
        match self {
            ChildWrapper::Member => "member",
            ChildWrapper::Field => "field",
        }
    }
}

impl Render for Pattern {
    fn render(&self, context: &RenderContext, writer: &mut XmlWriter) -> Result<(), RenderError> {
        if self.visibility.is_hidden() {
            trace!(name = %self.variable_name, "skipping hidden pattern");
            return Ok(());
        }

        if context.level > context.max_depth {
            return Err(RenderError::DepthExceeded {
                limit: context.max_depth,
            });
        }

        // A custom formatter or a seal turns any pattern into a plain value
        if self.formatter.is_some() || (self.sealed && self.kind.is_composite()) {
            render_scalar(self, context, writer);
            return Ok(());
        }

        match &self.kind {
            PatternKind::Struct { members } | PatternKind::Union { members } => {
                render_keyed(self, members, ChildWrapper::Member, context, writer)
            }
            PatternKind::Bitfield { fields } => {
                render_keyed(self, fields, ChildWrapper::Field, context, writer)
            }
            PatternKind::ArrayStatic { entries }
            | PatternKind::ArrayDynamic { entries }
            | PatternKind::BitfieldArray { entries } => {
                render_indexed(self, entries, context, writer)
            }
            PatternKind::Pointer {
                address,
                pointed_at,
            } => render_pointer(self, *address, pointed_at.as_deref(), context, writer),
            PatternKind::BitfieldField { .. }
            | PatternKind::Boolean(_)
            | PatternKind::Character(_)
            | PatternKind::WideCharacter(_)
            | PatternKind::Enum { .. }
            | PatternKind::Float(_)
            | PatternKind::Signed(_)
            | PatternKind::Unsigned(_)
            | PatternKind::String(_)
            | PatternKind::WideString(_)
            | PatternKind::Padding
            | PatternKind::Error { .. }
            | PatternKind::Opaque => {
                render_scalar(self, context, writer);
                Ok(())
            }
        }
    }
}

fn render_scalar(pattern: &Pattern, context: &RenderContext, writer: &mut XmlWriter) {
    let text = ValueFormatter::value_text(pattern);
    writer.line(context, &TagRenderer::leaf(context.encoding, pattern, &text));
}

fn open_container(pattern: &Pattern, context: &RenderContext, writer: &mut XmlWriter) {
    writer.line(context, &format!("{}>", TagRenderer::open_tag(context.encoding, pattern)));
}

fn close_container(pattern: &Pattern, context: &RenderContext, writer: &mut XmlWriter) {
    writer.line(context, &TagRenderer::close_tag(context.encoding, pattern));
}

/// Struct, union and bitfield children, in declaration order
fn render_keyed(
    pattern: &Pattern,
    children: &[Pattern],
    wrapper: ChildWrapper,
    context: &RenderContext,
    writer: &mut XmlWriter,
) -> Result<(), RenderError> {
    open_container(pattern, context, writer);

    let wrapper_context = context.nested();
    for child in children {
        match context.encoding {
            Encoding::Attributed => {
                if child.visibility.is_hidden() {
                    continue;
                }
                writer.line(
                    &wrapper_context,
                    &format!(
                        "<{} name=\"{}\">",
                        wrapper.tag(),
                        TextEscaper::escape_xml(&child.variable_name)
                    ),
                );
                child.render(&context.child(2), writer)?;
                writer.line(&wrapper_context, &format!("</{}>", wrapper.tag()));
            }
            Encoding::Flat => child.render(&context.child(1), writer)?,
        }
    }

    close_container(pattern, context, writer);
    Ok(())
}

/// Array entries, each under an index-tagged wrapper
fn render_indexed(
    pattern: &Pattern,
    entries: &[Pattern],
    context: &RenderContext,
    writer: &mut XmlWriter,
) -> Result<(), RenderError> {
    open_container(pattern, context, writer);

    let wrapper_context = context.nested();
    for (index, entry) in entries.iter().enumerate() {
        if entry.visibility.is_hidden() {
            continue;
        }

        let (open, close) = match context.encoding {
            Encoding::Attributed => (format!("<entry index=\"{}\">", index), "</entry>".to_string()),
            Encoding::Flat => (format!("<entry_{}>", index), format!("</entry_{}>", index)),
        };

        writer.line(&wrapper_context, &open);
        entry.render(&context.child(2), writer)?;
        writer.line(&wrapper_context, &close);
    }

    close_container(pattern, context, writer);
    Ok(())
}

/// The pointer's own address, then the target if it was resolved
fn render_pointer(
    pattern: &Pattern,
    address: u64,
    pointed_at: Option<&Pattern>,
    context: &RenderContext,
    writer: &mut XmlWriter,
) -> Result<(), RenderError> {
    open_container(pattern, context, writer);

    let inner = context.nested();
    let value = format!("{:#x}", address);
    writer.line(
        &inner,
        &format!("<value>{}</value>", TextEscaper::escape_text(context.encoding, &value)),
    );

    if let Some(target) = pointed_at.filter(|target| !target.visibility.is_hidden()) {
        writer.enter_pointer(target.offset)?;
        writer.line(&inner, "<pointed_data>");
        target.render(&context.child(2), writer)?;
        writer.line(&inner, "</pointed_data>");
        writer.leave_pointer(target.offset);
    }

    close_container(pattern, context, writer);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_node(pattern: &Pattern, options: &RenderOptions) -> Result<String, RenderError> {
        let mut writer = XmlWriter::new();
        pattern.render(&RenderContext::new(options).with_depth(0), &mut writer)?;
        Ok(writer.finish())
    }

    fn flat() -> RenderOptions {
        RenderOptions::default()
    }

    fn attributed() -> RenderOptions {
        RenderOptions::default().with_meta_information(true)
    }

    #[test]
    fn test_flat_struct() {
        let node = Pattern::new("header", "Header", 0, 6, PatternKind::Struct { members: vec![] })
            .with_member(Pattern::new("magic", "u32", 0, 4, PatternKind::Unsigned(0xCAFEBABE)))
            .with_member(Pattern::new("version", "u16", 4, 2, PatternKind::Unsigned(1)));

        let output = render_node(&node, &flat()).unwrap();
        assert_eq!(
            output,
            "<header>\n    <magic>3405691582</magic>\n    <version>1</version>\n</header>\n"
        );
    }

    #[test]
    fn test_attributed_struct_member_wrappers() {
        let node = Pattern::new("header", "Header", 0, 4, PatternKind::Struct { members: vec![] })
            .with_member(Pattern::new("magic", "u32", 0, 4, PatternKind::Unsigned(7)));

        let output = render_node(&node, &attributed()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("<Header name=\"header\" type=\"Header\""));
        assert_eq!(lines[1], "  <member name=\"magic\">");
        assert!(lines[2].starts_with("    <u32 name=\"magic\""));
        assert!(lines[2].ends_with(">7</u32>"));
        assert_eq!(lines[3], "  </member>");
        assert_eq!(lines[4], "</Header>");
    }

    #[test]
    fn test_bitfield_uses_field_wrappers() {
        let node = Pattern::new("flags", "Flags", 0, 1, PatternKind::Bitfield { fields: vec![] })
            .with_field(Pattern::new("ready", "bits", 0, 1, PatternKind::BitfieldField {
                value: 1,
                bit_offset: 0,
                bit_size: 1,
            }));

        let output = render_node(&node, &attributed()).unwrap();
        assert!(output.contains("  <field name=\"ready\">\n"));
        assert!(output.contains("bit_offset=\"0\" bit_size=\"1\">1</bits>"));
    }

    #[test]
    fn test_flat_array_entries() {
        let node = Pattern::new("data", "u8", 0, 2, PatternKind::ArrayDynamic { entries: vec![] })
            .with_entry(Pattern::new("[0]", "u8", 0, 1, PatternKind::Unsigned(10)))
            .with_entry(Pattern::new("[1]", "u8", 1, 1, PatternKind::Unsigned(20)));

        let output = render_node(&node, &flat()).unwrap();
        assert_eq!(
            output,
            "<data>\n    <entry_0>\n        <_0_>10</_0_>\n    </entry_0>\n    <entry_1>\n        <_1_>20</_1_>\n    </entry_1>\n</data>\n"
        );
    }

    #[test]
    fn test_attributed_array_entries() {
        let node = Pattern::new("data", "u8", 0, 1, PatternKind::ArrayStatic { entries: vec![] })
            .with_entry(Pattern::new("[0]", "u8", 0, 1, PatternKind::Unsigned(10)));

        let output = render_node(&node, &attributed()).unwrap();
        assert!(output.contains("\n  <entry index=\"0\">\n    <u8 name=\"[0]\""));
        assert!(output.ends_with("  </entry>\n</u8>\n"));
    }

    #[test]
    fn test_sealed_struct_is_leaf() {
        let node = Pattern::new("rgb", "Color", 0, 3, PatternKind::Struct { members: vec![] })
            .with_member(Pattern::new("r", "u8", 0, 1, PatternKind::Unsigned(255)))
            .sealed();

        assert_eq!(render_node(&node, &flat()).unwrap(), "<rgb>Color</rgb>\n");
    }

    #[test]
    fn test_formatter_overrides_container() {
        let node = Pattern::new("rgb", "Color", 0, 3, PatternKind::Struct { members: vec![] })
            .with_member(Pattern::new("r", "u8", 0, 1, PatternKind::Unsigned(255)))
            .with_formatter("format_color", Literal::String("#FF0000".into()));

        let output = render_node(&node, &attributed()).unwrap();
        assert_eq!(output.lines().count(), 1);
        assert!(output.contains(">#FF0000</Color>"));
        assert!(!output.contains("<member"));
    }

    #[test]
    fn test_hidden_members_skipped() {
        let node = Pattern::new("s", "S", 0, 2, PatternKind::Struct { members: vec![] })
            .with_member(
                Pattern::new("secret", "u8", 0, 1, PatternKind::Unsigned(1))
                    .with_visibility(Visibility::Hidden),
            )
            .with_member(Pattern::new("shown", "u8", 1, 1, PatternKind::Unsigned(2)));

        let output = render_node(&node, &attributed()).unwrap();
        assert!(!output.contains("secret"));
        assert_eq!(output.matches("<member").count(), 1);
    }

    #[test]
    fn test_pointer_without_target() {
        let node = Pattern::new("next", "Node*", 0, 4, PatternKind::Pointer {
            address: 0x40,
            pointed_at: None,
        });

        assert_eq!(
            render_node(&node, &flat()).unwrap(),
            "<next>\n    <value>0x40</value>\n</next>\n"
        );
    }

    #[test]
    fn test_pointer_with_target() {
        let node = Pattern::new("next", "u8*", 0, 4, PatternKind::Pointer {
            address: 0x40,
            pointed_at: None,
        })
        .pointing_at(Pattern::new("*next", "u8", 0x40, 1, PatternKind::Unsigned(9)));

        assert_eq!(
            render_node(&node, &flat()).unwrap(),
            "<next>\n    <value>0x40</value>\n    <pointed_data>\n        <_next>9</_next>\n    </pointed_data>\n</next>\n"
        );
    }

    #[test]
    fn test_pointer_cycle_detected() {
        let inner = Pattern::new("back", "Node*", 0x10, 4, PatternKind::Pointer {
            address: 0x10,
            pointed_at: None,
        })
        .pointing_at(Pattern::new("node", "Node", 0x10, 4, PatternKind::Unsigned(0)));
        let node = Pattern::new("head", "Node*", 0, 4, PatternKind::Pointer {
            address: 0x10,
            pointed_at: None,
        })
        .pointing_at(inner);

        assert_eq!(
            render_node(&node, &flat()),
            Err(RenderError::CyclicReference { address: 0x10 })
        );
    }

    #[test]
    fn test_depth_limit() {
        let mut node = Pattern::new("leaf", "u8", 0, 1, PatternKind::Unsigned(0));
        for _ in 0..5 {
            node = Pattern::new("s", "S", 0, 1, PatternKind::Struct { members: vec![] })
                .with_member(node);
        }

        let options = flat().with_max_depth(5);
        assert_eq!(
            render_node(&node, &options),
            Err(RenderError::DepthExceeded { limit: 5 })
        );
        assert!(render_node(&node, &flat().with_max_depth(6)).is_ok());
    }
}

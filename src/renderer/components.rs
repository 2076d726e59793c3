use std::collections::HashSet;

use crate::error::RenderError;
use crate::pattern::*;
use crate::renderer::traits::*;

/// Output buffer plus the pointer targets currently being expanded
#[derive(Debug, Default)]
pub struct XmlWriter {
    output: String,
    pointer_chain: HashSet<u64>,
}

impl XmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one indented, newline-terminated line
    pub fn line(&mut self, context: &RenderContext, text: &str) {
        self.output.push_str(&context.indent());
        self.output.push_str(text);
        self.output.push('\n');
    }

    pub fn push_str(&mut self, text: &str) {
        self.output.push_str(text);
    }

    /// Mark a pointer target as being expanded
    pub fn enter_pointer(&mut self, address: u64) -> Result<(), RenderError> {
        if !self.pointer_chain.insert(address) {
            return Err(RenderError::CyclicReference { address });
        }
        Ok(())
    }

    pub fn leave_pointer(&mut self, address: u64) {
        self.pointer_chain.remove(&address);
    }

    pub fn finish(self) -> String {
        self.output
    }
}

/// Helper for escaping text per encoding
pub struct TextEscaper;

impl TextEscaper {
    /// Replace the five XML-significant characters with named entities
    pub fn escape_xml(text: &str) -> String {
        let mut result = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '&' => result.push_str("&amp;"),
                '<' => result.push_str("&lt;"),
                '>' => result.push_str("&gt;"),
                '"' => result.push_str("&quot;"),
                '\'' => result.push_str("&apos;"),
                _ => result.push(c),
            }
        }
        result
    }

    /// Percent-encode every byte outside `A-Z a-z 0-9 - _ . ~`
    pub fn percent_encode(text: &str) -> String {
        let mut result = String::with_capacity(text.len());
        for byte in text.bytes() {
            if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
                result.push(byte as char);
            } else {
                result.push_str(&format!("%{:02X}", byte));
            }
        }
        result
    }

    pub fn escape_text(encoding: Encoding, text: &str) -> String {
        match encoding {
            Encoding::Attributed => Self::escape_xml(text),
            Encoding::Flat => Self::percent_encode(text),
        }
    }

    /// Turn a variable or type name into a usable element name
    pub fn element_name(name: &str) -> String {
        let mut result: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if !result.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
            result.insert(0, '_');
        }
        result
    }
}

/// Helper for computing display strings of values
pub struct ValueFormatter;

impl ValueFormatter {
    /// Text shown for a pattern rendered as a leaf
    pub fn value_text(pattern: &Pattern) -> String {
        if pattern.formatter.is_some() {
            if let Some(literal) = &pattern.literal {
                return Self::literal_text(literal);
            }
        }
        Self::display_value(pattern)
    }

    pub fn literal_text(literal: &Literal) -> String {
        match literal {
            Literal::Signed(value) => value.to_string(),
            Literal::Unsigned(value) => value.to_string(),
            Literal::Float(value) => value.to_string(),
            Literal::Boolean(value) => value.to_string(),
            Literal::Character(c) => format!("'{}'", c),
            Literal::String(s) => s.clone(),
            Literal::Pattern(pattern) => Self::value_text(pattern),
        }
    }

    /// The pattern's own value, ignoring any custom formatter
    pub fn display_value(pattern: &Pattern) -> String {
        match &pattern.kind {
            PatternKind::Struct { .. } | PatternKind::Union { .. } | PatternKind::Bitfield { .. } => {
                Self::type_label(pattern).to_string()
            }
            PatternKind::ArrayStatic { .. }
            | PatternKind::ArrayDynamic { .. }
            | PatternKind::BitfieldArray { .. } => {
                format!("{}[{}]", Self::type_label(pattern), pattern.children().len())
            }
            PatternKind::Pointer { address, .. } => format!("{:#x}", address),
            PatternKind::BitfieldField { value, .. } => value.to_string(),
            PatternKind::Boolean(value) => value.to_string(),
            PatternKind::Character(value) => Self::narrow_char(*value),
            PatternKind::WideCharacter(value) => Self::wide_char(*value),
            PatternKind::Enum { value, variant } => match variant {
                Some(name) => name.clone(),
                None => value.to_string(),
            },
            PatternKind::Float(value) => value.to_string(),
            PatternKind::Signed(value) => value.to_string(),
            PatternKind::Unsigned(value) => value.to_string(),
            PatternKind::String(s) | PatternKind::WideString(s) => s.clone(),
            PatternKind::Padding => String::new(),
            PatternKind::Error { message } => message.clone(),
            PatternKind::Opaque => Self::type_label(pattern).to_string(),
        }
    }

    fn type_label(pattern: &Pattern) -> &str {
        if pattern.type_name.is_empty() {
            pattern.kind.tag()
        } else {
            &pattern.type_name
        }
    }

    fn narrow_char(value: u8) -> String {
        if (0x20..=0x7E).contains(&value) {
            format!("'{}'", value as char)
        } else {
            value.to_string()
        }
    }

    fn wide_char(value: u16) -> String {
        match char::from_u32(u32::from(value)).filter(|c| !c.is_control()) {
            Some(c) => format!("'{}'", c),
            None => format!("{:#x}", value),
        }
    }
}

/// Helper for element tags in both encodings
pub struct TagRenderer;

impl TagRenderer {
    /// Element name a pattern is written under
    pub fn tag_name(encoding: Encoding, pattern: &Pattern) -> String {
        match encoding {
            Encoding::Attributed if pattern.type_name.is_empty() => pattern.kind.tag().to_string(),
            Encoding::Attributed => TextEscaper::element_name(&pattern.type_name),
            Encoding::Flat => TextEscaper::element_name(&pattern.variable_name),
        }
    }

    /// Opening tag without the closing `>`
    pub fn open_tag(encoding: Encoding, pattern: &Pattern) -> String {
        let tag = Self::tag_name(encoding, pattern);
        match encoding {
            Encoding::Attributed => format!("<{}{}", tag, Self::attributes(pattern)),
            Encoding::Flat => format!("<{}", tag),
        }
    }

    /// Metadata attributes, each with a leading space
    pub fn attributes(pattern: &Pattern) -> String {
        let mut attrs = format!(
            " name=\"{}\" type=\"{}\" endian=\"{}\" color=\"#{:08X}\" address=\"{:#x}\" size=\"{}\"",
            TextEscaper::escape_xml(&pattern.variable_name),
            TextEscaper::escape_xml(&pattern.type_name),
            pattern.endian.as_str(),
            pattern.color,
            pattern.offset,
            pattern.size,
        );

        if let Some(comment) = pattern.comment() {
            attrs.push_str(&format!(" comment=\"{}\"", TextEscaper::escape_xml(comment)));
        }

        if let PatternKind::BitfieldField { bit_offset, bit_size, .. } = &pattern.kind {
            attrs.push_str(&format!(" bit_offset=\"{}\" bit_size=\"{}\"", bit_offset, bit_size));
        }

        attrs
    }

    /// A complete single-line element; empty text self-closes
    pub fn leaf(encoding: Encoding, pattern: &Pattern, text: &str) -> String {
        let open = Self::open_tag(encoding, pattern);
        if text.is_empty() {
            format!("{}/>", open)
        } else {
            format!(
                "{}>{}</{}>",
                open,
                TextEscaper::escape_text(encoding, text),
                Self::tag_name(encoding, pattern)
            )
        }
    }

    pub fn close_tag(encoding: Encoding, pattern: &Pattern) -> String {
        format!("</{}>", Self::tag_name(encoding, pattern))
    }
}

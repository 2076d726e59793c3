use serde::Deserialize;

/// Byte order a pattern was decoded with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endian {
    #[default]
    Little,
    Big,
}

impl Endian {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endian::Little => "little",
            Endian::Big => "big",
        }
    }
}

/// Whether a pattern shows up in rendered output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Visible,
    /// Hidden from display together with its children
    Hidden,
    /// Hidden from tree views; its whole subtree is skipped
    TreeHidden,
}

impl Visibility {
    pub fn is_hidden(&self) -> bool {
        !matches!(self, Visibility::Visible)
    }
}

/// A value computed by a custom read-formatter function
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Signed(i128),
    Unsigned(u128),
    Float(f64),
    Boolean(bool),
    Character(char),
    String(String),
    Pattern(Box<Pattern>),
}

/// Kind-specific payload of a pattern node
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Struct {
        #[serde(default)]
        members: Vec<Pattern>,
    },
    Union {
        #[serde(default)]
        members: Vec<Pattern>,
    },
    ArrayStatic {
        #[serde(default)]
        entries: Vec<Pattern>,
    },
    ArrayDynamic {
        #[serde(default)]
        entries: Vec<Pattern>,
    },
    Bitfield {
        #[serde(default)]
        fields: Vec<Pattern>,
    },
    BitfieldField {
        value: u128,
        bit_offset: u8,
        bit_size: u8,
    },
    BitfieldArray {
        #[serde(default)]
        entries: Vec<Pattern>,
    },
    Boolean(bool),
    Character(u8),
    WideCharacter(u16),
    Enum {
        value: u128,
        #[serde(default)]
        variant: Option<String>,
    },
    Float(f64),
    Signed(i128),
    Unsigned(u128),
    String(String),
    WideString(String),
    Pointer {
        address: u64,
        #[serde(default)]
        pointed_at: Option<Box<Pattern>>,
    },
    Padding,
    Error {
        message: String,
    },
    Opaque,
}

impl PatternKind {
    /// Element name used for this kind in the attributed encoding
    pub fn tag(&self) -> &'static str {
        match self {
            PatternKind::Struct { .. } => "struct",
            PatternKind::Union { .. } => "union",
            PatternKind::ArrayStatic { .. } => "array_static",
            PatternKind::ArrayDynamic { .. } => "array_dynamic",
            PatternKind::Bitfield { .. } => "bitfield",
            PatternKind::BitfieldField { .. } => "bitfield_field",
            PatternKind::BitfieldArray { .. } => "bitfield_array",
            PatternKind::Boolean(_) => "boolean",
            PatternKind::Character(_) => "character",
            PatternKind::WideCharacter(_) => "wide_character",
            PatternKind::Enum { .. } => "enum",
            PatternKind::Float(_) => "float",
            PatternKind::Signed(_) => "signed",
            PatternKind::Unsigned(_) => "unsigned",
            PatternKind::String(_) => "string",
            PatternKind::WideString(_) => "wide_string",
            PatternKind::Pointer { .. } => "pointer",
            PatternKind::Padding => "padding",
            PatternKind::Error { .. } => "error",
            PatternKind::Opaque => "value",
        }
    }

    /// True for kinds that expand into child elements unless sealed
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            PatternKind::Struct { .. }
                | PatternKind::Union { .. }
                | PatternKind::ArrayStatic { .. }
                | PatternKind::ArrayDynamic { .. }
                | PatternKind::Bitfield { .. }
                | PatternKind::BitfieldArray { .. }
                | PatternKind::Pointer { .. }
        )
    }
}

fn default_global() -> bool {
    true
}

/// A node in the evaluated pattern forest.
/// Each node describes how one region of the data was interpreted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Pattern {
    #[serde(default)]
    pub variable_name: String,
    #[serde(default)]
    pub type_name: String,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub endian: Endian,
    /// Display color as `0xRRGGBBAA`
    #[serde(default)]
    pub color: u32,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    /// Render as an atomic value even when the kind is composite
    #[serde(default)]
    pub sealed: bool,
    /// Name of the custom read-formatter function, if any
    #[serde(default)]
    pub formatter: Option<String>,
    /// Result of running `formatter` during evaluation
    #[serde(default)]
    pub literal: Option<Literal>,
    /// Declared at global scope (only global roots are rendered)
    #[serde(default = "default_global")]
    pub global: bool,
    pub kind: PatternKind,
}

impl Pattern {
    pub fn new(
        variable_name: impl Into<String>,
        type_name: impl Into<String>,
        offset: u64,
        size: u64,
        kind: PatternKind,
    ) -> Self {
        Self {
            variable_name: variable_name.into(),
            type_name: type_name.into(),
            offset,
            size,
            endian: Endian::Little,
            color: 0,
            comment: None,
            visibility: Visibility::Visible,
            sealed: false,
            formatter: None,
            literal: None,
            global: true,
            kind,
        }
    }

    /// Add a member to a struct or union. Ignored for other kinds.
    pub fn with_member(mut self, member: Pattern) -> Self {
        if let PatternKind::Struct { members } | PatternKind::Union { members } = &mut self.kind {
            members.push(member);
        }
        self
    }

    /// Add an entry to any array kind. Ignored for other kinds.
    pub fn with_entry(mut self, entry: Pattern) -> Self {
        if let PatternKind::ArrayStatic { entries }
        | PatternKind::ArrayDynamic { entries }
        | PatternKind::BitfieldArray { entries } = &mut self.kind
        {
            entries.push(entry);
        }
        self
    }

    /// Add a field to a bitfield. Ignored for other kinds.
    pub fn with_field(mut self, field: Pattern) -> Self {
        if let PatternKind::Bitfield { fields } = &mut self.kind {
            fields.push(field);
        }
        self
    }

    /// Set the target of a pointer. Ignored for other kinds.
    pub fn pointing_at(mut self, target: Pattern) -> Self {
        if let PatternKind::Pointer { pointed_at, .. } = &mut self.kind {
            *pointed_at = Some(Box::new(target));
        }
        self
    }

    pub fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn sealed(mut self) -> Self {
        self.sealed = true;
        self
    }

    /// Attach a custom formatter and the value it produced
    pub fn with_formatter(mut self, function: impl Into<String>, literal: Literal) -> Self {
        self.formatter = Some(function.into());
        self.literal = Some(literal);
        self
    }

    pub fn with_global(mut self, global: bool) -> Self {
        self.global = global;
        self
    }

    /// Non-empty comment text
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref().filter(|c| !c.is_empty())
    }

    /// Ordered children, whatever the container kind
    pub fn children(&self) -> &[Pattern] {
        match &self.kind {
            PatternKind::Struct { members } | PatternKind::Union { members } => members,
            PatternKind::ArrayStatic { entries }
            | PatternKind::ArrayDynamic { entries }
            | PatternKind::BitfieldArray { entries } => entries,
            PatternKind::Bitfield { fields } => fields,
            _ => &[],
        }
    }
}

/// Region of data the forest was evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct DataRegion {
    #[serde(default)]
    pub base_address: u64,
    #[serde(default)]
    pub data_size: u64,
}

/// Everything the evaluator hands over for one export
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct PatternDocument {
    #[serde(default)]
    pub region: DataRegion,
    #[serde(default)]
    pub patterns: Vec<Pattern>,
}

impl PatternDocument {
    pub fn new(region: DataRegion, patterns: Vec<Pattern>) -> Self {
        Self { region, patterns }
    }
}

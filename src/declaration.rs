//! declaration blocks
//!
//! a consuming builder for python class, enum, union, and scalar alias
//! declarations. each `with_*` call returns the updated value and
//! [`DeclarationBlock::render`] produces the final text.

/// kind of declaration to render
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeclarationKind {
    #[default]
    Class,
    Enum,
    Union,
    Scalar,
}

/// python declaration builder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationBlock {
    kind: DeclarationKind,
    name: String,
    decorator: Option<String>,
    comment: Option<String>,
    block: String,
    content: String,
}

impl DeclarationBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_kind(mut self, kind: DeclarationKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// line emitted above the declaration, e.g. `@dataclass`
    pub fn with_decorator(mut self, decorator: impl Into<String>) -> Self {
        self.decorator = Some(decorator.into());
        self
    }

    /// description comment; blank text is ignored
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        let comment = comment.into();
        if !comment.trim().is_empty() {
            self.comment = Some(comment);
        }
        self
    }

    /// unindented body lines of a class or enum
    pub fn with_block(mut self, block: impl Into<String>) -> Self {
        self.block = block.into();
        self
    }

    /// inline content: base classes for a class, members for a union,
    /// the aliased type for a scalar
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DeclarationKind {
        self.kind
    }

    /// render the declaration, ending with a newline
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(comment) = &self.comment {
            out.push_str(&transform_comment(comment, 0));
        }
        if let Some(decorator) = &self.decorator {
            out.push_str(decorator);
            out.push('\n');
        }

        match self.kind {
            DeclarationKind::Class | DeclarationKind::Enum => {
                let header = match self.kind {
                    DeclarationKind::Enum => format!("class {}(Enum):", self.name),
                    _ => format!("class {}{}:", self.name, self.content),
                };
                out.push_str(&header);
                out.push('\n');
                if self.block.trim().is_empty() {
                    out.push_str("    pass\n");
                } else {
                    out.push_str(&indent_block(&self.block, 1));
                }
            }
            DeclarationKind::Union => {
                out.push_str(&format!("{} = Union[{}]\n", self.name, self.content));
            }
            DeclarationKind::Scalar => {
                out.push_str(&format!("{} = {}\n", self.name, self.content));
            }
        }

        if self.kind != DeclarationKind::Scalar {
            out.push_str(&format!("\n{} = {}\n", alias_marker(&self.name), self.name));
        }
        out
    }
}

/// name bound to every non-scalar declaration so quoted references resolve
pub fn alias_marker(name: &str) -> String {
    format!("__GQL_CODEGEN_{}__", name)
}

/// indent each non-empty line by `level` steps of four spaces
pub fn indent_block(text: &str, level: usize) -> String {
    let prefix = "    ".repeat(level);
    let mut out = String::new();
    for line in text.trim_end_matches('\n').lines() {
        if !line.trim().is_empty() {
            out.push_str(&prefix);
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}

/// description → `#` line comment, or a triple-quoted block when multi-line
pub fn transform_comment(text: &str, level: usize) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    let prefix = "    ".repeat(level);
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() == 1 {
        return format!("{}# {}\n", prefix, lines[0]);
    }

    let mut out = format!("{}\"\"\"\n", prefix);
    for line in lines {
        if !line.trim().is_empty() {
            out.push_str(&prefix);
            out.push_str(&line.trim_end().replace("\"\"\"", "\\\"\\\"\\\""));
        }
        out.push('\n');
    }
    out.push_str(&prefix);
    out.push_str("\"\"\"\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_class_with_decorator() {
        let rendered = DeclarationBlock::new()
            .as_kind(DeclarationKind::Class)
            .with_decorator("@dataclass")
            .with_name("UserSelection")
            .with_block("id: str\nname: Optional[str]")
            .render();

        assert_eq!(
            rendered,
            indoc! {"
                @dataclass
                class UserSelection:
                    id: str
                    name: Optional[str]

                __GQL_CODEGEN_UserSelection__ = UserSelection
            "}
        );
    }

    #[test]
    fn test_empty_class_body_is_pass() {
        let rendered = DeclarationBlock::new().with_name("Empty").render();
        assert!(rendered.starts_with("class Empty:\n    pass\n"));
    }

    #[test]
    fn test_enum() {
        let rendered = DeclarationBlock::new()
            .as_kind(DeclarationKind::Enum)
            .with_name("Role")
            .with_comment("user role")
            .with_block("Admin = 'ADMIN'\nUser = 'USER'")
            .render();

        assert_eq!(
            rendered,
            indoc! {"
                # user role
                class Role(Enum):
                    Admin = 'ADMIN'
                    User = 'USER'

                __GQL_CODEGEN_Role__ = Role
            "}
        );
    }

    #[test]
    fn test_union_and_scalar() {
        let union = DeclarationBlock::new()
            .as_kind(DeclarationKind::Union)
            .with_name("SearchResult")
            .with_content("\"__GQL_CODEGEN_User__\", \"__GQL_CODEGEN_Post__\"")
            .render();
        assert_eq!(
            union,
            "SearchResult = Union[\"__GQL_CODEGEN_User__\", \"__GQL_CODEGEN_Post__\"]\n\n\
             __GQL_CODEGEN_SearchResult__ = SearchResult\n"
        );

        let scalar = DeclarationBlock::new()
            .as_kind(DeclarationKind::Scalar)
            .with_name("ScalarDateTime")
            .with_content("datetime")
            .render();
        assert_eq!(scalar, "ScalarDateTime = datetime\n");
    }

    #[test]
    fn test_builder_is_a_value() {
        let base = DeclarationBlock::new().with_name("A");
        let renamed = base.clone().with_name("B");
        assert_eq!(base.name(), "A");
        assert_eq!(renamed.name(), "B");
        assert_eq!(renamed.kind(), DeclarationKind::Class);
    }

    #[test]
    fn test_multiline_comment_escapes_terminator() {
        let comment = transform_comment("first line\nsays \"\"\" here", 1);
        assert_eq!(
            comment,
            "    \"\"\"\n    first line\n    says \\\"\\\"\\\" here\n    \"\"\"\n"
        );
        assert_eq!(transform_comment("   ", 0), "");
    }

    #[test]
    fn test_blank_comment_ignored() {
        let rendered = DeclarationBlock::new().with_name("A").with_comment("").render();
        assert!(rendered.starts_with("class A:"));
    }
}

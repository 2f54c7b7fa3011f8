//! naming conventions
//!
//! name conversion and keyword escaping are collaborators handed to the
//! compiler and emitters, so callers can swap the convention without
//! touching the code generation itself.

/// options for a single name conversion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// prepended after conversion
    pub prefix: String,
    /// appended after conversion
    pub suffix: String,
    /// drop underscores instead of keeping them between converted pieces
    pub transform_underscore: bool,
}

impl ConvertOptions {
    /// options that only append a suffix
    pub fn with_suffix(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            ..Self::default()
        }
    }
}

/// schema name → target identifier
pub trait NameConverter {
    /// convert a schema or document name
    fn convert(&self, name: &str, options: &ConvertOptions) -> String;

    /// convert with default options
    fn convert_name(&self, name: &str) -> String {
        self.convert(name, &ConvertOptions::default())
    }
}

/// pascal-case conversion
#[derive(Debug, Clone, Copy, Default)]
pub struct PascalCase;

impl NameConverter for PascalCase {
    fn convert(&self, name: &str, options: &ConvertOptions) -> String {
        let converted = if options.transform_underscore {
            pascal_case(name)
        } else {
            name.split('_')
                .map(pascal_case)
                .collect::<Vec<_>>()
                .join("_")
        };
        format!("{}{}{}", options.prefix, converted, options.suffix)
    }
}

fn pascal_case(input: &str) -> String {
    let mut out = String::new();
    for (idx, word) in split_words(input).iter().enumerate() {
        let mut chars = word.chars();
        let Some(first) = chars.next() else { continue };
        if idx > 0 && first.is_ascii_digit() {
            out.push('_');
        }
        out.extend(first.to_uppercase());
        out.push_str(&chars.as_str().to_lowercase());
    }
    out
}

/// split on non-alphanumerics, lower→upper boundaries, and acronym ends
fn split_words(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (idx, &ch) in chars.iter().enumerate() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if let Some(prev) = current.chars().last() {
            let next = chars.get(idx + 1).copied();
            let lower_to_upper = (prev.is_lowercase() || prev.is_ascii_digit()) && ch.is_uppercase();
            let acronym_end = prev.is_uppercase()
                && ch.is_uppercase()
                && next.is_some_and(|n| n.is_lowercase());
            if lower_to_upper || acronym_end {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(ch);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// python reserved words
#[derive(Debug, Clone)]
pub struct Keywords {
    words: &'static [&'static str],
}

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

impl Keywords {
    /// python's reserved word set
    pub fn python() -> Self {
        Self {
            words: PYTHON_KEYWORDS,
        }
    }

    /// true if the name is reserved
    pub fn contains(&self, name: &str) -> bool {
        self.words.contains(&name)
    }

    /// prefix `_` to reserved words
    pub fn escape(&self, name: &str) -> String {
        if self.contains(name) {
            format!("_{}", name)
        } else {
            name.to_string()
        }
    }
}

impl Default for Keywords {
    fn default() -> Self {
        Self::python()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pascal_case() {
        let names = PascalCase;
        assert_eq!(names.convert_name("getUser"), "GetUser");
        assert_eq!(names.convert_name("GetUser"), "GetUser");
        assert_eq!(names.convert_name("HTMLParser"), "HtmlParser");
        assert_eq!(names.convert_name("get_user"), "Get_User");
        assert_eq!(names.convert_name("version2Info"), "Version2Info");
    }

    #[test]
    fn test_transform_underscore() {
        let names = PascalCase;
        let options = ConvertOptions {
            transform_underscore: true,
            ..ConvertOptions::default()
        };
        assert_eq!(names.convert("NEW_HOPE", &options), "NewHope");
        assert_eq!(names.convert("get_user", &options), "GetUser");
        assert_eq!(names.convert("PAGE_2", &options), "Page_2");
    }

    #[test]
    fn test_prefix_and_suffix() {
        let names = PascalCase;
        let options = ConvertOptions {
            prefix: "Types.".to_string(),
            suffix: "Input".to_string(),
            transform_underscore: false,
        };
        assert_eq!(names.convert("user", &options), "Types.UserInput");
        assert_eq!(
            names.convert("onUser", &ConvertOptions::with_suffix("Response")),
            "OnUserResponse"
        );
    }

    #[test]
    fn test_keywords() {
        let keywords = Keywords::python();
        assert_eq!(keywords.escape("from"), "_from");
        assert_eq!(keywords.escape("None"), "_None");
        assert_eq!(keywords.escape("name"), "name");
    }
}

// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Document tree for JavaScript output.
//!
//! Lowering functions return [`Document`] values instead of writing to a
//! buffer; indentation is applied when the finished tree is rendered. The same
//! tree renders either readable ([`Document::to_pretty_string`]) or minified
//! ([`Document::to_flat_string`]), where line breaks and indentation vanish.
//! Every statement the generator emits ends in `;` or `}`, so dropping the
//! line breaks never joins two statements.
//!
//! ```
//! use lokascript_core::codegen::document::{line, nest};
//! use lokascript_core::docvec;
//!
//! let doc = docvec!["if (ok) {", nest(2, docvec![line(), "run();"]), line(), "}"];
//! assert_eq!(doc.to_pretty_string(), "if (ok) {\n  run();\n}");
//! assert_eq!(doc.to_flat_string(), "if (ok) {run();}");
//! ```

/// Indentation width of generated JavaScript.
pub const INDENT: isize = 2;

/// A renderable document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document<'a> {
    Str(&'a str),
    String(String),
    /// A newline followed by the current indentation. Empty when flat.
    Line,
    /// Increase indentation for nested content.
    Nest(isize, Box<Document<'a>>),
    Vec(Vec<Document<'a>>),
    /// Rendered as `broken` when pretty and `flat` when minified.
    Break { broken: &'a str, flat: &'a str },
    Nil,
}

/// Coerce a value into a `Document`.
pub trait Documentable<'a> {
    fn to_doc(self) -> Document<'a>;
}

impl<'a> Documentable<'a> for &'a str {
    fn to_doc(self) -> Document<'a> {
        Document::Str(self)
    }
}

impl<'a> Documentable<'a> for String {
    fn to_doc(self) -> Document<'a> {
        Document::String(self)
    }
}

impl<'a> Documentable<'a> for Document<'a> {
    fn to_doc(self) -> Document<'a> {
        self
    }
}

impl<'a> Documentable<'a> for Vec<Document<'a>> {
    fn to_doc(self) -> Document<'a> {
        Document::Vec(self)
    }
}

impl<'a> Documentable<'a> for usize {
    fn to_doc(self) -> Document<'a> {
        Document::String(self.to_string())
    }
}

/// Concatenates documents. Each element is converted with [`Documentable`].
///
/// ```
/// use lokascript_core::docvec;
///
/// assert_eq!(docvec!["a", " = ", 1_usize, ";"].to_pretty_string(), "a = 1;");
/// ```
#[macro_export]
macro_rules! docvec {
    () => {
        $crate::codegen::document::Document::Vec(Vec::new())
    };

    ($first:expr $(,)?) => {
        $crate::codegen::document::Document::Vec(
            vec![$crate::codegen::document::Documentable::to_doc($first)]
        )
    };

    ($first:expr, $($rest:expr),+ $(,)?) => {
        match $crate::codegen::document::Documentable::to_doc($first) {
            $crate::codegen::document::Document::Vec(mut vec) => {
                $(
                    vec.push($crate::codegen::document::Documentable::to_doc($rest));
                )*
                $crate::codegen::document::Document::Vec(vec)
            },
            first => {
                $crate::codegen::document::Document::Vec(
                    vec![first, $($crate::codegen::document::Documentable::to_doc($rest)),+]
                )
            }
        }
    };
}

#[must_use]
pub fn line() -> Document<'static> {
    Document::Line
}

#[must_use]
pub fn nest(indent: isize, doc: Document<'_>) -> Document<'_> {
    Document::Nest(indent, Box::new(doc))
}

/// A space-like separator that disappears in flat output.
#[must_use]
pub fn break_<'a>(broken: &'a str, flat: &'a str) -> Document<'a> {
    Document::Break { broken, flat }
}

/// Joins documents with a separator between each pair.
#[must_use]
pub fn join<'a>(
    docs: impl IntoIterator<Item = Document<'a>>,
    separator: &Document<'a>,
) -> Document<'a> {
    let mut result = Vec::new();
    for doc in docs {
        if !result.is_empty() {
            result.push(separator.clone());
        }
        result.push(doc);
    }
    if result.is_empty() {
        Document::Nil
    } else {
        Document::Vec(result)
    }
}

#[must_use]
pub fn concat<'a>(docs: impl IntoIterator<Item = Document<'a>>) -> Document<'a> {
    Document::Vec(docs.into_iter().collect())
}

/// A braced block: `{`, the statements one indent deeper, `}`.
#[must_use]
pub fn block<'a>(statements: impl IntoIterator<Item = Document<'a>>) -> Document<'a> {
    let body = concat(statements.into_iter().map(|s| docvec![line(), s]));
    docvec!["{", nest(INDENT, body), line(), "}"]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Flat,
    Pretty,
}

impl Document<'_> {
    /// Renders with newlines and indentation.
    #[must_use]
    pub fn to_pretty_string(&self) -> String {
        let mut output = String::new();
        self.render_to(&mut output, 0, Mode::Pretty);
        output
    }

    /// Renders without newlines or indentation.
    #[must_use]
    pub fn to_flat_string(&self) -> String {
        let mut output = String::new();
        self.render_to(&mut output, 0, Mode::Flat);
        output
    }

    fn render_to(&self, output: &mut String, indent: isize, mode: Mode) {
        match self {
            Document::Str(s) => output.push_str(s),
            Document::String(s) => output.push_str(s),
            Document::Nil => {}
            Document::Line => {
                if mode == Mode::Pretty {
                    output.push('\n');
                    write_indent(output, indent);
                }
            }
            Document::Nest(extra, doc) => {
                doc.render_to(output, indent + extra, mode);
            }
            Document::Vec(docs) => {
                for doc in docs {
                    doc.render_to(output, indent, mode);
                }
            }
            Document::Break { broken, flat } => match mode {
                Mode::Pretty => output.push_str(broken),
                Mode::Flat => output.push_str(flat),
            },
        }
    }
}

fn write_indent(output: &mut String, indent: isize) {
    for _ in 0..indent {
        output.push(' ');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_document() {
        let doc = docvec!["a", line(), "b"];
        assert_eq!(doc.to_pretty_string(), "a\nb");
        assert_eq!(doc.to_flat_string(), "ab");
    }

    #[test]
    fn nested_nest() {
        let doc = nest(
            2,
            docvec![line(), "outer", nest(2, docvec![line(), "inner"])],
        );
        assert_eq!(doc.to_pretty_string(), "\n  outer\n    inner");
    }

    #[test]
    fn docvec_macro_empty() {
        assert_eq!(docvec![].to_pretty_string(), "");
    }

    #[test]
    fn docvec_macro_mixed_types() {
        let doc = docvec!["hello ", "world".to_string(), 2_usize];
        assert_eq!(doc.to_pretty_string(), "hello world2");
    }

    #[test]
    fn docvec_flattens_leading_vec() {
        let inner = docvec!["a", "b"];
        let doc = docvec![inner, "c"];
        assert_eq!(doc.to_pretty_string(), "abc");
        let Document::Vec(v) = doc else {
            panic!("Expected Vec");
        };
        assert_eq!(v.len(), 3);
    }

    #[test]
    fn join_documents() {
        let docs = vec![Document::Str("a"), Document::Str("b"), Document::Str("c")];
        assert_eq!(join(docs, &Document::Str(", ")).to_pretty_string(), "a, b, c");
        assert_eq!(join(Vec::new(), &Document::Str(", ")), Document::Nil);
    }

    #[test]
    fn breaks_by_mode() {
        let doc = docvec!["a", break_(" ", ""), "=", break_(" ", ""), "b"];
        assert_eq!(doc.to_pretty_string(), "a = b");
        assert_eq!(doc.to_flat_string(), "a=b");
    }

    #[test]
    fn blocks() {
        let doc = docvec!["while (true) ", block(vec![docvec!["a();"], docvec!["b();"]])];
        assert_eq!(doc.to_pretty_string(), "while (true) {\n  a();\n  b();\n}");
        assert_eq!(doc.to_flat_string(), "while (true) {a();b();}");
        assert_eq!(block(Vec::new()).to_pretty_string(), "{\n}");
    }
}

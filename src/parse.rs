//! Parses a single line of line-oriented RDF-Turtle into a [`Triple`].
//!
//! Grammar (design-level, see spec §4.1): `<S> <P> O .` where `S`/`P` are
//! resource/property URIs and `O` is an instance reference, a typed or
//! language-tagged literal, or an unparsed form.
use crate::triple::{Triple, Value, ValueKind};

#[derive(Debug, PartialEq, Eq)]
pub struct ParseError {
    pub line: String,
    pub reason: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} || Error: {}", self.line, self.reason)
    }
}

/// extracts the local name after the last `resource/` segment.
pub fn extract_subject_name(subject: &str) -> &str {
    subject.rsplit("resource/").next().unwrap_or(subject)
}

/// extracts the local name after the last `property/` segment.
pub fn extract_property_name(prop: &str) -> &str {
    prop.rsplit("property/").next().unwrap_or(prop)
}

/// parses the object segment of a triple line into a `(literal, kind)` pair.
///
/// `raw` is expected to still carry the trailing ` .` turtle terminator.
pub fn extract_value(raw: &str) -> Value {
    let mut value = raw.trim_end();
    // drop the trailing ` .`
    if let Some(stripped) = value.strip_suffix('.') {
        value = stripped.trim_end();
    }

    if let Some(stripped) = value.strip_suffix('>') {
        // either an instance reference or a typed literal
        if stripped.contains("resource/") {
            let name = extract_subject_name(stripped);
            return Value {
                literal: name.to_string(),
                kind: ValueKind::Instance,
            };
        }

        if let Some(idx) = stripped.rfind("^^") {
            let (literal_part, type_part) = stripped.split_at(idx);
            let type_name = type_part[2..].rsplit('#').next().unwrap_or(type_part);
            let literal = unquote(literal_part);
            return Value {
                literal,
                kind: ValueKind::Typed(type_name.to_string()),
            };
        }

        // no resource/ and no ^^: unparsed form, keep the closing `>`
        return Value {
            literal: format!("{}>", stripped),
            kind: ValueKind::Other,
        };
    }

    // a language-tagged or bare string literal: "literal"@lang or "literal"
    let literal_part = value.split('@').next().unwrap_or(value);
    Value {
        literal: unquote(literal_part),
        kind: ValueKind::String,
    }
}

fn unquote(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

/// parses a single dump line into a [`Triple`], splitting on `"> "` per the
/// spec's tokenization rule.
pub fn parse_line(line: &str) -> Result<Triple, ParseError> {
    let parts: Vec<&str> = line.splitn(3, "> ").collect();
    if parts.len() != 3 {
        return Err(ParseError {
            line: line.to_string(),
            reason: "expected 3 `> `-separated segments".to_string(),
        });
    }

    let subject = extract_subject_name(parts[0]).to_string();
    let property = extract_property_name(parts[1]).to_string();
    let value = extract_value(parts[2]);

    if subject.is_empty() || property.is_empty() {
        return Err(ParseError {
            line: line.to_string(),
            reason: "empty subject or property local name".to_string(),
        });
    }

    Ok(Triple {
        subject,
        property,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_typed_literal() {
        let line = r#"<http://en.dbpedia.org/resource/Foo> <http://en.dbpedia.org/property/bar> "42"^^<http://www.w3.org/2001/XMLSchema#integer> ."#;
        let t = parse_line(line).unwrap();
        assert_eq!(t.subject, "Foo");
        assert_eq!(t.property, "bar");
        assert_eq!(t.value.literal, "42");
        assert_eq!(t.value.kind, ValueKind::Typed("integer".to_string()));
    }

    #[test]
    fn s2_instance_value() {
        let line =
            "<http://en.dbpedia.org/resource/A> <http://en.dbpedia.org/property/p> <http://en.dbpedia.org/resource/B> .";
        let t = parse_line(line).unwrap();
        assert_eq!(t.subject, "A");
        assert_eq!(t.property, "p");
        assert_eq!(t.value.literal, "B");
        assert_eq!(t.value.kind, ValueKind::Instance);
    }

    #[test]
    fn s3_language_tagged_literal() {
        let line =
            r#"<http://en.dbpedia.org/resource/A> <http://en.dbpedia.org/property/p> "hi"@en ."#;
        let t = parse_line(line).unwrap();
        assert_eq!(t.value.literal, "hi");
        assert_eq!(t.value.kind, ValueKind::String);
    }

    #[test]
    fn bare_string_literal_no_lang_tag() {
        let line =
            r#"<http://en.dbpedia.org/resource/A> <http://en.dbpedia.org/property/p> "plain" ."#;
        let t = parse_line(line).unwrap();
        assert_eq!(t.value.literal, "plain");
        assert_eq!(t.value.kind, ValueKind::String);
    }

    #[test]
    fn other_unparsed_form() {
        let line =
            "<http://en.dbpedia.org/resource/A> <http://en.dbpedia.org/property/p> <not-a-resource> .";
        let t = parse_line(line).unwrap();
        assert_eq!(t.value.kind, ValueKind::Other);
        assert_eq!(t.value.literal, "<not-a-resource>");
    }

    #[test]
    fn malformed_line_is_recoverable_error() {
        let line = "this line has no angle-bracket segments";
        assert!(parse_line(line).is_err());
    }
}

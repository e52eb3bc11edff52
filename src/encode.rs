//! Shared encoding utilities (spec §4.4): reconstructs RDF-conformant
//! subject/property/value strings from parsed triple components.
use crate::triple::ValueKind;

pub fn encode_subject(subject: &str, lang: &str) -> String {
    format!("<http://{}.dbpedia.org/resource/{}>", lang, subject)
}

pub fn encode_property(prop: &str, lang: &str) -> String {
    format!("<http://{}.dbpedia.org/property/{}>", lang, prop)
}

pub fn encode_value(literal: &str, kind: &ValueKind, lang: &str) -> String {
    match kind {
        ValueKind::Instance => format!("<http://{}.dbpedia.org/resource/{}>", lang, literal),
        ValueKind::String => format!("\"{}\"@{}", literal, lang),
        ValueKind::Typed(t) => format!(
            "\"{}\"^^<http://www.w3.org/2001/XMLSchema#{}>",
            literal, t
        ),
        ValueKind::Other => literal.to_string(),
    }
}

//! Inline style declarations.
//!
//! Styles live in the element's `style` attribute. [`StyleDeclaration`] parses
//! that attribute into ordered properties and writes it back in the canonical
//! `name: value;` form browsers use for `cssText`.

use std::fmt;

use cssparser::{Delimiter, ParseError, Parser, ParserInput};
use smol_str::SmolStr;

/// Ordered list of inline CSS properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleDeclaration {
    properties: Vec<(SmolStr, String)>,
}

impl StyleDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `style` attribute value.
    ///
    /// Values are kept as written. Declarations that are not `name: value`
    /// are skipped.
    pub fn parse(text: &str) -> Self {
        let mut style = Self::default();
        let mut input = ParserInput::new(text);
        let mut parser = Parser::new(&mut input);
        while !parser.is_exhausted() {
            match parser.parse_until_after(Delimiter::Semicolon, |p| declaration(p)) {
                Ok((name, value)) if !value.is_empty() => style.set(&name, &value),
                Ok(_) => {}
                Err(error) => {
                    tracing::trace!(target: "tapestry::style", ?error, "skipped style declaration");
                }
            }
        }
        style
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Set a property. An empty value removes it, like assigning `""` through CSSOM.
    pub fn set(&mut self, name: &str, value: &str) {
        if value.is_empty() {
            self.remove(name);
            return;
        }
        match self
            .properties
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value.to_string(),
            None => self
                .properties
                .push((SmolStr::new(name.to_ascii_lowercase()), value.to_string())),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self
            .properties
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))?;
        Some(self.properties.remove(index).1)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Serialize as `a: b; c: d;`.
    pub fn to_css_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for StyleDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (name, value)) in self.properties.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}: {};", name, value)?;
        }
        Ok(())
    }
}

fn declaration<'i>(parser: &mut Parser<'i, '_>) -> Result<(String, String), ParseError<'i, ()>> {
    let name = parser.expect_ident()?.to_string();
    parser.expect_colon()?;
    let start = parser.position();
    while parser.next_including_whitespace_and_comments().is_ok() {}
    Ok((name, parser.slice_from(start).trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_serialize() {
        let style = StyleDeclaration::parse("color:red;  FONT-WEIGHT : bold ;;");
        assert_eq!(style.get("color"), Some("red"));
        assert_eq!(style.get("font-weight"), Some("bold"));
        assert_eq!(style.to_css_text(), "color: red; font-weight: bold;");
    }

    #[test]
    fn test_parse_keeps_semicolons_inside_parens() {
        let style = StyleDeclaration::parse("background-image: url(a;b); color: blue");
        assert_eq!(style.get("background-image"), Some("url(a;b)"));
        assert_eq!(style.len(), 2);
    }

    #[test]
    fn test_parse_keeps_semicolons_inside_strings() {
        let style = StyleDeclaration::parse(r#"font-family: "a;b", serif; color: red"#);
        assert_eq!(style.get("font-family"), Some(r#""a;b", serif"#));
        assert_eq!(style.get("color"), Some("red"));
    }

    #[test]
    fn test_parse_skips_malformed_declarations() {
        let style = StyleDeclaration::parse("color red; 12px: x; --accent: #fff; width: 10px");
        let names: Vec<&str> = style.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["--accent", "width"]);
    }

    #[test]
    fn test_set_empty_removes() {
        let mut style = StyleDeclaration::parse("color: red");
        style.set("color", "");
        assert!(style.is_empty());
        assert_eq!(style.to_css_text(), "");
    }
}

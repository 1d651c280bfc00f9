//! The selector subset the toolkit emits: comma lists of compound selectors built from
//! tag, `#id`, `.class`, `[attr]`, and `[attr='value']`. Combinators are rejected.

use dui_core::{DuiError, DuiResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Part {
    Tag(String),
    Id(String),
    Class(String),
    Attr { name: String, value: Option<String> },
}

pub(crate) type Compound = Vec<Part>;

/// Attribute view of a node used for matching.
pub(crate) trait Matchable {
    fn tag(&self) -> &str;
    fn attribute(&self, name: &str) -> Option<String>;
    fn has_class(&self, class: &str) -> bool;
}

pub(crate) fn parse(selector: &str) -> DuiResult<Vec<Compound>> {
    selector
        .split(',')
        .map(|compound| parse_compound(compound.trim(), selector))
        .collect()
}

pub(crate) fn matches(list: &[Compound], node: &impl Matchable) -> bool {
    list.iter()
        .any(|compound| compound.iter().all(|part| part_matches(part, node)))
}

fn part_matches(part: &Part, node: &impl Matchable) -> bool {
    match part {
        Part::Tag(tag) => node.tag().eq_ignore_ascii_case(tag),
        Part::Id(id) => node.attribute("id").as_deref() == Some(id.as_str()),
        Part::Class(class) => node.has_class(class),
        Part::Attr { name, value: None } => node.attribute(name).is_some(),
        Part::Attr {
            name,
            value: Some(expected),
        } => node.attribute(name).as_deref() == Some(expected.as_str()),
    }
}

fn unsupported(selector: &str, reason: &str) -> DuiError {
    DuiError::dom("query", format!("unsupported selector '{selector}': {reason}"))
}

fn is_ident(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

fn parse_compound(compound: &str, selector: &str) -> DuiResult<Compound> {
    if compound.is_empty() {
        return Err(unsupported(selector, "empty compound"));
    }
    let chars: Vec<char> = compound.chars().collect();
    let mut parts = Vec::new();
    let mut index = 0;
    let read_ident = |start: usize| -> (String, usize) {
        let mut end = start;
        while end < chars.len() && is_ident(chars[end]) {
            end += 1;
        }
        (chars[start..end].iter().collect(), end)
    };
    while index < chars.len() {
        match chars[index] {
            '#' => {
                let (ident, end) = read_ident(index + 1);
                if ident.is_empty() {
                    return Err(unsupported(selector, "empty id"));
                }
                parts.push(Part::Id(ident));
                index = end;
            }
            '.' => {
                let (ident, end) = read_ident(index + 1);
                if ident.is_empty() {
                    return Err(unsupported(selector, "empty class"));
                }
                parts.push(Part::Class(ident));
                index = end;
            }
            '[' => {
                let close = chars[index..]
                    .iter()
                    .position(|ch| *ch == ']')
                    .ok_or_else(|| unsupported(selector, "unterminated attribute"))?;
                let body: String = chars[index + 1..index + close].iter().collect();
                parts.push(parse_attr(&body, selector)?);
                index += close + 1;
            }
            ch if is_ident(ch) && parts.is_empty() => {
                let (ident, end) = read_ident(index);
                parts.push(Part::Tag(ident));
                index = end;
            }
            _ => return Err(unsupported(selector, "combinators are not supported")),
        }
    }
    Ok(parts)
}

fn parse_attr(body: &str, selector: &str) -> DuiResult<Part> {
    match body.split_once('=') {
        None => {
            let name = body.trim();
            if name.is_empty() || !name.chars().all(is_ident) {
                return Err(unsupported(selector, "bad attribute name"));
            }
            Ok(Part::Attr {
                name: name.to_string(),
                value: None,
            })
        }
        Some((name, value)) => {
            let name = name.trim();
            if name.is_empty() || !name.chars().all(is_ident) {
                return Err(unsupported(selector, "bad attribute name"));
            }
            let value = value.trim();
            let unquoted = value
                .strip_prefix('\'')
                .and_then(|rest| rest.strip_suffix('\''))
                .or_else(|| {
                    value
                        .strip_prefix('"')
                        .and_then(|rest| rest.strip_suffix('"'))
                })
                .unwrap_or(value);
            Ok(Part::Attr {
                name: name.to_string(),
                value: Some(unquoted.to_string()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        tag: &'static str,
        id: Option<&'static str>,
        classes: &'static [&'static str],
        attrs: &'static [(&'static str, &'static str)],
    }

    impl Matchable for Probe {
        fn tag(&self) -> &str {
            self.tag
        }

        fn attribute(&self, name: &str) -> Option<String> {
            if name == "id" {
                return self.id.map(str::to_string);
            }
            self.attrs
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_string())
        }

        fn has_class(&self, class: &str) -> bool {
            self.classes.contains(&class)
        }
    }

    const TRIGGER: Probe = Probe {
        tag: "button",
        id: Some("open"),
        classes: &["btn", "scale-95"],
        attrs: &[("data-dui-toggle", "modal"), ("data-dui-icon", "")],
    };

    #[test]
    fn matches_supported_forms() -> DuiResult<()> {
        assert!(matches(&parse("[data-dui-toggle='modal']")?, &TRIGGER));
        assert!(matches(&parse("[data-dui-toggle=\"modal\"]")?, &TRIGGER));
        assert!(matches(&parse("[data-dui-icon]")?, &TRIGGER));
        assert!(matches(&parse("#open")?, &TRIGGER));
        assert!(matches(&parse("button.btn")?, &TRIGGER));
        assert!(matches(&parse(".scale-100, .scale-95")?, &TRIGGER));
        assert!(!matches(&parse("[data-dui-toggle='collapse']")?, &TRIGGER));
        Ok(())
    }

    #[test]
    fn rejects_combinators() {
        assert!(parse("div .child").is_err());
        assert!(parse("div > span").is_err());
        assert!(parse("[unterminated").is_err());
    }
}

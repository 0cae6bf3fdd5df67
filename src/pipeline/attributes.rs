//! Facet inference from free-text product names.
//!
//! Every facet owns an ordered list of rules and the first rule whose pattern
//! matches decides the value, even when a later rule would match better.
//! Facets no rule matches are reported as `Unknown`.

use crate::constants::UNKNOWN;
use crate::error::Result;
use crate::types::{Attributes, Facet};
use regex::{Captures, Regex, RegexBuilder};

/// How a matching rule turns its captures into the facet value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Render {
    /// The whole match, trimmed
    Whole,
    /// One capture group, trimmed
    Group(usize),
    /// Template where `{1}` stands for capture group 1
    Template(&'static str),
    /// Capture group with a literal substring replaced
    Replace {
        group: usize,
        from: &'static str,
        to: &'static str,
    },
}

/// Uncompiled rule, as declared in a table
#[derive(Debug, Clone, Copy)]
pub struct RuleSpec {
    pub facet: Facet,
    pub pattern: &'static str,
    pub render: Render,
}

const fn rule(facet: Facet, pattern: &'static str, render: Render) -> RuleSpec {
    RuleSpec { facet, pattern, render }
}

/// Laptop listing rules, in precedence order within each facet.
pub const LAPTOP_RULES: &[RuleSpec] = &[
    rule(
        Facet::Brand,
        r"\b(HP|Dell|Lenovo|Asus|Acer|Apple|MSI|Samsung|Toshiba)\b",
        Render::Group(1),
    ),
    rule(
        Facet::Brand,
        r"\b(Huawei|Microsoft|Razer|Gigabyte|Xiaomi|Chuwi)\b",
        Render::Group(1),
    ),
    rule(
        Facet::Model,
        r"(EliteBook|ThinkPad|Inspiron|Pavilion|IdeaPad|MacBook|Predator|ZenBook|Aspire|OMEN|ROG|Satellite)?\s?\d+\s?[A-Za-z]*",
        Render::Whole,
    ),
    rule(
        Facet::Generation,
        r"(\d+)(?:[èé]me|th)?\s?(?:GEN|GÉNÉRATION|GÉN)",
        Render::Template("{1}th Gen"),
    ),
    rule(Facet::Generation, r"\bGen\s?(\d+)\b", Render::Template("{1}th Gen")),
    rule(Facet::Processor, r"(Core\s?i[3579]|Ryzen\s?\d+)", Render::Group(1)),
    rule(Facet::Processor, r"(Core\s?Ultra\s?[3579])", Render::Group(1)),
    rule(
        Facet::Processor,
        r"(Apple\s?M[1-4](?:\s?(?:Pro|Max))?)",
        Render::Group(1),
    ),
    rule(Facet::Processor, r"\b(Celeron|Pentium|Athlon)\b", Render::Group(1)),
    rule(Facet::Memory, r"(\d+)\s?Go", Render::Template("{1}GB")),
    rule(
        Facet::Memory,
        r"(\d+)\s?GB\s?(?:RAM|LPDDR\d?|DDR\d?|Memory)",
        Render::Template("{1}GB"),
    ),
    rule(
        Facet::Storage,
        r"(\d+\s?Go\s?(SSD|HDD))",
        Render::Replace { group: 1, from: "Go", to: "GB" },
    ),
    rule(
        Facet::Storage,
        r"(\d+\s?(?:To|TB)\s?(?:SSD|HDD))",
        Render::Replace { group: 1, from: "To", to: "TB" },
    ),
    rule(Facet::Storage, r"(\d+\s?GB\s?(?:SSD|HDD|eMMC))", Render::Group(1)),
];

#[derive(Debug, Clone)]
pub struct FacetRule {
    pub pattern: Regex,
    pub render: Render,
}

impl FacetRule {
    pub fn compile(spec: &RuleSpec) -> Result<Self> {
        let pattern = RegexBuilder::new(spec.pattern).case_insensitive(true).build()?;
        Ok(Self {
            pattern,
            render: spec.render,
        })
    }

    /// `None` when the pattern does not match; otherwise the rendered value.
    pub fn apply(&self, name: &str) -> Option<String> {
        let captures = self.pattern.captures(name)?;
        Some(render(&captures, self.render))
    }
}

fn group(captures: &Captures, index: usize) -> String {
    captures
        .get(index)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

fn render(captures: &Captures, render: Render) -> String {
    match render {
        Render::Whole => group(captures, 0),
        Render::Group(index) => group(captures, index),
        Render::Template(template) => template.replace("{1}", &group(captures, 1)),
        Render::Replace { group: index, from, to } => group(captures, index).replace(from, to).trim().to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct AttributeInferencer {
    table: Vec<(Facet, Vec<FacetRule>)>,
}

impl AttributeInferencer {
    pub fn from_specs(specs: &[RuleSpec]) -> Result<Self> {
        let mut table: Vec<(Facet, Vec<FacetRule>)> =
            Facet::ALL.iter().map(|facet| (*facet, Vec::new())).collect();
        for spec in specs {
            let compiled = FacetRule::compile(spec)?;
            if let Some((_, rules)) = table.iter_mut().find(|(facet, _)| *facet == spec.facet) {
                rules.push(compiled);
            }
        }
        Ok(Self { table })
    }

    pub fn laptops() -> Result<Self> {
        Self::from_specs(LAPTOP_RULES)
    }

    pub fn rules(&self, facet: Facet) -> &[FacetRule] {
        self.table
            .iter()
            .find(|(f, _)| *f == facet)
            .map(|(_, rules)| rules.as_slice())
            .unwrap_or(&[])
    }

    /// Value of one facet: the first matching rule wins.
    pub fn infer_facet(&self, facet: Facet, name: &str) -> String {
        self.rules(facet)
            .iter()
            .find_map(|rule| rule.apply(name))
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    pub fn infer(&self, name: &str) -> Attributes {
        Facet::ALL
            .iter()
            .map(|facet| (*facet, self.infer_facet(*facet, name)))
            .collect()
    }
}

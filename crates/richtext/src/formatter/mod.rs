//! Formatter registry.

mod identifier;
mod style;

pub use identifier::FormatIdentifier;
pub use style::Formatter;

use indexmap::IndexMap;

use crate::styled::{CharacterStyle, ListStyle};
use crate::Result;

/// Read-only table from format identifiers to formatters
#[derive(Debug, Clone)]
pub struct Formatters {
    table: IndexMap<FormatIdentifier, Formatter>,
}

impl Formatters {
    /// Create the table of built-in formatters
    pub fn new() -> Self {
        Self {
            table: FormatIdentifier::ALL
                .into_iter()
                .map(|id| (id, builtin_formatter(id)))
                .collect(),
        }
    }

    /// The registered formatter for `id`.
    ///
    /// The link entry has an empty target: it checks for and removes links, while
    /// callers adding a link build `Formatter::Link(href)` themselves.
    pub fn get(&self, id: FormatIdentifier) -> &Formatter {
        // Every identifier is registered in `new`.
        &self.table[&id]
    }

    /// Look up a formatter by its identifier string, e.g. `"orderedList"`
    pub fn by_name(&self, name: &str) -> Result<&Formatter> {
        let id: FormatIdentifier = name.parse()?;
        Ok(self.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FormatIdentifier, &Formatter)> {
        self.table.iter()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for Formatters {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin_formatter(id: FormatIdentifier) -> Formatter {
    match id {
        FormatIdentifier::Bold => Formatter::Character(CharacterStyle::Bold),
        FormatIdentifier::Italic => Formatter::Character(CharacterStyle::Italic),
        FormatIdentifier::Underline => Formatter::Character(CharacterStyle::Underline),
        FormatIdentifier::Strikethrough => Formatter::Character(CharacterStyle::Strikethrough),
        FormatIdentifier::Code => Formatter::Character(CharacterStyle::Code),
        // No target is known here.
        FormatIdentifier::Link => Formatter::Link(String::new()),
        FormatIdentifier::Blockquote => Formatter::Blockquote,
        FormatIdentifier::OrderedList => Formatter::List(ListStyle::Ordered),
        FormatIdentifier::UnorderedList => Formatter::List(ListStyle::Unordered),
        FormatIdentifier::Header1 => Formatter::Header(1),
        FormatIdentifier::Header2 => Formatter::Header(2),
        FormatIdentifier::Header3 => Formatter::Header(3),
        FormatIdentifier::Header4 => Formatter::Header(4),
        FormatIdentifier::Header5 => Formatter::Header(5),
        FormatIdentifier::Header6 => Formatter::Header(6),
        FormatIdentifier::Pre => Formatter::Pre,
        FormatIdentifier::Paragraph => Formatter::Paragraph,
    }
}

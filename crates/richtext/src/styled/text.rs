//! The styled-text buffer.
//!
//! Text is stored as one `String` with attribute runs over byte ranges. Runs always
//! partition the text and neighbouring runs never carry equal attributes.

use std::ops::Range;

use super::attributes::{Attachment, Attributes, ElementSnapshot};
use crate::utilities::{LINE_SEPARATOR, PARAGRAPH_SEPARATOR};

/// Attributes applied to a byte range of the text
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub range: Range<usize>,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyledText {
    text: String,
    runs: Vec<Run>,
}

impl StyledText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer holding `text` with a single set of attributes
    pub fn with_attributes(text: &str, attributes: Attributes) -> Self {
        let mut styled = Self::new();
        styled.push(text, attributes);
        styled
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Append text with the given attributes
    pub fn push(&mut self, text: &str, attributes: Attributes) {
        if text.is_empty() {
            return;
        }
        let start = self.text.len();
        self.text.push_str(text);
        let end = self.text.len();
        match self.runs.last_mut() {
            Some(last) if last.attributes == attributes => last.range.end = end,
            _ => self.runs.push(Run {
                range: start..end,
                attributes,
            }),
        }
    }

    /// Attributes of the character starting at byte `offset`
    pub fn attributes_at(&self, offset: usize) -> &Attributes {
        assert!(
            offset < self.text.len(),
            "offset {offset} out of bounds (len {})",
            self.text.len()
        );
        let index = self.run_index(offset);
        &self.runs[index].attributes
    }

    /// Runs overlapping `range`, clipped to it
    pub fn runs_in(&self, range: Range<usize>) -> Vec<Run> {
        self.check_range(&range);
        self.runs
            .iter()
            .filter(|r| r.range.start < range.end && r.range.end > range.start)
            .map(|r| Run {
                range: r.range.start.max(range.start)..r.range.end.min(range.end),
                attributes: r.attributes.clone(),
            })
            .collect()
    }

    /// Replace the attributes of every character in `range`
    pub fn set_attributes(&mut self, range: Range<usize>, attributes: Attributes) {
        self.update_attributes(range, |a| *a = attributes.clone());
    }

    /// Modify the attributes of every character in `range` in place
    pub fn update_attributes(&mut self, range: Range<usize>, mut update: impl FnMut(&mut Attributes)) {
        self.check_range(&range);
        if range.is_empty() {
            return;
        }
        self.split_at(range.start);
        self.split_at(range.end);
        for run in &mut self.runs {
            if run.range.start >= range.start && run.range.end <= range.end {
                update(&mut run.attributes);
            }
        }
        self.coalesce();
    }

    /// Insert text at byte `offset`
    pub fn insert(&mut self, offset: usize, text: &str) {
        self.replace_range(offset..offset, text);
    }

    /// Remove the characters in `range`
    pub fn delete(&mut self, range: Range<usize>) {
        self.replace_range(range, "");
    }

    /// Replace the characters in `range` with `text`.
    ///
    /// New text takes the attributes of the character before `range` (or after it at
    /// the start of the buffer) without attachments or unsupported markup. At the start
    /// of a paragraph the paragraph properties come from that paragraph. Every run the
    /// edit touches loses its unsupported markup. Line separators in `text` become line
    /// breaks.
    pub fn replace_range(&mut self, range: Range<usize>, text: &str) {
        self.check_range(&range);

        let mut inherited = if range.start > 0 {
            self.attributes_at(self.previous_boundary(range.start)).for_typing()
        } else if range.end < self.text.len() {
            self.attributes_at(range.end).for_typing()
        } else {
            Attributes::default()
        };
        // The separator before a paragraph carries the previous paragraph's properties.
        if self.text[..range.start].ends_with(PARAGRAPH_SEPARATOR) && range.end < self.text.len() {
            inherited.paragraph = self.attributes_at(range.end).paragraph.clone();
        }

        let mut before = Vec::new();
        let mut after = Vec::new();
        let delta = text.len() as isize - range.len() as isize;
        for mut run in std::mem::take(&mut self.runs) {
            let touched = if range.is_empty() {
                run.range.start < range.start && range.start < run.range.end
            } else {
                run.range.start < range.end && run.range.end > range.start
            };
            if touched {
                run.attributes.unsupported.clear();
            }
            if run.range.start < range.start {
                before.push(Run {
                    range: run.range.start..run.range.end.min(range.start),
                    attributes: run.attributes.clone(),
                });
            }
            if run.range.end > range.end {
                let start = run.range.start.max(range.end);
                after.push(Run {
                    range: shift(start, delta)..shift(run.range.end, delta),
                    attributes: run.attributes,
                });
            }
        }

        self.text.replace_range(range.clone(), text);
        self.runs = before;
        self.push_typed(range.start, text, inherited);
        self.runs.extend(after);
        self.coalesce();
    }

    // Runs for text typed at `offset`, with a line break attachment on each line
    // separator.
    fn push_typed(&mut self, offset: usize, text: &str, attributes: Attributes) {
        let mut line_break = attributes.clone();
        line_break.attachment = Some(Attachment::LineBreak(ElementSnapshot::new("br", Vec::new())));

        let mut start = 0;
        for (i, _) in text.match_indices(LINE_SEPARATOR) {
            let end = i + LINE_SEPARATOR.len_utf8();
            if start < i {
                self.runs.push(Run {
                    range: offset + start..offset + i,
                    attributes: attributes.clone(),
                });
            }
            self.runs.push(Run {
                range: offset + i..offset + end,
                attributes: line_break.clone(),
            });
            start = end;
        }
        if start < text.len() {
            self.runs.push(Run {
                range: offset + start..offset + text.len(),
                attributes,
            });
        }
    }

    /// Expand `range` to cover whole paragraphs, including their trailing separator
    pub fn paragraph_range(&self, range: Range<usize>) -> Range<usize> {
        self.check_range(&range);
        let start = self.text[..range.start]
            .rfind(PARAGRAPH_SEPARATOR)
            .map_or(0, |i| i + 1);
        let ends_paragraph = !range.is_empty() && self.text[..range.end].ends_with(PARAGRAPH_SEPARATOR);
        let end = if ends_paragraph {
            range.end
        } else {
            self.text[range.end..]
                .find(PARAGRAPH_SEPARATOR)
                .map_or(self.text.len(), |i| range.end + i + 1)
        };
        start..end
    }

    /// Ranges of every paragraph, each including its trailing separator
    pub fn paragraph_ranges(&self) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();
        let mut start = 0;
        for (i, _) in self.text.match_indices(PARAGRAPH_SEPARATOR) {
            ranges.push(start..i + 1);
            start = i + 1;
        }
        if start < self.text.len() {
            ranges.push(start..self.text.len());
        }
        ranges
    }

    /// 1-based position of the paragraph at `offset` inside its innermost list, or `None`
    /// when the paragraph is not in a list.
    ///
    /// A paragraph starts a new item unless it and the previous paragraph are both
    /// nested deeper than the list, in which case they share one item.
    pub fn list_item_number(&self, offset: usize) -> Option<usize> {
        let paragraphs = self.paragraph_ranges();
        let position = paragraphs
            .iter()
            .position(|r| r.contains(&offset) || (r.end == offset && offset == self.text.len()))?;
        let depth_of = |index: usize| self.attributes_at(paragraphs[index].start).list_depth();

        let depth = depth_of(position);
        if depth == 0 {
            return None;
        }

        let mut first = position;
        while first > 0 && depth_of(first - 1) >= depth {
            first -= 1;
        }

        let mut number = 1;
        for index in first + 1..=position {
            if depth_of(index) == depth || depth_of(index - 1) == depth {
                number += 1;
            }
        }
        Some(number)
    }

    fn previous_boundary(&self, offset: usize) -> usize {
        let mut i = offset - 1;
        while !self.text.is_char_boundary(i) {
            i -= 1;
        }
        i
    }

    fn run_index(&self, offset: usize) -> usize {
        self.runs.partition_point(|r| r.range.end <= offset)
    }

    fn split_at(&mut self, offset: usize) {
        if offset == 0 || offset >= self.text.len() {
            return;
        }
        let index = self.run_index(offset);
        let run = &mut self.runs[index];
        if run.range.start == offset {
            return;
        }
        let tail = Run {
            range: offset..run.range.end,
            attributes: run.attributes.clone(),
        };
        run.range.end = offset;
        self.runs.insert(index + 1, tail);
    }

    fn coalesce(&mut self) {
        let mut merged: Vec<Run> = Vec::with_capacity(self.runs.len());
        for run in std::mem::take(&mut self.runs) {
            if run.range.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(last) if last.attributes == run.attributes => last.range.end = run.range.end,
                _ => merged.push(run),
            }
        }
        self.runs = merged;
    }

    fn check_range(&self, range: &Range<usize>) {
        assert!(
            range.start <= range.end && range.end <= self.text.len(),
            "range {range:?} out of bounds (len {})",
            self.text.len()
        );
        assert!(
            self.text.is_char_boundary(range.start) && self.text.is_char_boundary(range.end),
            "range {range:?} is not on char boundaries"
        );
    }
}

fn shift(offset: usize, delta: isize) -> usize {
    (offset as isize + delta) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::styled::{CharacterStyle, ElementSnapshot, ListStyle, ParagraphProperty};

    fn bold() -> Attributes {
        Attributes::new().with_style(CharacterStyle::Bold)
    }

    fn list_item(depth: usize) -> Attributes {
        let mut attributes = Attributes::new();
        for _ in 0..depth {
            attributes.paragraph.push(ParagraphProperty::TextList {
                style: ListStyle::Ordered,
                representation: None,
            });
            attributes.paragraph.push(ParagraphProperty::HtmlLi(None));
        }
        attributes
    }

    #[test]
    fn test_push_coalesces() {
        let mut text = StyledText::new();
        text.push("Hello ", Attributes::new());
        text.push("big ", bold());
        text.push("world", bold());
        assert_eq!(text.as_str(), "Hello big world");
        assert_eq!(text.runs().len(), 2);
        assert_eq!(text.runs()[1].range, 6..15);
    }

    #[test]
    fn test_update_attributes_splits_runs() {
        let mut text = StyledText::with_attributes("Hello world", Attributes::new());
        text.update_attributes(6..11, |a| a.add_style(CharacterStyle::Italic, None));
        assert_eq!(text.runs().len(), 2);
        assert!(text.attributes_at(6).has_style(CharacterStyle::Italic));
        assert!(!text.attributes_at(5).has_style(CharacterStyle::Italic));

        text.update_attributes(0..11, |a| a.remove_style(CharacterStyle::Italic));
        assert_eq!(text.runs().len(), 1);
    }

    #[test]
    fn test_insert_inherits_previous_attributes() {
        let mut text = StyledText::new();
        text.push("ab", bold());
        text.push("cd", Attributes::new());
        text.insert(2, "X");
        assert_eq!(text.as_str(), "abXcd");
        assert!(text.attributes_at(2).has_style(CharacterStyle::Bold));
        assert_eq!(text.runs()[0].range, 0..3);

        text.insert(0, "Y");
        assert!(text.attributes_at(0).has_style(CharacterStyle::Bold));
    }

    #[test]
    fn test_insert_at_paragraph_start_keeps_its_properties() {
        let mut text = StyledText::new();
        text.push("a\n", Attributes::new());
        text.push("b", list_item(1));
        text.insert(2, "X");
        assert_eq!(text.as_str(), "a\nXb");
        assert_eq!(text.attributes_at(2), &list_item(1));
        assert!(text.attributes_at(1).paragraph.is_empty());

        // An empty paragraph is its own separator.
        let mut text = StyledText::new();
        text.push("a\n", Attributes::new());
        text.push("\n", list_item(2));
        text.push("b", Attributes::new());
        text.insert(2, "X");
        assert_eq!(text.attributes_at(2), &list_item(2));
    }

    #[test]
    fn test_typed_line_separator_is_a_line_break() {
        let mut text = StyledText::with_attributes("ab", bold());
        text.insert(1, "x\u{2028}y");
        assert_eq!(text.as_str(), "ax\u{2028}yb");
        assert!(text.attributes_at(1).attachment.is_none());
        assert_eq!(
            text.attributes_at(2).attachment,
            Some(Attachment::LineBreak(ElementSnapshot::new("br", Vec::new())))
        );
        assert!(text.attributes_at(2).has_style(CharacterStyle::Bold));
        assert!(text.attributes_at(5).attachment.is_none());
        assert_eq!(text.runs().len(), 3);
    }

    #[test]
    fn test_delete_shifts_runs() {
        let mut text = StyledText::new();
        text.push("abc", Attributes::new());
        text.push("def", bold());
        text.delete(1..4);
        assert_eq!(text.as_str(), "aef");
        assert_eq!(text.runs()[0].range, 0..1);
        assert_eq!(text.runs()[1].range, 1..3);

        text.delete(0..1);
        assert_eq!(text.runs().len(), 1);
        assert_eq!(text.runs()[0].range, 0..2);
    }

    #[test]
    fn test_edit_discards_unsupported_html() {
        let mut span = Attributes::new();
        span.unsupported.push(ElementSnapshot::new("span", vec![]));
        let mut text = StyledText::new();
        text.push("keep ", span.clone());
        text.push("plain ", Attributes::new());
        text.push("edit", span);

        text.insert(text.len() - 1, "!");
        assert_eq!(text.attributes_at(0).unsupported.len(), 1);
        assert!(text.attributes_at(text.len() - 1).unsupported.is_empty());
    }

    #[test]
    fn test_unicode_offsets() {
        let mut text = StyledText::with_attributes("caf\u{e9}", Attributes::new());
        text.insert(5, "!");
        assert_eq!(text.as_str(), "caf\u{e9}!");
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_out_of_bounds_range_panics() {
        let mut text = StyledText::with_attributes("abc", Attributes::new());
        text.delete(2..5);
    }

    #[test]
    #[should_panic(expected = "char boundaries")]
    fn test_non_boundary_range_panics() {
        let mut text = StyledText::with_attributes("\u{e9}", Attributes::new());
        text.delete(0..1);
    }

    #[test]
    fn test_paragraph_ranges() {
        let text = StyledText::with_attributes("one\ntwo\n\nthree", Attributes::new());
        assert_eq!(text.paragraph_ranges(), vec![0..4, 4..8, 8..9, 9..14]);
        assert_eq!(text.paragraph_range(5..6), 4..8);
        assert_eq!(text.paragraph_range(4..8), 4..8);
        assert_eq!(text.paragraph_range(2..10), 0..14);
        assert_eq!(text.paragraph_range(14..14), 9..14);
    }

    #[test]
    fn test_list_item_number() {
        let mut text = StyledText::new();
        text.push("First\n", list_item(1));
        text.push("Second\n", list_item(2));
        text.push("Third\n", list_item(1));
        text.push("Plain", Attributes::new());

        assert_eq!(text.list_item_number(0), Some(1));
        assert_eq!(text.list_item_number(6), Some(1));
        assert_eq!(text.list_item_number(13), Some(3));
        assert_eq!(text.list_item_number(20), None);
    }
}

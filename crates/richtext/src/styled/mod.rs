//! Styled text: a flat character buffer annotated with runs of formatting metadata.

mod attributes;
mod text;

pub use attributes::{
    Attachment, Attributes, CharacterStyle, ElementSnapshot, HtmlRepresentation, Link,
    ListStyle, ParagraphProperty,
};
pub use text::{Run, StyledText};

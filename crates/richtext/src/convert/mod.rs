//! Conversion between node trees and styled text.

mod to_dom;
mod to_styled;

pub use to_dom::to_dom;
pub use to_styled::to_styled_text;

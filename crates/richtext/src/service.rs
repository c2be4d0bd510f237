//! RichTextService - the main entry point for HTML ⇄ styled text conversion.

use std::sync::Arc;

use log::debug;
use richtext_core::{serialize, Document, SerializeOptions};

use crate::convert;
use crate::formatter::Formatters;
use crate::parser;
use crate::processors::{
    CaptionShortcodeInputProcessor, CaptionShortcodeOutputProcessor, HtmlProcessor, ParagraphRestorer,
    Shortcode, ShortcodeProcessor, TreeProcessor,
};
use crate::styled::{Attributes, StyledText};
use crate::Result;

/// Options for the converters
#[derive(Debug, Clone)]
pub struct ConverterOptions {
    /// Attributes every converted run starts from
    pub default_attributes: Attributes,

    /// Character written into an extra paragraph when the text ends with a paragraph
    /// separator, so that the empty last line survives as markup. Usually
    /// [`ZERO_WIDTH_SPACE`](crate::ZERO_WIDTH_SPACE).
    pub trailing_empty_line_replacement: Option<char>,

    /// Wrap loose root-level text in paragraphs before converting
    pub restore_paragraphs: bool,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            default_attributes: Attributes::default(),
            trailing_empty_line_replacement: None,
            restore_paragraphs: false,
        }
    }
}

/// The main service for converting HTML to styled text and back
pub struct RichTextService {
    options: ConverterOptions,
    formatters: Formatters,
    html_pre_processors: Vec<Box<dyn HtmlProcessor>>,
    html_post_processors: Vec<Box<dyn HtmlProcessor>>,
    tree_processors: Vec<Box<dyn TreeProcessor>>,
}

impl RichTextService {
    /// Create a RichTextService with default options
    pub fn new() -> Self {
        Self::with_options(ConverterOptions::default())
    }

    /// Create a RichTextService with custom options
    pub fn with_options(options: ConverterOptions) -> Self {
        Self {
            options,
            formatters: Formatters::new(),
            html_pre_processors: Vec::new(),
            html_post_processors: Vec::new(),
            tree_processors: Vec::new(),
        }
    }

    /// Parse HTML into a document. Never fails.
    pub fn parse_html(&self, html: &str) -> Document {
        parser::parse_html(html)
    }

    /// Serialize a document, optionally pretty printed
    pub fn serialize_html(&self, document: &Document, prettify: bool) -> String {
        let options = if prettify {
            SerializeOptions::pretty()
        } else {
            SerializeOptions::default()
        };
        serialize(document, &options)
    }

    pub fn to_styled_text(&self, document: &Document) -> StyledText {
        convert::to_styled_text(document, &self.options)
    }

    pub fn to_dom(&self, text: &StyledText) -> Document {
        convert::to_dom(text, &self.options)
    }

    /// Run the HTML pre-processors, parse, run the tree processors and convert
    pub fn html_to_styled_text(&self, html: &str) -> StyledText {
        let html = run_html_processors(&self.html_pre_processors, html);
        let mut document = parser::parse_html(&html);
        if self.options.restore_paragraphs {
            ParagraphRestorer::new().process(&mut document);
        }
        self.run_tree_processors(&mut document);
        self.to_styled_text(&document)
    }

    /// Convert, run the tree processors, serialize and run the HTML post-processors
    pub fn styled_text_to_html(&self, text: &StyledText, prettify: bool) -> String {
        let mut document = self.to_dom(text);
        self.run_tree_processors(&mut document);
        let html = self.serialize_html(&document, prettify);
        run_html_processors(&self.html_post_processors, &html)
    }

    /// The read-only formatter registry
    pub fn formatters(&self) -> &Formatters {
        &self.formatters
    }

    /// Rewrite a shortcode before parsing and again after serialization, for
    /// shortcodes that reach the output. Occurrences the rewriter returns `None` for
    /// are kept as text.
    pub fn register_shortcode<F>(&mut self, tag: &str, rewriter: F) -> Result<&mut Self>
    where
        F: Fn(&Shortcode) -> Option<String> + Send + Sync + 'static,
    {
        let rewriter = Arc::new(rewriter);
        let input = {
            let rewriter = Arc::clone(&rewriter);
            ShortcodeProcessor::new(tag, move |shortcode| rewriter(shortcode))?
        };
        let output = ShortcodeProcessor::new(tag, move |shortcode| rewriter(shortcode))?;
        Ok(self.add_html_pre_processor(input).add_html_post_processor(output))
    }

    /// Add a tree processor. It runs on parsed documents and on converted ones before
    /// serialization.
    pub fn add_tree_processor<P>(&mut self, processor: P) -> &mut Self
    where
        P: TreeProcessor + 'static,
    {
        self.tree_processors.push(Box::new(processor));
        self
    }

    pub fn add_html_pre_processor<P>(&mut self, processor: P) -> &mut Self
    where
        P: HtmlProcessor + 'static,
    {
        self.html_pre_processors.push(Box::new(processor));
        self
    }

    pub fn add_html_post_processor<P>(&mut self, processor: P) -> &mut Self
    where
        P: HtmlProcessor + 'static,
    {
        self.html_post_processors.push(Box::new(processor));
        self
    }

    /// Apply a plugin
    pub fn use_plugin<F>(&mut self, plugin: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        plugin(self)?;
        Ok(self)
    }

    /// Get the current options
    pub fn options(&self) -> &ConverterOptions {
        &self.options
    }

    /// Get mutable access to options
    pub fn options_mut(&mut self) -> &mut ConverterOptions {
        &mut self.options
    }

    fn run_tree_processors(&self, document: &mut Document) {
        for processor in &self.tree_processors {
            processor.process(document);
        }
    }
}

impl Default for RichTextService {
    fn default() -> Self {
        Self::new()
    }
}

fn run_html_processors(processors: &[Box<dyn HtmlProcessor>], html: &str) -> String {
    let mut html = html.to_string();
    for processor in processors {
        let processed = processor.process(&html);
        if processed != html {
            debug!("html processor rewrote {} bytes into {}", html.len(), processed.len());
            html = processed;
        }
    }
    html
}

/// Plugin keeping `[caption]` shortcodes as `<div data-shortcode="caption">` while editing
pub fn caption_shortcodes(service: &mut RichTextService) -> Result<()> {
    service
        .add_html_pre_processor(CaptionShortcodeInputProcessor::new()?)
        .add_html_post_processor(CaptionShortcodeOutputProcessor::new());
    Ok(())
}

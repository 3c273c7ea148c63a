//! Provider-neutral request and response shapes for multi-part image models.

use crate::imaging::DataUri;

/// One part of a multi-part prompt or response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    InlineImage(DataUri),
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text(text.into())
    }

    pub fn image(image: DataUri) -> Self {
        ContentPart::InlineImage(image)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text(text) => Some(text),
            ContentPart::InlineImage(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&DataUri> {
        match self {
            ContentPart::InlineImage(image) => Some(image),
            ContentPart::Text(_) => None,
        }
    }
}

/// An ordered list of parts sent as a single user turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentRequest {
    pub parts: Vec<ContentPart>,
}

impl ContentRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(ContentPart::text(text));
        self
    }

    pub fn with_image(mut self, image: DataUri) -> Self {
        self.parts.push(ContentPart::image(image));
        self
    }

    pub fn image_count(&self) -> usize {
        self.parts.iter().filter(|p| p.as_image().is_some()).count()
    }
}

/// Parts of the first candidate returned by the model, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelResponse {
    pub parts: Vec<ContentPart>,
}

impl ModelResponse {
    pub fn new(parts: Vec<ContentPart>) -> Self {
        Self { parts }
    }

    /// The first inline image, in response order.
    pub fn first_image(&self) -> Option<&DataUri> {
        self.parts.iter().find_map(ContentPart::as_image)
    }

    /// All text parts concatenated.
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(ContentPart::as_text).collect()
    }
}

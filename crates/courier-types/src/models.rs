/// An inbound message that has passed request validation.
///
/// The handler only constructs one of these for a non-empty `message` field,
/// so downstream code can assume `content` is never empty. The content is
/// carried verbatim: it is what gets published and what gets stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub content: String,
}

impl InboundMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

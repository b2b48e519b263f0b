//! The closed-element view handed to callers
//!
//! A `ClosedElement` is a reusable slot: the reader fills it, the caller reads
//! it, and the next `clear()` keeps the allocations for the following element.
//! Strings are recycled in place so steady-state streaming does not allocate.

/// A direct child of a record-level element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildElement {
    tag: String,
    text: String,
}

impl ChildElement {
    /// Child tag name
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Concatenated text of the child and all its descendants
    pub fn text(&self) -> &str {
        &self.text
    }

    fn reset(&mut self, tag: &str) {
        self.tag.clear();
        self.tag.push_str(tag);
        self.text.clear();
    }

    fn capacity(&self) -> usize {
        self.tag.capacity() + self.text.capacity()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Attribute {
    name: String,
    value: String,
}

/// A completed record-level element
///
/// Borrowed from the [`StreamReader`](crate::StreamReader); valid until the
/// next call to `next_element()` or `release()`.
#[derive(Debug, Clone, Default)]
pub struct ClosedElement {
    tag: String,
    position: u64,
    attributes: Vec<Attribute>,
    attribute_len: usize,
    children: Vec<ChildElement>,
    child_len: usize,
}

impl ClosedElement {
    /// Element tag name
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Byte offset where the element started
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Value of a single attribute
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes[..self.attribute_len]
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// All attributes in document order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes[..self.attribute_len]
            .iter()
            .map(|a| (a.name.as_str(), a.value.as_str()))
    }

    /// Direct children in document order
    pub fn children(&self) -> &[ChildElement] {
        &self.children[..self.child_len]
    }

    /// Text of the first child with `tag`
    pub fn child_text(&self, tag: &str) -> Option<&str> {
        self.children().iter().find(|c| c.tag == tag).map(|c| c.text())
    }

    /// Whether the slot currently holds an element
    pub fn is_empty(&self) -> bool {
        self.tag.is_empty()
    }

    /// Heap bytes currently reserved by the slot
    pub fn retained_bytes(&self) -> usize {
        self.tag.capacity()
            + self
                .attributes
                .iter()
                .map(|a| a.name.capacity() + a.value.capacity())
                .sum::<usize>()
            + self.attributes.capacity() * std::mem::size_of::<Attribute>()
            + self.children.iter().map(ChildElement::capacity).sum::<usize>()
            + self.children.capacity() * std::mem::size_of::<ChildElement>()
    }

    pub(crate) fn begin(&mut self, tag: &str, position: u64) {
        self.clear();
        self.tag.push_str(tag);
        self.position = position;
    }

    pub(crate) fn push_attribute(&mut self, name: &str, value: &str) {
        if self.attribute_len == self.attributes.len() {
            self.attributes.push(Attribute::default());
        }
        let slot = &mut self.attributes[self.attribute_len];
        slot.name.clear();
        slot.name.push_str(name);
        slot.value.clear();
        slot.value.push_str(value);
        self.attribute_len += 1;
    }

    pub(crate) fn begin_child(&mut self, tag: &str) {
        if self.child_len == self.children.len() {
            self.children.push(ChildElement::default());
        }
        self.children[self.child_len].reset(tag);
        self.child_len += 1;
    }

    /// Append text to the most recently opened child
    pub(crate) fn push_child_text(&mut self, text: &str) {
        if let Some(child) = self.children[..self.child_len].last_mut() {
            child.text.push_str(text);
        }
    }

    /// Forget the current element, keeping allocations for reuse
    pub(crate) fn clear(&mut self) {
        self.tag.clear();
        self.position = 0;
        self.attribute_len = 0;
        self.child_len = 0;
    }

    /// Drop every allocation
    pub(crate) fn shrink(&mut self) {
        *self = Self::default();
    }
}

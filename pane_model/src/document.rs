//! Documents collect the models of one rendering session and turn server-side changes
//! into wire-protocol patches.

use crate::{model::Model, object::ObjectId};
use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard, RwLock};
use serde::{ser::SerializeStruct, Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::{
    fmt,
    sync::{Arc, Weak},
};
use xxhash_rust::xxh3::xxh3_64;

/// The serialized content of a patch that carries no events.
pub const EMPTY_CONTENT: &str = "{}";

/// A reference to a model as it appears on the wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelRef(pub ObjectId);

impl Serialize for ModelRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ModelRef", 1)?;
        state.serialize_field("id", &format!("p{}", self.0))?;
        state.end()
    }
}

/// A queued change to the document, in the order it happened.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum DocumentEvent {
    ModelChanged {
        model: ModelRef,
        attr: String,
        new: Value,
    },
    RootAdded {
        model: ModelRef,
    },
    RootRemoved {
        model: ModelRef,
    },
}

impl DocumentEvent {
    /// The model the event originated from.
    pub fn model_id(&self) -> ObjectId {
        match self {
            DocumentEvent::ModelChanged { model, .. }
            | DocumentEvent::RootAdded { model }
            | DocumentEvent::RootRemoved { model } => model.0,
        }
    }
}

#[derive(Serialize)]
struct PatchContent<'a> {
    events: &'a [DocumentEvent],
}

/// A captured document diff: `{header, metadata, content}`, each already serialized.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatchMessage {
    pub header: String,
    pub metadata: String,
    pub content: String,
}

impl PatchMessage {
    /// The patch for "nothing changed".
    pub fn empty() -> Self {
        Self::from_content(EMPTY_CONTENT.to_string())
    }

    pub fn from_events(events: &[DocumentEvent]) -> Result<Self, serde_json::Error> {
        if events.is_empty() {
            return Ok(Self::empty());
        }
        let content = serde_json::to_string(&PatchContent { events })?;
        Ok(Self::from_content(content))
    }

    fn from_content(content: String) -> Self {
        // derived from the content so that identical diffs serialize identically
        let header = format!(
            r#"{{"msgid":"{:016x}","msgtype":"PATCH-DOC"}}"#,
            xxh3_64(content.as_bytes())
        );
        Self {
            header,
            metadata: EMPTY_CONTENT.to_string(),
            content,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content == EMPTY_CONTENT
    }
}

/// The model tree of one rendering session.
#[derive(Clone)]
pub struct Document(Arc<DocumentInner>);

struct DocumentInner {
    id: ObjectId,
    roots: RwLock<Vec<Model>>,
    events: Mutex<Vec<DocumentEvent>>,
    hold: ReentrantMutex<()>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self(Arc::new(DocumentInner {
            id: ObjectId::next(),
            roots: RwLock::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            hold: ReentrantMutex::new(()),
        }))
    }

    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    /// Adds a root model, attaching its whole tree to this document.
    pub fn add_root(&self, model: &Model) {
        self.0.roots.write().push(model.clone());
        model.attach_document(self);
        self.push_event(DocumentEvent::RootAdded {
            model: ModelRef(model.id()),
        });
    }

    /// Removes a root model, returning whether it was one.
    pub fn remove_root(&self, model: &Model) -> bool {
        let removed = {
            let mut roots = self.0.roots.write();
            let before = roots.len();
            roots.retain(|root| root != model);
            roots.len() != before
        };
        if removed {
            self.push_event(DocumentEvent::RootRemoved {
                model: ModelRef(model.id()),
            });
        }
        removed
    }

    pub fn roots(&self) -> Vec<Model> {
        self.0.roots.read().clone()
    }

    pub fn get_model_by_id(&self, id: ObjectId) -> Option<Model> {
        self.roots()
            .iter()
            .flat_map(Model::descendants)
            .find(|model| model.id() == id)
    }

    /// Enters the document's serialization scope.
    ///
    /// All mutation that should end up in a single consistent diff happens while the
    /// returned guard is alive. The scope is re-entrant on the same thread.
    pub fn hold(&self) -> ReentrantMutexGuard<'_, ()> {
        self.0.hold.lock()
    }

    pub(crate) fn push_event(&self, event: DocumentEvent) {
        self.0.events.lock().push(event);
    }

    pub fn events(&self) -> Vec<DocumentEvent> {
        self.0.events.lock().clone()
    }

    pub fn clear_events(&self) {
        self.0.events.lock().clear();
    }

    /// Drops every queued event for which `keep` returns `false`.
    pub fn retain_events(&self, keep: impl FnMut(&DocumentEvent) -> bool) {
        self.0.events.lock().retain(keep);
    }

    /// Swaps the queued events for `events`, returning the previous queue.
    pub fn replace_events(&self, events: Vec<DocumentEvent>) -> Vec<DocumentEvent> {
        std::mem::replace(&mut *self.0.events.lock(), events)
    }

    /// Drains the queued events into a patch.
    pub fn diff(&self) -> Result<PatchMessage, serde_json::Error> {
        let events = std::mem::take(&mut *self.0.events.lock());
        PatchMessage::from_events(&events)
    }

    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument(Arc::downgrade(&self.0))
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Document {}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.0.id)
            .field("roots", &self.0.roots.read().len())
            .finish()
    }
}

#[derive(Clone)]
pub struct WeakDocument(Weak<DocumentInner>);

impl WeakDocument {
    pub fn upgrade(&self) -> Option<Document> {
        self.0.upgrade().map(Document)
    }
}

#[cfg(test)]
mod tests {
    use super::{Document, PatchMessage, EMPTY_CONTENT};
    use crate::model::Model;
    use serde_json::json;

    #[test]
    fn empty_diff_is_canonical() {
        let document = Document::new();
        let diff = document.diff().unwrap();
        assert!(diff.is_empty());
        assert_eq!(diff.content, EMPTY_CONTENT);
        assert_eq!(diff.metadata, "{}");
        assert_eq!(diff, PatchMessage::empty());
    }

    #[test]
    fn diff_serializes_and_drains_events() {
        let document = Document::new();
        let div = Model::new("Div").with_property("text", json!(""));
        document.add_root(&div);
        document.clear_events();

        div.set("text", json!("<b>A</b>")).unwrap();
        let diff = document.diff().unwrap();
        assert_eq!(
            diff.content,
            format!(
                r#"{{"events":[{{"kind":"ModelChanged","model":{{"id":"p{}"}},"attr":"text","new":"<b>A</b>"}}]}}"#,
                div.id()
            )
        );
        assert!(diff.header.contains(r#""msgtype":"PATCH-DOC""#));
        assert!(document.diff().unwrap().is_empty());
    }

    #[test]
    fn identical_content_has_identical_header() {
        let document = Document::new();
        let div = Model::new("Div").with_property("text", json!(""));
        document.add_root(&div);
        document.clear_events();

        div.set("text", json!("x")).unwrap();
        let first = document.diff().unwrap();
        div.set("text", json!("")).unwrap();
        document.clear_events();
        div.set("text", json!("x")).unwrap();
        let second = document.diff().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn events_can_be_filtered_by_model() {
        let document = Document::new();
        let a = Model::new("Div").with_property("text", json!(""));
        let b = Model::new("Div").with_property("text", json!(""));
        document.add_root(&a);
        document.add_root(&b);
        document.clear_events();

        a.set("text", json!("a")).unwrap();
        b.set("text", json!("b")).unwrap();
        document.retain_events(|event| event.model_id() != a.id());
        let events = document.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].model_id(), b.id());
    }

    #[test]
    fn queued_events_can_be_set_aside() {
        let document = Document::new();
        let div = Model::new("Div").with_property("text", json!(""));
        document.add_root(&div);

        let baseline = document.replace_events(Vec::new());
        assert_eq!(baseline.len(), 1);
        div.set("text", json!("x")).unwrap();
        let during = document.replace_events(baseline);
        assert_eq!(during.len(), 1);
        assert_eq!(document.events().len(), 1);
    }

    #[test]
    fn roots_can_be_removed() {
        let document = Document::new();
        let div = Model::new("Div");
        document.add_root(&div);
        document.clear_events();

        assert!(document.remove_root(&div));
        assert!(!document.remove_root(&div));
        assert!(document.roots().is_empty());
        assert_eq!(document.events().len(), 1);
        assert_eq!(document.events()[0].model_id(), div.id());
    }

    #[test]
    fn hold_is_reentrant() {
        let document = Document::new();
        let _outer = document.hold();
        let _inner = document.hold();
    }
}

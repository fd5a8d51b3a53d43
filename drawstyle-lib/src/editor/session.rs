//! The editing session of one drawing: what is selected and how edits are
//! committed to the stylesheet.

use std::fmt;
use std::rc::Rc;

use log::{debug, info, warn};

use crate::editor::controls::EditValues;
use crate::editor::synthesis::{display_label, final_selector, insert_rule_in_category, Insertion};
use crate::error::StyleError;
use crate::picker::{classify, CandidateKind, Classification, ElementView, IgnoreReason};
use crate::style::locator::{locate, resolve, Resolution};
use crate::style::model::StyleModel;
use crate::style::stylesheet::{Rule, RuleHandle, Stylesheet};
use crate::style::validate::validate_selector;

pub const TITLE_IDLE: &str = "Click on an element to edit its style.";
pub const TITLE_DEFAULT_TEXT: &str = "Uses default text styling";
pub const TITLE_NOT_LOADED: &str = "Stylesheet not loaded correctly";

/// What the next commit writes to. Never both a rule and a new selector.
#[derive(Debug, Clone, Default)]
pub enum PendingSelection {
    #[default]
    None,
    /// Bound to a rule of the current stylesheet generation.
    Existing(RuleHandle),
    /// A rule that will be created under this selector.
    New(String),
}

impl PendingSelection {
    pub fn rule(&self) -> Option<&RuleHandle> {
        match self {
            PendingSelection::Existing(rule) => Some(rule),
            _ => None,
        }
    }

    pub fn new_selector(&self) -> Option<&str> {
        match self {
            PendingSelection::New(selector) => Some(selector),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, PendingSelection::None)
    }
}

/// Which editor owns the shared controls.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditorMode {
    #[default]
    Css,
    /// Editing the parts of the symbol definition `id`.
    Symbol { id: String },
}

/// Notification sent to listeners whenever the selection changes.
#[derive(Debug, Clone)]
pub enum SelectionChanged {
    Existing(RuleHandle),
    New(String),
    Cleared,
}

/// Result of handling one click.
#[derive(Debug, Clone)]
pub enum PickOutcome {
    /// Nothing changed.
    Ignored(IgnoreReason),
    /// The session switched to symbol editing for this definition.
    Symbol { id: String },
    /// Unclassed text; the selection was cleared.
    DefaultText,
    /// Nothing resolvable was hit; the selection was cleared.
    NoSelector,
    /// The stylesheet has no rules to search; the selection was cleared.
    NotLoaded,
    Bound(RuleHandle),
    /// A new rule is pending. `fallback` supplied the starting values, if any.
    PendingNew {
        selector: String,
        fallback: Option<RuleHandle>,
    },
}

/// Outcome of a commit.
#[derive(Debug, Clone)]
pub struct CommitResult {
    /// The rule the session is bound to after the commit.
    pub rule: RuleHandle,
    /// Serialized stylesheet after the commit.
    pub css: String,
    /// Set when the commit created a rule.
    pub insertion: Option<Insertion>,
}

type Listener = Box<dyn FnMut(&SelectionChanged)>;

/// Owns the stylesheet model and the selection made on top of it.
pub struct EditorSession {
    model: StyleModel,
    selection: PendingSelection,
    mode: EditorMode,
    values: EditValues,
    title: String,
    read_only: bool,
    listeners: Vec<Listener>,
}

impl fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorSession")
            .field("selection", &self.selection)
            .field("mode", &self.mode)
            .field("title", &self.title)
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}

impl EditorSession {
    pub fn new(model: StyleModel) -> Self {
        EditorSession {
            model,
            selection: PendingSelection::None,
            mode: EditorMode::Css,
            values: EditValues::defaults_for(""),
            title: TITLE_IDLE.to_owned(),
            read_only: false,
            listeners: Vec::new(),
        }
    }

    pub fn model(&self) -> &StyleModel {
        &self.model
    }

    pub fn sheet(&self) -> &Stylesheet {
        self.model.sheet()
    }

    pub fn css(&self) -> &str {
        self.model.text()
    }

    pub fn selection(&self) -> &PendingSelection {
        &self.selection
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn values(&self) -> &EditValues {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut EditValues {
        &mut self.values
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        if read_only {
            warn!("stylesheet is read-only until it is saved");
        }
        self.read_only = read_only;
    }

    /// Registers a selection-changed listener.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&SelectionChanged) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Replaces the stylesheet text wholesale. The selection is dropped since
    /// its rule belongs to the old generation.
    pub fn replace_text(&mut self, css: impl Into<String>) {
        self.model.set_text(css);
        self.clear_selection(TITLE_IDLE);
    }

    fn notify(&mut self, event: SelectionChanged) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    pub(crate) fn bind(&mut self, rule: RuleHandle, values: EditValues) {
        self.title = rule.borrow().selector();
        self.values = values;
        self.selection = PendingSelection::Existing(Rc::clone(&rule));
        self.notify(SelectionChanged::Existing(rule));
    }

    pub(crate) fn set_pending(&mut self, selector: String, title: String, values: EditValues) {
        self.title = title;
        self.values = values;
        self.selection = PendingSelection::New(selector.clone());
        self.notify(SelectionChanged::New(selector));
    }

    pub(crate) fn clear_selection(&mut self, title: &str) {
        self.title = title.to_owned();
        self.values = EditValues::defaults_for("");
        let was_set = !self.selection.is_none();
        self.selection = PendingSelection::None;
        if was_set {
            self.notify(SelectionChanged::Cleared);
        }
    }

    /// Switches the shared controls to `mode`, dropping the other editor's selection.
    pub(crate) fn switch_mode(&mut self, mode: EditorMode) {
        if self.mode != mode {
            debug!("editor mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
            if !self.selection.is_none() {
                self.selection = PendingSelection::None;
                self.notify(SelectionChanged::Cleared);
            }
        }
    }

    /// Handles a click on `clicked`.
    ///
    /// # Arguments
    ///
    /// * `clicked` - The element the click landed on.
    ///
    /// # Returns
    ///
    /// A [`PickOutcome`]. Unless the click was ignored, the selection and the
    /// edit values are updated before this returns.
    pub fn pick<E: ElementView>(&mut self, clicked: &E) -> PickOutcome {
        let classification = classify(clicked);
        if !matches!(
            classification,
            Classification::Symbol { .. } | Classification::Ignored(IgnoreReason::Space)
        ) {
            self.switch_mode(EditorMode::Css);
        }

        match classification {
            Classification::Ignored(IgnoreReason::Space) => PickOutcome::Ignored(IgnoreReason::Space),
            Classification::Symbol { id } => {
                self.clear_selection(&format!("Editing Symbol: #{id}"));
                self.switch_mode(EditorMode::Symbol { id: id.clone() });
                self.values = EditValues::symbol_from_rule(None);
                PickOutcome::Symbol { id }
            }
            _ if !self.model.is_loaded() => {
                warn!("click while no stylesheet is loaded");
                self.clear_selection(TITLE_NOT_LOADED);
                PickOutcome::NotLoaded
            }
            Classification::Ignored(reason) => PickOutcome::Ignored(reason),
            Classification::DefaultText => {
                self.clear_selection(TITLE_DEFAULT_TEXT);
                PickOutcome::DefaultText
            }
            Classification::NoSelector => {
                self.clear_selection(TITLE_IDLE);
                PickOutcome::NoSelector
            }
            Classification::Candidates { ideal, priority, kind } => match kind {
                CandidateKind::PlainText => self.resolve_text(ideal, &priority),
                CandidateKind::Shape => self.resolve_shape(ideal, &priority),
            },
        }
    }

    fn resolve_text(&mut self, ideal: String, priority: &[String]) -> PickOutcome {
        match locate(self.model.index(), priority) {
            Some(rule) => {
                let values = EditValues::from_rule(&rule.borrow());
                self.bind(Rc::clone(&rule), values);
                PickOutcome::Bound(rule)
            }
            None => {
                let values = EditValues::defaults_for(&ideal);
                self.set_pending(ideal.clone(), format!("Create rule for: {ideal}"), values);
                PickOutcome::PendingNew {
                    selector: ideal,
                    fallback: None,
                }
            }
        }
    }

    fn resolve_shape(&mut self, ideal: String, priority: &[String]) -> PickOutcome {
        let label = display_label(&ideal);
        let title = format!("Create rule for: {label}");
        match resolve(self.model.index(), &ideal, priority) {
            Resolution::Perfect(rule) => {
                let values = EditValues::from_rule(&rule.borrow());
                self.bind(Rc::clone(&rule), values);
                PickOutcome::Bound(rule)
            }
            Resolution::Fallback(rule) => {
                debug!("`{ideal}` falls back to `{}`", rule.borrow().selector());
                let values = EditValues::from_rule(&rule.borrow());
                self.set_pending(ideal.clone(), title, values);
                PickOutcome::PendingNew {
                    selector: ideal,
                    fallback: Some(rule),
                }
            }
            Resolution::Missing | Resolution::NotLoaded => {
                self.set_pending(ideal.clone(), title, EditValues::defaults_for(&label));
                PickOutcome::PendingNew {
                    selector: ideal,
                    fallback: None,
                }
            }
        }
    }

    /// Runs a stylesheet mutation, re-serializes and rebinds the selection to
    /// the new generation.
    pub(crate) fn rewrite<T, F>(&mut self, mutate: F) -> T
    where
        F: FnOnce(&mut Stylesheet) -> T,
    {
        let bound = self
            .selection
            .rule()
            .and_then(|rule| rule.borrow().first_selector().map(str::to_owned));
        let (result, _) = self.model.commit(mutate);
        if let Some(first) = bound {
            match self.model.lookup(&first) {
                Some(rule) => self.selection = PendingSelection::Existing(rule),
                None => {
                    warn!("rule `{first}` disappeared after the stylesheet was rewritten");
                    self.clear_selection(TITLE_IDLE);
                }
            }
        }
        result
    }

    /// Commits `values` to the selected rule, or creates the pending rule.
    ///
    /// # Arguments
    ///
    /// * `values` - The edit surface. Its declarations replace the rule's body.
    ///
    /// # Returns
    ///
    /// The rule the session is bound to afterwards and the new stylesheet text.
    pub fn commit(&mut self, values: &EditValues) -> Result<CommitResult, StyleError> {
        if self.read_only {
            return Err(StyleError::ReadOnly);
        }
        let declarations = values.to_declarations();

        let (first, insertion) = match &self.selection {
            PendingSelection::None => return Err(StyleError::NothingSelected),
            PendingSelection::Existing(rule) => {
                let first = rule.borrow().first_selector().unwrap_or_default().to_owned();
                rule.borrow_mut().replace_declarations(declarations);
                self.model.commit(|_| ());
                (first, None)
            }
            PendingSelection::New(pending) => {
                let selector = final_selector(pending);
                validate_selector(&selector)?;
                let mut rule = Rule::new(&selector);
                rule.replace_declarations(declarations);
                let first = rule.first_selector().unwrap_or_default().to_owned();
                let (insertion, _) = self
                    .model
                    .commit(|sheet| insert_rule_in_category(sheet, rule));
                (first, Some(insertion))
            }
        };

        let rule = self.model.lookup(&first).ok_or_else(|| {
            warn!("committed rule `{first}` not found after re-indexing");
            StyleError::NothingSelected
        })?;
        info!("committed `{}`", rule.borrow().selector());
        self.values = values.clone();
        self.title = rule.borrow().selector();
        self.selection = PendingSelection::Existing(Rc::clone(&rule));
        self.notify(SelectionChanged::Existing(Rc::clone(&rule)));

        Ok(CommitResult {
            rule,
            css: self.model.text().to_owned(),
            insertion,
        })
    }
}

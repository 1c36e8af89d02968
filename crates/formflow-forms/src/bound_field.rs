//! Bound fields: form fields populated with values and validation state.
//!
//! A [`BoundField`] pairs a field definition with its current value, error,
//! in-flight flag, and the widget a view layer should draw. It is what
//! [`crate::form::FormEngine::render`] hands out for every visible field.
//! Repeater fields carry one [`BoundItem`] per item, each holding the bound
//! sub-fields of that item under `"<field>-<index>-<sub>"` names.

use crate::condition;
use crate::fields::{FieldKind, FormField};
use crate::repeater;
use crate::state::FormState;
use crate::value::{FieldValue, FormValues};
use crate::widgets::{handler_for, WidgetType};

/// Label of the leading empty option of a select without a placeholder.
pub const DEFAULT_SELECT_PLACEHOLDER: &str = "Select an option";

/// One `<option>` of a rendered select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedOption {
    /// Display text.
    pub label: String,
    /// Submitted value. Empty for the leading placeholder option.
    pub value: String,
    /// Whether this option is the current value.
    pub selected: bool,
}

/// One item of a rendered repeater.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundItem {
    /// Position of the item in the repeater.
    pub index: usize,
    /// Whether the view offers a remove control. The first item is kept.
    pub removable: bool,
    /// Visible sub-fields of this item.
    pub fields: Vec<BoundField>,
}

/// A form field bound to its value and validation state.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundField {
    /// The state key: the field name, or `field-index-sub` inside a repeater.
    pub name: String,
    /// Human-readable label.
    pub label: String,
    /// The field kind.
    pub kind: FieldKind,
    /// The widget used for rendering.
    pub widget: WidgetType,
    /// HTML `type` for `<input>` widgets.
    pub input_type: Option<&'static str>,
    /// Placeholder text.
    pub placeholder: Option<String>,
    /// Select options, led by the empty placeholder option. Empty for other kinds.
    pub options: Vec<RenderedOption>,
    /// The current value. `None` for a sub-field never edited.
    pub value: Option<FieldValue>,
    /// The current error.
    pub error: Option<String>,
    /// Whether a validation is in flight.
    pub validating: bool,
    /// Whether the field carries a `required` rule.
    pub required: bool,
    /// Repeater items. Empty for other kinds.
    pub items: Vec<BoundItem>,
    /// Text for a repeater's add control.
    pub add_label: Option<String>,
}

impl BoundField {
    /// Binds `field` to the state entry under `key`.
    pub fn bind(field: &FormField, key: &str, value: Option<&FieldValue>, state: &FormState) -> Self {
        let handler = handler_for(field.kind);
        let current = value.and_then(FieldValue::as_text).unwrap_or_default();

        let options = if handler.has_options() {
            let lead = RenderedOption {
                label: field
                    .placeholder
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SELECT_PLACEHOLDER.to_string()),
                value: String::new(),
                selected: current.is_empty(),
            };
            std::iter::once(lead)
                .chain(field.options.iter().map(|o| RenderedOption {
                    label: o.label.clone(),
                    value: o.value.clone(),
                    selected: o.value == current,
                }))
                .collect()
        } else {
            Vec::new()
        };

        let (items, add_label) = if field.kind == FieldKind::Repeater {
            let items = value
                .and_then(FieldValue::as_items)
                .unwrap_or_default()
                .iter()
                .enumerate()
                .map(|(index, item)| bind_item(field, key, index, item, state))
                .collect();
            (items, Some(repeater::add_label(&field.label)))
        } else {
            (Vec::new(), None)
        };

        Self {
            name: key.to_string(),
            label: field.label.clone(),
            kind: field.kind,
            widget: handler.widget_type(),
            input_type: handler.input_type(),
            placeholder: field.placeholder.clone(),
            options,
            value: value.cloned(),
            error: state.error(key).map(str::to_string),
            validating: state.is_validating(key),
            required: field.is_required(),
            items,
            add_label,
        }
    }

    /// Returns the auto-generated HTML `id` for this field.
    pub fn auto_id(&self) -> String {
        format!("id_{}", self.name)
    }

    /// Returns the id of the element that shows this field's error.
    pub fn error_id(&self) -> String {
        format!("{}-error", self.name)
    }

    /// Returns `true` if this field has an error.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Value for `aria-invalid`.
    pub fn aria_invalid(&self) -> bool {
        self.has_error()
    }

    /// Value for `aria-describedby`: the error element, when there is one.
    pub fn aria_describedby(&self) -> Option<String> {
        self.has_error().then(|| self.error_id())
    }

    /// The text shown in a text-like widget. Missing values render empty.
    pub fn text(&self) -> &str {
        self.value
            .as_ref()
            .and_then(FieldValue::as_text)
            .unwrap_or_default()
    }

    /// Whether a checkbox is ticked. Missing values render unticked.
    pub fn is_checked(&self) -> bool {
        self.value
            .as_ref()
            .and_then(FieldValue::as_bool)
            .unwrap_or(false)
    }
}

/// Binds the visible top-level fields of a form, in order.
pub fn bind_fields(fields: &[FormField], state: &FormState) -> Vec<BoundField> {
    fields
        .iter()
        .filter(|f| condition::is_visible(f.condition.as_ref(), &state.values))
        .map(|f| BoundField::bind(f, &f.name, state.values.get(&f.name), state))
        .collect()
}

fn bind_item(
    field: &FormField,
    key: &str,
    index: usize,
    item: &FormValues,
    state: &FormState,
) -> BoundItem {
    let fields = field
        .fields
        .iter()
        .filter(|sub| condition::is_visible(sub.condition.as_ref(), item))
        .map(|sub| {
            let sub_key = repeater::item_key(key, index, &sub.name);
            BoundField::bind(sub, &sub_key, item.get(&sub.name), state)
        })
        .collect();
    BoundItem {
        index,
        removable: index > 0,
        fields,
    }
}

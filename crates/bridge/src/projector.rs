use crate::engine::{DocumentEngine, Feature, ValueMark};
use crate::protocol::{ActionId, EditorState};

/// Recomputes the whole host-visible state. Pure: the engine is only queried.
pub fn project(engine: &dyn DocumentEngine) -> EditorState {
    let can = |action| engine.query_applicable(action);
    let is = |feature| engine.query_active(feature);

    EditorState {
        html: engine.serialize_html(),
        json: engine.serialize_structured(),

        can_bold: can(ActionId::ToggleBold),
        can_italic: can(ActionId::ToggleItalic),
        can_strike: can(ActionId::ToggleStrike),
        can_underline: can(ActionId::ToggleUnderline),
        can_horizontal_rule: can(ActionId::SetHorizontalRule),
        can_sink_list_item: can(ActionId::SinkListItem),
        can_lift_list_item: can(ActionId::LiftListItem),
        can_h1: can(ActionId::ToggleH1),
        can_h2: can(ActionId::ToggleH2),
        can_h3: can(ActionId::ToggleH3),
        can_blockquote: can(ActionId::ToggleBlockquote),
        can_undo: can(ActionId::Undo),
        can_redo: can(ActionId::Redo),
        can_bullet_list: can(ActionId::ToggleBulletListItem),
        can_ordered_list: can(ActionId::ToggleOrderedListItem),
        can_task_list: can(ActionId::ToggleTaskListItem),
        can_set_color: engine.can_set_mark(ValueMark::Color),
        can_set_highlight: engine.can_set_mark(ValueMark::Highlight),
        can_unset_color: can(ActionId::UnsetColor),
        can_unset_highlight: can(ActionId::UnsetHighlight),

        is_bullet_list_active: is(Feature::BulletList),
        is_ordered_list_active: is(Feature::OrderedList),
        is_task_list_active: is(Feature::TaskList),
        is_bold_active: is(Feature::Bold),
        is_italic_active: is(Feature::Italic),
        is_strike_active: is(Feature::Strike),
        is_underline_active: is(Feature::Underline),
        is_h1_active: is(Feature::Heading(1)),
        is_h2_active: is(Feature::Heading(2)),
        is_h3_active: is(Feature::Heading(3)),
        is_blockquote_active: is(Feature::Blockquote),

        active_color: engine.active_value(ValueMark::Color),
        active_highlight: engine.active_value(ValueMark::Highlight),
    }
}

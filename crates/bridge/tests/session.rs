use pretty_assertions::assert_eq;
use webtext_bridge::{
    ActionId, BridgeConfig, ContentPolicy, DocumentEngine, EditorSession, EditorState,
    FocusCommand, NativeMessage, NoopPolicy, PlateEngine, PreReadyPolicy, ProtocolError,
    SessionPhase, ValueMark, VideoEmbed, WebViewMessage, project,
};
use webtext_plate_core::{Point, Selection};

fn ready_session(config: BridgeConfig, html: &str) -> EditorSession {
    let mut session = EditorSession::with_config(config);
    session.boot();
    session.receive(NativeMessage::InitialContent(html.to_string()));
    session.take_outgoing();
    session
}

fn select_all_of_first_leaf(session: &mut EditorSession, len: usize) {
    session.select(Selection::range(
        Point::new(vec![0, 0], 0),
        Point::new(vec![0, 0], len),
    ));
    session.take_outgoing();
}

fn updates(messages: Vec<WebViewMessage>) -> Vec<EditorState> {
    messages
        .into_iter()
        .filter_map(|msg| match msg {
            WebViewMessage::EditorStateUpdate(state) => Some(*state),
            WebViewMessage::EditorInitialised => None,
        })
        .collect()
}

fn last_state(session: &mut EditorSession) -> EditorState {
    updates(session.take_outgoing())
        .pop()
        .expect("expected a state update")
}

#[test]
fn projection_is_idempotent() {
    let session = ready_session(
        BridgeConfig::default(),
        "<ul><li><p>a</p></li><li><p>b</p></li></ul>",
    );
    assert_eq!(project(session.engine()), project(session.engine()));
}

#[test]
fn initialised_is_sent_once_and_before_any_update() {
    let mut session = EditorSession::with_config(BridgeConfig::default());
    assert_eq!(session.phase(), SessionPhase::Uninitialised);

    session.receive(NativeMessage::InitialContent("<p>early</p>".to_string()));
    session.type_text("typed early");
    assert!(session.take_outgoing().is_empty());

    session.boot();
    session.boot();
    assert_eq!(session.phase(), SessionPhase::Ready);

    let outgoing = session.take_outgoing();
    assert_eq!(outgoing[0], WebViewMessage::EditorInitialised);
    let initialised = outgoing
        .iter()
        .filter(|msg| **msg == WebViewMessage::EditorInitialised)
        .count();
    assert_eq!(initialised, 1);
    assert_eq!(outgoing.len(), 2);
}

#[test]
fn queued_messages_replay_in_arrival_order() {
    let mut session = EditorSession::with_config(BridgeConfig::default());
    session.receive(NativeMessage::InitialContent("<p>title</p>".to_string()));
    session.receive(NativeMessage::Action(ActionId::ToggleH1));
    assert_eq!(session.pending_len(), 2);

    session.boot();
    let outgoing = session.take_outgoing();
    assert_eq!(outgoing[0], WebViewMessage::EditorInitialised);

    let html: Vec<String> = updates(outgoing).into_iter().map(|s| s.html).collect();
    assert_eq!(html, vec!["<p>title</p>", "<h1>title</h1>"]);
    assert_eq!(session.pending_len(), 0);
}

#[test]
fn drop_policy_discards_early_messages() {
    let config = BridgeConfig {
        pre_ready: PreReadyPolicy::Drop,
        ..BridgeConfig::default()
    };
    let mut session = EditorSession::with_config(config);
    session.receive(NativeMessage::InitialContent("<p>lost</p>".to_string()));
    session.boot();

    assert_eq!(session.take_outgoing(), vec![WebViewMessage::EditorInitialised]);
    assert_eq!(session.engine().serialize_html(), "<p></p>");
}

#[test]
fn inapplicable_command_is_silent_by_default() {
    let mut session = ready_session(BridgeConfig::default(), "<p>plain</p>");
    let before = project(session.engine());
    assert!(!before.can_sink_list_item);

    session.receive(NativeMessage::Action(ActionId::SinkListItem));

    assert!(session.take_outgoing().is_empty());
    assert_eq!(project(session.engine()), before);
}

#[test]
fn inapplicable_command_echoes_unchanged_state_when_configured() {
    let config = BridgeConfig {
        noop: NoopPolicy::Echo,
        ..BridgeConfig::default()
    };
    let mut session = ready_session(config, "<p>plain</p>");
    let before = project(session.engine());

    session.receive(NativeMessage::Action(ActionId::LiftListItem));

    let state = last_state(&mut session);
    assert_eq!(state.html, before.html);
    assert_eq!(state.json, before.json);
}

#[test]
fn focus_and_blur_emit_nothing() {
    let mut session = ready_session(BridgeConfig::default(), "<p>x</p>");

    session.receive(NativeMessage::Editor(FocusCommand::Focus));
    assert!(session.engine().is_focused());
    session.receive(NativeMessage::Editor(FocusCommand::Blur));
    assert!(!session.engine().is_focused());

    assert!(session.take_outgoing().is_empty());
}

#[test]
fn repeated_content_gives_the_same_state() {
    let mut session = ready_session(BridgeConfig::default(), "<p>x</p>");
    let html = "<h2>Notes</h2><p>body</p>";

    session.receive(NativeMessage::InitialContent(html.to_string()));
    let first = last_state(&mut session);
    session.receive(NativeMessage::InitialContent(html.to_string()));
    let second = last_state(&mut session);

    assert_eq!(first, second);
    assert_eq!(first.html, html);
}

#[test]
fn replacing_content_clears_history() {
    let mut session = ready_session(BridgeConfig::default(), "<p></p>");
    session.type_text("draft");
    assert!(last_state(&mut session).can_undo);

    session.receive(NativeMessage::InitialContent("<p>server copy</p>".to_string()));
    let state = last_state(&mut session);
    assert!(!state.can_undo);
    assert!(!state.can_redo);

    session.receive(NativeMessage::Action(ActionId::Undo));
    assert!(session.take_outgoing().is_empty());
}

#[test]
fn ignore_if_dirty_keeps_local_edits() {
    let config = BridgeConfig {
        content: ContentPolicy::IgnoreIfDirty,
        ..BridgeConfig::default()
    };
    let mut session = ready_session(config, "<p></p>");
    session.type_text("mine");
    session.take_outgoing();

    session.receive(NativeMessage::InitialContent("<p>theirs</p>".to_string()));

    assert!(session.take_outgoing().is_empty());
    assert_eq!(session.engine().serialize_html(), "<p>mine</p>");
}

#[test]
fn bold_toggle_is_symmetric() {
    let mut session = ready_session(BridgeConfig::default(), "<p>hello</p>");
    select_all_of_first_leaf(&mut session, 5);

    session.receive(NativeMessage::Action(ActionId::ToggleBold));
    let state = last_state(&mut session);
    assert_eq!(state.html, "<p><strong>hello</strong></p>");
    assert!(state.is_bold_active);

    session.receive(NativeMessage::Action(ActionId::ToggleBold));
    let state = last_state(&mut session);
    assert_eq!(state.html, "<p>hello</p>");
    assert!(!state.is_bold_active);
}

#[test]
fn headings_report_only_their_own_level() {
    let mut session = ready_session(BridgeConfig::default(), "<p>title</p>");

    session.receive(NativeMessage::Action(ActionId::ToggleH2));
    let state = last_state(&mut session);
    assert_eq!(state.html, "<h2>title</h2>");
    assert_eq!(
        (state.is_h1_active, state.is_h2_active, state.is_h3_active),
        (false, true, false)
    );
    assert!(state.can_h1 && state.can_h2 && state.can_h3);
}

#[test]
fn video_sizes_are_clamped() {
    let mut session = ready_session(BridgeConfig::default(), "<p>a</p>");

    session.receive_text(r#"{"kind":"insertVideo","payload":{"url":"x","width":0,"height":-5}}"#);

    let state = last_state(&mut session);
    assert_eq!(
        state.html,
        "<p>a</p><div data-video><iframe src=\"x\" width=\"640\" height=\"480\" allowfullscreen></iframe></div>"
    );
}

#[test]
fn configured_embed_bounds_reach_the_engine() {
    let mut config = BridgeConfig::default();
    config.embed.min_width = 500;
    let mut session = ready_session(config, "<p>a</p>");

    session.receive(NativeMessage::InsertVideo(VideoEmbed {
        url: "x".to_string(),
        width: Some(100.0),
        height: None,
    }));

    let html = last_state(&mut session).html;
    assert!(html.contains("width=\"500\" height=\"480\""), "{html}");
}

#[test]
fn unknown_action_is_reported_without_side_effects() {
    let mut session = ready_session(BridgeConfig::default(), "<p>x</p>");
    let before = project(session.engine());

    session.receive_text(r#"{"kind":"action","payload":"toggleFlying"}"#);

    assert_eq!(
        session.diagnostics(),
        &[ProtocolError::UnknownAction("toggleFlying".to_string())]
    );
    assert!(session.take_outgoing().is_empty());
    assert_eq!(project(session.engine()), before);
}

#[test]
fn malformed_text_is_reported_and_dropped() {
    let mut session = ready_session(BridgeConfig::default(), "<p>x</p>");

    session.receive_text("{\"kind\":");
    session.receive_text(r#"{"kind":"selfDestruct"}"#);

    assert!(matches!(session.diagnostics()[0], ProtocolError::Malformed(_)));
    assert_eq!(
        session.diagnostics()[1],
        ProtocolError::UnknownKind("selfDestruct".to_string())
    );
    assert!(session.take_outgoing().is_empty());
}

#[test]
fn text_color_can_be_set_and_cleared() {
    let mut session = ready_session(BridgeConfig::default(), "<p>hello</p>");
    select_all_of_first_leaf(&mut session, 5);
    assert!(project(session.engine()).can_set_color);
    assert!(!project(session.engine()).can_unset_color);

    session.receive(NativeMessage::SetColor("#F98181".to_string()));
    let state = last_state(&mut session);
    assert_eq!(state.html, "<p><span style=\"color: #F98181\">hello</span></p>");
    assert_eq!(state.active_color.as_deref(), Some("#F98181"));
    assert!(state.can_unset_color);

    session.receive(NativeMessage::Action(ActionId::UnsetColor));
    let state = last_state(&mut session);
    assert_eq!(state.html, "<p>hello</p>");
    assert_eq!(state.active_color, None);
}

#[test]
fn list_capabilities_follow_structure() {
    let session = ready_session(
        BridgeConfig::default(),
        "<ul><li><p>one</p></li><li><p>two</p></li></ul>",
    );
    let state = project(session.engine());
    assert!(state.is_bullet_list_active);
    assert!(!state.can_sink_list_item);
    assert!(state.can_lift_list_item);

    let mut session = session;
    session.select(Selection::collapsed(Point::new(vec![1, 0], 0)));
    let state = last_state(&mut session);
    assert!(state.can_sink_list_item);

    session.receive(NativeMessage::Action(ActionId::SinkListItem));
    let state = last_state(&mut session);
    assert_eq!(
        state.html,
        "<ul><li><p>one</p><ul><li><p>two</p></li></ul></li></ul>"
    );
    assert!(!state.can_sink_list_item);
}

#[test]
fn undo_and_redo_follow_the_history() {
    let mut session = ready_session(BridgeConfig::default(), "<p>x</p>");
    session.receive(NativeMessage::Action(ActionId::SetHorizontalRule));
    let state = last_state(&mut session);
    assert_eq!(state.html, "<p>x</p><hr><p></p>");
    assert!(state.can_undo);

    session.receive(NativeMessage::Action(ActionId::Undo));
    let state = last_state(&mut session);
    assert_eq!(state.html, "<p>x</p>");
    assert!(state.can_redo);

    session.receive(NativeMessage::Action(ActionId::Redo));
    assert_eq!(last_state(&mut session).html, "<p>x</p><hr><p></p>");
}

#[test]
fn engine_can_be_driven_directly() {
    let mut engine = PlateEngine::default();
    engine.replace_content("<p>abc</p>");
    assert!(!engine.query_applicable(ActionId::Undo));
    assert!(engine.query_applicable(ActionId::ToggleBlockquote));
    assert!(engine.apply_command(ActionId::ToggleBlockquote));
    assert_eq!(engine.serialize_html(), "<blockquote><p>abc</p></blockquote>");
    assert!(engine.query_applicable(ActionId::Undo));
}

#[test]
fn reversed_selection_projects_the_same_state() {
    let html = "<p>s</p><blockquote><p>q</p></blockquote>";
    let (start, end) = (Point::new(vec![0, 0], 0), Point::new(vec![1, 0, 0], 1));
    let mut forward = ready_session(BridgeConfig::default(), html);
    forward.select(Selection::range(start.clone(), end.clone()));
    let mut backward = ready_session(BridgeConfig::default(), html);
    backward.select(Selection::range(end, start));

    let state = project(forward.engine());
    assert_eq!(state, project(backward.engine()));
    assert!(!state.is_blockquote_active);
    assert!(!state.can_blockquote);

    backward.receive(NativeMessage::Action(ActionId::ToggleBlockquote));
    assert_eq!(backward.engine().serialize_html(), html);
}

#[test]
fn value_marks_can_be_unset_through_the_engine() {
    let mut engine = PlateEngine::default();
    engine.replace_content("<p><mark data-color=\"#FAF594\">hello</mark></p>");
    engine.set_selection(Selection::range(
        Point::new(vec![0, 0], 0),
        Point::new(vec![0, 0], 5),
    ));
    assert_eq!(
        engine.active_value(ValueMark::Highlight).as_deref(),
        Some("#FAF594")
    );

    assert!(engine.unset_mark(ValueMark::Highlight));
    assert_eq!(engine.serialize_html(), "<p>hello</p>");
    assert!(!engine.unset_mark(ValueMark::Highlight));
    assert!(!engine.query_applicable(ActionId::UnsetHighlight));
}

#[test]
fn diagnostics_are_bounded_and_can_be_drained() {
    let mut session = ready_session(BridgeConfig::default(), "<p>x</p>");
    for _ in 0..100 {
        session.receive_text("not json");
    }
    assert!(session.diagnostics().len() < 100);

    let drained = session.take_diagnostics();
    assert!(matches!(drained.last(), Some(ProtocolError::Malformed(_))));
    assert!(session.diagnostics().is_empty());
}

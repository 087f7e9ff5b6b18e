// This module draws the area dialog windows and feeds what the user does back into the dialog state machine

use egui::{
    Align2, Area, Button, Color32, Context, Frame, Grid, Id, Order, RichText, TextEdit, Ui, Vec2,
    Window,
};

use crate::{
    area::{HexColor, Price, MIN_POLYGON_POINTS},
    map::{self, MapView},
    modal::{draft_overlays, Draft, Editor, Event, Outcome, Overlay, Step},
    store::AreaStore,
};

const DRAWING_MAP_SIZE: Vec2 = Vec2::new(520.0, 360.0);

/// Text the user is typing that may not parse yet, the drawing map's
/// viewport, plus any pending warning.
#[derive(Default)]
pub struct FormState {
    price_text: String,
    price_error: Option<String>,
    color_text: String,
    color_error: Option<String>,
    warning: Option<String>,
    view: MapView,
}

impl FormState {
    /// While a warning is shown nothing else may be interacted with.
    pub fn has_warning(&self) -> bool {
        self.warning.is_some()
    }

    /// A text field that does not parse, so the draft does not match the screen.
    fn has_field_error(&self) -> bool {
        self.price_error.is_some() || self.color_error.is_some()
    }

    fn load(&mut self, draft: &Draft) {
        *self = Self {
            price_text: draft.metadata.price.to_string(),
            color_text: draft.metadata.color.to_string(),
            view: MapView::around(&draft.previous),
            ..Default::default()
        };
    }

    fn price_edited(&mut self) -> Option<Event> {
        match self.price_text.parse::<Price>() {
            Ok(price) => {
                self.price_error = None;
                Some(Event::SetPrice(price))
            }
            Err(e) => {
                log::debug!("{e:#}");
                self.price_error = Some("Not a number".into());
                None
            }
        }
    }

    fn color_edited(&mut self) -> Option<Event> {
        match self.color_text.parse::<HexColor>() {
            Ok(color) => {
                self.color_error = None;
                Some(Event::SetColor(color))
            }
            Err(e) => {
                log::debug!("{e:#}");
                self.color_error = Some("Use #RRGGBB".into());
                None
            }
        }
    }
}

/// Runs `event` through the dialog and keeps the form text in sync with the result.
pub fn dispatch(editor: &mut Editor, store: &mut AreaStore, form: &mut FormState, event: Event) {
    if event == Event::Advance && form.has_field_error() {
        form.warning = Some("Fix the price and color before drawing the area.".into());
        return;
    }

    let was_open = editor.is_open();
    match editor.update(store, event) {
        Outcome::Warning(message) => form.warning = Some(message),
        Outcome::Committed { index } => {
            log::debug!("Dialog closed after saving area {index}");
            *form = Default::default();
        }
        Outcome::Deleted { index } => {
            log::debug!("Dialog closed after deleting area {index}");
            *form = Default::default();
        }
        Outcome::Updated | Outcome::Ignored => {}
    }

    match editor.draft() {
        Some(draft) if !was_open => form.load(draft),
        None if was_open && !form.has_warning() => *form = Default::default(),
        _ => {}
    }
}

pub fn ui(ctx: &Context, editor: &mut Editor, store: &mut AreaStore, form: &mut FormState) {
    let mut events = vec![];

    if let Some(draft) = editor.draft() {
        let enabled = !form.has_warning();
        let title = match draft.editing {
            Some(_) => "Edit delivery area",
            None => "New delivery area",
        };

        if draft.confirm_delete {
            delete_prompt_ui(ctx, draft, enabled, &mut events);
        } else {
            Window::new(title)
                .id(Id::new("area form"))
                .collapsible(false)
                .resizable(false)
                .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.set_enabled(enabled);
                    match draft.step {
                        Step::Metadata => metadata_ui(ui, draft, form, &mut events),
                        Step::Drawing => {
                            let overlays = draft_overlays(editor);
                            drawing_ui(ui, draft, &overlays, form, &mut events)
                        }
                    }
                });
        }
    }

    warning_ui(ctx, form);

    for event in events {
        dispatch(editor, store, form, event);
    }
}

fn metadata_ui(ui: &mut Ui, draft: &Draft, form: &mut FormState, events: &mut Vec<Event>) {
    ui.label(RichText::new("Step 1 of 2: describe the area").weak());
    ui.add_space(4.0);

    Grid::new("area metadata")
        .num_columns(2)
        .spacing([12.0, 8.0])
        .show(ui, |ui| {
            ui.label("Title");
            let mut title = draft.metadata.title.clone();
            if ui
                .add(TextEdit::singleline(&mut title).hint_text("e.g. Downtown"))
                .changed()
            {
                events.push(Event::SetTitle(title));
            }
            ui.end_row();

            ui.label("Price");
            ui.vertical(|ui| {
                if ui
                    .add(TextEdit::singleline(&mut form.price_text).hint_text("0.00"))
                    .changed()
                {
                    events.extend(form.price_edited());
                }
                if let Some(e) = &form.price_error {
                    ui.colored_label(Color32::RED, e.as_str());
                }
            });
            ui.end_row();

            ui.label("Color");
            ui.horizontal(|ui| {
                let mut rgb = draft.metadata.color.0;
                if ui.color_edit_button_srgb(&mut rgb).changed() {
                    form.color_text = HexColor(rgb).to_string();
                    form.color_error = None;
                    events.push(Event::SetColor(HexColor(rgb)));
                }
                if ui
                    .add(TextEdit::singleline(&mut form.color_text).desired_width(70.0))
                    .changed()
                {
                    events.extend(form.color_edited());
                }
            });
            ui.end_row();

            if let Some(e) = &form.color_error {
                ui.label("");
                ui.colored_label(Color32::RED, e.as_str());
                ui.end_row();
            }
        });

    ui.separator();
    ui.horizontal(|ui| {
        if ui.button("Cancel").clicked() {
            events.push(Event::Cancel);
        }
        if draft.editing.is_some() && ui.button("Delete").clicked() {
            events.push(Event::RequestDelete);
        }
        if ui
            .add_enabled(!form.has_field_error(), Button::new("Next: draw on map"))
            .clicked()
        {
            events.push(Event::Advance);
        }
    });
}

fn drawing_ui(
    ui: &mut Ui,
    draft: &Draft,
    overlays: &[Overlay<'_>],
    form: &mut FormState,
    events: &mut Vec<Event>,
) {
    ui.label(RichText::new("Step 2 of 2: draw the area").weak());
    ui.label("Click on the map to place the corners of the area, in order.");
    if draft.shows_reference() {
        ui.label(RichText::new("The faded shape is the current area.").italics());
    }

    if let Some(point) = map::ui(ui, DRAWING_MAP_SIZE, &mut form.view, overlays, true) {
        events.push(Event::MapClick(point));
    }

    let n = draft.points.len();
    let status = format!("{n} point{} placed", if n == 1 { "" } else { "s" });
    if n < MIN_POLYGON_POINTS {
        ui.label(format!("{status}, at least {MIN_POLYGON_POINTS} are needed"));
    } else {
        ui.label(status);
    }

    ui.separator();
    ui.horizontal(|ui| {
        if ui.button("Back").clicked() {
            events.push(Event::Back);
        }
        if ui.add_enabled(n > 0, Button::new("Undo point")).clicked() {
            events.push(Event::UndoPoint);
        }
        if ui.button("Cancel").clicked() {
            events.push(Event::Cancel);
        }
        if ui.button("Confirm").clicked() {
            events.push(Event::Confirm);
        }
    });
}

fn delete_prompt_ui(ctx: &Context, draft: &Draft, enabled: bool, events: &mut Vec<Event>) {
    Window::new("Delete area?")
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.set_enabled(enabled);
            let title = match draft.metadata.title.as_str() {
                "" => "this area".to_string(),
                title => format!("'{title}'"),
            };
            ui.label(format!("Delete {title}? This cannot be undone."));
            ui.horizontal(|ui| {
                if ui.button("Yes").clicked() {
                    events.push(Event::AnswerDelete(true));
                }
                if ui.button("No").clicked() {
                    events.push(Event::AnswerDelete(false));
                }
            });
        });
}

// drawn above every window, the rest of the page is disabled until it is dismissed
fn warning_ui(ctx: &Context, form: &mut FormState) {
    let Some(message) = &form.warning else {
        return;
    };

    let mut dismissed = false;
    Area::new(Id::new("warning"))
        .order(Order::Foreground)
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            Frame::window(ui.style()).show(ui, |ui| {
                ui.heading("Warning");
                ui.label(message.as_str());
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        });

    if dismissed {
        form.warning = None;
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        area::{Area, LatLng, Metadata, Price},
        modal::{Editor, Event, Step},
        store::AreaStore,
    };

    use super::{dispatch, ui, FormState};

    fn triangle() -> Vec<Event> {
        [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)]
            .map(|(lat, lng)| Event::MapClick(LatLng::new(lat, lng)))
            .to_vec()
    }

    #[test]
    fn test_form_loads_edited_area() {
        let mut store = AreaStore::default();
        let metadata = Metadata {
            price: Price::from_cents(1250),
            ..Default::default()
        };
        let points = vec![LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0), LatLng::new(1.0, 1.0)];
        store.upsert(None, Area::new(metadata, points)).unwrap();

        let mut editor = Editor::default();
        let mut form = FormState::default();
        dispatch(&mut editor, &mut store, &mut form, Event::Edit(0));

        assert_eq!(form.price_text, "12.50");
        assert_eq!(form.color_text, "#77A2E8");
        assert!(!form.has_warning());
    }

    #[test]
    fn test_warning_survives_until_dismissed() {
        let mut store = AreaStore::default();
        let mut editor = Editor::default();
        let mut form = FormState::default();

        for event in [Event::CreateNew, Event::Advance, Event::Confirm] {
            dispatch(&mut editor, &mut store, &mut form, event);
        }
        assert!(form.has_warning());
        assert!(editor.is_open());

        dispatch(&mut editor, &mut store, &mut form, Event::Edit(7));
        assert!(form.has_warning());
    }

    #[test]
    fn test_form_cleared_on_cancel() {
        let mut store = AreaStore::default();
        let mut editor = Editor::default();
        let mut form = FormState::default();

        dispatch(&mut editor, &mut store, &mut form, Event::CreateNew);
        form.price_text = "abc".into();
        form.price_error = Some("Not a number".into());
        dispatch(&mut editor, &mut store, &mut form, Event::Cancel);

        assert!(form.price_text.is_empty());
        assert!(form.price_error.is_none());
    }

    #[test]
    fn test_unparsed_price_blocks_drawing() {
        let mut store = AreaStore::default();
        let mut editor = Editor::default();
        let mut form = FormState::default();

        dispatch(&mut editor, &mut store, &mut form, Event::CreateNew);
        form.price_text = "abc".into();
        assert_eq!(form.price_edited(), None);

        let mut events = vec![Event::Advance];
        events.extend(triangle());
        events.push(Event::Confirm);
        for event in events {
            dispatch(&mut editor, &mut store, &mut form, event);
        }
        assert!(form.has_warning());
        assert_eq!(editor.draft().unwrap().step, Step::Metadata);
        assert!(store.is_empty());

        form.warning = None;
        form.price_text = "9.5".into();
        let mut events: Vec<_> = form.price_edited().into_iter().collect();
        events.push(Event::Advance);
        events.extend(triangle());
        events.push(Event::Confirm);
        for event in events {
            dispatch(&mut editor, &mut store, &mut form, event);
        }

        assert!(!editor.is_open());
        assert_eq!(store.len(), 1);
        assert_eq!(store.list()[0].metadata.price, Price::from_cents(950));
    }

    #[test]
    fn test_unparsed_color_blocks_drawing() {
        let mut store = AreaStore::default();
        let mut editor = Editor::default();
        let mut form = FormState::default();

        dispatch(&mut editor, &mut store, &mut form, Event::CreateNew);
        form.color_text = "#12".into();
        assert_eq!(form.color_edited(), None);
        dispatch(&mut editor, &mut store, &mut form, Event::Advance);

        assert!(form.has_warning());
        assert_eq!(editor.draft().unwrap().step, Step::Metadata);
    }

    #[test]
    fn test_dialog_frames_draw_with_warning() {
        let mut store = AreaStore::default();
        let mut editor = Editor::default();
        let mut form = FormState::default();
        let ctx = egui::Context::default();

        for event in [Event::CreateNew, Event::Advance, Event::Confirm] {
            dispatch(&mut editor, &mut store, &mut form, event);
        }
        assert!(form.has_warning());

        for _ in 0..2 {
            let _ = ctx.run(egui::RawInput::default(), |ctx| {
                ui(ctx, &mut editor, &mut store, &mut form);
            });
        }

        assert!(form.has_warning());
        assert_eq!(editor.draft().unwrap().step, Step::Drawing);
        assert!(store.is_empty());
    }
}

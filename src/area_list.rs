// This module lists the delivery areas as cards

use egui::{vec2, Frame, RichText, ScrollArea, Sense, Ui};

use crate::{area::Area, modal::Event, store::AreaStore};

fn card_title(area: &Area) -> &str {
    match area.metadata.title.trim() {
        "" => "(untitled)",
        _ => &area.metadata.title,
    }
}

/// Draws the list. Returns the dialog event for whichever button was clicked.
pub fn ui(ui: &mut Ui, store: &AreaStore, enabled: bool) -> Option<Event> {
    let mut event = None;

    ui.heading("Areas");
    ui.add_enabled_ui(enabled, |ui| {
        if ui.button("New area").clicked() {
            event = Some(Event::CreateNew);
        }
    });
    ui.separator();

    if store.is_empty() {
        ui.label("No delivery areas yet.");
        return event;
    }

    ScrollArea::vertical().id_source("area cards").show(ui, |ui| {
        for (i, area) in store.list().iter().enumerate() {
            Frame::group(ui.style()).show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.horizontal(|ui| {
                    let (rect, _) = ui.allocate_exact_size(vec2(18.0, 18.0), Sense::hover());
                    ui.painter()
                        .rect_filled(rect, 3.0, area.metadata.color.to_color32());

                    ui.vertical(|ui| {
                        ui.label(RichText::new(card_title(area)).strong());
                        ui.label(area.metadata.price.to_string());
                    });

                    ui.add_enabled_ui(enabled, |ui| {
                        if ui.button("Edit").clicked() {
                            event = Some(Event::Edit(i));
                        }
                    });
                });
            });
        }
    });

    event
}

#[cfg(test)]
mod tests {
    use crate::{
        area::{Area, LatLng, Metadata},
        modal::Event,
        store::AreaStore,
    };

    use super::{card_title, ui};

    #[test]
    fn test_card_title() {
        let mut area = Area::new(Metadata::default(), vec![]);
        assert_eq!(card_title(&area), "(untitled)");
        area.metadata.title = "  ".into();
        assert_eq!(card_title(&area), "(untitled)");
        area.metadata.title = "Downtown".into();
        assert_eq!(card_title(&area), "Downtown");
    }

    #[test]
    fn test_list_draws_without_clicks() {
        let mut store = AreaStore::default();
        let points = vec![LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0), LatLng::new(1.0, 1.0)];
        store.upsert(None, Area::new(Metadata::default(), points)).unwrap();

        let ctx = egui::Context::default();
        let mut clicked: Option<Event> = None;
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::SidePanel::left("areas").show(ctx, |panel| {
                clicked = ui(panel, &store, true);
            });
        });
        assert_eq!(clicked, None);
    }
}

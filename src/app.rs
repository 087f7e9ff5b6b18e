use egui::{CentralPanel, Frame, RichText, SidePanel, TopBottomPanel};

use crate::{
    area_list,
    form::{self, FormState},
    map::{self, MapView},
    modal::{area_overlays, Editor, Event},
    store::AreaStore,
};

/// Only the map viewport survives a restart, delivery areas live as long as the page.
#[derive(serde::Deserialize, serde::Serialize, Default)]
#[serde(default)]
pub struct App {
    view: MapView,
    #[serde(skip)]
    store: AreaStore,
    #[serde(skip)]
    editor: Editor,
    #[serde(skip)]
    form: FormState,
}

impl App {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        if let Some(storage) = cc.storage {
            return eframe::get_value(storage, eframe::APP_KEY).unwrap_or_default();
        }

        Default::default()
    }

    fn dispatch(&mut self, event: Event) {
        form::dispatch(&mut self.editor, &mut self.store, &mut self.form, event);
    }
}

impl eframe::App for App {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, self);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Delivery areas");
                ui.label(RichText::new(concat!("v", env!("CARGO_PKG_VERSION"))).weak());
            });
        });

        let list_enabled = !self.editor.is_open() && !self.form.has_warning();
        let clicked = SidePanel::left("areas")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| area_list::ui(ui, &self.store, list_enabled))
            .inner;
        if let Some(event) = clicked {
            self.dispatch(event);
        }

        // areas are drawn in the dialog's own map, this one only shows what is stored
        CentralPanel::default()
            .frame(Frame::none())
            .show(ctx, |ui| {
                let size = ui.available_size();
                map::ui(ui, size, &mut self.view, &area_overlays(&self.store), false);
            });

        form::ui(ctx, &mut self.editor, &mut self.store, &mut self.form);
    }
}

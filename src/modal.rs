// This module contains the create/edit area dialog as a plain state machine, independent of egui

use crate::{
    area::{Area, HexColor, LatLng, Metadata, Price, MIN_POLYGON_POINTS},
    store::AreaStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Metadata,
    Drawing,
}

/// The in-progress, unconfirmed state of the dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    /// `None` when creating a new area, otherwise the index of the area being replaced.
    pub editing: Option<usize>,
    pub step: Step,
    pub metadata: Metadata,
    /// Points placed in this drawing session, in click order.
    pub points: Vec<LatLng>,
    /// Shape of the area being replaced, shown faded until a new point is placed.
    pub previous: Vec<LatLng>,
    pub confirm_delete: bool,
}

impl Draft {
    fn new(editing: Option<usize>, metadata: Metadata, previous: Vec<LatLng>) -> Self {
        Self {
            editing,
            step: Step::Metadata,
            metadata,
            points: vec![],
            previous,
            confirm_delete: false,
        }
    }

    pub fn shows_reference(&self) -> bool {
        self.step == Step::Drawing
            && self.points.is_empty()
            && self.previous.len() >= MIN_POLYGON_POINTS
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CreateNew,
    Edit(usize),
    SetTitle(String),
    SetPrice(Price),
    SetColor(HexColor),
    Advance,
    Back,
    MapClick(LatLng),
    UndoPoint,
    Confirm,
    Cancel,
    RequestDelete,
    AnswerDelete(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The event does not apply to the current state.
    Ignored,
    Updated,
    /// Nothing changed, the message must be shown to the user before they carry on.
    Warning(String),
    Committed { index: usize },
    Deleted { index: usize },
}

/// The dialog. Closed when there is no draft.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Editor {
    draft: Option<Draft>,
}

impl Editor {
    pub fn is_open(&self) -> bool {
        self.draft.is_some()
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    pub fn update(&mut self, store: &mut AreaStore, event: Event) -> Outcome {
        log::debug!("Dialog event {event:?}");

        let outcome = match self.draft.take() {
            None => self.update_closed(store, event),
            Some(draft) if draft.confirm_delete => self.update_confirm_delete(store, draft, event),
            Some(draft) => match draft.step {
                Step::Metadata => self.update_metadata(draft, event),
                Step::Drawing => self.update_drawing(store, draft, event),
            },
        };

        if outcome == Outcome::Ignored {
            log::debug!("Ignored dialog event, state is {:?}", self.draft);
        }
        outcome
    }

    fn update_closed(&mut self, store: &AreaStore, event: Event) -> Outcome {
        match event {
            Event::CreateNew => {
                self.draft = Some(Draft::new(None, Metadata::default(), vec![]));
                Outcome::Updated
            }
            Event::Edit(index) => match store.get(index) {
                Some(area) => {
                    self.draft = Some(Draft::new(
                        Some(index),
                        area.metadata.clone(),
                        area.points.clone(),
                    ));
                    Outcome::Updated
                }
                None => {
                    log::error!(
                        "Tried to edit area {index}, but there are {} areas",
                        store.len()
                    );
                    Outcome::Warning(format!("Area {index} does not exist."))
                }
            },
            _ => Outcome::Ignored,
        }
    }

    fn update_metadata(&mut self, mut draft: Draft, event: Event) -> Outcome {
        let outcome = match event {
            Event::SetTitle(title) => {
                draft.metadata.title = title;
                Outcome::Updated
            }
            Event::SetPrice(price) => {
                draft.metadata.price = price;
                Outcome::Updated
            }
            Event::SetColor(color) => {
                draft.metadata.color = color;
                Outcome::Updated
            }
            Event::Advance => {
                draft.step = Step::Drawing;
                Outcome::Updated
            }
            Event::RequestDelete if draft.editing.is_some() => {
                draft.confirm_delete = true;
                Outcome::Updated
            }
            Event::Cancel => return Outcome::Updated,
            _ => Outcome::Ignored,
        };

        self.draft = Some(draft);
        outcome
    }

    fn update_drawing(
        &mut self,
        store: &mut AreaStore,
        mut draft: Draft,
        event: Event,
    ) -> Outcome {
        let outcome = match event {
            Event::MapClick(point) => {
                draft.points.push(point);
                Outcome::Updated
            }
            Event::UndoPoint => match draft.points.pop() {
                Some(_) => Outcome::Updated,
                None => Outcome::Ignored,
            },
            Event::Back => {
                draft.step = Step::Metadata;
                Outcome::Updated
            }
            Event::Confirm if draft.points.len() < MIN_POLYGON_POINTS => {
                log::warn!("Rejected area with {} points", draft.points.len());
                Outcome::Warning(format!(
                    "A delivery area needs at least {MIN_POLYGON_POINTS} points on the map, you have placed {}.",
                    draft.points.len()
                ))
            }
            Event::Confirm => {
                let Draft {
                    editing,
                    metadata,
                    points,
                    ..
                } = draft;
                return match store.upsert(editing, Area::new(metadata, points)) {
                    Ok(()) => Outcome::Committed {
                        index: editing.unwrap_or(store.len() - 1),
                    },
                    Err(e) => {
                        log::error!("Failed to save area: {e:#}");
                        Outcome::Warning(format!("The area could not be saved!\n{e:#}"))
                    }
                };
            }
            Event::Cancel => return Outcome::Updated,
            _ => Outcome::Ignored,
        };

        self.draft = Some(draft);
        outcome
    }

    fn update_confirm_delete(
        &mut self,
        store: &mut AreaStore,
        mut draft: Draft,
        event: Event,
    ) -> Outcome {
        match (event, draft.editing) {
            (Event::AnswerDelete(true), Some(index)) => match store.delete(index) {
                Ok(_) => Outcome::Deleted { index },
                Err(e) => {
                    log::error!("Failed to delete area: {e:#}");
                    Outcome::Warning(format!("The area could not be deleted!\n{e:#}"))
                }
            },
            (Event::AnswerDelete(false), _) => {
                draft.confirm_delete = false;
                self.draft = Some(draft);
                Outcome::Updated
            }
            (Event::Cancel, _) => Outcome::Updated,
            _ => {
                self.draft = Some(draft);
                Outcome::Ignored
            }
        }
    }
}

pub const AREA_FILL_OPACITY: f32 = 0.35;
pub const REFERENCE_OPACITY: f32 = 0.15;

/// Something the map should draw, bottom-most first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Overlay<'a> {
    /// A stored area, filled at [`AREA_FILL_OPACITY`].
    Area {
        points: &'a [LatLng],
        color: HexColor,
    },
    /// The faded shape of the area being replaced.
    Reference {
        points: &'a [LatLng],
        color: HexColor,
    },
    /// Points placed in the current drawing session. Closed once it is a polygon.
    Draft {
        points: &'a [LatLng],
        color: HexColor,
        closed: bool,
    },
}

/// What the page map draws: one filled polygon per stored area, nothing else.
pub fn area_overlays(store: &AreaStore) -> Vec<Overlay<'_>> {
    store
        .list()
        .iter()
        .filter(|area| area.is_polygon())
        .map(|area| Overlay::Area {
            points: &area.points,
            color: area.metadata.color,
        })
        .collect()
}

/// What the drawing map in the dialog draws: the reference shape until the
/// first point is placed, then the points placed so far.
pub fn draft_overlays(editor: &Editor) -> Vec<Overlay<'_>> {
    let Some(draft) = editor.draft().filter(|d| d.step == Step::Drawing) else {
        return vec![];
    };

    if draft.shows_reference() {
        vec![Overlay::Reference {
            points: &draft.previous,
            color: draft.metadata.color,
        }]
    } else if !draft.points.is_empty() {
        vec![Overlay::Draft {
            points: &draft.points,
            color: draft.metadata.color,
            closed: draft.points.len() >= MIN_POLYGON_POINTS,
        }]
    } else {
        vec![]
    }
}

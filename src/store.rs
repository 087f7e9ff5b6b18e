// This module holds the list of delivery areas for the lifetime of the page

use anyhow::bail;

use crate::area::{Area, MIN_POLYGON_POINTS};

/// Ordered list of delivery areas. Insertion order is display order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AreaStore {
    areas: Vec<Area>,
}

impl AreaStore {
    pub fn list(&self) -> &[Area] {
        &self.areas
    }

    pub fn get(&self, index: usize) -> Option<&Area> {
        self.areas.get(index)
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Appends `area` when `index` is `None`, otherwise replaces the area at `index`.
    pub fn upsert(&mut self, index: Option<usize>, area: Area) -> anyhow::Result<()> {
        if !area.is_polygon() {
            bail!(
                "An area needs at least {MIN_POLYGON_POINTS} points, this one has {}",
                area.points.len()
            );
        }

        match index {
            None => {
                log::info!("Added area '{}'", area.metadata.title);
                self.areas.push(area);
            }
            Some(i) => {
                let len = self.areas.len();
                let Some(slot) = self.areas.get_mut(i) else {
                    bail!("Cannot replace area {i}, there are only {len} areas");
                };
                log::info!("Replaced area {i} with '{}'", area.metadata.title);
                *slot = area;
            }
        }

        Ok(())
    }

    pub fn delete(&mut self, index: usize) -> anyhow::Result<Area> {
        if index >= self.areas.len() {
            bail!(
                "Cannot delete area {index}, there are only {} areas",
                self.areas.len()
            );
        }

        let area = self.areas.remove(index);
        log::info!("Deleted area {index} '{}'", area.metadata.title);
        Ok(area)
    }
}

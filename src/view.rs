//! Pure projection of the session into what the screen shows.
//!
//! `render` is called after every accepted event; drawing code only ever sees
//! a [`SessionView`], never the controller itself.

use crate::model::{Coordinate, LocationRecord, TableRow, RECORD_COUNT};
use crate::session::SessionController;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    /// The unconfirmed selection.
    Pending,
    /// A coordinate stored in a record.
    Saved,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub coordinate: Coordinate,
    pub label: String,
    pub style: MarkerStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub current_index: usize,
    pub editing: LocationRecord,
    pub pending: Coordinate,
    /// Pending marker first, then saved markers in record order.
    pub markers: Vec<Marker>,
    pub rows: Vec<TableRow>,
    pub confirmed: usize,
}

impl SessionView {
    pub fn title(&self) -> String {
        format!("Editing record {} of {}", self.current_index + 1, RECORD_COUNT)
    }
}

pub fn render(session: &SessionController) -> SessionView {
    let store = session.store();
    let current_index = session.current_index();
    let pending = session.pending();

    let mut markers = vec![Marker {
        coordinate: pending,
        label: "selected".into(),
        style: MarkerStyle::Pending,
    }];
    markers.extend(store.iter().filter_map(|r| {
        r.coordinate.map(|coordinate| Marker {
            coordinate,
            label: if r.name.is_empty() {
                format!("#{}", r.sequence)
            } else {
                r.name.clone()
            },
            style: MarkerStyle::Saved,
        })
    }));

    SessionView {
        current_index,
        editing: store
            .get(current_index)
            .cloned()
            .unwrap_or_else(|_| LocationRecord::empty(current_index)),
        pending,
        markers,
        rows: store.to_table(),
        confirmed: store.confirmed_count(),
    }
}

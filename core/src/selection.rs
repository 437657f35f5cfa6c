//! Cursor state over the three lists a user can navigate

use crate::engine::DisplaySnapshot;
use serde::{Deserialize, Serialize};

/// Which list keyboard navigation applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActiveList {
    #[default]
    Results,
    ContextMenu,
    History,
}

#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    index: Option<usize>,
    len: usize,
}

impl Cursor {
    fn set_len(&mut self, len: usize) {
        self.len = len;
        self.index = match self.index {
            _ if len == 0 => None,
            Some(index) => Some(index.min(len - 1)),
            None => Some(0),
        };
    }

    fn shift(&mut self, delta: i64) {
        if self.len == 0 {
            self.index = None;
            return;
        }
        let len = self.len as i64;
        let current = self.index.unwrap_or(0) as i64;
        self.index = Some((current + delta).rem_euclid(len) as usize);
    }
}

/// Selection cursors; consumes merge output but never touches it
#[derive(Debug, Clone)]
pub struct SelectionState {
    active: ActiveList,
    results: Cursor,
    context_menu: Cursor,
    history: Cursor,
    page_size: usize,
}

impl SelectionState {
    pub fn new(page_size: usize) -> Self {
        Self {
            active: ActiveList::Results,
            results: Cursor::default(),
            context_menu: Cursor::default(),
            history: Cursor::default(),
            page_size: page_size.max(1),
        }
    }

    pub fn active(&self) -> ActiveList {
        self.active
    }

    fn cursor(&self, list: ActiveList) -> &Cursor {
        match list {
            ActiveList::Results => &self.results,
            ActiveList::ContextMenu => &self.context_menu,
            ActiveList::History => &self.history,
        }
    }

    fn cursor_mut(&mut self, list: ActiveList) -> &mut Cursor {
        match list {
            ActiveList::Results => &mut self.results,
            ActiveList::ContextMenu => &mut self.context_menu,
            ActiveList::History => &mut self.history,
        }
    }

    /// Track a new display snapshot
    pub fn on_snapshot(&mut self, snapshot: &DisplaySnapshot) {
        self.results.set_len(snapshot.len());
        if snapshot.reset_selection && !snapshot.is_empty() {
            self.results.index = Some(0);
        }
    }

    /// Update the length of a list, clamping its cursor
    pub fn set_len(&mut self, list: ActiveList, len: usize) {
        self.cursor_mut(list).set_len(len);
    }

    /// Switch to `list` with its cursor on the first item
    pub fn activate(&mut self, list: ActiveList, len: usize) {
        self.active = list;
        let cursor = self.cursor_mut(list);
        cursor.index = None;
        cursor.set_len(len);
    }

    /// Cursor of the active list
    pub fn selected_index(&self) -> Option<usize> {
        self.cursor(self.active).index
    }

    pub fn selected_index_in(&self, list: ActiveList) -> Option<usize> {
        self.cursor(list).index
    }

    pub fn next(&mut self) {
        self.cursor_mut(self.active).shift(1);
    }

    pub fn previous(&mut self) {
        self.cursor_mut(self.active).shift(-1);
    }

    pub fn next_page(&mut self) {
        let step = self.page_size as i64;
        self.cursor_mut(self.active).shift(step);
    }

    pub fn previous_page(&mut self) {
        let step = self.page_size as i64;
        self.cursor_mut(self.active).shift(-step);
    }

    /// Leave a secondary list; returns false when the window should hide
    pub fn escape(&mut self) -> bool {
        match self.active {
            ActiveList::Results => false,
            ActiveList::ContextMenu | ActiveList::History => {
                self.active = ActiveList::Results;
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DisplayEntry;
    use crate::result::ResultItem;
    use std::sync::Arc;

    fn snapshot(len: usize, reset: bool) -> DisplaySnapshot {
        let entries = (0..len)
            .map(|i| DisplayEntry {
                instance_id: i as u64,
                result: ResultItem::new(format!("r{}", i)),
            })
            .collect();
        DisplaySnapshot {
            revision: 1,
            entries: Arc::new(entries),
            visible: len > 0,
            top_margin: 0,
            reset_selection: reset,
        }
    }

    #[test]
    fn test_moves_wrap() {
        let mut state = SelectionState::new(6);
        state.on_snapshot(&snapshot(3, true));
        assert_eq!(state.selected_index(), Some(0));

        state.previous();
        assert_eq!(state.selected_index(), Some(2));
        state.next();
        assert_eq!(state.selected_index(), Some(0));
    }

    #[test]
    fn test_page_moves_wrap() {
        let mut state = SelectionState::new(6);
        state.on_snapshot(&snapshot(10, true));

        state.next_page();
        assert_eq!(state.selected_index(), Some(6));
        state.next_page();
        assert_eq!(state.selected_index(), Some(2));
        state.previous_page();
        assert_eq!(state.selected_index(), Some(6));
    }

    #[test]
    fn test_snapshot_reset_and_clamp() {
        let mut state = SelectionState::new(6);
        state.on_snapshot(&snapshot(5, true));
        state.next();
        state.next();
        state.next();
        state.next();
        assert_eq!(state.selected_index(), Some(4));

        state.on_snapshot(&snapshot(2, false));
        assert_eq!(state.selected_index(), Some(1));

        state.on_snapshot(&snapshot(0, false));
        assert_eq!(state.selected_index(), None);
        state.next();
        assert_eq!(state.selected_index(), None);

        state.on_snapshot(&snapshot(4, true));
        assert_eq!(state.selected_index(), Some(0));
    }

    #[test]
    fn test_lists_keep_separate_cursors() {
        let mut state = SelectionState::new(6);
        state.on_snapshot(&snapshot(5, true));
        state.next();
        state.next();

        state.activate(ActiveList::ContextMenu, 3);
        assert_eq!(state.active(), ActiveList::ContextMenu);
        assert_eq!(state.selected_index(), Some(0));
        state.previous();
        assert_eq!(state.selected_index(), Some(2));

        assert!(state.escape());
        assert_eq!(state.active(), ActiveList::Results);
        assert_eq!(state.selected_index(), Some(2));
        assert!(!state.escape());
    }
}

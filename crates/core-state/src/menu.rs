//! Menu / fuzzy-search palette (spec §4.G).

use crate::action::Action;

/// One entry in a menu: a display name and the action to dispatch when it's
/// chosen. A closed enum of action kinds wasn't flexible enough to cover
/// every menu use (open-file, set-language, arbitrary custom commands)
/// without duplicating `Action`'s variants, so a menu item just carries the
/// `Action` itself (spec §9 design note on "dynamic action on menu items").
#[derive(Debug, Clone)]
pub struct MenuItem {
    pub name: String,
    pub action: Action,
}

impl MenuItem {
    pub fn new(name: impl Into<String>, action: Action) -> Self {
        Self { name: name.into(), action }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScoredMatch {
    item_idx: usize,
    first_match_offset: usize,
    name_len: usize,
}

/// Case-insensitive subsequence fuzzy scorer (spec §4.G "Scoring").
struct Scorer;

impl Scorer {
    /// `None` if `query`'s runes don't all appear, in order, in `name`.
    fn score(query: &str, name: &str) -> Option<ScoredMatch> {
        if query.is_empty() {
            return Some(ScoredMatch { item_idx: 0, first_match_offset: 0, name_len: name.chars().count() });
        }
        let name_lower: Vec<char> = name.to_lowercase().chars().collect();
        let query_lower: Vec<char> = query.to_lowercase().chars().collect();
        let mut ni = 0usize;
        let mut first_match_offset = None;
        for &qc in &query_lower {
            let mut found = None;
            while ni < name_lower.len() {
                if name_lower[ni] == qc {
                    found = Some(ni);
                    ni += 1;
                    break;
                }
                ni += 1;
            }
            let idx = found?;
            if first_match_offset.is_none() {
                first_match_offset = Some(idx);
            }
        }
        Some(ScoredMatch {
            item_idx: 0,
            first_match_offset: first_match_offset.unwrap_or(0),
            name_len: name_lower.len(),
        })
    }
}

/// {query, result list, scorer} (spec §3: Menu State).
#[derive(Default)]
pub struct MenuSearch {
    pub query: String,
    pub results: Vec<usize>, // indices into MenuState::items
}

/// {visible, prompt, search, selected_result_idx} (spec §3).
pub struct MenuState {
    pub visible: bool,
    pub prompt: String,
    pub items: Vec<MenuItem>,
    pub search: MenuSearch,
    pub selected_result_idx: usize,
    empty_query_shows_all: bool,
}

impl Default for MenuState {
    fn default() -> Self {
        Self {
            visible: false,
            prompt: String::new(),
            items: Vec::new(),
            search: MenuSearch::default(),
            selected_result_idx: 0,
            empty_query_shows_all: true,
        }
    }
}

impl MenuState {
    pub fn show(&mut self, prompt: impl Into<String>, items: Vec<MenuItem>, empty_query_shows_all: bool) {
        self.visible = true;
        self.prompt = prompt.into();
        self.items = items;
        self.search = MenuSearch::default();
        self.empty_query_shows_all = empty_query_shows_all;
        self.selected_result_idx = 0;
        self.rescore();
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.prompt.clear();
        self.items.clear();
        self.search = MenuSearch::default();
        self.selected_result_idx = 0;
    }

    pub fn append_rune(&mut self, r: char) {
        self.search.query.push(r);
        self.selected_result_idx = 0;
        self.rescore();
    }

    pub fn delete_rune(&mut self) {
        self.search.query.pop();
        self.selected_result_idx = 0;
        self.rescore();
    }

    pub fn move_selection(&mut self, delta: i64) {
        let n = self.search.results.len();
        if n == 0 {
            return;
        }
        let cur = self.selected_result_idx as i64;
        let n_i = n as i64;
        self.selected_result_idx = (((cur + delta) % n_i + n_i) % n_i) as usize;
    }

    /// The currently selected item, if any results are present.
    pub fn selected_item(&self) -> Option<&MenuItem> {
        self.search
            .results
            .get(self.selected_result_idx)
            .and_then(|&idx| self.items.get(idx))
    }

    fn rescore(&mut self) {
        if self.search.query.is_empty() && !self.empty_query_shows_all {
            self.search.results.clear();
            self.selected_result_idx = 0;
            return;
        }
        let mut scored: Vec<(usize, ScoredMatch)> = self
            .items
            .iter()
            .enumerate()
            .filter_map(|(idx, item)| {
                Scorer::score(&self.search.query, &item.name).map(|m| (idx, ScoredMatch { item_idx: idx, ..m }))
            })
            .collect();
        scored.sort_by(|(_, a), (_, b)| {
            a.first_match_offset
                .cmp(&b.first_match_offset)
                .then(a.name_len.cmp(&b.name_len))
        });
        self.search.results = scored.into_iter().map(|(idx, _)| idx).collect();
        if self.selected_result_idx >= self.search.results.len() {
            self.selected_result_idx = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(names: &[&str]) -> Vec<MenuItem> {
        names.iter().map(|n| MenuItem::new(*n, Action::Quit)).collect()
    }

    #[test]
    fn empty_query_shows_all_when_requested() {
        let mut menu = MenuState::default();
        menu.show("open", items(&["alpha", "beta"]), true);
        assert_eq!(menu.search.results.len(), 2);
    }

    #[test]
    fn empty_query_hides_results_when_requested() {
        let mut menu = MenuState::default();
        menu.show("open", items(&["alpha", "beta"]), false);
        assert!(menu.search.results.is_empty());
    }

    #[test]
    fn subsequence_match_filters_and_orders_by_earliest_match() {
        let mut menu = MenuState::default();
        menu.show("open", items(&["zzzabcd", "abcd"]), true);
        menu.append_rune('a');
        menu.append_rune('b');
        menu.append_rune('c');
        let first = menu.selected_item().unwrap();
        assert_eq!(first.name, "abcd");
    }

    #[test]
    fn move_selection_wraps_modulo_result_count() {
        let mut menu = MenuState::default();
        menu.show("open", items(&["a", "b", "c"]), true);
        menu.move_selection(-1);
        assert_eq!(menu.selected_result_idx, 2);
        menu.move_selection(1);
        assert_eq!(menu.selected_result_idx, 0);
    }

    #[test]
    fn move_selection_is_noop_when_no_results() {
        let mut menu = MenuState::default();
        menu.show("open", items(&[]), true);
        menu.move_selection(3);
        assert_eq!(menu.selected_result_idx, 0);
    }

    #[test]
    fn delete_rune_rescopes_and_resets_selection() {
        let mut menu = MenuState::default();
        menu.show("open", items(&["abc", "axc"]), true);
        menu.append_rune('a');
        menu.append_rune('b');
        assert_eq!(menu.search.results.len(), 1);
        menu.delete_rune();
        assert_eq!(menu.search.results.len(), 2);
    }
}

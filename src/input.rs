use crate::app::InputMode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleHelp,
    StartSearch,
    ToggleTheme,
    Refresh,
    Down,
    Up,
    NextPage,
    PrevPage,
    NextTab,
    PrevTab,
    NextAlias,
    PrevAlias,
    CycleStatusFilter,
    CycleSortKey,
    FlipSortOrder,
    ToggleRotation,
    OpenDetail,
    Back,
    DismissToast,
    SubmitInput,
    CancelInput,
    Backspace,
    InputChar(char),
}

pub fn map_key(mode: InputMode, key: KeyEvent) -> Option<Action> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }
    match mode {
        InputMode::Normal => map_normal_mode_key(key),
        InputMode::Search => map_search_mode_key(key),
    }
}

/// Single-letter shortcuts only fire without modifiers, so terminal chords
/// such as Ctrl+R never reach them.
fn map_normal_mode_key(key: KeyEvent) -> Option<Action> {
    let plain = key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT;
    match key.code {
        KeyCode::Char('q') if plain => Some(Action::Quit),
        KeyCode::Char('?') => Some(Action::ToggleHelp),
        KeyCode::Char('/') if plain => Some(Action::StartSearch),
        KeyCode::Char('d') if key.modifiers.is_empty() => Some(Action::ToggleTheme),
        KeyCode::Char('r') if key.modifiers.is_empty() => Some(Action::Refresh),
        KeyCode::F(5) => Some(Action::Refresh),
        KeyCode::Char('j') if key.modifiers.is_empty() => Some(Action::Down),
        KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') if key.modifiers.is_empty() => Some(Action::Up),
        KeyCode::Up => Some(Action::Up),
        KeyCode::Char('n') if key.modifiers.is_empty() => Some(Action::NextPage),
        KeyCode::PageDown => Some(Action::NextPage),
        KeyCode::Char('p') if key.modifiers.is_empty() => Some(Action::PrevPage),
        KeyCode::PageUp => Some(Action::PrevPage),
        KeyCode::Tab | KeyCode::Right => Some(Action::NextTab),
        KeyCode::BackTab | KeyCode::Left => Some(Action::PrevTab),
        KeyCode::Char(']') if plain => Some(Action::NextAlias),
        KeyCode::Char('[') if plain => Some(Action::PrevAlias),
        KeyCode::Char('f') if key.modifiers.is_empty() => Some(Action::CycleStatusFilter),
        KeyCode::Char('s') if key.modifiers.is_empty() => Some(Action::CycleSortKey),
        KeyCode::Char('o') if key.modifiers.is_empty() => Some(Action::FlipSortOrder),
        KeyCode::Char('a') if key.modifiers.is_empty() => Some(Action::ToggleRotation),
        KeyCode::Char('x') if key.modifiers.is_empty() => Some(Action::DismissToast),
        KeyCode::Enter => Some(Action::OpenDetail),
        KeyCode::Esc => Some(Action::Back),
        _ => None,
    }
}

fn map_search_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::CancelInput),
        KeyCode::Enter => Some(Action::SubmitInput),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Char('/') => None,
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            Some(Action::InputChar(c))
        }
        _ => None,
    }
}

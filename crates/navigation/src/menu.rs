//! Menu - Entries derived from the same guard decision as the routes
//!
//! A screen is listed iff it is menu-visible and the guard would allow
//! entering it against the same snapshot. There is no second rule.

use session::SessionSnapshot;

use crate::guard::{Decision, GuardChain};
use crate::screens::{Screen, ScreenRegistry};

/// One main menu entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub id: String,
    pub path: String,
    pub title: String,
}

impl From<&Screen> for MenuEntry {
    fn from(screen: &Screen) -> Self {
        Self {
            id: screen.id.clone(),
            path: screen.path.clone(),
            title: screen.title.clone(),
        }
    }
}

/// Guard decision for one gated screen
#[derive(Debug, Clone)]
pub struct ScreenDecision<'a> {
    pub screen: &'a Screen,
    pub decision: Decision,
}

/// Decide every non-public screen against one snapshot
pub fn decide_screens<'a>(
    screens: &'a ScreenRegistry,
    guard: &GuardChain,
    session: &SessionSnapshot,
) -> Vec<ScreenDecision<'a>> {
    screens
        .screens()
        .iter()
        .filter(|screen| !screen.is_public())
        .map(|screen| ScreenDecision {
            screen,
            decision: guard.decide(session, &screen.requirement),
        })
        .collect()
}

/// Menu entries, in screen declaration order. Empty while bootstrapping
/// and when signed out.
pub fn build_menu(
    screens: &ScreenRegistry,
    guard: &GuardChain,
    session: &SessionSnapshot,
) -> Vec<MenuEntry> {
    decide_screens(screens, guard, session)
        .into_iter()
        .filter(|d| d.screen.in_menu && d.decision.is_allow())
        .map(|d| MenuEntry::from(d.screen))
        .collect()
}

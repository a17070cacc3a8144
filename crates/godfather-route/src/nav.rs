//! The navigation bar.

use crate::{Access, Route};

/// One entry of the navigation bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub route: Route,
}

impl NavLink {
    const fn new(label: &'static str, route: Route) -> Self {
        Self { label, route }
    }

    pub fn path(&self) -> &'static str {
        self.route.path()
    }

    /// Whether this link should be highlighted for the current route.
    pub fn is_active(&self, current: Route) -> bool {
        self.route == current
    }
}

const PLAYER_LINKS: [NavLink; 4] = [
    NavLink::new("Dashboard", Route::Dashboard),
    NavLink::new("Missions", Route::Missions),
    NavLink::new("Market", Route::Trade),
    NavLink::new("Family", Route::Family),
];

const ADMIN_LINK: NavLink = NavLink::new("Admin", Route::Admin);

/// The links to show. The bar is hidden (no links) unless signed in, and
/// the admin entry only appears for admins.
pub fn nav_links(access: Access) -> Vec<NavLink> {
    if !access.is_authenticated() {
        return Vec::new();
    }
    let mut links = PLAYER_LINKS.to_vec();
    if access.is_admin() {
        links.push(ADMIN_LINK);
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(access: Access) -> Vec<&'static str> {
        nav_links(access).iter().map(|l| l.label).collect()
    }

    #[test]
    fn test_nav_links_hidden_until_signed_in() {
        assert!(nav_links(Access::Loading).is_empty());
        assert!(nav_links(Access::Anonymous).is_empty());
    }

    #[test]
    fn test_nav_links_player() {
        assert_eq!(labels(Access::Player), ["Dashboard", "Missions", "Market", "Family"]);
    }

    #[test]
    fn test_nav_links_admin_adds_admin_entry() {
        let links = nav_links(Access::Admin);
        assert_eq!(links.len(), 5);
        assert_eq!(links[4].path(), "/admin");
    }

    #[test]
    fn test_market_link_points_at_trade() {
        let market = nav_links(Access::Player)
            .into_iter()
            .find(|l| l.label == "Market")
            .unwrap();
        assert_eq!(market.path(), "/trade");
        assert!(market.is_active(Route::parse("/trade?x=1")));
        assert!(!market.is_active(Route::Dashboard));
    }
}

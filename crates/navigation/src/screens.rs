//! ScreenRegistry - Navigable screens and what each one requires

use rbac::RouteRequirement;
use shared::{AccessConfig, AccessError, Capability, Result, RoutesConfig, ScreenConfig};

/// Whether a screen needs a session at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenAccess {
    /// Reachable without a session; the guard is not consulted
    Public,
    Authenticated,
}

/// A navigable screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub id: String,
    pub path: String,
    pub title: String,
    pub access: ScreenAccess,
    pub requirement: RouteRequirement,
    pub in_menu: bool,
}

impl Screen {
    /// An authenticated, open, menu-listed screen
    pub fn new(id: impl Into<String>, path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            title: title.into(),
            access: ScreenAccess::Authenticated,
            requirement: RouteRequirement::Open,
            in_menu: true,
        }
    }

    /// Make the screen public; public screens never appear in the menu
    pub fn public(mut self) -> Self {
        self.access = ScreenAccess::Public;
        self.in_menu = false;
        self
    }

    pub fn requires(mut self, requirement: RouteRequirement) -> Self {
        self.requirement = requirement;
        self
    }

    pub fn hidden_from_menu(mut self) -> Self {
        self.in_menu = false;
        self
    }

    pub fn is_public(&self) -> bool {
        self.access == ScreenAccess::Public
    }
}

impl From<ScreenConfig> for Screen {
    fn from(config: ScreenConfig) -> Self {
        let screen = Screen::new(config.id, config.path, config.title)
            .requires(config.requirement.into());
        let screen = if config.public { screen.public() } else { screen };
        if config.in_menu {
            screen
        } else {
            screen.hidden_from_menu()
        }
    }
}

/// Strip query, fragment and trailing slashes from a location
pub fn normalize_location(location: &str) -> &str {
    let end = location.find(['?', '#']).unwrap_or(location.len());
    let path = location[..end].trim_end_matches('/');
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

/// Screens in declaration order, which is also menu order
#[derive(Debug, Clone, Default)]
pub struct ScreenRegistry {
    screens: Vec<Screen>,
}

impl ScreenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a screen. Ids and paths must be unique and paths absolute.
    pub fn register(&mut self, mut screen: Screen) -> Result<()> {
        if !screen.path.starts_with('/') {
            return Err(AccessError::Config(format!(
                "Screen '{}' path must be absolute, got '{}'",
                screen.id, screen.path
            )));
        }
        screen.path = normalize_location(&screen.path).to_string();

        if self.get(&screen.id).is_some() {
            return Err(AccessError::Config(format!(
                "Duplicate screen id '{}'",
                screen.id
            )));
        }
        if self.screens.iter().any(|s| s.path == screen.path) {
            return Err(AccessError::Config(format!(
                "Duplicate screen path '{}'",
                screen.path
            )));
        }

        self.screens.push(screen);
        Ok(())
    }

    /// The clinic back-office screens
    pub fn clinic_defaults(routes: &RoutesConfig) -> Result<Self> {
        use Capability::*;

        let mut registry = Self::new();
        for screen in [
            Screen::new("home", "/", "Home"),
            Screen::new("owners", "/owners", "Owners")
                .requires(RouteRequirement::any_of([OwnersRead, OwnersManage])),
            Screen::new("animals", "/animals", "Animals")
                .requires(RouteRequirement::any_of([AnimalsRead, AnimalsManage])),
            Screen::new("services", "/services", "Services")
                .requires(RouteRequirement::any_of([ServicesRead, ServicesManage])),
            Screen::new("appointments", "/appointments", "Appointments")
                .requires(RouteRequirement::any_of([AppointmentsRead, AppointmentsManage])),
            Screen::new("products", "/products", "Products")
                .requires(RouteRequirement::any_of([ProductsRead, ProductsManage])),
            Screen::new("cashier", "/cashier", "Cashier")
                .requires(RouteRequirement::all_of([CashierRead, ProductsRead])),
            Screen::new("users", "/users", "Users")
                .requires(RouteRequirement::all_of([UsersRead, UsersManage])),
            Screen::new("roles", "/roles", "Roles")
                .requires(RouteRequirement::all_of([RolesManage])),
        ] {
            registry.register(screen)?;
        }
        registry.ensure_route_screens(routes)?;
        Ok(registry)
    }

    /// Screens from configuration, or the clinic defaults when none are declared
    pub fn from_config(config: &AccessConfig) -> Result<Self> {
        match &config.screens {
            None => Self::clinic_defaults(&config.routes),
            Some(screens) => {
                let mut registry = Self::new();
                for screen in screens {
                    registry.register(screen.clone().into())?;
                }
                registry.ensure_route_screens(&config.routes)?;
                Ok(registry)
            }
        }
    }

    /// Add public sign-in and unauthorized screens when missing
    fn ensure_route_screens(&mut self, routes: &RoutesConfig) -> Result<()> {
        for (id, path, title) in [
            ("sign-in", &routes.sign_in_path, "Sign in"),
            ("unauthorized", &routes.unauthorized_path, "Not authorized"),
        ] {
            let existing = self
                .resolve_exact(path)
                .map(|screen| (screen.id.clone(), screen.is_public()));
            match existing {
                Some((screen_id, false)) => {
                    return Err(AccessError::Config(format!(
                        "Screen '{}' at '{}' must be public",
                        screen_id, path
                    )));
                }
                Some(_) => {}
                None => self.register(Screen::new(id, path.as_str(), title).public())?,
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Screen> {
        self.screens.iter().find(|s| s.id == id)
    }

    pub fn screens(&self) -> &[Screen] {
        &self.screens
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    fn resolve_exact(&self, location: &str) -> Option<&Screen> {
        let path = normalize_location(location);
        self.screens.iter().find(|s| s.path == path)
    }

    /// Screen owning a location: exact path, else longest segment prefix.
    /// The root screen only owns `/` itself.
    pub fn resolve(&self, location: &str) -> Option<&Screen> {
        let path = normalize_location(location);

        self.screens
            .iter()
            .filter(|s| {
                s.path == path
                    || (s.path != "/"
                        && path.starts_with(s.path.as_str())
                        && path[s.path.len()..].starts_with('/'))
            })
            .max_by_key(|s| s.path.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> ScreenRegistry {
        ScreenRegistry::clinic_defaults(&RoutesConfig::default()).unwrap()
    }

    // ============== Location Tests ==============

    #[test]
    fn test_normalize_location() {
        assert_eq!(normalize_location("/owners"), "/owners");
        assert_eq!(normalize_location("/owners/"), "/owners");
        assert_eq!(normalize_location("/owners?page=2#top"), "/owners");
        assert_eq!(normalize_location("/"), "/");
        assert_eq!(normalize_location("/?tab=1"), "/");
        assert_eq!(normalize_location(""), "/");
    }

    #[test]
    fn test_resolve_exact_and_nested() {
        let registry = defaults();

        assert_eq!(registry.resolve("/owners").unwrap().id, "owners");
        assert_eq!(registry.resolve("/owners/42/edit").unwrap().id, "owners");
        assert_eq!(registry.resolve("/owners?page=3").unwrap().id, "owners");
        assert_eq!(registry.resolve("/").unwrap().id, "home");
    }

    #[test]
    fn test_resolve_requires_segment_boundary() {
        let registry = defaults();
        assert!(registry.resolve("/ownership").is_none());
        assert!(registry.resolve("/pharmacy").is_none());
    }

    #[test]
    fn test_resolve_prefers_longest_prefix() {
        let mut registry = defaults();
        registry
            .register(Screen::new("owner-reports", "/owners/reports", "Owner reports"))
            .unwrap();

        assert_eq!(registry.resolve("/owners/reports/2024").unwrap().id, "owner-reports");
        assert_eq!(registry.resolve("/owners/7").unwrap().id, "owners");
    }

    // ============== Registration Tests ==============

    #[test]
    fn test_defaults_include_public_route_screens() {
        let registry = defaults();

        let sign_in = registry.get("sign-in").unwrap();
        assert!(sign_in.is_public());
        assert!(!sign_in.in_menu);
        assert_eq!(sign_in.path, "/login");
        assert!(registry.get("unauthorized").unwrap().is_public());
    }

    #[test]
    fn test_defaults_declare_policies() {
        let registry = defaults();

        assert_eq!(registry.get("home").unwrap().requirement, RouteRequirement::Open);
        assert_eq!(
            registry.get("cashier").unwrap().requirement,
            RouteRequirement::all_of([Capability::CashierRead, Capability::ProductsRead])
        );
        assert_eq!(
            registry.get("owners").unwrap().requirement.policy(),
            Some(shared::RequirementPolicy::AnyOf)
        );
    }

    #[test]
    fn test_duplicate_screens_rejected() {
        let mut registry = defaults();
        assert!(registry.register(Screen::new("owners", "/clients", "Clients")).is_err());
        assert!(registry.register(Screen::new("clients", "/owners/", "Clients")).is_err());
    }

    #[test]
    fn test_relative_path_rejected() {
        let mut registry = ScreenRegistry::new();
        assert!(registry.register(Screen::new("x", "owners", "X")).is_err());
    }

    // ============== Config Tests ==============

    #[test]
    fn test_from_config_uses_declared_screens() {
        let config: AccessConfig = serde_json::from_str(
            r#"{
                "routes": {"signInPath": "/auth"},
                "screens": [
                    {"id": "home", "path": "/", "title": "Home"},
                    {"id": "stock", "path": "/stock", "title": "Stock",
                     "requirement": {"policy": "anyOf", "capabilities": ["products:read"]}},
                    {"id": "help", "path": "/help", "title": "Help", "public": true}
                ]
            }"#,
        )
        .unwrap();

        let registry = ScreenRegistry::from_config(&config).unwrap();

        assert!(registry.get("owners").is_none());
        assert_eq!(
            registry.get("stock").unwrap().requirement,
            RouteRequirement::any_of([Capability::ProductsRead])
        );
        assert!(registry.get("help").unwrap().is_public());
        // Route screens filled in from the configured paths
        assert_eq!(registry.resolve("/auth").unwrap().id, "sign-in");
        assert_eq!(registry.resolve("/unauthorized").unwrap().id, "unauthorized");
    }

    #[test]
    fn test_from_config_without_screens_uses_defaults() {
        let registry = ScreenRegistry::from_config(&AccessConfig::default()).unwrap();
        assert_eq!(registry.len(), defaults().len());
    }

    #[test]
    fn test_gated_sign_in_screen_rejected() {
        let config: AccessConfig = serde_json::from_str(
            r#"{"screens": [{"id": "login", "path": "/login", "title": "Login"}]}"#,
        )
        .unwrap();

        assert!(ScreenRegistry::from_config(&config).is_err());
    }
}
